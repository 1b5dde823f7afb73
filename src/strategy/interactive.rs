//! User-driven disposition.
//!
//! Each group is shown as a multi-select list of `path (size)` labels. The
//! selected paths are removed without a backup step, everything else is
//! kept. Selecting every path would leave nothing behind, so that choice is
//! refused and the group is skipped.

use std::io;

use bytesize::ByteSize;
use dialoguer::{theme::ColorfulTheme, MultiSelect};

use super::{DispositionStrategy, GroupContext};
use crate::actions::{Counters, Resolver};
use crate::policy::Classification;
use crate::report::Reporter;

/// Presents labeled choices and returns the indices the user picked.
pub trait ChoicePresenter {
    /// Show `labels` under `prompt`. An aborted prompt yields no selection.
    fn choose(&mut self, prompt: &str, labels: &[String]) -> io::Result<Vec<usize>>;
}

/// Terminal multi-select built on dialoguer.
#[derive(Default)]
pub struct DialoguerPresenter {
    theme: ColorfulTheme,
}

impl DialoguerPresenter {
    /// Create a presenter with the colorful theme.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChoicePresenter for DialoguerPresenter {
    fn choose(&mut self, prompt: &str, labels: &[String]) -> io::Result<Vec<usize>> {
        let selection = MultiSelect::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(labels)
            .interact_opt()
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(selection.unwrap_or_default())
    }
}

/// Lets the user pick which copies of each group to remove.
pub struct InteractiveStrategy<P = DialoguerPresenter> {
    presenter: P,
    resolver: Resolver,
}

impl InteractiveStrategy<DialoguerPresenter> {
    /// Interactive strategy on the terminal.
    #[must_use]
    pub fn terminal() -> Self {
        Self::new(DialoguerPresenter::new())
    }
}

impl<P: ChoicePresenter> InteractiveStrategy<P> {
    /// Create the strategy around any presenter.
    #[must_use]
    pub fn new(presenter: P) -> Self {
        Self {
            presenter,
            resolver: Resolver::default(),
        }
    }

    /// Recover the presenter.
    pub fn into_presenter(self) -> P {
        self.presenter
    }
}

fn label(path: &std::path::Path, size: Option<u64>) -> String {
    match size {
        Some(size) => format!("{} ({})", path.display(), ByteSize::b(size)),
        None => format!("{} (unknown size)", path.display()),
    }
}

impl<P: ChoicePresenter> DispositionStrategy for InteractiveStrategy<P> {
    fn name(&self) -> &'static str {
        "interactive"
    }

    fn dispose(
        &mut self,
        ctx: GroupContext<'_>,
        reporter: &dyn Reporter,
        counters: &mut Counters,
    ) -> usize {
        reporter.info(&format!("Duplication {} of {}", ctx.index + 1, ctx.total));

        let labels: Vec<String> = ctx.members().map(|(p, s)| label(p, s)).collect();
        let selected = match self.presenter.choose("Select files to remove", &labels) {
            Ok(selected) => selected,
            Err(e) => {
                reporter.error(&format!("Selection failed: {e}"));
                return 1;
            }
        };

        let paths = ctx.group.paths();
        let mut removed = Vec::new();
        let mut kept = Vec::new();
        for (i, path) in paths.iter().enumerate() {
            if selected.contains(&i) {
                removed.push(path.clone());
            } else {
                kept.push(path.clone());
            }
        }

        if removed.is_empty() {
            return 0;
        }
        if kept.is_empty() {
            reporter.warning("Every copy was selected; at least one must be kept. Group skipped.");
            return 0;
        }

        let classification = Classification {
            kept,
            removed,
            issues: Vec::new(),
        };
        self.resolver.apply(&classification, reporter, counters).len()
    }
}
