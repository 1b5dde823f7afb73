//! Disposition strategies: what happens to each duplicate group.
//!
//! Three interchangeable strategies consume the same group stream:
//! - [`AutoStrategy`]: policy engine plus resolution executor
//! - [`InteractiveStrategy`]: the user picks copies to remove
//! - [`ListStrategy`]: report paths only, never touch anything
//!
//! [`run_strategy`] drives any of them and accounts duplicate groups, files
//! and bytes the same way for all three.

pub mod auto;
pub mod interactive;
pub mod list;

use std::path::PathBuf;

pub use auto::AutoStrategy;
pub use interactive::{ChoicePresenter, DialoguerPresenter, InteractiveStrategy};
pub use list::ListStrategy;

use crate::actions::Counters;
use crate::duplicates::DuplicateGroup;
use crate::report::Reporter;
use crate::scanner::file_size;

/// One group with its position in the run and member sizes.
#[derive(Debug, Clone, Copy)]
pub struct GroupContext<'a> {
    /// The group being disposed of
    pub group: &'a DuplicateGroup,
    /// Member sizes, parallel to `group.paths()`; `None` if unreadable
    pub sizes: &'a [Option<u64>],
    /// Zero-based position of the group
    pub index: usize,
    /// Number of groups in the run
    pub total: usize,
}

impl<'a> GroupContext<'a> {
    /// Paths paired with their sizes.
    pub fn members(&self) -> impl Iterator<Item = (&'a PathBuf, Option<u64>)> + 'a {
        let (group, sizes) = (self.group, self.sizes);
        group
            .paths()
            .iter()
            .enumerate()
            .map(move |(i, p)| (p, sizes.get(i).copied().flatten()))
    }
}

/// Consumes duplicate groups one at a time.
pub trait DispositionStrategy {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Dispose of one group, adding deletions and backups to `counters`.
    ///
    /// Returns the number of recovered file-level failures; each has
    /// already been sent to `reporter`.
    fn dispose(
        &mut self,
        ctx: GroupContext<'_>,
        reporter: &dyn Reporter,
        counters: &mut Counters,
    ) -> usize;
}

/// Totals of a whole strategy run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Accumulated counters
    pub counters: Counters,
    /// Recovered file-level failures
    pub failures: usize,
}

/// Feed every group to `strategy`, accumulating shared counters first.
pub fn run_strategy(
    strategy: &mut dyn DispositionStrategy,
    groups: &[DuplicateGroup],
    reporter: &dyn Reporter,
) -> RunTotals {
    let mut totals = RunTotals::default();
    log::info!(
        "Disposing of {} groups with the {} strategy",
        groups.len(),
        strategy.name()
    );

    for (index, group) in groups.iter().enumerate() {
        let sizes: Vec<Option<u64>> = group
            .paths()
            .iter()
            .map(|path| match file_size(path) {
                Ok(size) => Some(size),
                Err(e) => {
                    log::warn!("Size unavailable: {}", e);
                    None
                }
            })
            .collect();

        let counters = &mut totals.counters;
        counters.duplicate_groups += 1;
        counters.duplicate_files += group.len() as u64;
        counters.duplicate_bytes += sizes.iter().flatten().sum::<u64>();

        let ctx = GroupContext {
            group,
            sizes: &sizes,
            index,
            total: groups.len(),
        };
        totals.failures += strategy.dispose(ctx, reporter, counters);
    }

    totals
}
