//! Severity-tagged user messages and the end-of-run summary.
//!
//! Core modules talk to the user only through the [`Reporter`] trait.
//! [`ConsoleReporter`] is the terminal implementation: `ok` and `info` go to
//! stdout, `warning` and `error` to stderr, each with a colored tag. Every
//! line is mirrored to the log so `-vv` runs keep a single timeline.

use std::fmt;
use std::sync::Mutex;

use bytesize::ByteSize;
use yansi::Paint;

use crate::actions::Counters;

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// An action completed
    Ok,
    /// Informational
    Info,
    /// Something was skipped
    Warning,
    /// Something failed
    Error,
}

impl Severity {
    /// Plain tag text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sink for user-facing messages.
pub trait Reporter {
    /// Emit one message.
    fn report(&self, severity: Severity, message: &str);

    /// Emit an [`Severity::Ok`] message.
    fn ok(&self, message: &str) {
        self.report(Severity::Ok, message);
    }

    /// Emit an [`Severity::Info`] message.
    fn info(&self, message: &str) {
        self.report(Severity::Info, message);
    }

    /// Emit a [`Severity::Warning`] message.
    fn warning(&self, message: &str) {
        self.report(Severity::Warning, message);
    }

    /// Emit an [`Severity::Error`] message.
    fn error(&self, message: &str) {
        self.report(Severity::Error, message);
    }
}

/// Terminal reporter with colored tags.
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    color: bool,
    quiet: bool,
}

impl ConsoleReporter {
    /// Create a reporter.
    ///
    /// With `quiet`, only warnings and errors are printed.
    #[must_use]
    pub fn new(color: bool, quiet: bool) -> Self {
        Self { color, quiet }
    }

    fn tag(&self, severity: Severity) -> String {
        let label = format!("[{}]", severity.label());
        if !self.color {
            return label;
        }
        match severity {
            Severity::Ok => label.green().bold().to_string(),
            Severity::Info => label.cyan().to_string(),
            Severity::Warning => label.yellow().bold().to_string(),
            Severity::Error => label.red().bold().to_string(),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, severity: Severity, message: &str) {
        log::debug!("[{}] {}", severity, message);

        match severity {
            Severity::Ok | Severity::Info if self.quiet => {}
            Severity::Ok | Severity::Info => println!("{} {}", self.tag(severity), message),
            Severity::Warning | Severity::Error => {
                eprintln!("{} {}", self.tag(severity), message);
            }
        }
    }
}

/// Reporter that records messages in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl MemoryReporter {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Recorded messages of one severity.
    #[must_use]
    pub fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m)
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, severity: Severity, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((severity, message.to_string()));
        }
    }
}

/// End-of-run totals in display form.
#[derive(Debug, Clone, Copy)]
pub struct Summary<'a> {
    counters: &'a Counters,
    dry_run: bool,
    removals: bool,
}

impl<'a> Summary<'a> {
    /// Wrap run counters for display.
    #[must_use]
    pub fn new(counters: &'a Counters, dry_run: bool) -> Self {
        Self {
            counters,
            dry_run,
            removals: true,
        }
    }

    /// Include removal totals; off for runs that never delete.
    #[must_use]
    pub fn with_removals(mut self, removals: bool) -> Self {
        self.removals = removals;
        self
    }

    /// Summary lines, one per counter.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let c = self.counters;
        let removed = if self.dry_run {
            "Would be removed"
        } else {
            "Removed"
        };

        let mut lines = vec![
            format!("Duplicate groups: {}", c.duplicate_groups),
            format!(
                "Duplicated files: {} ({})",
                c.duplicate_files,
                ByteSize::b(c.duplicate_bytes)
            ),
        ];
        if !self.removals {
            return lines;
        }

        lines.push(format!(
            "{removed} files: {} ({})",
            c.deleted_files,
            ByteSize::b(c.deleted_bytes)
        ));
        if c.backed_up_files > 0 {
            lines.push(format!("Backed up files: {}", c.backed_up_files));
        }
        lines
    }

    /// Emit every line as an info message.
    pub fn report_to(&self, reporter: &dyn Reporter) {
        for line in self.lines() {
            reporter.info(&line);
        }
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}
