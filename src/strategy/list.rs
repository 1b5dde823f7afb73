//! Listing-only disposition.

use std::io::{self, Write};

use bytesize::ByteSize;

use super::{DispositionStrategy, GroupContext};
use crate::actions::Counters;
use crate::report::Reporter;

/// Writes every path of every group.
///
/// With sizes shown each line reads `path (size)` and groups are separated
/// by a blank line. Otherwise paths are bare, one per line, for piping into
/// other tools.
pub struct ListStrategy<W: Write = io::Stdout> {
    out: W,
    show_size: bool,
}

impl ListStrategy<io::Stdout> {
    /// List to standard output.
    #[must_use]
    pub fn stdout(show_size: bool) -> Self {
        Self::new(io::stdout(), show_size)
    }
}

impl<W: Write> ListStrategy<W> {
    /// List to any writer.
    #[must_use]
    pub fn new(out: W, show_size: bool) -> Self {
        Self { out, show_size }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_group(&mut self, ctx: &GroupContext<'_>) -> io::Result<()> {
        for (path, size) in ctx.members() {
            if self.show_size {
                let size = size.map_or_else(
                    || "unknown size".to_string(),
                    |s| ByteSize::b(s).to_string(),
                );
                writeln!(self.out, "{} ({})", path.display(), size)?;
            } else {
                writeln!(self.out, "{}", path.display())?;
            }
        }
        if self.show_size {
            writeln!(self.out)?;
        }
        self.out.flush()
    }
}

impl<W: Write> DispositionStrategy for ListStrategy<W> {
    fn name(&self) -> &'static str {
        "list"
    }

    fn dispose(
        &mut self,
        ctx: GroupContext<'_>,
        reporter: &dyn Reporter,
        _counters: &mut Counters,
    ) -> usize {
        match self.write_group(&ctx) {
            Ok(()) => 0,
            Err(e) => {
                reporter.error(&format!("Cannot write listing: {e}"));
                1
            }
        }
    }
}
