//! Command-line interface definitions for dupesweep.
//!
//! All options live on a single command; the positional arguments are the
//! sources to scan. Mode flags are not made mutually exclusive here: their
//! combinations are checked by [`crate::config::RunConfig::validate`] so a
//! bad combination exits with the configuration error code.
//!
//! # Example
//!
//! ```bash
//! # List duplicates under two directories, with sizes
//! dupesweep ~/Pictures /mnt/backup/Pictures
//!
//! # Hash with four workers, only files of at least 1 MiB
//! dupesweep -t 4 -m 1MiB ~/Downloads
//!
//! # Delete by policy, copying every removed file to /backup first
//! dupesweep -d -D policy.json -b /backup ~/Downloads
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Find duplicate files and decide which copies survive.
///
/// Files are grouped by BLAKE3 content fingerprint (or by file name with
/// `--check-by-name`). Each group is then listed, offered for interactive
/// selection, or resolved automatically by a JSON policy.
#[derive(Debug, Parser)]
#[command(name = "dupesweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories or files to scan (default: current directory)
    #[arg(value_name = "SOURCE")]
    pub sources: Vec<PathBuf>,

    /// Choose interactively which copies of each group to delete
    #[arg(short, long)]
    pub interactive: bool,

    /// Print only the paths of duplicated files, without sizes
    #[arg(short, long)]
    pub list_only: bool,

    /// Delete duplicates automatically, keeping one copy per group
    #[arg(short = 'd', long)]
    pub auto_delete: bool,

    /// Do not fingerprint empty files
    #[arg(short, long)]
    pub skip_empty: bool,

    /// Group files by file name instead of content
    #[arg(short = 'N', long)]
    pub check_by_name: bool,

    /// Show the file being hashed in the progress bar
    #[arg(short, long)]
    pub progress_info: bool,

    /// Number of hashing workers (0 or 1 hashes on the main thread)
    #[arg(short, long, value_name = "N")]
    pub thread: Option<usize>,

    /// Only fingerprint files whose size is shared with another file
    #[arg(short = 'S', long = "size")]
    pub size_check: bool,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(short, long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Hash only the first SIZE bytes of each file (0 hashes everything)
    #[arg(short, long, value_name = "SIZE", value_parser = parse_size)]
    pub chunk: Option<u64>,

    /// Copy each deleted file under this directory first (auto-delete only)
    #[arg(short = 'b', long, value_name = "DIR")]
    pub delete_backup: Option<PathBuf>,

    /// JSON policy deciding which copies to keep (auto-delete only)
    #[arg(short = 'D', long, value_name = "FILE")]
    pub delete_policy: Option<PathBuf>,

    /// Print an example delete policy and exit
    #[arg(short = 'E', long)]
    pub delete_policy_example: bool,

    /// Report what auto-delete would do without deleting (auto-delete only)
    #[arg(short = 'T', long)]
    pub auto_delete_test: bool,

    /// Write the fingerprint map as JSON after scanning
    #[arg(long, value_name = "FILE")]
    pub dump_map: Option<PathBuf>,

    /// Configuration file (default: platform config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

impl Cli {
    /// Sources to scan, defaulting to the current directory.
    #[must_use]
    pub fn source_paths(&self) -> Vec<PathBuf> {
        if self.sources.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.sources.clone()
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupesweep::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    // Find where the number ends and the suffix begins
    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    if num < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
