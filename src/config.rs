//! Configuration management.
//!
//! Two layers feed a run:
//!
//! - [`Settings`]: persistent defaults merged with figment from built-in
//!   defaults, a TOML file, then `DUPESWEEP_*` environment variables.
//! - [`RunConfig`]: the single immutable configuration of one run, built
//!   from the command line on top of the settings and validated before any
//!   file is touched.
//!
//! ```toml
//! # ~/.config/dupesweep/config.toml
//! thread = 4
//! chunk = 1048576
//! size_check = true
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;
use crate::duplicates::{CompareBy, ScanOptions};

/// Environment variable prefix for settings.
pub const ENV_PREFIX: &str = "DUPESWEEP_";

/// Invalid or unloadable configuration. Always fatal, raised before scanning.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Two disposition modes were requested at once.
    #[error("{0} and {1} options are incompatible")]
    IncompatibleModes(&'static str, &'static str),

    /// An auto-delete option was given without auto-delete.
    #[error("--{0} can only be used with --auto-delete")]
    RequiresAutoDelete(&'static str),

    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {0}")]
    MissingFile(PathBuf),

    /// The merged settings could not be read.
    #[error("invalid settings: {0}")]
    Settings(#[from] Box<figment::Error>),
}

/// Persistent defaults for scan options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hashing workers; 0 or 1 hashes on the main thread
    pub thread: usize,
    /// Bytes hashed per file; 0 hashes everything
    pub chunk: u64,
    /// Files smaller than this are ignored
    pub min_size: u64,
    /// Only fingerprint files whose size is shared with another file
    pub size_check: bool,
    /// Do not fingerprint empty files
    pub skip_empty: bool,
    /// Show the current file name in progress output
    pub progress_info: bool,
}

impl Settings {
    /// Default location of the settings file, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupesweep").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Provider chain: defaults, then the TOML file, then the environment.
    ///
    /// A missing file at the default location is skipped; an explicit
    /// `path` must exist.
    pub fn figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        match path {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                if let Some(default) = Self::default_path() {
                    figment = figment.merge(Toml::file(default));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load settings from `path` (or the default location) and the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = Self::figment(path)?.extract().map_err(Box::new)?;
        log::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }
}

/// What happens to each duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionMode {
    /// Print every group with sizes
    Report,
    /// Print bare paths only
    ListOnly,
    /// Ask which copies to delete
    Interactive,
    /// Delete by policy
    Automatic,
}

impl DispositionMode {
    /// Whether this mode can remove files.
    #[must_use]
    pub fn removes_files(self) -> bool {
        matches!(self, Self::Interactive | Self::Automatic)
    }
}

/// Everything one run needs, fixed before scanning starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Directories or files to scan
    pub sources: Vec<PathBuf>,
    /// `--interactive` was requested
    pub interactive: bool,
    /// `--list-only` was requested
    pub list_only: bool,
    /// `--auto-delete` was requested
    pub auto_delete: bool,
    /// Hashing workers
    pub threads: usize,
    /// Fingerprinting options
    pub scan: ScanOptions,
    /// Files smaller than this are ignored
    pub min_size: u64,
    /// Size-equality pre-filter
    pub size_check: bool,
    /// Show the current file name in progress output
    pub progress_info: bool,
    /// Suppress progress bars and informational output
    pub quiet: bool,
    /// Policy document for auto-delete
    pub delete_policy: Option<PathBuf>,
    /// Backup root for auto-delete
    pub backup_root: Option<PathBuf>,
    /// Report deletions without performing them
    pub dry_run: bool,
    /// Write the fingerprint map here after scanning
    pub dump_map: Option<PathBuf>,
}

impl RunConfig {
    /// Combine command-line arguments with settings and validate.
    ///
    /// Flags given on the command line win; a flag left off falls back to
    /// the settings value.
    pub fn from_cli(cli: &Cli, settings: &Settings) -> Result<Self, ConfigError> {
        let compare = if cli.check_by_name {
            CompareBy::Name
        } else {
            CompareBy::Content
        };
        let progress_info = cli.progress_info || settings.progress_info;

        let config = Self {
            sources: cli.source_paths(),
            interactive: cli.interactive,
            list_only: cli.list_only,
            auto_delete: cli.auto_delete,
            threads: cli.thread.unwrap_or(settings.thread),
            scan: ScanOptions::default()
                .with_compare(compare)
                .with_chunk(cli.chunk.unwrap_or(settings.chunk))
                .with_skip_empty(cli.skip_empty || settings.skip_empty)
                .with_show_path(progress_info),
            min_size: cli.min_size.unwrap_or(settings.min_size),
            size_check: cli.size_check || settings.size_check,
            progress_info,
            quiet: cli.quiet,
            delete_policy: cli.delete_policy.clone(),
            backup_root: cli.delete_backup.clone(),
            dry_run: cli.auto_delete_test,
            dump_map: cli.dump_map.clone(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject incompatible option combinations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interactive && self.list_only {
            return Err(ConfigError::IncompatibleModes("interactive", "list-only"));
        }
        if self.interactive && self.auto_delete {
            return Err(ConfigError::IncompatibleModes("interactive", "auto-delete"));
        }
        if self.list_only && self.auto_delete {
            return Err(ConfigError::IncompatibleModes("list-only", "auto-delete"));
        }

        if !self.auto_delete {
            if self.backup_root.is_some() {
                return Err(ConfigError::RequiresAutoDelete("delete-backup"));
            }
            if self.delete_policy.is_some() {
                return Err(ConfigError::RequiresAutoDelete("delete-policy"));
            }
            if self.dry_run {
                return Err(ConfigError::RequiresAutoDelete("auto-delete-test"));
            }
        }
        Ok(())
    }

    /// The disposition mode. Meaningful once [`Self::validate`] passed.
    #[must_use]
    pub fn mode(&self) -> DispositionMode {
        if self.auto_delete {
            DispositionMode::Automatic
        } else if self.interactive {
            DispositionMode::Interactive
        } else if self.list_only {
            DispositionMode::ListOnly
        } else {
            DispositionMode::Report
        }
    }
}
