//! dupesweep - duplicate file finder with policy-driven resolution
//!
//! Files are fingerprinted with BLAKE3 (optionally across a pool of worker
//! threads), grouped into duplicate sets, and each set is handed to a
//! disposition strategy: a plain report, an interactive picker, or an
//! automatic policy that decides which copies survive.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod policy;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod strategy;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::actions::{ResolveOptions, Resolver};
use crate::cli::Cli;
use crate::config::{DispositionMode, RunConfig, Settings};
use crate::duplicates::{DuplicateFinder, FinderConfig, ScanArtifact};
use crate::error::ExitCode;
use crate::policy::{PolicyDocument, PolicyEngine, EXAMPLE_POLICY};
use crate::progress::{Progress, ProgressCallback, WorkerProgress};
use crate::report::{ConsoleReporter, Reporter, Summary};
use crate::scanner::{collect_files, filter_by_min_size, keep_same_size};
use crate::strategy::{
    run_strategy, AutoStrategy, DispositionStrategy, InteractiveStrategy, ListStrategy,
};

/// Warning shown when the size pre-filter leaves nothing to hash.
pub const NO_SAME_SIZE: &str = "Files with the same file size not found. No duplications.";

/// Run the command line application.
///
/// Fatal errors (bad options, unreadable policy) are returned before any
/// file is modified. Recovered file-level failures turn the exit code into
/// [`ExitCode::PartialSuccess`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    if cli.delete_policy_example {
        println!("{}", EXAMPLE_POLICY.trim_end());
        return Ok(ExitCode::Success);
    }

    let settings = Settings::load(cli.config.as_deref()).context("cannot load settings")?;
    let config = RunConfig::from_cli(&cli, &settings).context("invalid options")?;
    let reporter = ConsoleReporter::new(!cli.no_color, cli.quiet);

    let mut strategy = build_strategy(&config)?;
    execute(&config, strategy.as_mut(), &reporter)
}

/// Strategy for the configured mode.
///
/// Loads and compiles the policy document for automatic mode, so a bad
/// policy fails here, before anything is scanned.
pub fn build_strategy(config: &RunConfig) -> anyhow::Result<Box<dyn DispositionStrategy>> {
    let strategy: Box<dyn DispositionStrategy> = match config.mode() {
        DispositionMode::Report => Box::new(ListStrategy::stdout(true)),
        DispositionMode::ListOnly => Box::new(ListStrategy::stdout(false)),
        DispositionMode::Interactive => Box::new(InteractiveStrategy::terminal()),
        DispositionMode::Automatic => {
            let document = match &config.delete_policy {
                Some(path) => PolicyDocument::load(path).with_context(|| {
                    format!("cannot load delete policy {}", path.display())
                })?,
                None => PolicyDocument::default(),
            };
            let options = ResolveOptions {
                backup_root: config.backup_root.clone(),
                dry_run: config.dry_run,
            };
            Box::new(AutoStrategy::new(
                PolicyEngine::new(document),
                Resolver::new(options),
            ))
        }
    };
    Ok(strategy)
}

/// Scan, group and dispose of duplicates with `strategy`.
///
/// Progress is drawn with indicatif unless the run is quiet.
pub fn execute(
    config: &RunConfig,
    strategy: &mut dyn DispositionStrategy,
    reporter: &dyn Reporter,
) -> anyhow::Result<ExitCode> {
    let progress = Arc::new(Progress::new(config.quiet));
    execute_with_progress(config, strategy, reporter, progress.clone(), progress)
}

/// [`execute`] with explicit progress sinks.
///
/// `phase` receives single-threaded hashing progress, `workers` the
/// per-worker status stream of a pooled run.
pub fn execute_with_progress(
    config: &RunConfig,
    strategy: &mut dyn DispositionStrategy,
    reporter: &dyn Reporter,
    phase: Arc<dyn ProgressCallback>,
    workers: Arc<dyn WorkerProgress>,
) -> anyhow::Result<ExitCode> {
    let mut failures = 0usize;

    let (files, walk_errors) = collect_files(&config.sources);
    for err in &walk_errors {
        reporter.warning(&err.to_string());
    }
    failures += walk_errors.len();
    log::info!("Collected {} files", files.len());

    let mut files = filter_by_min_size(files, config.min_size);
    if config.size_check {
        let (same_size, stat_errors) = keep_same_size(files);
        for err in &stat_errors {
            reporter.error(&err.to_string());
        }
        failures += stat_errors.len();

        files = same_size;
        if files.is_empty() {
            reporter.warning(NO_SAME_SIZE);
            return Ok(finish(ExitCode::NoDuplicates, failures));
        }
    }

    let finder_config = FinderConfig::default()
        .with_threads(config.threads)
        .with_options(config.scan.clone())
        .with_progress_callback(phase)
        .with_worker_progress(workers);

    let outcome = DuplicateFinder::new(finder_config).find(&files);
    for err in &outcome.errors {
        reporter.error(&err.to_string());
    }
    for err in &outcome.worker_errors {
        reporter.error(&err.to_string());
    }
    failures += outcome.errors.len() + outcome.worker_errors.len();
    if outcome.skipped_empty > 0 {
        log::info!("Skipped {} empty files", outcome.skipped_empty);
    }

    if let Some(path) = &config.dump_map {
        if let Err(e) = dump_map(&outcome.artifact, path) {
            reporter.error(&format!("{e:#}"));
            failures += 1;
        }
    }

    let groups = outcome.groups();
    if groups.is_empty() {
        reporter.info("No duplicates found.");
        return Ok(finish(ExitCode::NoDuplicates, failures));
    }

    let totals = run_strategy(strategy, &groups, reporter);
    failures += totals.failures;
    Summary::new(&totals.counters, config.dry_run)
        .with_removals(config.mode().removes_files())
        .report_to(reporter);

    Ok(finish(ExitCode::Success, failures))
}

fn dump_map(artifact: &ScanArtifact, path: &Path) -> anyhow::Result<()> {
    let json = artifact
        .to_json()
        .context("cannot serialize fingerprint map")?;
    fs::write(path, json)
        .with_context(|| format!("cannot write fingerprint map to {}", path.display()))?;
    log::info!("Fingerprint map written to {}", path.display());
    Ok(())
}

fn finish(code: ExitCode, failures: usize) -> ExitCode {
    if failures > 0 {
        log::warn!("{} recovered failures during the run", failures);
        ExitCode::PartialSuccess
    } else {
        code
    }
}
