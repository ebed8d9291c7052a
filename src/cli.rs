//! Command-line interface and run orchestration.
//!
//! Wires the pieces together for one invocation: resolve the target
//! directory, load configuration, then either organize (optionally as a
//! dry run) or hand over to the undo engine.

use crate::category::CategoryMap;
use crate::config::Config;
use crate::desktop;
use crate::history::HistoryStore;
use crate::organizer::Organizer;
use crate::output::Reporter;
use crate::undo::{UndoEngine, UndoReport};
use clap::Parser;
use std::path::PathBuf;

/// Tidy a desktop (or any directory) into category folders.
#[derive(Parser, Debug)]
#[command(name = "tidydesk", version)]
#[command(about = "Organize a directory into category folders, with dry-run preview and undo")]
pub struct Cli {
    /// Directory to organize (defaults to the detected desktop folder)
    pub directory: Option<PathBuf>,

    /// Preview the moves without touching the filesystem or the history
    #[arg(long)]
    pub dry_run: bool,

    /// Revert the most recent run using its history log
    #[arg(long)]
    pub undo: bool,

    /// Undo a specific history log instead of the most recent one
    #[arg(long, value_name = "FILE", requires = "undo")]
    pub log: Option<PathBuf>,

    /// Path to a configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Runs one invocation against the default per-user history store.
pub fn run(cli: &Cli, reporter: &mut Reporter) -> Result<(), String> {
    let history = HistoryStore::open_default().map_err(|e| e.to_string())?;
    run_with_history(cli, &history, reporter)
}

/// Runs one invocation against an explicit history store.
///
/// Split out from [`run`] so tests can point the history at a temporary
/// directory. A partial-failure undo (some records missing or conflicting)
/// still returns `Ok`; only a missing history or a fatal move error is an
/// `Err`.
pub fn run_with_history(
    cli: &Cli,
    history: &HistoryStore,
    reporter: &mut Reporter,
) -> Result<(), String> {
    if cli.undo {
        return undo(cli, history, reporter);
    }

    let target = desktop::find_desktop(cli.directory.as_deref()).map_err(|e| e.to_string())?;
    let config = Config::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    let categories = CategoryMap::with_overrides(&config.categories);
    let filters = config.filters.compile().map_err(|e| e.to_string())?;

    if cli.dry_run {
        reporter.info(&format!("Dry run over {} (no changes)", target.display()));
    } else {
        reporter.info(&format!("Organizing {}", target.display()));
    }

    let organizer = Organizer::new(&target, &categories, &filters);
    let summary = organizer
        .organize(cli.dry_run, history, reporter)
        .map_err(|e| e.to_string())?;

    if summary.moved > 0 {
        reporter.summary_table(&summary.by_category, summary.moved);
    }

    Ok(())
}

fn undo(cli: &Cli, history: &HistoryStore, reporter: &mut Reporter) -> Result<(), String> {
    let engine = UndoEngine::new(history);
    let report = match &cli.log {
        Some(path) => engine.undo_log(path, reporter),
        None => engine.undo_latest(reporter),
    }
    .map_err(|e| e.to_string())?;

    print_undo_summary(&report, reporter);
    Ok(())
}

fn print_undo_summary(report: &UndoReport, reporter: &mut Reporter) {
    reporter.header("UNDO SUMMARY");
    reporter.plain(&format!("  restored: {}", report.restored.len()));
    reporter.plain(&format!("  missing:  {}", report.missing.len()));
    reporter.plain(&format!("  conflict: {}", report.conflicts.len()));
    if !report.failed.is_empty() {
        reporter.plain(&format!("  failed:   {}", report.failed.len()));
    }
    if report.is_complete_success() {
        reporter.success("Undo complete");
    } else {
        reporter.warning("Undo finished with skipped records; see lines above");
    }
}
