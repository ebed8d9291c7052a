//! Directory organization: scanning, categorizing, and relocating files.
//!
//! The [`Organizer`] walks the top-level files of a target directory,
//! categorizes each by extension, and moves it into the matching category
//! subfolder, recording every successful move in the run's history log.
//! In dry-run mode it reports the destinations it would use, collision
//! suffixes included, without touching the filesystem or the history store.

use crate::category::CategoryMap;
use crate::config::CompiledFilters;
use crate::history::{HistoryError, HistoryStore};
use crate::output::Reporter;
use chrono::Local;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that abort an organization run.
#[derive(Debug)]
pub enum MoveError {
    /// The target directory could not be read.
    InvalidTargetDir { path: PathBuf, source: io::Error },
    /// A category subfolder could not be created.
    CreateCategoryDir { path: PathBuf, source: io::Error },
    /// A file relocation failed.
    Relocate {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// A successful move could not be recorded; the run stops rather than
    /// perform moves that would not be undoable.
    History(HistoryError),
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTargetDir { path, source } => {
                write!(f, "Cannot read directory {}: {}", path.display(), source)
            }
            Self::CreateCategoryDir { path, source } => {
                write!(
                    f,
                    "Failed to create category folder {}: {}",
                    path.display(),
                    source
                )
            }
            Self::Relocate { from, to, source } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::History(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for MoveError {}

impl From<HistoryError> for MoveError {
    fn from(e: HistoryError) -> Self {
        Self::History(e)
    }
}

/// Result type for organization operations.
pub type MoveResult<T> = Result<T, MoveError>;

/// What a run did (or, in dry-run mode, would have done).
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Files moved, or files that would be moved in dry-run mode.
    pub moved: usize,
    /// Files left in place by filter rules.
    pub skipped: usize,
    /// Moved-file counts per category label.
    pub by_category: HashMap<String, usize>,
}

/// Organizes one directory's files into category subfolders.
pub struct Organizer<'a> {
    target_dir: &'a Path,
    categories: &'a CategoryMap,
    filters: &'a CompiledFilters,
}

impl<'a> Organizer<'a> {
    pub fn new(
        target_dir: &'a Path,
        categories: &'a CategoryMap,
        filters: &'a CompiledFilters,
    ) -> Self {
        Self {
            target_dir,
            categories,
            filters,
        }
    }

    /// Runs the organization pass.
    ///
    /// Entries are processed strictly sequentially in file-name order, so the
    /// history log ordering matches the filesystem mutation ordering. A
    /// failed move aborts the rest of the run; every move recorded before the
    /// failure stays undoable.
    pub fn organize(
        &self,
        dry_run: bool,
        history: &HistoryStore,
        reporter: &mut Reporter,
    ) -> MoveResult<RunSummary> {
        let (files, skipped) = self.scan(reporter)?;

        let mut summary = RunSummary {
            skipped,
            ..Default::default()
        };

        if files.is_empty() {
            reporter.plain("Nothing to organize.");
            return Ok(summary);
        }

        if dry_run {
            self.preview(&files, &mut summary, reporter);
            return Ok(summary);
        }

        let mut log = history.begin_run(Local::now());
        reporter.start_progress(files.len() as u64);

        for file in &files {
            let name = file_name_lossy(file);
            let category = self.categories.categorize(&name);

            let moved = Self::move_into_category(self.target_dir, file, category)
                .and_then(|destination| {
                    log.record(file, &destination)?;
                    Ok(destination)
                });

            match moved {
                Ok(_) => {
                    reporter.success(&format!("{} -> {}/", name, category));
                    reporter.advance_progress();
                    summary.moved += 1;
                    *summary.by_category.entry(category.to_string()).or_insert(0) += 1;
                }
                Err(e) => {
                    reporter.finish_progress();
                    // Keep the move error; a sync failure here is secondary.
                    let _ = log.finish();
                    return Err(e);
                }
            }
        }

        reporter.finish_progress();
        log.finish()?;

        if log.has_records() {
            reporter.info(&format!(
                "History saved to {}. Run with --undo to revert.",
                log.path().display()
            ));
        }

        Ok(summary)
    }

    /// Moves one file into `target/category/`, creating the folder when
    /// missing and probing for a collision-free name. Returns the destination
    /// the file ended up at.
    pub fn move_into_category(
        target_dir: &Path,
        file_path: &Path,
        category: &str,
    ) -> MoveResult<PathBuf> {
        let category_dir = target_dir.join(category);
        fs::create_dir_all(&category_dir).map_err(|e| MoveError::CreateCategoryDir {
            path: category_dir.clone(),
            source: e,
        })?;

        let name = file_path.file_name().unwrap_or(OsStr::new("file"));
        let destination = unique_destination(&category_dir, name);

        fs::rename(file_path, &destination).map_err(|e| MoveError::Relocate {
            from: file_path.to_path_buf(),
            to: destination.clone(),
            source: e,
        })?;

        Ok(destination)
    }

    /// Lists eligible top-level files sorted by name, reporting every skip
    /// decision. Directories are never organized; filtered files stay put.
    fn scan(&self, reporter: &mut Reporter) -> MoveResult<(Vec<PathBuf>, usize)> {
        let entries = fs::read_dir(self.target_dir).map_err(|e| MoveError::InvalidTargetDir {
            path: self.target_dir.to_path_buf(),
            source: e,
        })?;

        let mut files = Vec::new();
        let mut skipped = 0;

        for entry in entries.flatten() {
            if let Ok(file_type) = entry.file_type()
                && file_type.is_file()
            {
                let path = entry.path();
                if self.filters.should_include(&path) {
                    files.push(path);
                } else {
                    skipped += 1;
                    reporter.warning(&format!("skipped {} (filtered)", file_name_lossy(&path)));
                }
            }
        }

        files.sort();
        Ok((files, skipped))
    }

    fn preview(&self, files: &[PathBuf], summary: &mut RunSummary, reporter: &mut Reporter) {
        for file in files {
            let name = file_name_lossy(file);
            let category = self.categorize_name(&name);
            let category_dir = self.target_dir.join(&category);
            let destination = unique_destination(&category_dir, Path::new(&name).as_os_str());

            reporter.dry_run(&format!(
                "Would move: {} -> {}/{}",
                name,
                category,
                file_name_lossy(&destination)
            ));
            summary.moved += 1;
            *summary.by_category.entry(category).or_insert(0) += 1;
        }

        reporter.plain(&format!(
            "\n{} file(s) would be moved. No files were modified.",
            files.len()
        ));
    }

    fn categorize_name(&self, name: &str) -> String {
        self.categories.categorize(name).to_string()
    }
}

fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Picks a collision-free destination inside `dir` for `file_name`.
///
/// Probes `name.ext`, then `name (1).ext`, `name (2).ext`, ... until a free
/// slot is found. Deterministic: the same directory state always yields the
/// same destination.
pub fn unique_destination(dir: &Path, file_name: &OsStr) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let extension = name.extension().map(|e| e.to_string_lossy().to_string());

    let mut n = 1u32;
    loop {
        let candidate_name = match &extension {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = dir.join(candidate_name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
