//! Persisted move history: one log file per run, used exclusively by undo.
//!
//! Logs live under a per-user directory (`~/.tidydesk/history` by default,
//! any directory in tests), are named after the run's start timestamp, and
//! contain one JSON-encoded [`MoveRecord`] per line so they stay readable
//! with a pager. A log is written lazily: dry runs and runs that move nothing
//! leave no file behind. Once undone, a log is renamed with an `.undone`
//! suffix so it can never drive a second undo.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One completed relocation, exactly reversible.
///
/// Created by the recorder immediately after a successful move and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Where the file lived before the move.
    pub original_path: PathBuf,
    /// Where the move put it.
    pub destination_path: PathBuf,
    /// When the move was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Errors raised by the history subsystem.
#[derive(Debug)]
pub enum HistoryError {
    /// Undo was requested but no unconsumed history log exists.
    NoHistory,
    /// The HOME directory could not be determined.
    MissingHome,
    /// An IO operation on a history file failed.
    Io { path: PathBuf, source: io::Error },
    /// A history file contained a line that is not a valid record.
    InvalidFormat { path: PathBuf, reason: String },
}

impl std::fmt::Display for HistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoHistory => write!(f, "No history log found, nothing to undo"),
            Self::MissingHome => {
                write!(f, "Cannot locate the history directory: HOME is not set")
            }
            Self::Io { path, source } => {
                write!(f, "History IO error on {}: {}", path.display(), source)
            }
            Self::InvalidFormat { path, reason } => {
                write!(f, "Invalid history log {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for HistoryError {}

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Suffix given to consumed logs.
const CONSUMED_SUFFIX: &str = "log.undone";

/// Handle on the per-user history directory.
///
/// The directory is a plain value so tests can point it at a temp dir instead
/// of the real `$HOME`.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    /// Creates a store rooted at an arbitrary directory.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Creates a store rooted at the default per-user location,
    /// `$HOME/.tidydesk/history`.
    pub fn open_default() -> HistoryResult<Self> {
        let home = std::env::var("HOME").map_err(|_| HistoryError::MissingHome)?;
        Ok(Self::new(
            PathBuf::from(home).join(".tidydesk").join("history"),
        ))
    }

    /// Returns the directory holding the log files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Starts a new run log named after the run's start time.
    ///
    /// Nothing is created on disk until the first record is appended.
    pub fn begin_run(&self, started_at: DateTime<Local>) -> RunLog {
        let name = format!("run-{}.log", started_at.format("%Y%m%d-%H%M%S%.3f"));
        RunLog {
            dir: self.dir.clone(),
            path: self.dir.join(name),
            file: None,
        }
    }

    /// Returns the path of the most recent unconsumed log.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NoHistory`] if the directory holds no
    /// unconsumed logs.
    pub fn latest_log(&self) -> HistoryResult<PathBuf> {
        let pattern = self.dir.join("run-*.log");
        let matches = glob::glob(&pattern.to_string_lossy())
            .map_err(|e| HistoryError::InvalidFormat {
                path: self.dir.clone(),
                reason: e.to_string(),
            })?
            .flatten();

        // Newest by modification time; the timestamped name breaks ties.
        let mut logs: Vec<(std::time::SystemTime, PathBuf)> = matches
            .filter_map(|path| {
                let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((modified, path))
            })
            .collect();
        logs.sort();

        logs.pop().map(|(_, path)| path).ok_or(HistoryError::NoHistory)
    }

    /// Reads every record of a log, in the order the moves were performed.
    pub fn read_log(&self, path: &Path) -> HistoryResult<Vec<MoveRecord>> {
        let content = fs::read_to_string(path).map_err(|e| HistoryError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| HistoryError::InvalidFormat {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Marks a log consumed by renaming it with an `.undone` suffix, so it is
    /// never picked up by [`Self::latest_log`] again.
    pub fn mark_consumed(&self, path: &Path) -> HistoryResult<()> {
        let consumed = path.with_extension(CONSUMED_SUFFIX);
        fs::rename(path, &consumed).map_err(|e| HistoryError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Append-only writer for one run's history log.
pub struct RunLog {
    dir: PathBuf,
    path: PathBuf,
    file: Option<File>,
}

impl RunLog {
    /// The path this log is (or will be) written to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true once at least one record has been written.
    pub fn has_records(&self) -> bool {
        self.file.is_some()
    }

    /// Appends a record for a completed move and flushes it, so everything
    /// written so far survives an interruption of the rest of the run.
    pub fn record(&mut self, original: &Path, destination: &Path) -> HistoryResult<MoveRecord> {
        let record = MoveRecord {
            original_path: original.to_path_buf(),
            destination_path: destination.to_path_buf(),
            timestamp: Utc::now(),
        };

        let line = serde_json::to_string(&record).map_err(|e| HistoryError::InvalidFormat {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let (path, file) = self.open_file()?;
        writeln!(file, "{}", line).map_err(|e| HistoryError::Io {
            path: path.clone(),
            source: e,
        })?;
        file.flush().map_err(|e| HistoryError::Io { path, source: e })?;

        Ok(record)
    }

    /// Syncs the log to disk. Call once the run completes (or aborts).
    pub fn finish(&mut self) -> HistoryResult<()> {
        if let Some(file) = &self.file {
            file.sync_all().map_err(|e| HistoryError::Io {
                path: self.path.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    fn open_file(&mut self) -> HistoryResult<(PathBuf, &mut File)> {
        if self.file.is_none() {
            fs::create_dir_all(&self.dir).map_err(|e| HistoryError::Io {
                path: self.dir.clone(),
                source: e,
            })?;

            // Two runs starting in the same millisecond get distinct files.
            let base = self.path.clone();
            let mut attempt = 0u32;
            loop {
                let candidate = if attempt == 0 {
                    base.clone()
                } else {
                    base.with_extension(format!("{}.log", attempt))
                };
                match OpenOptions::new().create_new(true).append(true).open(&candidate) {
                    Ok(file) => {
                        self.path = candidate;
                        self.file = Some(file);
                        break;
                    }
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                        attempt += 1;
                    }
                    Err(e) => {
                        return Err(HistoryError::Io {
                            path: candidate,
                            source: e,
                        });
                    }
                }
            }
        }

        let path = self.path.clone();
        match self.file.as_mut() {
            Some(file) => Ok((path, file)),
            None => Err(HistoryError::Io {
                path,
                source: io::Error::other("history log is not open"),
            }),
        }
    }
}
