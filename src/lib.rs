//! tidydesk - desktop cleanup with a safety net
//!
//! This library organizes the files of a single directory into category
//! subfolders by extension. Two safety nets keep it honest: a dry-run mode
//! that previews every move without touching the filesystem, and a persisted
//! per-run history log that makes every run exactly reversible with undo.

pub mod category;
pub mod cli;
pub mod config;
pub mod desktop;
pub mod history;
pub mod organizer;
pub mod output;
pub mod undo;

pub use category::{CategoryMap, DEFAULT_CATEGORY};
pub use config::{CompiledFilters, Config, ConfigError};
pub use history::{HistoryError, HistoryStore, MoveRecord};
pub use organizer::{MoveError, Organizer, RunSummary};
pub use output::Reporter;
pub use undo::{UndoEngine, UndoReport};

pub use cli::{Cli, run, run_with_history};
