//! Undo: replays a history log backwards, restoring original locations.
//!
//! Records are processed in strict reverse chronological order, so collision
//! suffixes handed out during the original run unwind correctly: the file
//! that took a slot last gives it back first. Per-record failures (missing
//! destination, occupied original slot, io errors) are collected into the
//! report and never abort the batch.

use crate::history::{HistoryResult, HistoryStore, MoveRecord};
use crate::output::Reporter;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-record outcomes of one undo pass.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Original paths the files were restored to.
    pub restored: Vec<PathBuf>,
    /// Destination paths that no longer existed.
    pub missing: Vec<PathBuf>,
    /// Original paths now occupied by an unrelated file; the moved file was
    /// left at its destination.
    pub conflicts: Vec<PathBuf>,
    /// Records whose restore failed with an io error, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// Returns the total number of records processed.
    pub fn total_processed(&self) -> usize {
        self.restored.len() + self.missing.len() + self.conflicts.len() + self.failed.len()
    }

    /// Returns true if every record was restored.
    pub fn is_complete_success(&self) -> bool {
        self.missing.is_empty() && self.conflicts.is_empty() && self.failed.is_empty()
    }
}

/// Reverses the moves recorded in a history log.
pub struct UndoEngine<'a> {
    history: &'a HistoryStore,
}

impl<'a> UndoEngine<'a> {
    pub fn new(history: &'a HistoryStore) -> Self {
        Self { history }
    }

    /// Undoes the most recent unconsumed run.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NoHistory`](crate::history::HistoryError) when
    /// no unconsumed log exists; per-record restore problems are reported in
    /// the returned [`UndoReport`] instead of failing the call.
    pub fn undo_latest(&self, reporter: &mut Reporter) -> HistoryResult<UndoReport> {
        let log_path = self.history.latest_log()?;
        self.undo_log(&log_path, reporter)
    }

    /// Undoes a specific history log.
    ///
    /// The log is marked consumed after processing, whatever the per-record
    /// outcomes, so the same moves are never replayed twice.
    pub fn undo_log(&self, log_path: &Path, reporter: &mut Reporter) -> HistoryResult<UndoReport> {
        let records = self.history.read_log(log_path)?;
        reporter.info(&format!("Undoing moves from {}", log_path.display()));

        let mut report = UndoReport::default();
        for record in records.iter().rev() {
            Self::restore(record, &mut report, reporter);
        }

        Self::prune_category_dirs(&records);
        self.history.mark_consumed(log_path)?;

        Ok(report)
    }

    fn restore(record: &MoveRecord, report: &mut UndoReport, reporter: &mut Reporter) {
        let original = &record.original_path;
        let destination = &record.destination_path;

        if !destination.exists() {
            reporter.warning(&format!(
                "missing: {} is gone, cannot restore {}",
                destination.display(),
                original.display()
            ));
            report.missing.push(destination.clone());
            return;
        }

        if original.exists() {
            reporter.warning(&format!(
                "conflict: {} is occupied, leaving {} in place",
                original.display(),
                destination.display()
            ));
            report.conflicts.push(original.clone());
            return;
        }

        let moved_back = Self::ensure_parent(original)
            .and_then(|_| fs::rename(destination, original));

        match moved_back {
            Ok(()) => {
                reporter.success(&format!("restored {}", original.display()));
                report.restored.push(original.clone());
            }
            Err(e) => {
                reporter.error(&format!(
                    "failed to restore {}: {}",
                    destination.display(),
                    e
                ));
                report.failed.push((destination.clone(), e.to_string()));
            }
        }
    }

    fn ensure_parent(path: &Path) -> std::io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.exists() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }

    /// Removes category folders the undo emptied out, restoring the original
    /// directory structure. Folders still holding files are kept.
    fn prune_category_dirs(records: &[MoveRecord]) {
        let dirs: BTreeSet<&Path> = records
            .iter()
            .filter_map(|r| r.destination_path.parent())
            .collect();
        for dir in dirs {
            // Fails (and is ignored) when the folder is not empty.
            let _ = fs::remove_dir(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryMap;
    use crate::config::FilterRules;
    use crate::history::HistoryError;
    use crate::organizer::Organizer;
    use chrono::{Local, Utc};
    use tempfile::TempDir;

    struct UndoFixture {
        target: TempDir,
        _history_dir: TempDir,
        history: HistoryStore,
    }

    impl UndoFixture {
        fn new() -> Self {
            let target = TempDir::new().expect("Failed to create temp directory");
            let history_dir = TempDir::new().expect("Failed to create temp directory");
            let history = HistoryStore::new(history_dir.path().to_path_buf());
            Self {
                target,
                _history_dir: history_dir,
                history,
            }
        }

        fn path(&self) -> &Path {
            self.target.path()
        }

        fn write_file(&self, name: &str) -> PathBuf {
            let path = self.path().join(name);
            fs::write(&path, name.as_bytes()).expect("Failed to write test file");
            path
        }

        /// Runs a full (non-dry-run) organization over the target.
        fn organize(&self) {
            let categories = CategoryMap::builtin();
            let filters = FilterRules::default().compile().unwrap();
            let organizer = Organizer::new(self.path(), &categories, &filters);
            let mut reporter = Reporter::captured();
            organizer
                .organize(false, &self.history, &mut reporter)
                .expect("organize should succeed");
        }

        fn undo(&self) -> HistoryResult<UndoReport> {
            let engine = UndoEngine::new(&self.history);
            let mut reporter = Reporter::captured();
            engine.undo_latest(&mut reporter)
        }
    }

    #[test]
    fn test_undo_without_history_fails() {
        let fixture = UndoFixture::new();
        assert!(matches!(fixture.undo(), Err(HistoryError::NoHistory)));
    }

    #[test]
    fn test_round_trip_restores_everything() {
        let fixture = UndoFixture::new();
        fixture.write_file("photo.jpg");
        fixture.write_file("notes.txt");
        fixture.write_file("script.py");
        fixture.write_file("archive.unknownext");

        fixture.organize();
        assert!(fixture.path().join("Images").join("photo.jpg").exists());
        assert!(fixture.path().join("Documents").join("notes.txt").exists());
        assert!(fixture.path().join("Code").join("script.py").exists());
        assert!(fixture.path().join("Others").join("archive.unknownext").exists());

        let report = fixture.undo().expect("undo should succeed");
        assert_eq!(report.restored.len(), 4);
        assert!(report.is_complete_success());

        for name in ["photo.jpg", "notes.txt", "script.py", "archive.unknownext"] {
            assert!(fixture.path().join(name).exists(), "{} should be back", name);
        }
        // Category folders created by the run are gone again.
        for dir in ["Images", "Documents", "Code", "Others"] {
            assert!(!fixture.path().join(dir).exists(), "{} should be pruned", dir);
        }
    }

    #[test]
    fn test_undo_reports_missing_file_and_continues() {
        let fixture = UndoFixture::new();
        fixture.write_file("photo.jpg");
        fixture.write_file("notes.txt");
        fixture.write_file("script.py");
        fixture.write_file("archive.unknownext");
        fixture.organize();

        fs::remove_file(fixture.path().join("Documents").join("notes.txt")).unwrap();

        let report = fixture.undo().expect("undo should succeed");
        assert_eq!(report.restored.len(), 3);
        assert_eq!(report.missing.len(), 1);
        assert!(report.conflicts.is_empty());
        assert!(fixture.path().join("photo.jpg").exists());
        assert!(!fixture.path().join("notes.txt").exists());
    }

    #[test]
    fn test_undo_reports_conflict_and_leaves_file() {
        let fixture = UndoFixture::new();
        fixture.write_file("notes.txt");
        fixture.organize();

        // An unrelated file reclaims the original slot.
        fs::write(fixture.path().join("notes.txt"), b"unrelated").unwrap();

        let report = fixture.undo().expect("undo should succeed");
        assert_eq!(report.restored.len(), 0);
        assert_eq!(report.conflicts.len(), 1);

        // The moved file stays at its destination, the unrelated one is untouched.
        assert!(fixture.path().join("Documents").join("notes.txt").exists());
        let kept = fs::read(fixture.path().join("notes.txt")).unwrap();
        assert_eq!(kept, b"unrelated");
    }

    #[test]
    fn test_undo_processes_records_in_reverse_order() {
        // A chained history: a -> b, then b -> c. Only reverse replay can
        // unwind it; forward replay finds b missing for the first record.
        let fixture = UndoFixture::new();
        let a = fixture.path().join("a.txt");
        let b = fixture.path().join("staging").join("a.txt");
        let c = fixture.path().join("Archives").join("a.txt");

        fs::create_dir_all(c.parent().unwrap()).unwrap();
        fs::write(&c, b"chained").unwrap();

        let mut log = fixture.history.begin_run(Local::now());
        log.record(&a, &b).unwrap();
        log.record(&b, &c).unwrap();
        log.finish().unwrap();

        let report = fixture.undo().expect("undo should succeed");
        assert_eq!(report.restored.len(), 2);
        assert!(report.is_complete_success());
        assert!(a.exists());
        assert!(!b.exists());
        assert!(!c.exists());
    }

    #[test]
    fn test_forward_replay_would_lose_a_record() {
        // Same chained history as above, replayed oldest-first by hand to
        // show why the engine must not do that.
        let fixture = UndoFixture::new();
        let a = fixture.path().join("a.txt");
        let b = fixture.path().join("staging").join("a.txt");
        let c = fixture.path().join("Archives").join("a.txt");

        fs::create_dir_all(c.parent().unwrap()).unwrap();
        fs::write(&c, b"chained").unwrap();

        let records = vec![
            MoveRecord {
                original_path: a.clone(),
                destination_path: b.clone(),
                timestamp: Utc::now(),
            },
            MoveRecord {
                original_path: b.clone(),
                destination_path: c.clone(),
                timestamp: Utc::now(),
            },
        ];

        let mut report = UndoReport::default();
        let mut reporter = Reporter::captured();
        for record in records.iter() {
            UndoEngine::restore(record, &mut report, &mut reporter);
        }

        // Forward order: record a->b finds b missing, so only one restore
        // lands and the file never reaches its true origin.
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.restored.len(), 1);
        assert!(!a.exists());
    }

    #[test]
    fn test_undo_consumes_log_even_on_partial_failure() {
        let fixture = UndoFixture::new();
        fixture.write_file("notes.txt");
        fixture.organize();
        fs::remove_file(fixture.path().join("Documents").join("notes.txt")).unwrap();

        let report = fixture.undo().expect("undo should succeed");
        assert_eq!(report.missing.len(), 1);

        // The log was consumed; there is nothing left to undo.
        assert!(matches!(fixture.undo(), Err(HistoryError::NoHistory)));
    }

    #[test]
    fn test_second_undo_targets_previous_run() {
        let fixture = UndoFixture::new();
        fixture.write_file("first.txt");
        fixture.organize();

        fixture.write_file("second.txt");
        fixture.organize();

        // First undo reverts the most recent run only.
        let report = fixture.undo().expect("undo should succeed");
        assert_eq!(report.restored, vec![fixture.path().join("second.txt")]);

        // Second undo walks back to the run before it.
        let report = fixture.undo().expect("undo should succeed");
        assert_eq!(report.restored, vec![fixture.path().join("first.txt")]);

        assert!(matches!(fixture.undo(), Err(HistoryError::NoHistory)));
    }

    #[test]
    fn test_undo_restores_collision_suffixed_names() {
        let fixture = UndoFixture::new();

        // Pre-existing Documents/a.txt forces the run to hand out "a (1).txt".
        fs::create_dir(fixture.path().join("Documents")).unwrap();
        fs::write(fixture.path().join("Documents").join("a.txt"), b"old").unwrap();
        fs::write(fixture.path().join("a.txt"), b"new").unwrap();

        fixture.organize();
        assert!(fixture.path().join("Documents").join("a (1).txt").exists());

        let report = fixture.undo().expect("undo should succeed");
        assert_eq!(report.restored.len(), 1);

        // The original name comes back, the pre-existing file keeps its slot.
        assert_eq!(fs::read(fixture.path().join("a.txt")).unwrap(), b"new");
        assert_eq!(
            fs::read(fixture.path().join("Documents").join("a.txt")).unwrap(),
            b"old"
        );
        assert!(!fixture.path().join("Documents").join("a (1).txt").exists());
    }
}
