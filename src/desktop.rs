//! Desktop folder autodetection.
//!
//! When no target directory is given on the command line, the user's real
//! desktop is located by probing the usual candidates: `~/Desktop`, a few
//! localized names, and under WSL the Windows user profiles mounted at
//! `/mnt/c/Users`. System profiles ("All Users", "Public", ...) are skipped,
//! and among the remaining candidates the one holding the most files wins.

use std::fs;
use std::path::{Path, PathBuf};

/// Localized desktop folder names probed under `$HOME`.
const LOCALIZED_NAMES: &[&str] = &["Desktop", "desktop", "Escritorio", "Bureau", "Schreibtisch"];

/// Windows profile names that are never a user's desktop.
const BLOCKED_PROFILES: &[&str] = &["All Users", "Default", "Default User", "Public"];

/// Errors raised while locating the desktop.
#[derive(Debug)]
pub enum DesktopError {
    /// An explicitly given path does not exist.
    Missing(PathBuf),
    /// An explicitly given path is not a directory.
    NotADirectory(PathBuf),
    /// No desktop candidate could be found automatically.
    NotFound,
}

impl std::fmt::Display for DesktopError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(path) => write!(f, "Path does not exist: {}", path.display()),
            Self::NotADirectory(path) => write!(f, "Not a directory: {}", path.display()),
            Self::NotFound => write!(
                f,
                "Could not find your desktop automatically; pass the directory explicitly"
            ),
        }
    }
}

impl std::error::Error for DesktopError {}

/// Resolves the directory to organize.
///
/// An explicit override is validated and returned as-is; otherwise the
/// desktop is autodetected.
pub fn find_desktop(override_path: Option<&Path>) -> Result<PathBuf, DesktopError> {
    if let Some(path) = override_path {
        if !path.exists() {
            return Err(DesktopError::Missing(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(DesktopError::NotADirectory(path.to_path_buf()));
        }
        return Ok(path.to_path_buf());
    }

    let mut candidates: Vec<(usize, PathBuf)> = candidate_desktops()
        .into_iter()
        .filter(|c| !is_blocked(c))
        .filter(|c| c.is_dir())
        .filter_map(|c| file_count(&c).map(|n| (n, c)))
        .collect();

    // The busiest candidate is assumed to be the real desktop.
    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    candidates
        .into_iter()
        .next()
        .map(|(_, path)| path)
        .ok_or(DesktopError::NotFound)
}

fn candidate_desktops() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(home) = std::env::var("HOME") {
        let home = PathBuf::from(home);
        for name in LOCALIZED_NAMES {
            candidates.push(home.join(name));
        }
    }

    if is_wsl() {
        let users_root = Path::new("/mnt/c/Users");
        if let Ok(entries) = fs::read_dir(users_root) {
            for entry in entries.flatten() {
                let candidate = entry.path().join("Desktop");
                if candidate.is_dir() {
                    candidates.push(candidate);
                }
            }
        }
    }

    candidates
}

fn is_blocked(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    BLOCKED_PROFILES
        .iter()
        .any(|blocked| path_str.contains(&blocked.to_lowercase()))
}

fn file_count(dir: &Path) -> Option<usize> {
    let entries = fs::read_dir(dir).ok()?;
    Some(
        entries
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .count(),
    )
}

fn is_wsl() -> bool {
    if std::env::var_os("WSL_DISTRO_NAME").is_some() {
        return true;
    }
    fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|release| release.to_lowercase().contains("microsoft"))
        .unwrap_or(false)
}
