//! Configuration loading: category overrides and file exclusion rules.
//!
//! Configuration is optional. When present it is a TOML file resolved in this
//! order: an explicit `--config` path, `.tidydesk.toml` in the working
//! directory, `~/.config/tidydesk/config.toml`, and finally built-in defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! [categories]
//! Notebooks = ["ipynb", "md"]
//!
//! [filters]
//! include_hidden = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! extensions = ["tmp", "bak"]
//! patterns = ["*.partial"]
//! regex = []
//! ```
//!
//! `[categories]` entries extend the built-in extension table: each listed
//! extension is reassigned to the named category. `[filters]` decides which
//! directory entries are eligible for organizing at all; excluded files are
//! reported as skipped and left in place.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the explicitly requested path.
    NotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    Invalid(String),
    /// Invalid glob pattern in the exclusion rules.
    InvalidGlobPattern(String),
    /// Invalid regex pattern in the exclusion rules.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading the file.
    Io(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::Io(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Category-name to extension-list overrides for the extension table.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,

    /// Rules deciding which files are eligible for organizing.
    #[serde(default)]
    pub filters: FilterRules,
}

/// File filtering rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether hidden files (names starting with ".") are organized too.
    #[serde(default)]
    pub include_hidden: bool,

    /// Rules for excluding files from organization.
    #[serde(default)]
    pub exclude: ExcludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: false,
            exclude: ExcludeRules::default(),
        }
    }
}

/// Exclusion rules; a file matching any rule stays where it is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// File extensions to exclude, matched case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl Config {
    /// Loads configuration, falling back to defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file is missing or
    /// unreadable, or if any found file fails to parse.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".tidydesk.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("tidydesk")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

impl FilterRules {
    /// Compiles the rules into matcher structures, validating every glob and
    /// regex pattern up front so a bad pattern fails the run before any file
    /// is touched.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        let exclude_patterns = self
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = self
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledFilters {
            include_hidden: self.include_hidden,
            exclude_filenames: self.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: self
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }
}

/// Pre-compiled filter structures for per-file matching.
pub struct CompiledFilters {
    include_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    /// Returns true if the file should be organized.
    ///
    /// Checks, in order: hidden-file rule, exact filename, extension, glob
    /// patterns, regex patterns. Files matching none of the rules are
    /// included.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(&*file_name) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
        {
            return false;
        }

        if self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
        {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_with_exclude(exclude: ExcludeRules) -> FilterRules {
        FilterRules {
            include_hidden: true,
            exclude,
        }
    }

    #[test]
    fn test_default_config_has_no_overrides() {
        let config = Config::default();
        assert!(config.categories.is_empty());
        assert!(!config.filters.include_hidden);
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
[categories]
Notebooks = ["ipynb"]

[filters]
include_hidden = true

[filters.exclude]
filenames = ["Thumbs.db"]
extensions = ["tmp"]
patterns = ["*.partial"]
regex = ["^scratch_"]
"#;
        let config: Config = toml::from_str(content).expect("config should parse");
        assert_eq!(config.categories["Notebooks"], vec!["ipynb".to_string()]);
        assert!(config.filters.include_hidden);
        assert_eq!(config.filters.exclude.filenames, vec!["Thumbs.db"]);
        assert_eq!(config.filters.exclude.extensions, vec!["tmp"]);
    }

    #[test]
    fn test_hidden_files_excluded_by_default() {
        let compiled = FilterRules::default().compile().unwrap();
        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(!compiled.should_include(Path::new(".gitignore")));
        assert!(compiled.should_include(Path::new("photo.jpg")));
    }

    #[test]
    fn test_hidden_files_included_when_enabled() {
        let rules = FilterRules {
            include_hidden: true,
            exclude: ExcludeRules::default(),
        };
        let compiled = rules.compile().unwrap();
        assert!(compiled.should_include(Path::new(".DS_Store")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let compiled = rules_with_exclude(ExcludeRules {
            filenames: vec!["Thumbs.db".to_string()],
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(!compiled.should_include(Path::new("Thumbs.db")));
        assert!(compiled.should_include(Path::new("image.jpg")));
    }

    #[test]
    fn test_exclude_extensions_case_insensitive() {
        let compiled = rules_with_exclude(ExcludeRules {
            extensions: vec!["bak".to_string(), "tmp".to_string()],
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(!compiled.should_include(Path::new("file.bak")));
        assert!(!compiled.should_include(Path::new("file.BAK")));
        assert!(compiled.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_glob_patterns() {
        let compiled = rules_with_exclude(ExcludeRules {
            patterns: vec!["*.partial".to_string(), "draft-?".to_string()],
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(!compiled.should_include(Path::new("download.partial")));
        assert!(!compiled.should_include(Path::new("draft-1")));
        assert!(compiled.should_include(Path::new("draft-12")));
        assert!(compiled.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_regex() {
        let compiled = rules_with_exclude(ExcludeRules {
            regex: vec![r"^scratch_.*\.txt$".to_string()],
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(!compiled.should_include(Path::new("scratch_notes.txt")));
        assert!(compiled.should_include(Path::new("notes.txt")));
    }

    #[test]
    fn test_invalid_regex_fails_compile() {
        let result = rules_with_exclude(ExcludeRules {
            regex: vec!["[invalid(".to_string()],
            ..Default::default()
        })
        .compile();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_glob_fails_compile() {
        let result = rules_with_exclude(ExcludeRules {
            patterns: vec!["[invalid".to_string()],
            ..Default::default()
        })
        .compile();
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_explicit_path_errors() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
