//! Extension-based file categorization.
//!
//! This module maps file extensions to broad category labels ("Images",
//! "Documents", ...) which become the names of the destination subfolders.
//! Categorization is pure: it never touches the filesystem and never fails.
//!
//! # Examples
//!
//! ```
//! use tidydesk::category::{CategoryMap, DEFAULT_CATEGORY};
//!
//! let map = CategoryMap::builtin();
//! assert_eq!(map.categorize("photo.jpg"), "Images");
//! assert_eq!(map.categorize("archive.unknownext"), DEFAULT_CATEGORY);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Category assigned to files whose extension is unknown or absent.
pub const DEFAULT_CATEGORY: &str = "Others";

/// Built-in extension table. Matching is case-insensitive on the final
/// extension.
const BUILTIN_MAPPINGS: &[(&str, &[&str])] = &[
    ("Images", &["png", "jpg", "jpeg", "gif", "bmp", "svg", "webp"]),
    (
        "Documents",
        &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "md", "odt", "rtf"],
    ),
    (
        "Code",
        &[
            "py", "ipynb", "js", "ts", "java", "go", "c", "cpp", "rb", "sh", "rs", "html", "css",
            "yaml", "yml", "json", "tf",
        ],
    ),
    ("Archives", &["zip", "tar", "gz", "tgz", "rar", "7z", "bz2"]),
    ("Media", &["mp3", "wav", "m4a", "aac", "ogg", "flac", "mp4", "mkv", "avi", "mov", "wmv"]),
];

/// Immutable extension-to-category lookup table.
///
/// Built once per invocation, optionally extended from configuration, and
/// then only read. Keeping it an explicit value (rather than a static table)
/// lets tests substitute their own mappings.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    extensions: HashMap<String, String>,
}

impl CategoryMap {
    /// Creates a map holding only the built-in mappings.
    pub fn builtin() -> Self {
        let mut map = Self {
            extensions: HashMap::new(),
        };
        for (category, extensions) in BUILTIN_MAPPINGS {
            for ext in *extensions {
                map.insert(ext, category);
            }
        }
        map
    }

    /// Creates a map from the built-ins plus per-extension overrides, as read
    /// from the `[categories]` section of a configuration file.
    ///
    /// An override entry maps a category name to the extensions it should
    /// claim; a claimed extension is removed from whatever built-in category
    /// held it before.
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> Self {
        let mut map = Self::builtin();
        for (category, extensions) in overrides {
            for ext in extensions {
                map.insert(ext, category);
            }
        }
        map
    }

    /// Adds or replaces a single extension mapping (case-insensitive).
    pub fn insert(&mut self, extension: &str, category: &str) {
        self.extensions
            .insert(extension.to_lowercase(), category.to_string());
    }

    /// Returns the category label for a file name.
    ///
    /// Matches on the final extension, case-insensitively. Files without an
    /// extension, and extensions not present in the table, map to
    /// [`DEFAULT_CATEGORY`].
    pub fn categorize(&self, file_name: &str) -> &str {
        let Some(ext) = Path::new(file_name).extension() else {
            return DEFAULT_CATEGORY;
        };
        let ext = ext.to_string_lossy().to_lowercase();
        self.extensions
            .get(&ext)
            .map(String::as_str)
            .unwrap_or(DEFAULT_CATEGORY)
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::builtin()
    }
}
