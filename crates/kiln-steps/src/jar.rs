use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Selects jar entries to drop while packaging.
///
/// Patterns are matched as substrings of the entry path, which covers the
/// common "remove these generated classes" cases without pulling a regex
/// engine into the planning core.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePatterns(Vec<String>);

impl RemovePatterns {
    pub fn new(patterns: Vec<String>) -> Self {
        Self(patterns)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, entry: &str) -> bool {
        self.0.iter().any(|pattern| entry.contains(pattern.as_str()))
    }
}

/// Parameters for packaging a directory tree into a jar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JarParameters {
    pub jar_path: PathBuf,
    /// Ordered directory/file entries to include.
    pub entries: Vec<PathBuf>,
    pub main_class: Option<String>,
    pub manifest_file: Option<PathBuf>,
    pub remove_entries: RemovePatterns,
    pub merge_manifests: bool,
}

impl JarParameters {
    pub fn new(jar_path: impl Into<PathBuf>, entries: Vec<PathBuf>) -> Self {
        Self {
            jar_path: jar_path.into(),
            entries,
            main_class: None,
            manifest_file: None,
            remove_entries: RemovePatterns::default(),
            merge_manifests: true,
        }
    }
}
