//! Registry configuration.

use std::path::PathBuf;

/// Configuration for the archive scan.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Directory scanned for `.rpf` archives.
    pub root: PathBuf,
    /// Directory names skipped during the scan. Dot-directories are
    /// always skipped.
    pub ignore_dirs: Vec<String>,
    /// Maximum scan depth below the root, unbounded when `None`.
    pub max_depth: Option<usize>,
}

impl RegistryConfig {
    /// Configuration rooted at `root` with default ignores.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            ignore_dirs: ["node_modules", "target", "vendor"]
                .map(String::from)
                .to_vec(),
            max_depth: None,
        }
    }
}
