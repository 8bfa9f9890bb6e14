//! Process-level registry mapping logical paths to loaded archives.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use rage_crypto::{KeystreamProvider, UnavailableKeystream};
use rpf_parser::{EntryKind, RpfArchive, ARCHIVE_EXTENSION};

use crate::config::RegistryConfig;
use crate::error::{Result, StorageError};
use crate::types::{
    DirectoryListing, EntryMetadata, EntryType, RegistryStats, SearchHit, TreeNode,
};

/// Registry of every archive found under a scan root.
///
/// Logical paths use forward slashes relative to the root; archives
/// nested inside another archive appear under
/// `<parent_logical_path>/<child_filename>`. After [`init`] completes
/// the registry is read-only and may be shared freely.
///
/// [`init`]: PackfileRegistry::init
pub struct PackfileRegistry {
    config: RegistryConfig,
    keystream: Arc<dyn KeystreamProvider>,
    archives: BTreeMap<String, Arc<RpfArchive>>,
    initialized: bool,
}

impl PackfileRegistry {
    /// Registry without NG key material; NG archives will be skipped
    /// during the scan with a warning.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_keystream(config, Arc::new(UnavailableKeystream))
    }

    /// Registry with an injected NG keystream provider.
    pub fn with_keystream(config: RegistryConfig, keystream: Arc<dyn KeystreamProvider>) -> Self {
        Self {
            config,
            keystream,
            archives: BTreeMap::new(),
            initialized: false,
        }
    }

    /// Scan the configured root and load every `.rpf` archive.
    ///
    /// Dot-directories and configured ignore directories are skipped.
    /// An archive that fails to parse is logged and skipped; the scan
    /// itself only fails if the root cannot be walked at all.
    pub fn init(&mut self) -> Result<()> {
        info!("scanning {:?} for package archives", self.config.root);

        let mut walker = WalkDir::new(&self.config.root).follow_links(false);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let ignore_dirs = self.config.ignore_dirs.clone();
        for dir_entry in walker
            .into_iter()
            .filter_entry(|e| keep_during_scan(e, &ignore_dirs))
        {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("scan error under {:?}: {e}", self.config.root);
                    continue;
                }
            };
            if !dir_entry.file_type().is_file() {
                continue;
            }
            let file_name = dir_entry.file_name().to_string_lossy();
            if !file_name.to_lowercase().ends_with(ARCHIVE_EXTENSION) {
                continue;
            }

            let logical = logical_path(&self.config.root, dir_entry.path());
            match RpfArchive::open(dir_entry.path(), Arc::clone(&self.keystream)) {
                Ok(archive) => self.register(logical, Arc::new(archive)),
                Err(e) => warn!("skipping unreadable archive {:?}: {e}", dir_entry.path()),
            }
        }

        self.initialized = true;
        info!("registered {} archives", self.archives.len());
        Ok(())
    }

    /// Insert an archive and, recursively, every archive nested in it.
    fn register(&mut self, logical: String, archive: Arc<RpfArchive>) {
        for child in &archive.children {
            self.register(format!("{logical}/{}", child.name), Arc::clone(child));
        }
        debug!("registered '{logical}' ({} entries)", archive.entries.len());
        self.archives.insert(logical, archive);
    }

    fn require_init(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StorageError::NotInitialized)
        }
    }

    /// Look up an archive by logical path. Either separator is
    /// accepted; an exact match is preferred, then a case-insensitive
    /// one.
    fn archive(&self, archive_path: &str) -> Result<(&str, &Arc<RpfArchive>)> {
        let normalized = archive_path.replace('\\', "/");
        let normalized = normalized.trim_matches('/');
        if let Some((key, archive)) = self.archives.get_key_value(normalized) {
            return Ok((key, archive));
        }
        let lower = normalized.to_lowercase();
        self.archives
            .iter()
            .find(|(key, _)| key.to_lowercase() == lower)
            .map(|(key, archive)| (key.as_str(), archive))
            .ok_or_else(|| StorageError::ArchiveNotFound(archive_path.to_string()))
    }

    fn entry_index(&self, archive: &RpfArchive, key: &str, inner_path: &str) -> Result<usize> {
        archive
            .find_index(inner_path)
            .ok_or_else(|| StorageError::EntryNotFound {
                archive: key.to_string(),
                path: inner_path.to_string(),
            })
    }

    /// Sorted logical paths of every registered archive.
    pub fn list_archives(&self) -> Result<Vec<String>> {
        self.require_init()?;
        Ok(self.archives.keys().cloned().collect())
    }

    /// Resolve an entry, if present.
    pub fn find_entry(&self, archive_path: &str, inner_path: &str) -> Result<Option<EntryMetadata>> {
        self.require_init()?;
        let (key, archive) = self.archive(archive_path)?;
        Ok(archive
            .find(inner_path)
            .map(|entry| EntryMetadata::from_entry(key, entry)))
    }

    /// Immediate children of a directory, split into subdirectory and
    /// file names.
    pub fn list_directory(&self, archive_path: &str, inner_path: &str) -> Result<DirectoryListing> {
        self.require_init()?;
        let (key, archive) = self.archive(archive_path)?;
        let index = self.entry_index(archive, key, inner_path)?;
        if !archive.entries[index].is_dir() {
            return Err(StorageError::InvalidPath(format!(
                "'{inner_path}' is not a directory"
            )));
        }

        let mut listing = DirectoryListing::default();
        for child in archive.children_of(index) {
            let entry = &archive.entries[child];
            if entry.is_dir() {
                listing.dirs.push(entry.name.clone());
            } else {
                listing.files.push(entry.name.clone());
            }
        }
        Ok(listing)
    }

    /// Extract a file entry's bytes, decrypted and decompressed.
    pub fn read_file(&self, archive_path: &str, inner_path: &str) -> Result<Vec<u8>> {
        self.require_init()?;
        let (key, archive) = self.archive(archive_path)?;
        let index = self.entry_index(archive, key, inner_path)?;
        Ok(archive.read_file(&archive.entries[index])?)
    }

    /// Metadata for one entry.
    pub fn file_info(&self, archive_path: &str, inner_path: &str) -> Result<EntryMetadata> {
        self.require_init()?;
        let (key, archive) = self.archive(archive_path)?;
        let index = self.entry_index(archive, key, inner_path)?;
        Ok(EntryMetadata::from_entry(key, &archive.entries[index]))
    }

    /// Match entry names across every archive.
    ///
    /// A pattern containing `*` is treated as a glob anchored at both
    /// ends; anything else matches as a case-insensitive substring.
    pub fn search(&self, pattern: &str) -> Result<Vec<SearchHit>> {
        self.require_init()?;
        let matcher = Matcher::new(pattern)?;

        let mut hits = Vec::new();
        for (key, archive) in &self.archives {
            for entry in archive.entries.iter().skip(1) {
                if matcher.matches(&entry.name_lower) {
                    hits.push(SearchHit {
                        archive: key.clone(),
                        path: entry.path.clone(),
                        kind: EntryType::from(&entry.kind),
                    });
                }
            }
        }
        debug!("search '{pattern}' matched {} entries", hits.len());
        Ok(hits)
    }

    /// Depth-limited subtree rooted at a directory (or a single file
    /// node). `max_depth` counts levels of children included.
    pub fn directory_tree(
        &self,
        archive_path: &str,
        inner_path: &str,
        max_depth: usize,
    ) -> Result<TreeNode> {
        self.require_init()?;
        let (key, archive) = self.archive(archive_path)?;
        let index = self.entry_index(archive, key, inner_path)?;
        Ok(build_tree(archive, index, max_depth))
    }

    /// Aggregate counts over all registered archives.
    pub fn stats(&self) -> Result<RegistryStats> {
        self.require_init()?;
        let mut stats = RegistryStats {
            archive_count: self.archives.len(),
            ..RegistryStats::default()
        };
        for archive in self.archives.values() {
            stats.entry_count += archive.entries.len();
            for entry in &archive.entries {
                if entry.is_file() {
                    stats.file_count += 1;
                    stats.total_payload_bytes += entry.on_disk_size().map_or(0, u64::from);
                }
            }
        }
        Ok(stats)
    }
}

fn keep_during_scan(dir_entry: &walkdir::DirEntry, ignore_dirs: &[String]) -> bool {
    if dir_entry.depth() == 0 || !dir_entry.file_type().is_dir() {
        return true;
    }
    let name = dir_entry.file_name().to_string_lossy();
    !name.starts_with('.') && !ignore_dirs.iter().any(|ignored| ignored == &*name)
}

/// Forward-slash path of `path` relative to `root`.
fn logical_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_tree(archive: &RpfArchive, index: usize, depth: usize) -> TreeNode {
    let entry = &archive.entries[index];
    let mut node = TreeNode {
        name: entry.name.clone(),
        kind: EntryType::from(&entry.kind),
        size: entry.on_disk_size().map_or(0, u64::from),
        children: Vec::new(),
    };
    if depth > 0 && matches!(entry.kind, EntryKind::Directory { .. }) {
        for child in archive.children_of(index) {
            node.children.push(build_tree(archive, child, depth - 1));
        }
    }
    node
}

enum Matcher {
    Glob(Regex),
    Substring(String),
}

impl Matcher {
    fn new(pattern: &str) -> Result<Self> {
        if pattern.contains('*') {
            let mut expression = String::from("^");
            for (i, piece) in pattern.split('*').enumerate() {
                if i > 0 {
                    expression.push_str(".*");
                }
                expression.push_str(&regex::escape(piece));
            }
            expression.push('$');
            Ok(Self::Glob(
                RegexBuilder::new(&expression).case_insensitive(true).build()?,
            ))
        } else {
            Ok(Self::Substring(pattern.to_lowercase()))
        }
    }

    fn matches(&self, name_lower: &str) -> bool {
        match self {
            Self::Glob(regex) => regex.is_match(name_lower),
            Self::Substring(needle) => name_lower.contains(needle.as_str()),
        }
    }
}
