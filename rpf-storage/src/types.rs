//! Value types returned by registry operations.

use rpf_parser::{Entry, EntryKind};

/// Entry classification exposed to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Directory,
    Binary,
    Resource,
}

impl From<&EntryKind> for EntryType {
    fn from(kind: &EntryKind) -> Self {
        match kind {
            EntryKind::Directory { .. } => Self::Directory,
            EntryKind::Binary { .. } => Self::Binary,
            EntryKind::Resource { .. } => Self::Resource,
        }
    }
}

/// Names of a directory's immediate children, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

/// Metadata for one entry.
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    /// Logical path of the owning archive.
    pub archive: String,
    /// Backslash-joined path within the archive.
    pub path: String,
    pub name: String,
    pub kind: EntryType,
    /// Stored payload bytes; zero for directories.
    pub on_disk_size: u64,
    /// Bytes `read_file` returns; zero for directories.
    pub uncompressed_size: u64,
    pub encrypted: bool,
}

impl EntryMetadata {
    pub(crate) fn from_entry(archive: &str, entry: &Entry) -> Self {
        Self {
            archive: archive.to_string(),
            path: entry.path.clone(),
            name: entry.name.clone(),
            kind: EntryType::from(&entry.kind),
            on_disk_size: entry.on_disk_size().map_or(0, u64::from),
            uncompressed_size: entry.uncompressed_size().map_or(0, u64::from),
            encrypted: entry.is_encrypted(),
        }
    }
}

/// One search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Logical path of the archive containing the entry.
    pub archive: String,
    /// Backslash-joined path within the archive.
    pub path: String,
    pub kind: EntryType,
}

/// A depth-limited directory subtree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub kind: EntryType,
    /// Stored payload bytes; zero for directories.
    pub size: u64,
    pub children: Vec<TreeNode>,
}

/// Aggregate counts over every registered archive.
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    pub archive_count: usize,
    pub entry_count: usize,
    pub file_count: usize,
    /// Sum of on-disk payload sizes across all entries. Nested
    /// archives count their own entries again.
    pub total_payload_bytes: u64,
}
