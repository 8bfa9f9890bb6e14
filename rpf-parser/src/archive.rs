//! Archive opening, hierarchy building and nested-archive recursion.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use rage_crypto::ecb;
use rage_crypto::keystream::{xor_keystream, KeystreamProvider};

use crate::entry::{decode_record, Entry, EntryKind, DIRECTORY_SENTINEL, ENTRY_RECORD_SIZE};
use crate::header::{ArchiveHeader, EncryptionMode};
use crate::{Error, Result};

/// Payload offsets are expressed in blocks of this many bytes.
pub const PAYLOAD_BLOCK_SIZE: u64 = 512;

/// Lowercased extension that marks nested archives.
pub const ARCHIVE_EXTENSION: &str = ".rpf";

/// A parsed archive: its decoded entry tree plus enough location
/// information to read payloads from the backing file on demand.
///
/// Nested archives are opened eagerly during [`RpfArchive::open`] and
/// shared behind [`Arc`] so a registry can index them without copying
/// metadata. No file descriptor is held between operations; every read
/// opens its own.
pub struct RpfArchive {
    /// File containing this archive's bytes.
    pub backing_path: PathBuf,
    /// File name of a top-level archive, or the entry name of a nested one.
    pub name: String,
    /// Byte offset of the archive header within the backing file.
    pub start_offset: u64,
    /// Total byte span of the archive within the backing file.
    pub size: u64,
    pub encryption: EncryptionMode,
    /// Flat entry array; entry 0 is the root directory.
    pub entries: Vec<Entry>,
    /// Archives stored as `.rpf` file entries inside this one.
    pub children: Vec<Arc<RpfArchive>>,
    pub(crate) keystream: Arc<dyn KeystreamProvider>,
}

impl std::fmt::Debug for RpfArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpfArchive")
            .field("backing_path", &self.backing_path)
            .field("name", &self.name)
            .field("start_offset", &self.start_offset)
            .field("size", &self.size)
            .field("encryption", &self.encryption)
            .field("entries", &self.entries)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

impl RpfArchive {
    /// Open a top-level archive at offset 0 of `path`.
    pub fn open(path: impl AsRef<Path>, keystream: Arc<dyn KeystreamProvider>) -> Result<Self> {
        let path = path.as_ref();
        let size = path.metadata()?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::open_at(path, name, 0, size, keystream)
    }

    /// Open an archive at an arbitrary offset within a backing file.
    ///
    /// Used directly for nested archives, whose header lies at the
    /// parent entry's payload offset in the shared backing file.
    pub fn open_at(
        path: &Path,
        name: String,
        start_offset: u64,
        size: u64,
        keystream: Arc<dyn KeystreamProvider>,
    ) -> Result<Self> {
        debug!("opening archive '{name}' at {start_offset:#x} in {path:?}");

        let (header, entries_buf, names_buf) = {
            let mut file = File::open(path)?;
            file.seek(SeekFrom::Start(start_offset))?;

            let mut header_buf = [0u8; ArchiveHeader::SIZE];
            read_exact_or(&mut file, &mut header_buf, "archive header")?;
            let header = ArchiveHeader::parse(&header_buf)?;

            let mut entries_buf = vec![0u8; header.entry_count as usize * ENTRY_RECORD_SIZE];
            read_exact_or(&mut file, &mut entries_buf, "entries table")?;
            let mut names_buf = vec![0u8; header.names_length as usize];
            read_exact_or(&mut file, &mut names_buf, "names table")?;

            (header, entries_buf, names_buf)
        };

        let (entries_buf, names_buf) = match header.encryption {
            EncryptionMode::Aes => (ecb::decrypt(&entries_buf), ecb::decrypt(&names_buf)),
            EncryptionMode::Ng => {
                let stream = keystream.keystream(&name.to_lowercase(), size as u32)?;
                let mut entries_buf = entries_buf;
                let mut names_buf = names_buf;
                xor_keystream(&mut entries_buf, &stream);
                xor_keystream(&mut names_buf, &stream);
                (entries_buf, names_buf)
            }
            EncryptionMode::None | EncryptionMode::Open => (entries_buf, names_buf),
        };

        let entries = decode_entries(&entries_buf, &names_buf)?;

        let mut archive = Self {
            backing_path: path.to_path_buf(),
            name,
            start_offset,
            size,
            encryption: header.encryption,
            entries,
            children: Vec::new(),
            keystream,
        };
        archive.build_hierarchy()?;
        archive.scan_nested();

        debug!(
            "archive '{}': {} entries, {} nested",
            archive.name,
            archive.entries.len(),
            archive.children.len()
        );
        Ok(archive)
    }

    /// Root directory entry.
    pub fn root(&self) -> &Entry {
        &self.entries[0]
    }

    /// Resolve a path within the archive.
    ///
    /// Segments are matched case-insensitively; both separators are
    /// accepted. The empty path resolves to the root directory.
    pub fn find(&self, path: &str) -> Option<&Entry> {
        self.find_index(path).map(|index| &self.entries[index])
    }

    /// Like [`find`](Self::find), returning the entry's index.
    pub fn find_index(&self, path: &str) -> Option<usize> {
        let segments: Vec<&str> = path
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty())
            .collect();

        let mut current = 0usize;
        for (depth, segment) in segments.iter().enumerate() {
            let segment = segment.to_lowercase();
            let last = depth + 1 == segments.len();

            let EntryKind::Directory {
                entries_index,
                entries_count,
            } = self.entries[current].kind
            else {
                return None;
            };
            let range = entries_index as usize..(entries_index + entries_count) as usize;

            // Directories take precedence over a file with the same name.
            let hit = range
                .clone()
                .find(|&child| {
                    self.entries[child].is_dir() && self.entries[child].name_lower == segment
                })
                .or_else(|| {
                    if last {
                        range.clone().find(|&child| {
                            self.entries[child].is_file()
                                && self.entries[child].name_lower == segment
                        })
                    } else {
                        None
                    }
                });
            current = hit?;
        }
        Some(current)
    }

    /// Indices of a directory entry's children, empty for files.
    pub fn children_of(&self, index: usize) -> std::ops::Range<usize> {
        match self.entries[index].kind {
            EntryKind::Directory {
                entries_index,
                entries_count,
            } => entries_index as usize..(entries_index + entries_count) as usize,
            _ => 0..0,
        }
    }

    /// Assign parent links and backslash-joined paths from the
    /// directory ranges, validating the range invariants.
    fn build_hierarchy(&mut self) -> Result<()> {
        let count = self.entries.len();

        for index in 0..count {
            if let EntryKind::Directory {
                entries_index,
                entries_count,
            } = self.entries[index].kind
            {
                let start = entries_index as usize;
                let end = start
                    .checked_add(entries_count as usize)
                    .ok_or(Error::InvalidDirectoryEntry(index))?;
                if end > count {
                    return Err(Error::InvalidDirectoryEntry(index));
                }
                for child in start..end {
                    // The root is nobody's child; ranges must not
                    // overlap or self-reference.
                    if child == 0 || child == index || self.entries[child].parent.is_some() {
                        return Err(Error::InvalidDirectoryEntry(index));
                    }
                    self.entries[child].parent = Some(index);
                }
            }
        }

        for index in 1..count {
            if self.entries[index].parent.is_none() {
                warn!(
                    "entry {} ('{}') is not reachable from the root directory",
                    index, self.entries[index].name
                );
            }
        }

        self.entries[0].path = String::new();
        let mut queue = VecDeque::from([0usize]);
        while let Some(index) = queue.pop_front() {
            let parent_path = self.entries[index].path.clone();
            for child in self.children_of(index) {
                self.entries[child].path = if parent_path.is_empty() {
                    self.entries[child].name.clone()
                } else {
                    format!("{parent_path}\\{}", self.entries[child].name)
                };
                queue.push_back(child);
            }
        }

        Ok(())
    }

    /// Recursively open every `.rpf` file entry as a child archive.
    ///
    /// A child that fails to parse is logged and skipped so one bad
    /// nested file does not make the enclosing archive unusable.
    fn scan_nested(&mut self) {
        let mut children = Vec::new();
        for entry in &self.entries {
            if !entry.is_file() || !entry.name_lower.ends_with(ARCHIVE_EXTENSION) {
                continue;
            }
            let (Some(block_offset), Some(on_disk_size)) =
                (entry.block_offset(), entry.on_disk_size())
            else {
                continue;
            };
            let child_offset = self.start_offset + u64::from(block_offset) * PAYLOAD_BLOCK_SIZE;
            match Self::open_at(
                &self.backing_path,
                entry.name.clone(),
                child_offset,
                u64::from(on_disk_size),
                Arc::clone(&self.keystream),
            ) {
                Ok(child) => children.push(Arc::new(child)),
                Err(e) => warn!(
                    "skipping nested archive '{}' in '{}': {e}",
                    entry.path, self.name
                ),
            }
        }
        self.children = children;
    }
}

/// `read_exact` that reports end-of-file as a structural truncation.
fn read_exact_or(file: &mut File, buf: &mut [u8], what: &'static str) -> Result<()> {
    file.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Truncated(what)
        } else {
            Error::Io(e)
        }
    })
}

/// Decode the entries table, resolving names as NUL-terminated byte
/// strings out of the names table.
fn decode_entries(entries_buf: &[u8], names_buf: &[u8]) -> Result<Vec<Entry>> {
    if entries_buf.is_empty() {
        return Err(Error::InvalidDirectoryEntry(0));
    }

    let mut entries = Vec::with_capacity(entries_buf.len() / ENTRY_RECORD_SIZE);
    for (index, record) in entries_buf.chunks_exact(ENTRY_RECORD_SIZE).enumerate() {
        if index == 0 {
            // The root must decode as a directory before anything else
            // in the record is interpreted.
            let h2 = u32::from_le_bytes(record[4..8].try_into().expect("record is 16 bytes"));
            if h2 != DIRECTORY_SENTINEL {
                return Err(Error::InvalidDirectoryEntry(0));
            }
        }

        let (name_offset, kind) = decode_record(index, record)?;
        let name = name_at(names_buf, name_offset, index)?;
        entries.push(Entry {
            name_lower: name.to_lowercase(),
            path: name.clone(),
            name,
            parent: None,
            kind,
        });
    }
    Ok(entries)
}

fn name_at(names_buf: &[u8], offset: u32, entry: usize) -> Result<String> {
    let start = offset as usize;
    if start >= names_buf.len() {
        return Err(Error::NamesOverrun { entry, offset });
    }
    let terminator = names_buf[start..]
        .iter()
        .position(|&byte| byte == 0)
        .ok_or(Error::NamesOverrun { entry, offset })?;
    Ok(String::from_utf8_lossy(&names_buf[start..start + terminator]).into_owned())
}
