//! Entry record decoding.
//!
//! Each TOC record is 16 bytes, read as two little-endian 64-bit words
//! `d1` and `d2`. The second 32-bit word discriminates directories
//! (sentinel `0x7FFFFF00`); for files, the top bit of `d1` separates
//! resource entries from binary entries. Field boundaries are not
//! byte-aligned, so everything is extracted with explicit shifts and
//! masks.

use crate::{Error, Result};

/// Second 32-bit word of every directory record.
pub const DIRECTORY_SENTINEL: u32 = 0x7FFF_FF00;

/// On-disk size of one entry record.
pub const ENTRY_RECORD_SIZE: usize = 16;

/// Marker bit distinguishing resource entries from binary entries.
const RESOURCE_FLAG: u64 = 1 << 63;

/// Sentinel on-disk size meaning "reconstruct from resource flags".
const RESOURCE_SIZE_SENTINEL: u32 = 0xFF_FFFF;

/// One decoded TOC entry together with its resolved name and position
/// in the tree.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Name from the names table.
    pub name: String,
    /// Lowercased name, used for case-insensitive matching.
    pub name_lower: String,
    /// Backslash-joined path within the archive; empty for the root.
    pub path: String,
    /// Index of the parent directory entry; `None` only for the root.
    pub parent: Option<usize>,
    pub kind: EntryKind,
}

/// The typed payload of an entry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory {
        /// First child in the archive's flat entry array.
        entries_index: u32,
        /// Number of consecutive children.
        entries_count: u32,
    },
    Binary {
        on_disk_size: u32,
        /// Payload position in 512-byte blocks from the archive start.
        block_offset: u32,
        /// Zero when the payload is stored uncompressed.
        uncompressed_size: u32,
        /// Zero means plaintext; any other value applies the archive mode.
        encryption_type: u8,
    },
    Resource {
        /// Reconstructed from the flag fields when stored as `0xFFFFFF`.
        on_disk_size: u32,
        block_offset: u32,
        system_flags: u32,
        graphics_flags: u32,
    },
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory { .. })
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    pub fn is_resource(&self) -> bool {
        matches!(self.kind, EntryKind::Resource { .. })
    }

    /// Stored payload size; `None` for directories.
    pub fn on_disk_size(&self) -> Option<u32> {
        match self.kind {
            EntryKind::Directory { .. } => None,
            EntryKind::Binary { on_disk_size, .. } | EntryKind::Resource { on_disk_size, .. } => {
                Some(on_disk_size)
            }
        }
    }

    /// Size of the bytes `read_file` returns; `None` for directories.
    ///
    /// Resource payloads are never compressed, so their uncompressed
    /// size equals the on-disk size. A binary entry with a zero
    /// uncompressed-size field is stored verbatim.
    pub fn uncompressed_size(&self) -> Option<u32> {
        match self.kind {
            EntryKind::Directory { .. } => None,
            EntryKind::Binary {
                on_disk_size,
                uncompressed_size,
                ..
            } => Some(if uncompressed_size == 0 {
                on_disk_size
            } else {
                uncompressed_size
            }),
            EntryKind::Resource { on_disk_size, .. } => Some(on_disk_size),
        }
    }

    /// Payload block offset; `None` for directories.
    pub fn block_offset(&self) -> Option<u32> {
        match self.kind {
            EntryKind::Directory { .. } => None,
            EntryKind::Binary { block_offset, .. } | EntryKind::Resource { block_offset, .. } => {
                Some(block_offset)
            }
        }
    }

    /// Whether the payload must be decrypted with the archive mode.
    pub fn is_encrypted(&self) -> bool {
        matches!(self.kind, EntryKind::Binary { encryption_type, .. } if encryption_type != 0)
    }
}

/// Reconstruct a resource payload size from its bit-packed system and
/// graphics flag fields.
pub fn resource_size(system_flags: u32, graphics_flags: u32) -> u32 {
    let base = if (system_flags >> 27) & 1 != 0 { 0x10 } else { 0 };
    let virt = (system_flags & 0x7FF) << ((system_flags >> 11) & 0xF);
    let phys = ((system_flags >> 15) & 0x7F) << ((system_flags >> 25) & 0xF);
    let virt_gfx = (graphics_flags & 0x7FF) << ((graphics_flags >> 11) & 0xF);
    let phys_gfx = ((graphics_flags >> 15) & 0x7F) << ((graphics_flags >> 25) & 0xF);
    base + virt + phys + virt_gfx + phys_gfx
}

/// Decode one 16-byte record into its name offset and typed fields.
pub(crate) fn decode_record(index: usize, record: &[u8]) -> Result<(u32, EntryKind)> {
    let d1 = u64::from_le_bytes(record[0..8].try_into().expect("record is 16 bytes"));
    let d2 = u64::from_le_bytes(record[8..16].try_into().expect("record is 16 bytes"));
    let h2 = (d1 >> 32) as u32;

    if h2 == DIRECTORY_SENTINEL {
        let name_offset = (d1 & 0xFFFF_FFFF) as u32;
        return Ok((
            name_offset,
            EntryKind::Directory {
                entries_index: (d2 & 0xFFFF_FFFF) as u32,
                entries_count: (d2 >> 32) as u32,
            },
        ));
    }

    let name_offset = (d1 & 0xFFFF) as u32;
    let stored_size = ((d1 >> 16) & 0xFF_FFFF) as u32;

    if d1 & RESOURCE_FLAG == 0 {
        if d2 >> 32 != 0 {
            return Err(Error::InvalidBinaryEntry(index));
        }
        Ok((
            name_offset,
            EntryKind::Binary {
                on_disk_size: stored_size,
                block_offset: ((d1 >> 40) & 0xFF_FFFF) as u32,
                uncompressed_size: (d2 & 0xFF_FFFF) as u32,
                encryption_type: ((d2 >> 24) & 0xFF) as u8,
            },
        ))
    } else {
        let system_flags = (d2 & 0xFFFF_FFFF) as u32;
        let graphics_flags = (d2 >> 32) as u32;
        let on_disk_size = if stored_size == RESOURCE_SIZE_SENTINEL {
            resource_size(system_flags, graphics_flags)
        } else {
            stored_size
        };
        Ok((
            name_offset,
            EntryKind::Resource {
                on_disk_size,
                // The top bit of the 24-bit offset field is the resource marker.
                block_offset: ((d1 >> 40) & 0x7F_FFFF) as u32,
                system_flags,
                graphics_flags,
            },
        ))
    }
}
