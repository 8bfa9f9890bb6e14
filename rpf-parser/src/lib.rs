//! Parsing and extraction for RPF7 package archives.
//!
//! An RPF7 archive is a table of contents (16-byte entry records plus a
//! names table, optionally encrypted as a unit) followed by per-file
//! payloads addressed in 512-byte blocks. Archives nest: a file entry
//! whose name ends in `.rpf` is itself an archive sharing the same
//! backing file at a non-zero offset.
//!
//! [`RpfArchive::open`] materializes the entry tree and recursively
//! opens nested archives; [`RpfArchive::read_file`] runs the payload
//! pipeline (positioned read, per-entry decryption, deflate inflation).

pub mod archive;
pub mod data;
pub mod entry;
pub mod error;
pub mod header;

pub use archive::{RpfArchive, ARCHIVE_EXTENSION, PAYLOAD_BLOCK_SIZE};
pub use entry::{resource_size, Entry, EntryKind};
pub use error::Error;
pub use header::{ArchiveHeader, EncryptionMode};

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, Error>;
