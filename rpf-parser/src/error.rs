//! Error types for archive parsing and extraction.

use rage_crypto::CryptoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid archive version tag: {0:#010x}")]
    InvalidVersion(u32),

    #[error("unknown encryption mode tag: {0:#010x}")]
    UnknownEncryption(u32),

    #[error("archive truncated while reading {0}")]
    Truncated(&'static str),

    #[error("entry {0} is not a valid directory entry")]
    InvalidDirectoryEntry(usize),

    #[error("entry {0} has nonzero reserved bits")]
    InvalidBinaryEntry(usize),

    #[error("entry {entry} name offset {offset} overruns the names table")]
    NamesOverrun { entry: usize, offset: u32 },

    #[error("encrypted archive is unreadable: {0}")]
    UnsupportedEncryption(#[from] CryptoError),

    #[error("'{0}' is not a file entry")]
    EntryNotFile(String),

    #[error("payload read truncated: wanted {wanted} bytes at offset {offset:#x}")]
    ReadTruncated { wanted: u64, offset: u64 },

    #[error("inflate failed: {0}")]
    InflateFailed(String),

    #[error("inflated size mismatch: expected {expected}, got {actual}")]
    InflateLengthMismatch { expected: u32, actual: usize },
}
