//! Archive header parsing.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::{Error, Result};

/// Version tag of supported archives ("RPF7" little-endian).
pub const RPF7_VERSION: u32 = 0x5250_4637;

const ENCRYPTION_NONE: u32 = 0x0000_0000;
const ENCRYPTION_OPEN: u32 = 0x4E45_504F;
const ENCRYPTION_AES: u32 = 0x0FFF_FFF9;
const ENCRYPTION_NG: u32 = 0x0FEF_FFFF;

/// How an archive's table of contents and payloads are encrypted.
///
/// The mode is fixed at archive creation time and applies uniformly to
/// the TOC and to every payload whose entry is flagged encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMode {
    /// No encryption.
    None,
    /// "OPEN" tag; also plaintext.
    Open,
    /// Fixed-key AES-128-ECB over whole buffers.
    Aes,
    /// Name-keyed XOR stream.
    Ng,
}

impl EncryptionMode {
    /// Parse the on-disk mode tag.
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            ENCRYPTION_NONE => Ok(Self::None),
            ENCRYPTION_OPEN => Ok(Self::Open),
            ENCRYPTION_AES => Ok(Self::Aes),
            ENCRYPTION_NG => Ok(Self::Ng),
            other => Err(Error::UnknownEncryption(other)),
        }
    }

    /// The on-disk tag for this mode.
    pub fn tag(self) -> u32 {
        match self {
            Self::None => ENCRYPTION_NONE,
            Self::Open => ENCRYPTION_OPEN,
            Self::Aes => ENCRYPTION_AES,
            Self::Ng => ENCRYPTION_NG,
        }
    }

    /// Whether the TOC requires decryption before decoding.
    pub fn is_encrypted(self) -> bool {
        matches!(self, Self::Aes | Self::Ng)
    }
}

/// The 16-byte archive header. All fields little-endian; the header
/// itself is always plaintext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub entry_count: u32,
    pub names_length: u32,
    pub encryption: EncryptionMode,
}

impl ArchiveHeader {
    /// On-disk size of the header.
    pub const SIZE: usize = 16;

    /// Parse and validate a header.
    pub fn parse(buf: &[u8; Self::SIZE]) -> Result<Self> {
        let mut cursor = Cursor::new(&buf[..]);
        let version = cursor.read_u32::<LittleEndian>()?;
        if version != RPF7_VERSION {
            return Err(Error::InvalidVersion(version));
        }
        let entry_count = cursor.read_u32::<LittleEndian>()?;
        let names_length = cursor.read_u32::<LittleEndian>()?;
        let encryption = EncryptionMode::from_tag(cursor.read_u32::<LittleEndian>()?)?;

        Ok(Self {
            entry_count,
            names_length,
            encryption,
        })
    }
}
