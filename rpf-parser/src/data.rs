//! Entry payload pipeline: positioned read, decryption, inflation.

use flate2::read::DeflateDecoder;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use tracing::trace;

use rage_crypto::ecb;
use rage_crypto::keystream::xor_keystream;

use crate::archive::{RpfArchive, PAYLOAD_BLOCK_SIZE};
use crate::entry::{Entry, EntryKind};
use crate::header::EncryptionMode;
use crate::{Error, Result};

impl RpfArchive {
    /// Read and decode a file entry's payload.
    ///
    /// Reads exactly `on_disk_size` bytes at the entry's block offset,
    /// decrypts them with the archive mode when the entry is flagged
    /// encrypted, and inflates the raw deflate stream when the
    /// uncompressed size is nonzero and differs from the on-disk size.
    /// Resource payloads are never compressed or flagged, so they come
    /// back verbatim.
    ///
    /// The backing-file descriptor is scoped to this call and released
    /// on every exit path.
    pub fn read_file(&self, entry: &Entry) -> Result<Vec<u8>> {
        let (on_disk_size, uncompressed_size, encryption_type, block_offset) = match entry.kind {
            EntryKind::Binary {
                on_disk_size,
                block_offset,
                uncompressed_size,
                encryption_type,
            } => (on_disk_size, uncompressed_size, encryption_type, block_offset),
            EntryKind::Resource {
                on_disk_size,
                block_offset,
                ..
            } => (on_disk_size, on_disk_size, 0, block_offset),
            EntryKind::Directory { .. } => return Err(Error::EntryNotFile(entry.path.clone())),
        };

        let offset = self.start_offset + u64::from(block_offset) * PAYLOAD_BLOCK_SIZE;
        trace!(
            "reading '{}': {} bytes at {:#x} (uncompressed {}, encryption {})",
            entry.path,
            on_disk_size,
            offset,
            uncompressed_size,
            encryption_type
        );

        let mut buf = vec![0u8; on_disk_size as usize];
        {
            let mut file = File::open(&self.backing_path)?;
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buf).map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    Error::ReadTruncated {
                        wanted: u64::from(on_disk_size),
                        offset,
                    }
                } else {
                    Error::Io(e)
                }
            })?;
        }

        if encryption_type != 0 {
            match self.encryption {
                EncryptionMode::Aes => buf = ecb::decrypt(&buf),
                EncryptionMode::Ng => {
                    // Payload streams are keyed per entry, unlike the
                    // TOC stream keyed on the archive itself.
                    let stream = self
                        .keystream
                        .keystream(&entry.name_lower, uncompressed_size)?;
                    xor_keystream(&mut buf, &stream);
                }
                EncryptionMode::None | EncryptionMode::Open => {}
            }
        }

        // Resource entries never reach this branch: their uncompressed
        // size equals the on-disk size by construction.
        if uncompressed_size > 0 && uncompressed_size != on_disk_size {
            let mut inflated = Vec::with_capacity(uncompressed_size as usize);
            DeflateDecoder::new(buf.as_slice())
                .read_to_end(&mut inflated)
                .map_err(|e| Error::InflateFailed(e.to_string()))?;
            if inflated.len() != uncompressed_size as usize {
                return Err(Error::InflateLengthMismatch {
                    expected: uncompressed_size,
                    actual: inflated.len(),
                });
            }
            Ok(inflated)
        } else {
            Ok(buf)
        }
    }
}
