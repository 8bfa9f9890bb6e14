//! Shared fixture builder assembling synthetic archives byte-by-byte.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rage_crypto::{ecb, KeystreamProvider};

pub const NONE: u32 = 0x0000_0000;
pub const OPEN: u32 = 0x4E45_504F;
pub const AES: u32 = 0x0FFF_FFF9;
pub const NG: u32 = 0x0FEF_FFFF;

pub const RPF7: u32 = 0x5250_4637;
pub const DIRECTORY_SENTINEL: u32 = 0x7FFF_FF00;

fn pack(d1: u64, d2: u64) -> [u8; 16] {
    let mut record = [0u8; 16];
    record[0..8].copy_from_slice(&d1.to_le_bytes());
    record[8..16].copy_from_slice(&d2.to_le_bytes());
    record
}

pub fn dir_record(name_offset: u32, entries_index: u32, entries_count: u32) -> [u8; 16] {
    dir_record_with_sentinel(name_offset, entries_index, entries_count, DIRECTORY_SENTINEL)
}

pub fn dir_record_with_sentinel(
    name_offset: u32,
    entries_index: u32,
    entries_count: u32,
    sentinel: u32,
) -> [u8; 16] {
    pack(
        u64::from(name_offset) | (u64::from(sentinel) << 32),
        u64::from(entries_index) | (u64::from(entries_count) << 32),
    )
}

pub fn binary_record(
    name_offset: u16,
    on_disk_size: u32,
    block_offset: u32,
    uncompressed_size: u32,
    encryption_type: u8,
) -> [u8; 16] {
    pack(
        u64::from(name_offset)
            | (u64::from(on_disk_size & 0xFF_FFFF) << 16)
            | (u64::from(block_offset & 0xFF_FFFF) << 40),
        u64::from(uncompressed_size & 0xFF_FFFF) | (u64::from(encryption_type) << 24),
    )
}

pub fn resource_record(
    name_offset: u16,
    stored_size: u32,
    block_offset: u32,
    system_flags: u32,
    graphics_flags: u32,
) -> [u8; 16] {
    pack(
        u64::from(name_offset)
            | (u64::from(stored_size & 0xFF_FFFF) << 16)
            | ((u64::from(block_offset & 0x7F_FFFF) | 0x80_0000) << 40),
        u64::from(system_flags) | (u64::from(graphics_flags) << 32),
    )
}

/// Assembles an archive image: header, entry records, names table and
/// block-addressed payloads. An AES builder encrypts the entries and
/// names tables as separate units the way the producer does.
pub struct ArchiveBuilder {
    version: u32,
    encryption: u32,
    records: Vec<[u8; 16]>,
    names: Vec<u8>,
    payloads: Vec<(u32, Vec<u8>)>,
}

impl ArchiveBuilder {
    pub fn new(encryption: u32) -> Self {
        Self {
            version: RPF7,
            encryption,
            records: Vec::new(),
            names: Vec::new(),
            payloads: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn record(mut self, record: [u8; 16]) -> Self {
        self.records.push(record);
        self
    }

    pub fn names(mut self, names: &[u8]) -> Self {
        self.names = names.to_vec();
        self
    }

    pub fn payload(mut self, block: u32, bytes: &[u8]) -> Self {
        self.payloads.push((block, bytes.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut entries_buf: Vec<u8> = self.records.iter().flatten().copied().collect();
        let mut names_buf = self.names.clone();
        if self.encryption == AES {
            entries_buf = ecb::encrypt(&entries_buf);
            names_buf = ecb::encrypt(&names_buf);
        }

        let mut image = Vec::new();
        image.extend_from_slice(&self.version.to_le_bytes());
        image.extend_from_slice(&(self.records.len() as u32).to_le_bytes());
        image.extend_from_slice(&(names_buf.len() as u32).to_le_bytes());
        image.extend_from_slice(&self.encryption.to_le_bytes());
        image.extend_from_slice(&entries_buf);
        image.extend_from_slice(&names_buf);

        for (block, bytes) in &self.payloads {
            let offset = *block as usize * 512;
            if image.len() < offset + bytes.len() {
                image.resize(offset + bytes.len(), 0);
            }
            image[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
        image
    }

    pub fn write(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.build()).expect("write fixture archive");
        path
    }
}

/// Deterministic keystream fake for exercising the NG paths.
pub struct TestKeystream;

impl TestKeystream {
    pub fn stream(name: &str, length_tag: u32) -> Vec<u8> {
        let mut seed = length_tag;
        for byte in name.bytes() {
            seed = seed.wrapping_mul(31).wrapping_add(u32::from(byte));
        }
        (0..64u32)
            .map(|i| (seed.wrapping_add(i).wrapping_mul(2_654_435_761) >> 24) as u8)
            .collect()
    }
}

impl KeystreamProvider for TestKeystream {
    fn keystream(&self, name: &str, length_tag: u32) -> rage_crypto::Result<Vec<u8>> {
        Ok(Self::stream(name, length_tag))
    }
}
