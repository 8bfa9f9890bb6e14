//! Minimal archive fixture builder for registry tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const NONE: u32 = 0x0000_0000;
pub const RPF7: u32 = 0x5250_4637;
pub const DIRECTORY_SENTINEL: u32 = 0x7FFF_FF00;

fn pack(d1: u64, d2: u64) -> [u8; 16] {
    let mut record = [0u8; 16];
    record[0..8].copy_from_slice(&d1.to_le_bytes());
    record[8..16].copy_from_slice(&d2.to_le_bytes());
    record
}

pub fn dir_record(name_offset: u32, entries_index: u32, entries_count: u32) -> [u8; 16] {
    pack(
        u64::from(name_offset) | (u64::from(DIRECTORY_SENTINEL) << 32),
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

pub struct ArchiveBuilder {
    encryption: u32,
    records: Vec<[u8; 16]>,
    names: Vec<u8>,
    payloads: Vec<(u32, Vec<u8>)>,
}

impl ArchiveBuilder {
    pub fn new(encryption: u32) -> Self {
        Self {
            encryption,
            records: Vec::new(),
            names: Vec::new(),
            payloads: Vec::new(),
        }
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
        let mut image = Vec::new();
        image.extend_from_slice(&RPF7.to_le_bytes());
        image.extend_from_slice(&(self.records.len() as u32).to_le_bytes());
        image.extend_from_slice(&(self.names.len() as u32).to_le_bytes());
        image.extend_from_slice(&self.encryption.to_le_bytes());
        for record in &self.records {
            image.extend_from_slice(record);
        }
        image.extend_from_slice(&self.names);

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
        std::fs::create_dir_all(dir).expect("create fixture dir");
        std::fs::write(&path, self.build()).expect("write fixture archive");
        path
    }
}

/// `hi` -> `HELLO`, stored plain.
pub fn minimal_archive() -> ArchiveBuilder {
    ArchiveBuilder::new(NONE)
        .record(dir_record(0, 1, 1))
        .record(binary_record(1, 5, 1, 0, 0))
        .names(b"\0hi\0")
        .payload(1, b"HELLO")
}

/// `inner.rpf` (containing `inner.txt` -> `ok`) plus `top.txt` -> `TOP`.
pub fn outer_archive() -> ArchiveBuilder {
    let inner = ArchiveBuilder::new(NONE)
        .record(dir_record(0, 1, 1))
        .record(binary_record(1, 2, 1, 0, 0))
        .names(b"\0inner.txt\0")
        .payload(1, b"ok")
        .build();

    ArchiveBuilder::new(NONE)
        .record(dir_record(0, 1, 2))
        .record(binary_record(1, inner.len() as u32, 1, 0, 0))
        .record(binary_record(11, 3, 3, 0, 0))
        .names(b"\0inner.rpf\0top.txt\0")
        .payload(1, &inner)
        .payload(3, b"TOP")
}
