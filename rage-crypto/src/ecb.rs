//! Fixed-key AES-128-ECB cipher for package tables and payloads.
//!
//! The archive format encrypts the table of contents (and, per entry,
//! file payloads) with AES-128 in ECB mode under a single key compiled
//! into the game executable. Buffers are processed as whole 16-byte
//! blocks; a trailing partial block is copied through unchanged because
//! the producer does not pad payloads to the block size, and the tail
//! must survive a round trip.

use aes::{Aes128, Block};
use cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

/// The 128-bit table-of-contents key baked into the target executable.
const PACKFILE_KEY: [u8; 16] = [
    0xB7, 0x62, 0xDF, 0xB6, 0xE2, 0xB2, 0xC6, 0xDE, 0xAF, 0x72, 0x2A, 0x32, 0xD2, 0xFB, 0x6F, 0x0C,
];

/// Decrypt a buffer with the built-in packfile key.
///
/// Every full 16-byte block is decrypted in place; any trailing
/// `len % 16` bytes are passed through unchanged. The output length
/// always equals the input length.
pub fn decrypt(data: &[u8]) -> Vec<u8> {
    let cipher = Aes128::new(&PACKFILE_KEY.into());
    let mut out = data.to_vec();
    let aligned = out.len() - out.len() % 16;
    for chunk in out[..aligned].chunks_exact_mut(16) {
        cipher.decrypt_block(Block::from_mut_slice(chunk));
    }
    out
}

/// Encrypt a buffer with the built-in packfile key.
///
/// The exact inverse of [`decrypt`], including tail pass-through.
pub fn encrypt(data: &[u8]) -> Vec<u8> {
    let cipher = Aes128::new(&PACKFILE_KEY.into());
    let mut out = data.to_vec();
    let aligned = out.len() - out.len() % 16;
    for chunk in out[..aligned].chunks_exact_mut(16) {
        cipher.encrypt_block(Block::from_mut_slice(chunk));
    }
    out
}
