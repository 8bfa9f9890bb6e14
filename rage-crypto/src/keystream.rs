//! Keystream provider abstraction for NG-encrypted archives.
//!
//! NG mode XORs ciphertext against a stream derived from static key
//! material, a lowercased name, and a 32-bit length tag. The derivation
//! tables ship with the game and are not public, so the provider is an
//! injected capability: callers that hold valid key material implement
//! [`KeystreamProvider`]; without it, [`UnavailableKeystream`] makes NG
//! archives fail loudly instead of decoding to garbage.

use tracing::debug;

use crate::error::CryptoError;
use crate::Result;

/// Produces the keyed XOR stream for NG-encrypted data.
///
/// Implementations must be pure: the stream is a function only of
/// `(name, length_tag)` and the provider's static key material. The
/// returned stream should be at least as long as the ciphertext it will
/// be applied to; shorter streams are cycled by [`xor_keystream`].
pub trait KeystreamProvider: Send + Sync {
    /// Derive the keystream for `name` (already lowercased by the
    /// caller) and the given length tag.
    fn keystream(&self, name: &str, length_tag: u32) -> Result<Vec<u8>>;
}

/// Provider used when no NG key material is present.
///
/// Always fails with [`CryptoError::KeyMaterialMissing`], which archive
/// readers surface as an unsupported-encryption condition.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableKeystream;

impl KeystreamProvider for UnavailableKeystream {
    fn keystream(&self, name: &str, _length_tag: u32) -> Result<Vec<u8>> {
        debug!("no NG key material loaded, refusing keystream for '{name}'");
        Err(CryptoError::KeyMaterialMissing(name.to_string()))
    }
}

/// XOR `buf` against `stream`, cycling the stream modulo its length.
///
/// A no-op when the stream is empty.
pub fn xor_keystream(buf: &mut [u8], stream: &[u8]) {
    if stream.is_empty() {
        return;
    }
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= stream[i % stream.len()];
    }
}
