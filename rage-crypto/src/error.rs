//! Error types for rage-crypto operations.

use thiserror::Error;

/// Errors that can occur during crypto operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// No key material is available for the NG keystream.
    #[error("NG key material unavailable for '{0}'")]
    KeyMaterialMissing(String),
}
