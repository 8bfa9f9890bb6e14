//! Encryption support for RAGE package files.
//!
//! This crate provides:
//! - The fixed-key AES-128-ECB cipher used for table-of-contents and
//!   payload decryption
//! - The `KeystreamProvider` abstraction for the name-keyed XOR stream
//!   used by NG-encrypted archives

pub mod ecb;
pub mod error;
pub mod keystream;

pub use error::CryptoError;
pub use keystream::{KeystreamProvider, UnavailableKeystream};

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
