//! Registry and virtual filesystem over RPF package archives.
//!
//! [`PackfileRegistry`] scans a root directory for `.rpf` archives,
//! opens each one (including archives nested inside other archives)
//! and exposes directory listings, metadata, search and transparent
//! extraction under forward-slash logical paths.

pub mod config;
pub mod error;
pub mod registry;
pub mod types;

pub use config::RegistryConfig;
pub use error::{Result, StorageError};
pub use registry::PackfileRegistry;
pub use types::{
    DirectoryListing, EntryMetadata, EntryType, RegistryStats, SearchHit, TreeNode,
};
