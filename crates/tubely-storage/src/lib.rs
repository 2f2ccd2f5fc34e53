//! Tubely Storage Library
//!
//! Object storage abstraction and its S3 and local filesystem backends, plus
//! the two pieces every backend shares: storage key derivation and public
//! URL construction.
//!
//! # Storage key format
//!
//! `{prefix}{token}{extension}` where `prefix` is an orientation namespace
//! (`landscape/`, `portrait/`, `other/`) for videos and empty for thumbnails,
//! `token` encodes 32 bytes from the OS random source, and `extension` comes
//! from the sniffed content type (`.mp4`, `.jpg`, ...).
//!
//! Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;
pub mod urls;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{EntropySource, KeyDeriver, KeyError, OsEntropy, StorageKey};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StoredObject};
pub use tubely_core::StorageBackend;
pub use urls::{inline_data_url, PublicUrlFormat};
