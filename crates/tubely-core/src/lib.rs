//! Tubely Core Library
//!
//! This crate provides domain models, error types, and configuration shared by
//! every Tubely component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, IngestConfig, KeyEncoding, ThumbnailDelivery};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{MediaKind, Orientation, Video};
pub use storage_types::StorageBackend;
