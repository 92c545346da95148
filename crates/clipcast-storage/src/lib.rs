//! Clipcast Storage Library
//!
//! Storage gateway abstraction and implementations: the multipart session
//! contract consumed by the upload coordinator, an S3 backend, and a local
//! filesystem backend for development and tests.
//!
//! # Storage key format
//!
//! - **Podcasts**: `media/{content_id}.{ext}`
//! - **Clips**: `clips/{content_id}.{ext}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use clipcast_core::StorageBackend;
pub use factory::create_gateway;
#[cfg(feature = "storage-local")]
pub use local::LocalGateway;
#[cfg(feature = "storage-s3")]
pub use s3::S3Gateway;
pub use traits::{StorageError, StorageGateway, StorageResult};
