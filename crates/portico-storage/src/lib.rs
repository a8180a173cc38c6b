//! Object storage backends.
//!
//! The upload lifecycle talks to storage only through the [`Storage`] trait:
//! existence checks, raw writes, metadata get/attach, signed read URLs, and
//! buffer downloads. Two backends are provided: S3 (via `object_store`) and
//! a local filesystem backend used in development and tests.

pub mod factory;
pub mod keys;
pub mod local;
pub mod s3;
pub mod traits;

pub use factory::create_storage;
pub use keys::{derive_object_key, sanitize_filename};
pub use local::LocalStorage;
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
