//! Report media storage
//!
//! [`BlobStore`] is the seam the lifecycle engine uploads through; [`MinioBlobStore`]
//! implements it on a MinIO/S3-compatible bucket with a bounded upload time.

mod blob_store;
mod minio;

pub use blob_store::{BlobStore, MediaFile};
pub use minio::MinioBlobStore;
