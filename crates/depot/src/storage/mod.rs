//! Object storage operations using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: Cloudflare R2, MinIO, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem (development and passthrough use)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       ObjectStorage                              │
//! │            (bucket + object addressing, one API)                 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ upload / read / delete     │ signed_url / file_url               │
//! │ copy / exists / buckets    │ download (resumable, see `transfer`)│
//! ├─────────────────────────────────────────────────────────────────┤
//! │                      Apache OpenDAL                              │
//! │              (one Operator per bucket, cached)                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod names;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use names::{InvalidName, validate_bucket_name, validate_object_name};
pub use service::{ObjectStorage, PresignedUrl, SignedUrlOptions};
