//! Vendor-agnostic object storage with resumable partial downloads.
//!
//! This crate presents one contract for object-style storage so callers can
//! upload, download, copy, and sign URLs without depending on a specific
//! backend. Backends are driven through Apache OpenDAL: S3-compatible
//! services, Azure Blob Storage, and the local filesystem.
//!
//! # Modules
//!
//! - `storage` - provider configuration, name validation, and the
//!   whole-object operations (upload, read, delete, copy, presigned URLs)
//! - `transfer` - the resumable download protocol: interrupted downloads
//!   leave a version-tagged partial file behind, and a later call continues
//!   from the exact byte offset already on disk

pub mod storage;
pub mod transfer;

pub use storage::{ObjectStorage, StorageConfig, StorageError, StorageProvider};
pub use transfer::{ProgressSink, TransferError, TransferOptions, TransferService};
