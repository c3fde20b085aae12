//! Resumable download protocol.
//!
//! Downloads a remote object to a local path safely: bytes stream into an
//! append-only partial file named after the destination and the object's
//! version tag, and the destination itself only ever appears through an
//! atomic rename of a complete partial file. An interrupted transfer leaves
//! the partial file behind, and the next call resumes from the byte offset
//! already on disk - the filesystem is the only bookkeeping, so resumption
//! survives process restarts.
//!
//! The protocol is written once against the [`RemoteObjectAccessor`]
//! capability; backends differ only in how their accessor is constructed.
//!
//! Concurrent downloads targeting the same destination path race on the
//! same partial file and must be serialized by the caller. Downloads to
//! different paths are fully independent.

mod accessor;
mod error;
mod partial;
mod progress;
mod service;

pub use accessor::{ObjectStream, OperatorAccessor, RemoteObjectAccessor, RemoteObjectMeta};
pub use error::TransferError;
pub use partial::partial_path;
pub use progress::ProgressSink;
pub use service::{TransferOptions, TransferService};
