//! Transfer coordinator: drives one resumable download end-to-end.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::accessor::{RemoteObjectAccessor, RemoteObjectMeta};
use super::error::TransferError;
use super::partial::{open_partial, partial_path};
use super::progress::ProgressSink;
use crate::storage::{validate_bucket_name, validate_object_name};

/// Per-download options: an optional progress sink and a cancellation token.
#[derive(Clone, Default)]
pub struct TransferOptions {
    progress: Option<Arc<dyn ProgressSink>>,
    cancel: CancellationToken,
}

impl TransferOptions {
    /// Create options with no progress sink and no external cancellation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror every write through `sink`.
    #[must_use]
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Abort the transfer when `token` is cancelled. Cancellation is
    /// honored between chunk writes and surfaces as
    /// [`TransferError::Cancelled`].
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    fn report(&self, bytes_on_disk: u64, total_size: u64) {
        if let Some(sink) = &self.progress {
            sink.transferred(bytes_on_disk, total_size);
        }
    }
}

/// Resumable download coordinator over a [`RemoteObjectAccessor`].
///
/// The accessor is the coordinator's only backend dependency; it is passed
/// in explicitly rather than resolved from shared state, so callers decide
/// which backend a download runs against.
pub struct TransferService<A> {
    accessor: A,
}

impl<A: RemoteObjectAccessor> TransferService<A> {
    /// Create a coordinator over `accessor`.
    #[must_use]
    pub fn new(accessor: A) -> Self {
        Self { accessor }
    }

    /// Download `bucket`/`object` to `destination`, resuming any partial
    /// file a previous attempt left behind.
    ///
    /// On success the destination holds the complete object, promoted into
    /// place by an atomic rename. On failure the filesystem is left in one
    /// of three states: no file, a resumable partial file (interruptions,
    /// cancellation, failed commits), or an untouched pre-existing final
    /// file. A destination that already exists as a regular file is treated
    /// as authoritative and returned without any network call; re-download
    /// requires the caller to remove it first.
    ///
    /// # Errors
    ///
    /// See [`TransferError`] for the failure taxonomy. Backend errors from
    /// the stat and range-read calls are surfaced verbatim; no retries are
    /// performed here, and none are needed for resumption - a repeated call
    /// continues where the failed one stopped.
    pub async fn download(
        &self,
        bucket: &str,
        object: &str,
        destination: &Path,
        options: &TransferOptions,
    ) -> Result<(), TransferError> {
        validate_bucket_name(bucket)?;
        validate_object_name(object)?;

        match tokio::fs::metadata(destination).await {
            Ok(meta) if meta.is_dir() => {
                return Err(TransferError::destination_conflict(destination));
            }
            Ok(_) => {
                debug!(path = %destination.display(), "destination already exists, leaving it untouched");
                return Ok(());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(TransferError::local_io(destination, e)),
        }

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| TransferError::local_io(parent, e))?;
            }
        }

        let meta = self.accessor.stat(bucket, object).await?;
        let partial = partial_path(destination, &meta.version_tag, self.accessor.backend_tag());

        let (mut file, bytes_on_disk) = open_partial(&partial)
            .await
            .map_err(|e| TransferError::local_io(&partial, e))?;
        debug!(
            object,
            offset = bytes_on_disk,
            total = meta.total_size,
            partial = %partial.display(),
            "filling partial file"
        );

        if let Err(err) = self
            .fill_partial(&mut file, bucket, object, &meta, bytes_on_disk, options)
            .await
        {
            drop(file);
            if err.preserves_partial() {
                debug!(partial = %partial.display(), "keeping partial file for a later resume");
            } else if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                warn!(
                    partial = %partial.display(),
                    error = %cleanup,
                    "failed to remove partial file; original error still wins"
                );
            }
            return Err(err);
        }

        // Close before rename; Windows refuses to rename an open file.
        drop(file);
        tokio::fs::rename(&partial, destination)
            .await
            .map_err(|e| {
                TransferError::commit_failed(format!(
                    "rename {} -> {}: {e}",
                    partial.display(),
                    destination.display()
                ))
            })?;
        Ok(())
    }

    /// Stream the missing byte range into the partial file.
    ///
    /// Any failure in here maps to [`TransferError::Interrupted`]: the
    /// bytes already appended are valid, so the partial file stays usable.
    async fn fill_partial(
        &self,
        file: &mut File,
        bucket: &str,
        object: &str,
        meta: &RemoteObjectMeta,
        start: u64,
        options: &TransferOptions,
    ) -> Result<(), TransferError> {
        match start.cmp(&meta.total_size) {
            Ordering::Greater => {
                return Err(TransferError::interrupted(format!(
                    "partial file holds {start} bytes but the object is only {} bytes; \
                     the object shrank or changed",
                    meta.total_size
                )));
            }
            Ordering::Equal => {
                // Everything is already on disk; covers zero-byte objects.
                return sync_partial(file).await;
            }
            Ordering::Less => {}
        }

        options.report(start, meta.total_size);

        let remaining = meta.total_size - start;
        let mut stream = self
            .accessor
            .open_range(bucket, object, start, remaining)
            .await?;
        let mut bytes_on_disk = start;

        loop {
            let chunk = tokio::select! {
                biased;
                () = options.cancel.cancelled() => return Err(TransferError::Cancelled),
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = chunk else { break };
            let chunk = chunk
                .map_err(|e| TransferError::interrupted(format!("range read failed: {e}")))?;
            if bytes_on_disk + chunk.len() as u64 > meta.total_size {
                return Err(TransferError::interrupted(
                    "range read returned more bytes than the object reported",
                ));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| TransferError::interrupted(format!("write to partial file failed: {e}")))?;
            bytes_on_disk += chunk.len() as u64;
            options.report(bytes_on_disk, meta.total_size);
        }

        if bytes_on_disk != meta.total_size {
            return Err(TransferError::interrupted(format!(
                "short read: received {} of {remaining} bytes",
                bytes_on_disk - start
            )));
        }

        sync_partial(file).await
    }
}

async fn sync_partial(file: &mut File) -> Result<(), TransferError> {
    file.flush()
        .await
        .map_err(|e| TransferError::interrupted(format!("flush of partial file failed: {e}")))?;
    file.sync_all()
        .await
        .map_err(|e| TransferError::interrupted(format!("sync of partial file failed: {e}")))
}
