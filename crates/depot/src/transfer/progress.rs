//! Progress observation seam.

/// Write-through observer for download progress.
///
/// The coordinator reports cumulative bytes on disk, not per-call deltas:
/// a resumed transfer's first report already includes everything previous
/// attempts wrote. Implementations must not block indefinitely - the
/// coordinator calls the sink inline on the transfer path and does not
/// time out on a stalled sink.
pub trait ProgressSink: Send + Sync {
    /// Called once with the resume offset when streaming begins, then after
    /// every chunk written to the partial file.
    fn transferred(&self, bytes_on_disk: u64, total_size: u64);
}
