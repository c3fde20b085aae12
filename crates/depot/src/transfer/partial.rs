//! Partial download file bookkeeping.
//!
//! A partial file's name binds it to a destination path, an object version,
//! and a backend: `<destination><version-tag>.part.<backend-tag>`. The name
//! is deterministic, so re-running a download for the same object version
//! finds the same partial file, while a changed object version computes a
//! fresh name and the stale partial is simply never picked up again.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};

/// Marker between the version tag and the backend tag.
const PARTIAL_MARKER: &str = ".part.";

/// Compute the partial file path for a destination, object version, and
/// backend.
///
/// Orphaned partial files (left behind after the remote object changed) can
/// be recognized and reclaimed by matching this naming convention; the
/// protocol itself never deletes them.
#[must_use]
pub fn partial_path(destination: &Path, version_tag: &str, backend_tag: &str) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(sanitize_version_tag(version_tag));
    name.push(PARTIAL_MARKER);
    name.push(backend_tag);
    PathBuf::from(name)
}

/// Open the partial file in append mode, creating it if absent, and report
/// how many bytes it already holds.
///
/// The length is read from the freshly opened handle, so the resume offset
/// and the append position come from the same observation.
pub(crate) async fn open_partial(path: &Path) -> std::io::Result<(File, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let len = file.metadata().await?.len();
    Ok((file, len))
}

/// Make a version tag safe to embed in a file name.
///
/// Etags commonly arrive quoted; the quotes are dropped entirely, and any
/// other character outside `[A-Za-z0-9._-]` becomes a hyphen.
fn sanitize_version_tag(tag: &str) -> String {
    tag.chars()
        .filter(|c| *c != '"')
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
