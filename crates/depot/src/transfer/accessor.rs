//! Remote object access capability.
//!
//! [`RemoteObjectAccessor`] is the only backend-specific dependency the
//! transfer coordinator needs: report an object's size and version tag,
//! and open a byte-range read at an arbitrary offset. The OpenDAL-backed
//! [`OperatorAccessor`] implements it for every supported provider;
//! accessors own no retry or resume logic.

use bytes::Bytes;
use futures::stream::BoxStream;
use opendal::Operator;

use super::error::TransferError;

/// Byte stream returned by [`RemoteObjectAccessor::open_range`].
pub type ObjectStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Size and version of a remote object, as of one stat observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObjectMeta {
    /// Total object size in bytes.
    pub total_size: u64,
    /// Backend-supplied identifier that changes whenever the object's
    /// content changes. Used only to namespace partial download files.
    pub version_tag: String,
}

/// Capability to stat a remote object and read a byte range of it.
pub trait RemoteObjectAccessor: Send + Sync {
    /// Report the object's total size and version tag.
    fn stat(
        &self,
        bucket: &str,
        object: &str,
    ) -> impl std::future::Future<Output = Result<RemoteObjectMeta, TransferError>> + Send;

    /// Open a read of `limit` bytes starting at `offset`.
    fn open_range(
        &self,
        bucket: &str,
        object: &str,
        offset: u64,
        limit: u64,
    ) -> impl std::future::Future<Output = Result<ObjectStream, TransferError>> + Send;

    /// Short backend identifier appended to partial file names so partials
    /// from different backends never collide.
    fn backend_tag(&self) -> &str;
}

/// [`RemoteObjectAccessor`] over an OpenDAL [`Operator`].
///
/// The operator is already rooted at one bucket, so the bucket argument of
/// the trait methods is satisfied at construction time.
pub struct OperatorAccessor {
    operator: Operator,
    backend_tag: String,
}

impl OperatorAccessor {
    /// Create an accessor over a bucket-rooted operator.
    #[must_use]
    pub fn new(operator: Operator, backend_tag: impl Into<String>) -> Self {
        Self {
            operator,
            backend_tag: backend_tag.into(),
        }
    }
}

impl RemoteObjectAccessor for OperatorAccessor {
    async fn stat(&self, _bucket: &str, object: &str) -> Result<RemoteObjectMeta, TransferError> {
        let meta = self.operator.stat(object).await?;
        Ok(RemoteObjectMeta {
            total_size: meta.content_length(),
            version_tag: version_tag(&meta),
        })
    }

    async fn open_range(
        &self,
        _bucket: &str,
        object: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ObjectStream, TransferError> {
        let reader = self.operator.reader(object).await?;
        let stream = reader
            .into_bytes_stream(offset..offset + limit)
            .await
            .map_err(TransferError::from)?;
        Ok(Box::pin(stream))
    }

    fn backend_tag(&self) -> &str {
        &self.backend_tag
    }
}

/// Derive a version tag from backend metadata.
///
/// Prefers the etag; backends without one (the filesystem service, for
/// instance) fall back to modification time and length, which still changes
/// whenever the content does.
fn version_tag(meta: &opendal::Metadata) -> String {
    if let Some(etag) = meta.etag() {
        return etag.to_string();
    }
    match meta.last_modified() {
        Some(modified) => format!(
            "{}-{}",
            modified.into_inner().as_millisecond(),
            meta.content_length()
        ),
        None => String::new(),
    }
}
