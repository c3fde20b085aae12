//! Object storage service implementation using Apache OpenDAL.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use opendal::{Operator, services};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::info;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use super::names::{validate_bucket_name, validate_object_name};
use crate::transfer::{OperatorAccessor, TransferError, TransferOptions, TransferService};

/// Read buffer size for streaming uploads.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Presigned URL for a download.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use.
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Required headers for the request.
    pub headers: HashMap<String, String>,
}

/// Options for generating a signed URL.
#[derive(Debug, Clone, Default)]
pub struct SignedUrlOptions {
    /// URL lifetime; falls back to the configured default when `None`.
    pub expiry: Option<Duration>,
    /// Filename suggested to the downloading browser via the
    /// content-disposition header.
    pub default_filename: Option<String>,
}

/// Vendor-agnostic object storage addressed by bucket and object name.
///
/// One OpenDAL operator is built lazily per bucket and cached; all
/// whole-object operations validate names first and then forward to the
/// operator, surfacing the backend's native error unchanged in kind.
pub struct ObjectStorage {
    config: StorageConfig,
    operators: DashMap<String, Operator>,
}

impl ObjectStorage {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider configuration is unusable.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        if let StorageProvider::LocalFs { root } = &config.provider {
            if root.to_str().is_none() {
                return Err(StorageError::configuration("root path is not valid UTF-8"));
            }
        }
        info!(provider = config.provider.name(), "storage service configured");
        Ok(Self {
            config,
            operators: DashMap::new(),
        })
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// OpenDAL operator rooted at `bucket`, built on first use.
    fn operator(&self, bucket: &str) -> Result<Operator, StorageError> {
        validate_bucket_name(bucket)?;
        if let Some(op) = self.operators.get(bucket) {
            return Ok(op.clone());
        }
        let op = self.build_operator(bucket)?;
        self.operators.insert(bucket.to_string(), op.clone());
        Ok(op)
    }

    fn build_operator(&self, bucket: &str) -> Result<Operator, StorageError> {
        match &self.config.provider {
            StorageProvider::S3 {
                endpoint,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(bucket);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let bucket_root = root.join(bucket);
                let builder = services::Fs::default().root(
                    bucket_root
                        .to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Upload a whole buffer as `bucket`/`object`.
    ///
    /// # Errors
    ///
    /// Returns an error if the names are invalid or the backend rejects the
    /// write.
    pub async fn upload(
        &self,
        bucket: &str,
        object: &str,
        content: impl Into<Bytes> + Send,
    ) -> Result<(), StorageError> {
        validate_object_name(object)?;
        let op = self.operator(bucket)?;
        op.write(object, content.into()).await?;
        Ok(())
    }

    /// Upload from an async reader with an explicit content type and
    /// declared length.
    ///
    /// # Errors
    ///
    /// Returns an error if the names are invalid, the backend rejects the
    /// write, or the reader produces a different number of bytes than
    /// declared (the write is aborted in that case).
    pub async fn upload_reader<R>(
        &self,
        bucket: &str,
        object: &str,
        mut reader: R,
        content_type: &str,
        length: u64,
    ) -> Result<(), StorageError>
    where
        R: AsyncRead + Send + Unpin,
    {
        validate_object_name(object)?;
        let op = self.operator(bucket)?;
        let mut writer = op
            .writer_with(object)
            .content_type(content_type)
            .await?;

        let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| StorageError::operation(format!("reading upload source: {e}")))?;
            if n == 0 {
                break;
            }
            writer.write(Bytes::copy_from_slice(&buf[..n])).await?;
            written += n as u64;
        }

        if written != length {
            writer.abort().await?;
            return Err(StorageError::operation(format!(
                "upload source produced {written} bytes, expected {length}"
            )));
        }
        writer.close().await?;
        Ok(())
    }

    /// Read a whole object into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the names are invalid or the object cannot be
    /// read.
    pub async fn read(&self, bucket: &str, object: &str) -> Result<Bytes, StorageError> {
        validate_object_name(object)?;
        let op = self.operator(bucket)?;
        Ok(op.read(object).await?.to_bytes())
    }

    /// Delete a single object.
    ///
    /// # Errors
    ///
    /// Returns an error if the names are invalid or deletion fails.
    pub async fn delete(&self, bucket: &str, object: &str) -> Result<(), StorageError> {
        validate_object_name(object)?;
        let op = self.operator(bucket)?;
        op.delete(object).await?;
        Ok(())
    }

    /// Check whether an object exists. Errors collapse to `false`.
    pub async fn exists(&self, bucket: &str, object: &str) -> bool {
        if validate_object_name(object).is_err() {
            return false;
        }
        let Ok(op) = self.operator(bucket) else {
            return false;
        };
        op.stat(object).await.is_ok()
    }

    /// Check whether a bucket exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket name is invalid or the backend check
    /// fails for a reason other than the bucket being absent.
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        validate_bucket_name(bucket)?;
        match &self.config.provider {
            StorageProvider::LocalFs { root } => tokio::fs::try_exists(root.join(bucket))
                .await
                .map_err(|e| StorageError::operation(e.to_string())),
            _ => {
                let op = self.operator(bucket)?;
                match op.list_with("/").limit(1).await {
                    Ok(_) => Ok(true),
                    Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(false),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// Create a bucket.
    ///
    /// Native for the local filesystem provider; remote providers manage
    /// bucket lifecycle outside this API and report
    /// [`StorageError::Unsupported`].
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, creation fails, or the
    /// provider does not support bucket creation.
    pub async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        validate_bucket_name(bucket)?;
        match &self.config.provider {
            StorageProvider::LocalFs { root } => tokio::fs::create_dir_all(root.join(bucket))
                .await
                .map_err(|e| StorageError::operation(e.to_string())),
            _ => Err(StorageError::Unsupported("create_bucket")),
        }
    }

    /// Create or replace an object by copying an existing one.
    ///
    /// Within one bucket the backend's native copy is used; across buckets
    /// the object is read and rewritten.
    ///
    /// # Errors
    ///
    /// Returns an error if any name is invalid or either side of the copy
    /// fails.
    pub async fn copy(
        &self,
        src_bucket: &str,
        src_object: &str,
        dst_bucket: &str,
        dst_object: &str,
    ) -> Result<(), StorageError> {
        validate_object_name(src_object)?;
        validate_object_name(dst_object)?;
        if src_bucket == dst_bucket {
            let op = self.operator(src_bucket)?;
            op.copy(src_object, dst_object).await?;
        } else {
            let content = self.read(src_bucket, src_object).await?;
            self.upload(dst_bucket, dst_object, content).await?;
        }
        Ok(())
    }

    /// Local staging path for an object.
    ///
    /// The local filesystem provider stores objects under
    /// `<root>/<bucket>/<object>`; remote providers stage under the system
    /// temporary directory.
    #[must_use]
    pub fn file_path(&self, bucket: &str, object: &str) -> PathBuf {
        match &self.config.provider {
            StorageProvider::LocalFs { root } => root.join(bucket).join(object),
            _ => std::env::temp_dir().join(object),
        }
    }

    /// Public URL for an object: endpoint + bucket + object name.
    #[must_use]
    pub fn file_url(&self, bucket: &str, object: &str) -> String {
        match &self.config.provider {
            StorageProvider::S3 { endpoint, .. } => {
                format!("{}/{bucket}/{object}", endpoint.trim_end_matches('/'))
            }
            StorageProvider::AzureBlob { account, .. } => {
                format!("https://{account}.blob.core.windows.net/{bucket}/{object}")
            }
            StorageProvider::LocalFs { root } => match &self.config.public_url {
                Some(base) => format!("{}/{bucket}/{object}", base.trim_end_matches('/')),
                None => root.join(bucket).join(object).display().to_string(),
            },
        }
    }

    /// Generate a presigned download URL.
    ///
    /// The object must exist; absent objects report
    /// [`StorageError::NotFound`] rather than signing a URL that can only
    /// ever 404.
    ///
    /// # Errors
    ///
    /// Returns an error if the names are invalid, the object is missing, or
    /// presigning is not supported by the provider.
    pub async fn signed_url(
        &self,
        bucket: &str,
        object: &str,
        options: &SignedUrlOptions,
    ) -> Result<PresignedUrl, StorageError> {
        validate_object_name(object)?;
        let op = self.operator(bucket)?;

        op.stat(object).await?;

        let ttl = options
            .expiry
            .unwrap_or(Duration::from_secs(self.config.presign_ttl_secs));
        let presigned = if let Some(filename) = &options.default_filename {
            op.presign_read_with(object, ttl)
                .override_content_disposition(&format!("attachment; filename=\"{filename}\""))
                .await?
        } else {
            op.presign_read(object, ttl).await?
        };

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Utc::now()
                + chrono::Duration::seconds(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
            headers: HashMap::new(),
        })
    }

    /// Download an object to a local file, resuming any interrupted
    /// previous attempt.
    ///
    /// # Errors
    ///
    /// See [`TransferError`]; the partial-file guarantees of the transfer
    /// protocol apply.
    pub async fn download(
        &self,
        bucket: &str,
        object: &str,
        destination: &std::path::Path,
    ) -> Result<(), TransferError> {
        self.download_with(bucket, object, destination, &TransferOptions::new())
            .await
    }

    /// [`ObjectStorage::download`] with progress observation and
    /// cancellation.
    ///
    /// # Errors
    ///
    /// See [`TransferError`].
    pub async fn download_with(
        &self,
        bucket: &str,
        object: &str,
        destination: &std::path::Path,
        options: &TransferOptions,
    ) -> Result<(), TransferError> {
        let operator = self.operator(bucket)?;
        let accessor = OperatorAccessor::new(operator, self.provider_name());
        TransferService::new(accessor)
            .download(bucket, object, destination, options)
            .await
    }
}
