//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::StorageError;

/// Storage provider configuration.
///
/// Buckets are addressed per call, so the provider carries connection
/// parameters only - endpoint, credentials, region, or a local root path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, MinIO, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
    },
    /// Local filesystem
    LocalFs {
        /// Root directory under which buckets live as directories.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create S3-compatible provider (Cloudflare R2, MinIO, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(account: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
        }
    }

    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Short provider name, also used to namespace partial download files.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Default signed-URL TTL in seconds, used when a request does not
    /// carry its own expiry (default: 3600 = 1 hour).
    #[serde(default = "default_presign_ttl")]
    pub presign_ttl_secs: u64,
    /// Public base URL prepended by `file_url` for the local filesystem
    /// provider. Remote providers derive URLs from their endpoint.
    #[serde(default)]
    pub public_url: Option<String>,
}

fn default_presign_ttl() -> u64 {
    StorageConfig::DEFAULT_PRESIGN_TTL
}

impl StorageConfig {
    /// Default signed-URL TTL: 1 hour.
    pub const DEFAULT_PRESIGN_TTL: u64 = 3600;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            presign_ttl_secs: Self::DEFAULT_PRESIGN_TTL,
            public_url: None,
        }
    }

    /// Set the default signed-URL TTL.
    #[must_use]
    pub fn with_presign_ttl(mut self, secs: u64) -> Self {
        self.presign_ttl_secs = secs;
        self
    }

    /// Set the public base URL used by `file_url` for local storage.
    #[must_use]
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    /// Loads configuration from `DEPOT_`-prefixed environment variables.
    ///
    /// The provider is selected by `DEPOT_PROVIDER__TYPE` (`s3`,
    /// `azure_blob`, or `local_fs`) with the variant's fields supplied as
    /// `DEPOT_PROVIDER__<FIELD>`.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or malformed.
    pub fn from_env() -> Result<Self, StorageError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("DEPOT").separator("__"))
            .build()
            .map_err(|e| StorageError::configuration(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| StorageError::configuration(e.to_string()))
    }
}
