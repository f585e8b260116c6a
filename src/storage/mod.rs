//! # Artifact Storage
//!
//! Storage for generated zip archives behind the [`ArtifactStore`] trait.
//! Two backends: a local filesystem store for development and single-node
//! deployments, and a generic HTTP bucket store (bearer-token `PUT`) for
//! object-storage services. The concrete provider is configuration, not
//! code.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{StackforgeError, StackforgeResult};

/// Location of a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Backend-native key of the object
    pub key: String,
    /// Public URL the artifact can be downloaded from
    pub url: String,
}

/// Write-side interface to the artifact store.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under `key` and return its public location.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StackforgeResult<StoredArtifact>;
}

/// Build the configured store.
pub fn from_config(config: &StorageConfig) -> StackforgeResult<Arc<dyn ArtifactStore>> {
    match config.backend {
        StorageBackend::Filesystem => Ok(Arc::new(FsArtifactStore::new(
            PathBuf::from(&config.root_dir),
            config.public_base_url.clone(),
        ))),
        StorageBackend::HttpBucket => Ok(Arc::new(HttpBucketStore::new(config)?)),
    }
}

/// Keys come from our own service, but reject anything surprising anyway.
fn validate_key(key: &str) -> StackforgeResult<()> {
    if key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|segment| segment == ".." || segment.is_empty())
    {
        return Err(StackforgeError::StorageError(format!(
            "invalid artifact key: {key}"
        )));
    }
    Ok(())
}

/// Local-directory artifact store.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsArtifactStore {
    pub fn new(root: PathBuf, public_base_url: String) -> Self {
        Self {
            root,
            public_base_url,
        }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> StackforgeResult<StoredArtifact> {
        validate_key(key)?;

        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StackforgeError::StorageError(format!("failed to create artifact directory: {e}"))
            })?;
        }

        let size = bytes.len();
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            StackforgeError::StorageError(format!("failed to write artifact {key}: {e}"))
        })?;

        debug!(key, size, path = %path.display(), "Artifact written to filesystem");

        Ok(StoredArtifact {
            key: key.to_string(),
            url: format!("{}/{key}", self.public_base_url.trim_end_matches('/')),
        })
    }
}

/// Generic HTTP object-bucket store: `PUT {endpoint}/{bucket}/{key}` with a
/// bearer token.
pub struct HttpBucketStore {
    client: Client,
    endpoint: String,
    bucket: String,
    token: String,
    public_base_url: String,
}

impl std::fmt::Debug for HttpBucketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBucketStore")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl HttpBucketStore {
    pub fn new(config: &StorageConfig) -> StackforgeResult<Self> {
        if config.endpoint.is_empty() {
            return Err(StackforgeError::ConfigurationError(
                "storage.endpoint is required for the http_bucket backend".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                StackforgeError::StorageError(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            token: config.resolved_access_token(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{key}", self.endpoint, self.bucket)
    }
}

#[async_trait]
impl ArtifactStore for HttpBucketStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StackforgeResult<StoredArtifact> {
        validate_key(key)?;

        let size = bytes.len();
        let response = self
            .client
            .put(self.object_url(key))
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StackforgeError::StorageError(format!("upload failed for {key}: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            let detail = detail.chars().take(300).collect::<String>();
            return Err(StackforgeError::StorageError(format!(
                "bucket rejected upload of {key} ({status}): {detail}"
            )));
        }

        info!(key, size, bucket = %self.bucket, "Artifact uploaded");

        Ok(StoredArtifact {
            key: key.to_string(),
            url: format!("{}/{}/{key}", self.public_base_url, self.bucket),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_store_writes_bytes_and_builds_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(
            dir.path().to_path_buf(),
            "http://localhost:8080/artifacts/".to_string(),
        );

        let artifact = store
            .put("scaffolds/abc.zip", b"zipbytes".to_vec(), "application/zip")
            .await
            .unwrap();

        assert_eq!(
            artifact.url,
            "http://localhost:8080/artifacts/scaffolds/abc.zip"
        );
        let written = std::fs::read(dir.path().join("scaffolds/abc.zip")).unwrap();
        assert_eq!(written, b"zipbytes");
    }

    #[tokio::test]
    async fn test_fs_store_rejects_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().to_path_buf(), "http://x".to_string());

        let result = store.put("../escape.zip", vec![1], "application/zip").await;
        assert!(matches!(result, Err(StackforgeError::StorageError(_))));
    }

    #[test]
    fn test_http_bucket_requires_endpoint() {
        let config = StorageConfig {
            backend: StorageBackend::HttpBucket,
            ..StorageConfig::default()
        };
        assert!(HttpBucketStore::new(&config).is_err());
    }

    #[test]
    fn test_from_config_builds_filesystem_store() {
        let config = StorageConfig::default();
        assert!(from_config(&config).is_ok());
    }
}
