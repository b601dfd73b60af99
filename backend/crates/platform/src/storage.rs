//! Object Storage
//!
//! `put(key, bytes, content_type) -> URL` over two backends:
//! - [`HttpStorage`] - PUT to `{endpoint}/{bucket}/{key}` on an S3-style gateway
//! - [`LocalStorage`] - a directory served by the API under `/uploads`
//!
//! Every attempt is bounded by `StorageConfig::timeout`, and transient
//! failures (timeouts, connection errors, 5xx) are retried exactly once.
//! A PUT of the same key is idempotent, so the retry cannot duplicate
//! objects. Callers must only record a URL after `put` returned `Ok`.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

/// Storage failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage request timed out")]
    Timeout,

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Storage backend rejected the object with status {0}")]
    Rejected(u16),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Worth a second attempt
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Timeout | StorageError::Unavailable(_) => true,
            StorageError::Rejected(status) => *status >= 500,
            StorageError::InvalidKey(_) | StorageError::Io(_) => false,
        }
    }
}

/// Result of a successful put
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

#[trait_variant::make(ObjectStorage: Send)]
pub trait LocalObjectStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;
}

// ============================================================================
// Configuration
// ============================================================================

/// Remote object store settings
#[derive(Debug, Clone)]
pub struct HttpStorageConfig {
    pub endpoint: String,
    pub bucket: String,
    /// Sent as `Authorization: Bearer ...` when present
    pub access_token: Option<String>,
    /// Public base URL for stored objects; defaults to `{endpoint}/{bucket}`
    pub public_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// `None` selects the local directory backend
    pub http: Option<HttpStorageConfig>,
    pub local_root: PathBuf,
    pub local_public_url: String,
    pub timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            http: None,
            local_root: PathBuf::from("uploads"),
            local_public_url: "http://localhost:8080/uploads".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl StorageConfig {
    /// Local directory backend only
    pub fn development() -> Self {
        Self::default()
    }
}

// ============================================================================
// Keys
// ============================================================================

/// `{prefix}/{uuid}.{extension}`
pub fn object_key(prefix: &str, extension: &str) -> String {
    format!(
        "{}/{}.{}",
        prefix.trim_matches('/'),
        uuid::Uuid::new_v4(),
        extension
    )
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let well_formed = !key.is_empty()
        && !key.starts_with('/')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_'))
        && key.split('/').all(|segment| !segment.is_empty() && segment != "..");

    if well_formed {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

// ============================================================================
// Timeout and retry
// ============================================================================

async fn bounded<T, Fut>(timeout: Duration, attempt: Fut) -> Result<T, StorageError>
where
    Fut: Future<Output = Result<T, StorageError>>,
{
    tokio::time::timeout(timeout, attempt)
        .await
        .map_err(|_| StorageError::Timeout)?
}

/// Run `attempt` once more if the first failure is transient.
async fn with_single_retry<T, F, Fut>(
    key: &str,
    timeout: Duration,
    mut attempt: F,
) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    match bounded(timeout, attempt()).await {
        Err(e) if e.is_transient() => {
            tracing::warn!(key = %key, error = %e, "Object storage put failed, retrying once");
            bounded(timeout, attempt()).await
        }
        other => other,
    }
}

// ============================================================================
// HTTP backend
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpStorage {
    client: reqwest::Client,
    config: HttpStorageConfig,
    timeout: Duration,
}

impl HttpStorage {
    pub fn new(config: HttpStorageConfig, timeout: Duration) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            config,
            timeout,
        })
    }

    fn object_url(&self, key: &str) -> String {
        join_url(
            &join_url(&self.config.endpoint, &self.config.bucket),
            key,
        )
    }

    fn public_url(&self, key: &str) -> String {
        match &self.config.public_url {
            Some(base) => join_url(base, key),
            None => self.object_url(key),
        }
    }

    async fn put_once(&self, url: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        let mut request = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                StorageError::Timeout
            } else {
                StorageError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(StorageError::Rejected(status.as_u16()))
        }
    }
}

impl ObjectStorage for HttpStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        validate_key(key)?;
        let url = self.object_url(key);
        let size = bytes.len();

        // Bytes clones share the buffer
        with_single_retry(key, self.timeout, || {
            self.put_once(&url, bytes.clone(), content_type)
        })
        .await?;

        tracing::debug!(key = %key, size, "Stored object in remote storage");

        Ok(StoredObject {
            key: key.to_string(),
            url: self.public_url(key),
            content_type: content_type.to_string(),
            size,
        })
    }
}

// ============================================================================
// Local backend
// ============================================================================

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_url: String,
    timeout: Duration,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into(),
            timeout,
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Write to a sibling temp file and rename, so a failed write never
    /// leaves a truncated object under the final key.
    async fn write_once(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = self.root.join(format!("{key}.part"));
        tokio::fs::write(&partial, bytes).await?;
        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        Ok(())
    }
}

impl ObjectStorage for LocalStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        validate_key(key)?;
        with_single_retry(key, self.timeout, || self.write_once(key, &bytes)).await?;

        tracing::debug!(key = %key, size = bytes.len(), "Stored object on local disk");

        Ok(StoredObject {
            key: key.to_string(),
            url: join_url(&self.public_url, key),
            content_type: content_type.to_string(),
            size: bytes.len(),
        })
    }
}

// ============================================================================
// Runtime selection
// ============================================================================

/// Backend chosen from configuration at startup
#[derive(Debug, Clone)]
pub enum Storage {
    Http(HttpStorage),
    Local(LocalStorage),
}

impl Storage {
    /// Remote storage when configured and constructible, local directory otherwise.
    pub fn from_config(config: &StorageConfig) -> Self {
        let local = || {
            Storage::Local(LocalStorage::new(
                config.local_root.clone(),
                config.local_public_url.clone(),
                config.timeout,
            ))
        };

        match &config.http {
            Some(http) => match HttpStorage::new(http.clone(), config.timeout) {
                Ok(storage) => {
                    tracing::info!(endpoint = %http.endpoint, bucket = %http.bucket, "Using remote object storage");
                    Storage::Http(storage)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Remote storage init failed, falling back to local storage");
                    local()
                }
            },
            None => {
                tracing::info!(root = %config.local_root.display(), "Using local object storage");
                local()
            }
        }
    }

    /// Directory to serve statically, for the local backend
    pub fn local_root(&self) -> Option<&std::path::Path> {
        match self {
            Storage::Local(local) => Some(local.root()),
            Storage::Http(_) => None,
        }
    }
}

impl ObjectStorage for Storage {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        match self {
            Storage::Http(http) => ObjectStorage::put(http, key, bytes, content_type).await,
            Storage::Local(local) => ObjectStorage::put(local, key, bytes, content_type).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("platform-storage-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_object_key_shape() {
        let key = object_key("/images/", "png");
        assert!(key.starts_with("images/"));
        assert!(key.ends_with(".png"));
        assert!(validate_key(&key).is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs/path.png").is_err());
        assert!(validate_key("images//x.png").is_err());
        assert!(validate_key("images/x y.png").is_err());
        assert!(validate_key("").is_err());
    }

    #[test]
    fn test_transient_classification() {
        assert!(StorageError::Timeout.is_transient());
        assert!(StorageError::Unavailable("reset".into()).is_transient());
        assert!(StorageError::Rejected(503).is_transient());
        assert!(!StorageError::Rejected(403).is_transient());
        assert!(!StorageError::InvalidKey("x".into()).is_transient());
    }

    #[tokio::test]
    async fn test_retry_once_on_transient() {
        let calls = AtomicUsize::new(0);
        let result = with_single_retry("k", Duration::from_secs(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(StorageError::Unavailable("connection reset".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_retry_on_permanent_failure() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_single_retry("k", Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StorageError::Rejected(403)) }
        })
        .await;

        assert!(matches!(result, Err(StorageError::Rejected(403))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_second_timeout() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_single_retry("k", Duration::from_millis(10), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            }
        })
        .await;

        assert!(matches!(result, Err(StorageError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_local_put_writes_file() {
        let root = temp_root();
        let storage = LocalStorage::new(&root, "http://localhost:8080/uploads/", Duration::from_secs(5));

        let stored = ObjectStorage::put(
            &storage,
            "images/a.png",
            Bytes::from_static(b"\x89PNG"),
            "image/png",
        )
        .await
        .unwrap();

        assert_eq!(stored.url, "http://localhost:8080/uploads/images/a.png");
        assert_eq!(stored.size, 4);
        let on_disk = tokio::fs::read(root.join("images/a.png")).await.unwrap();
        assert_eq!(on_disk, b"\x89PNG");
        assert!(!root.join("images/a.png.part").exists());

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_local_put_rejects_bad_key() {
        let storage = LocalStorage::new(temp_root(), "http://x", Duration::from_secs(1));
        let result = ObjectStorage::put(&storage, "../escape", Bytes::new(), "text/plain").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_from_config_defaults_to_local() {
        let storage = Storage::from_config(&StorageConfig::default());
        assert!(matches!(storage, Storage::Local(_)));
        assert!(storage.local_root().is_some());
    }

    #[test]
    fn test_http_public_url() {
        let storage = HttpStorage::new(
            HttpStorageConfig {
                endpoint: "https://storage.example.com/".into(),
                bucket: "media".into(),
                access_token: None,
                public_url: None,
            },
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            storage.public_url("images/a.png"),
            "https://storage.example.com/media/images/a.png"
        );
    }
}
