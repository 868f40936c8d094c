//! Object storage for uploaded files.
//!
//! [`ObjectStorage`] is the byte-level seam over a bucket; [`R2Storage`] implements it against
//! Cloudflare R2 (or any S3-compatible API). [`StorageService`] sits on top and owns everything the
//! HTTP layer should not care about: normalizing folders, generating collision-free keys, and
//! turning keys into presigned or public URLs.
//!
//! ```text
//! upload(bytes, folder, filename, content_type)
//!   ├─ normalize_folder(folder)          "avatars/"  -> "avatars"
//!   ├─ generate_key(folder, filename)    -> "avatars/3f0c...e1.png"
//!   ├─ ObjectStorage::put(key, bytes)
//!   └─ ObjectStorage::presigned_url(key, presign_expiry)
//! ```

pub mod errors;
#[cfg(any(test, feature = "test-utils"))]
mod memory;
mod r2;

use crate::config::StorageConfig;
use async_trait::async_trait;
use bytes::Bytes;
use errors::{Result, StorageError};
use std::{path::Path, sync::Arc, time::Duration};
use tracing::instrument;
use url::Url;
use uuid::Uuid;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryStorage;
pub use r2::R2Storage;

/// Longest file extension carried over from the client's filename into the key.
const MAX_EXTENSION_LEN: usize = 10;

/// Trait for object storage backends
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write `body` under `key`, replacing any existing object
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()>;

    /// Produce a GET URL for `key` that is valid for `expires_in` without further credentials
    async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String>;
}

/// Result of a successful upload
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub folder: String,
    pub size_bytes: i64,
    /// Presigned GET URL, valid for the configured presign window
    pub url: String,
}

/// Storage adapter used by request handlers.
///
/// Cheap to clone; the backend is shared.
#[derive(Clone)]
pub struct StorageService {
    backend: Arc<dyn ObjectStorage>,
    presign_expiry: Duration,
    public_url: Option<Url>,
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("presign_expiry", &self.presign_expiry)
            .field("public_url", &self.public_url)
            .finish_non_exhaustive()
    }
}

impl StorageService {
    pub fn new(backend: Arc<dyn ObjectStorage>, config: &StorageConfig) -> Self {
        Self {
            backend,
            presign_expiry: config.presign_expiry,
            public_url: config.public_url.clone(),
        }
    }

    /// Build the service on top of an [`R2Storage`] client for `config`
    pub async fn from_config(config: &StorageConfig) -> Self {
        let backend = R2Storage::from_config(config).await;
        Self::new(Arc::new(backend), config)
    }

    /// Upload `body` into `folder` and return its new key together with a presigned URL.
    ///
    /// Every call generates a fresh key, so uploading the same filename twice never overwrites.
    #[instrument(skip(self, body), fields(size = body.len()), err)]
    pub async fn upload(&self, body: Bytes, folder: &str, filename: Option<&str>, content_type: &str) -> Result<StoredObject> {
        let folder = normalize_folder(folder)?;
        let key = generate_key(&folder, filename);
        let size_bytes = body.len() as i64;

        self.backend.put(&key, body, content_type).await?;
        tracing::debug!(key = %key, "Stored object");

        let url = self.presigned_url(&key).await.inspect_err(|e| {
            tracing::error!(key = %key, error = %e, "Object stored but presigning failed; object is orphaned");
        })?;

        Ok(StoredObject {
            key,
            folder,
            size_bytes,
            url,
        })
    }

    /// Presigned GET URL for an existing key, valid for the configured window
    pub async fn presigned_url(&self, key: &str) -> Result<String> {
        self.backend.presigned_url(key, self.presign_expiry).await
    }

    /// Public URL for `key` when the bucket is exposed through `R2_PUBLIC_URL`
    pub fn public_url(&self, key: &str) -> Option<String> {
        self.public_url
            .as_ref()
            .map(|base| format!("{}/{}", base.as_str().trim_end_matches('/'), key))
    }
}

/// Normalize a caller-supplied folder into a key prefix.
///
/// Surrounding slashes are trimmed. Each `/`-separated segment must be non-empty, must not be
/// `.` or `..`, and may only contain ASCII letters, digits, `-`, `_` and `.`.
pub fn normalize_folder(folder: &str) -> Result<String> {
    let invalid = |reason: &str| StorageError::InvalidFolder {
        folder: folder.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = folder.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(invalid("folder must not be empty"));
    }

    for segment in trimmed.split('/') {
        if segment.is_empty() {
            return Err(invalid("empty path segments are not allowed"));
        }
        if segment == "." || segment == ".." {
            return Err(invalid("relative segments are not allowed"));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(invalid("only letters, digits, '-', '_' and '.' are allowed"));
        }
    }

    Ok(trimmed.to_string())
}

/// Generate a fresh storage key `<folder>/<uuid-v4><.ext>`.
///
/// `folder` must already be normalized. The extension is taken from `filename` when it is a
/// short alphanumeric suffix and is lowercased.
pub fn generate_key(folder: &str, filename: Option<&str>) -> String {
    let id = Uuid::new_v4();
    match filename.and_then(extension) {
        Some(ext) => format!("{folder}/{id}.{ext}"),
        None => format!("{folder}/{id}"),
    }
}

fn extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(backend: Arc<MemoryStorage>) -> StorageService {
        let config = StorageConfig {
            bucket_name: "test-bucket".to_string(),
            public_url: Some(Url::parse("https://cdn.example.com/").unwrap()),
            ..Default::default()
        };
        StorageService::new(backend, &config)
    }

    #[test]
    fn test_normalize_folder() {
        assert_eq!(normalize_folder("files").unwrap(), "files");
        assert_eq!(normalize_folder("/avatars/2024/").unwrap(), "avatars/2024");
        assert_eq!(normalize_folder(" docs ").unwrap(), "docs");
        assert_eq!(normalize_folder("my_folder-1.v2").unwrap(), "my_folder-1.v2");
    }

    #[test]
    fn test_normalize_folder_rejects_bad_input() {
        for folder in ["", "/", "a//b", "../etc", "a/./b", "with space", "emoji🙂", "a\\b", "q?x=1"] {
            let result = normalize_folder(folder);
            assert!(
                matches!(result, Err(StorageError::InvalidFolder { .. })),
                "expected {folder:?} to be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_generate_key_keeps_extension() {
        let key = generate_key("avatars", Some("Profile Photo.PNG"));
        let (folder, name) = key.split_once('/').unwrap();
        assert_eq!(folder, "avatars");
        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "png");
        assert!(Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn test_generate_key_drops_odd_extensions() {
        for filename in [None, Some("README"), Some("archive.tar-gz"), Some("x.averyveryverylongext"), Some(".env")] {
            let key = generate_key("files", filename);
            let name = key.strip_prefix("files/").unwrap();
            assert!(Uuid::parse_str(name).is_ok(), "unexpected key {key} for {filename:?}");
        }
    }

    #[test]
    fn test_generate_key_is_unique_for_same_filename() {
        let a = generate_key("files", Some("report.pdf"));
        let b = generate_key("files", Some("report.pdf"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_upload_stores_object_and_presigns() {
        let backend = Arc::new(MemoryStorage::new());
        let storage = service(backend.clone());

        let stored = storage
            .upload(Bytes::from_static(b"hello"), "/docs/", Some("notes.txt"), "text/plain")
            .await
            .unwrap();

        assert_eq!(stored.folder, "docs");
        assert!(stored.key.starts_with("docs/"));
        assert!(stored.key.ends_with(".txt"));
        assert_eq!(stored.size_bytes, 5);
        assert!(stored.url.contains(&stored.key));
        assert!(stored.url.contains("expires_in=604800"));

        let (content, content_type) = backend.get(&stored.key).await.unwrap();
        assert_eq!(content, Bytes::from_static(b"hello"));
        assert_eq!(content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_folder_before_writing() {
        let backend = Arc::new(MemoryStorage::new());
        let storage = service(backend.clone());

        let result = storage
            .upload(Bytes::from_static(b"data"), "../secrets", Some("a.txt"), "text/plain")
            .await;

        assert!(matches!(result, Err(StorageError::InvalidFolder { .. })));
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_failure_surfaces_as_upload_error() {
        let backend = Arc::new(MemoryStorage::failing());
        let storage = service(backend);

        let result = storage
            .upload(Bytes::from_static(b"data"), "files", Some("a.txt"), "text/plain")
            .await;

        assert!(matches!(result, Err(StorageError::Upload { .. })));
    }

    #[test_log::test(tokio::test)]
    async fn test_presign_failure_after_put_is_presign_error() {
        let backend = Arc::new(MemoryStorage::failing_presign());
        let storage = service(backend.clone());

        let result = storage
            .upload(Bytes::from_static(b"data"), "files", Some("a.txt"), "text/plain")
            .await;

        assert!(matches!(result, Err(StorageError::Presign { .. })));
        // The object was written before presigning failed and is left behind
        assert_eq!(backend.len().await, 1);
    }

    #[test]
    fn test_public_url() {
        let storage = service(Arc::new(MemoryStorage::new()));
        assert_eq!(
            storage.public_url("files/abc.png").as_deref(),
            Some("https://cdn.example.com/files/abc.png")
        );

        let storage = StorageService::new(Arc::new(MemoryStorage::new()), &StorageConfig::default());
        assert_eq!(storage.public_url("files/abc.png"), None);
    }
}
