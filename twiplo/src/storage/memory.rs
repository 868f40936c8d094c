//! In-memory storage backend for tests.

use super::ObjectStorage;
use super::errors::{Result, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// Keeps objects in a map; presigned URLs use a `memory://` scheme.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<String, (Bytes, String)>>,
    fail_puts: bool,
    fail_presigns: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every `put` fails, for exercising upstream error paths
    pub fn failing() -> Self {
        Self {
            fail_puts: true,
            ..Self::default()
        }
    }

    /// A backend that stores objects but cannot presign them
    pub fn failing_presign() -> Self {
        Self {
            fail_presigns: true,
            ..Self::default()
        }
    }

    /// Stored content and content type for `key`
    pub async fn get(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        if self.fail_puts {
            return Err(StorageError::Upload {
                key: key.to_string(),
                message: "memory backend configured to fail".to_string(),
            });
        }
        self.objects
            .write()
            .await
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        if self.fail_presigns {
            return Err(StorageError::Presign {
                key: key.to_string(),
                message: "memory backend configured to fail".to_string(),
            });
        }
        Ok(format!("memory://test-bucket/{key}?expires_in={}", expires_in.as_secs()))
    }
}
