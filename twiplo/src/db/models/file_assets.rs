use crate::types::FileAssetId;
use chrono::{DateTime, Utc};

/// A row of `file_assets`: metadata for one uploaded object
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileAsset {
    pub id: FileAssetId,
    /// Filename as sent by the client
    pub filename: String,
    /// Storage key, unique per bucket
    pub key: String,
    pub folder: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub alt_text: Option<String>,
    /// Presigned URL returned by the storage adapter at upload time
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Database request for recording a new upload
#[derive(Debug, Clone)]
pub struct FileAssetCreateDBRequest {
    pub filename: String,
    pub key: String,
    pub folder: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub alt_text: Option<String>,
    pub url: String,
}

/// Filter for listing file assets, newest first
#[derive(Debug, Clone)]
pub struct FileAssetFilter {
    /// Only rows whose key lives under this folder
    pub folder: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

impl FileAssetFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { folder: None, skip, limit }
    }

    pub fn with_folder(mut self, folder: String) -> Self {
        self.folder = Some(folder);
        self
    }
}
