use crate::db::models::file_assets::FileAsset;
use crate::types::FileAssetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing file assets (in addition to pagination)
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListFileAssetsQuery {
    /// Only return files stored under this folder
    pub folder: Option<String>,
}

/// Serialized file asset, as returned by upload and listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileAssetResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: FileAssetId,
    /// Original filename sent by the client
    pub filename: String,
    /// Storage key inside the bucket
    pub key: String,
    pub folder: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub alt_text: Option<String>,
    /// Time-limited presigned GET URL
    pub url: String,
    /// Permanent URL, present when the bucket has a public domain configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FileAssetResponse {
    /// Build a response from a row, overriding its stored URL with a freshly presigned one
    pub fn from_db(asset: FileAsset, url: Option<String>, public_url: Option<String>) -> Self {
        Self {
            id: asset.id,
            filename: asset.filename,
            key: asset.key,
            folder: asset.folder,
            content_type: asset.content_type,
            size_bytes: asset.size_bytes,
            alt_text: asset.alt_text,
            url: url.unwrap_or(asset.url),
            public_url,
            created_at: asset.created_at,
        }
    }
}
