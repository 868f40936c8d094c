use crate::AppState;
use crate::api::models::files::{FileAssetResponse, ListFileAssetsQuery};
use crate::api::models::pagination::{PaginatedResponse, Pagination};
use crate::auth::ApiToken;
use crate::db::handlers::{FileAssets, Repository};
use crate::db::models::file_assets::{FileAssetCreateDBRequest, FileAssetFilter};
use crate::errors::{Error, Result};
use crate::storage::normalize_folder;
use axum::{
    Json,
    extract::{Multipart, Query, State, multipart::MultipartError},
    http::StatusCode,
};
use bytes::{Bytes, BytesMut};

/// Content type used when neither the client nor the filename tells us anything
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// The `file` part of an upload, fully buffered
struct ReceivedFile {
    filename: String,
    content_type: Option<String>,
    body: Bytes,
}

fn multipart_error(e: MultipartError, context: &str) -> Error {
    // The route body limit surfaces here as a multipart error rather than a rejection
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return Error::PayloadTooLarge {
            message: "Request body exceeds the maximum upload size".to_string(),
        };
    }
    Error::BadRequest {
        message: format!("{context}: {}", e.body_text()),
    }
}

fn too_large(max_file_size: u64) -> Error {
    Error::PayloadTooLarge {
        message: format!(
            "File size exceeds maximum allowed size of {} bytes ({} MB)",
            max_file_size,
            max_file_size / (1024 * 1024)
        ),
    }
}

/// Declared content type, else a guess from the filename, else octet-stream
fn resolve_content_type(declared: Option<&str>, filename: &str) -> String {
    declared
        .map(str::trim)
        .filter(|ct| !ct.is_empty() && *ct != FALLBACK_CONTENT_TYPE)
        .map(str::to_string)
        .or_else(|| mime_guess::from_path(filename).first_raw().map(str::to_string))
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[utoipa::path(
    post,
    path = "/base/files",
    tag = "files",
    summary = "Upload file",
    description = "Upload a file to object storage and record its metadata. \
        Fields: `file` (required), `alt_text` (optional), `folder` (optional, defaults to `files`).",
    request_body(
        content_type = "multipart/form-data",
        description = "File upload with optional alt text and target folder"
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = FileAssetResponse),
        (status = 400, description = "Missing or empty file, invalid folder, or malformed multipart body"),
        (status = 401, description = "Missing or invalid API token"),
        (status = 413, description = "Payload too large"),
        (status = 502, description = "Object storage failure"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
pub async fn upload_file(
    State(state): State<AppState>,
    _token: ApiToken,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileAssetResponse>)> {
    let max_file_size = state.config.files.max_file_size;

    let mut file: Option<ReceivedFile> = None;
    let mut alt_text: Option<String> = None;
    let mut folder: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to parse multipart data"))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(Error::BadRequest {
                        message: "Only one file may be uploaded per request".to_string(),
                    });
                }

                let filename = field
                    .file_name()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or("file")
                    .to_string();
                let content_type = field.content_type().map(str::to_string);

                // Abort as soon as the limit is crossed instead of buffering the whole part
                let mut body = BytesMut::new();
                while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, "Failed to read file chunk"))? {
                    if (body.len() + chunk.len()) as u64 > max_file_size {
                        tracing::debug!(filename = %filename, max_file_size, "Rejecting oversized upload");
                        return Err(too_large(max_file_size));
                    }
                    body.extend_from_slice(&chunk);
                }

                file = Some(ReceivedFile {
                    filename,
                    content_type,
                    body: body.freeze(),
                });
            }
            "alt_text" => {
                let text = field.text().await.map_err(|e| multipart_error(e, "Failed to read alt_text"))?;
                alt_text = non_empty(text);
            }
            "folder" => {
                let text = field.text().await.map_err(|e| multipart_error(e, "Failed to read folder"))?;
                folder = non_empty(text);
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let file = file.ok_or_else(|| Error::BadRequest {
        message: "No file uploaded".to_string(),
    })?;

    if file.body.is_empty() {
        return Err(Error::BadRequest {
            message: "Uploaded file is empty".to_string(),
        });
    }

    let folder = folder.unwrap_or_else(|| state.config.files.default_folder.clone());
    let content_type = resolve_content_type(file.content_type.as_deref(), &file.filename);

    let stored = state
        .storage
        .upload(file.body, &folder, Some(&file.filename), &content_type)
        .await?;

    let request = FileAssetCreateDBRequest {
        filename: file.filename,
        key: stored.key.clone(),
        folder: stored.folder.clone(),
        content_type,
        size_bytes: stored.size_bytes,
        alt_text,
        url: stored.url.clone(),
    };

    let mut pool_conn = state.db.acquire().await.map_err(|e| {
        tracing::error!(key = %stored.key, error = %e, "Object stored but database unavailable; object is orphaned");
        Error::Database(e.into())
    })?;
    let mut repo = FileAssets::new(&mut pool_conn);

    let asset = repo.create(&request).await.map_err(|e| {
        tracing::error!(key = %stored.key, error = %e, "Object stored but metadata insert failed; object is orphaned");
        Error::Database(e)
    })?;

    tracing::info!(file_asset_id = %asset.id, key = %asset.key, size_bytes = asset.size_bytes, "File uploaded");

    let public_url = state.storage.public_url(&asset.key);
    Ok((StatusCode::CREATED, Json(FileAssetResponse::from_db(asset, Some(stored.url), public_url))))
}

#[utoipa::path(
    get,
    path = "/base/files",
    tag = "files",
    summary = "List files",
    description = "Returns uploaded files, newest first. Only available in the local environment.",
    responses(
        (status = 200, description = "Page of files", body = PaginatedResponse<FileAssetResponse>),
        (status = 400, description = "Invalid folder"),
        (status = 401, description = "Missing or invalid API token"),
        (status = 405, description = "Listing is disabled outside the local environment"),
        (status = 500, description = "Internal server error")
    ),
    params(
        Pagination,
        ListFileAssetsQuery
    ),
    security(("BearerAuth" = []))
)]
pub async fn list_files(
    State(state): State<AppState>,
    _token: ApiToken,
    Query(pagination): Query<Pagination>,
    Query(query): Query<ListFileAssetsQuery>,
) -> Result<Json<PaginatedResponse<FileAssetResponse>>> {
    let mut filter = FileAssetFilter::new(pagination.offset(), pagination.page_size());
    if let Some(folder) = query.folder.filter(|f| !f.trim().is_empty()) {
        filter = filter.with_folder(normalize_folder(&folder)?);
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = FileAssets::new(&mut pool_conn);

    let total = repo.count(&filter).await?;
    let assets = repo.list(&filter).await?;

    let mut items = Vec::with_capacity(assets.len());
    for asset in assets {
        // Fall back to the URL stored at upload time if presigning fails
        let url = match state.storage.presigned_url(&asset.key).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(key = %asset.key, error = %e, "Failed to presign URL for listing");
                None
            }
        };
        let public_url = state.storage.public_url(&asset.key);
        items.push(FileAssetResponse::from_db(asset, url, public_url));
    }

    Ok(Json(PaginatedResponse::new(items, &pagination, total)))
}
