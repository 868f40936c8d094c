//! Database repository for uploaded file metadata.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::file_assets::{FileAsset, FileAssetCreateDBRequest, FileAssetFilter},
    },
    types::{FileAssetId, abbrev_uuid},
};

const COLUMNS: &str = "id, filename, key, folder, content_type, size_bytes, alt_text, url, created_at";

/// Folder filters match on the key prefix, so `docs` never matches `docs-archive/...`
fn folder_prefix(filter: &FileAssetFilter) -> Option<String> {
    filter.folder.as_ref().map(|folder| format!("{folder}/"))
}

pub struct FileAssets<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for FileAssets<'c> {
    type CreateRequest = FileAssetCreateDBRequest;
    type Response = FileAsset;
    type Id = FileAssetId;
    type Filter = FileAssetFilter;

    #[instrument(skip(self, request), fields(key = %request.key, size_bytes = request.size_bytes), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            INSERT INTO file_assets (filename, key, folder, content_type, size_bytes, alt_text, url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        );

        let asset = sqlx::query_as::<_, FileAsset>(&query)
            .bind(&request.filename)
            .bind(&request.key)
            .bind(&request.folder)
            .bind(&request.content_type)
            .bind(request.size_bytes)
            .bind(&request.alt_text)
            .bind(&request.url)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(asset)
    }

    #[instrument(skip(self), fields(file_asset_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {COLUMNS} FROM file_assets WHERE id = $1");

        let asset = sqlx::query_as::<_, FileAsset>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(asset)
    }

    #[instrument(skip(self, filter), fields(folder = ?filter.folder, limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!(
            r#"
            SELECT {COLUMNS} FROM file_assets
            WHERE ($1::text IS NULL OR starts_with(key, $1))
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let assets = sqlx::query_as::<_, FileAsset>(&query)
            .bind(folder_prefix(filter))
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(assets)
    }
}

impl<'c> FileAssets<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Count rows matching `filter`, ignoring its skip/limit
    #[instrument(skip(self, filter), fields(folder = ?filter.folder), err)]
    pub async fn count(&mut self, filter: &FileAssetFilter) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM file_assets WHERE ($1::text IS NULL OR starts_with(key, $1))")
            .bind(folder_prefix(filter))
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use sqlx::PgPool;

    fn request(folder: &str, name: &str) -> FileAssetCreateDBRequest {
        let key = format!("{folder}/{}-{name}", uuid::Uuid::new_v4());
        FileAssetCreateDBRequest {
            filename: name.to_string(),
            url: format!("https://bucket.example.com/{key}?X-Amz-Signature=abc"),
            key,
            folder: folder.to_string(),
            content_type: "image/png".to_string(),
            size_bytes: 1234,
            alt_text: Some("A test image".to_string()),
        }
    }

    #[sqlx::test]
    async fn test_create_and_get(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = FileAssets::new(&mut conn);

        let req = request("avatars", "me.png");
        let created = repo.create(&req).await.unwrap();

        assert_eq!(created.key, req.key);
        assert_eq!(created.filename, "me.png");
        assert_eq!(created.folder, "avatars");
        assert_eq!(created.size_bytes, 1234);
        assert_eq!(created.alt_text.as_deref(), Some("A test image"));

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.url, req.url);

        assert!(repo.get_by_id(uuid::Uuid::new_v4()).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_duplicate_key_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = FileAssets::new(&mut conn);

        let req = request("files", "a.txt");
        repo.create(&req).await.unwrap();

        let err = repo.create(&req).await.unwrap_err();
        match err {
            DbError::UniqueViolation { table, .. } => assert_eq!(table.as_deref(), Some("file_assets")),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    async fn test_negative_size_is_check_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = FileAssets::new(&mut conn);

        let mut req = request("files", "a.txt");
        req.size_bytes = -1;

        let err = repo.create(&req).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[sqlx::test]
    async fn test_list_newest_first_with_pagination(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = FileAssets::new(&mut conn);

        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(repo.create(&request("files", &format!("{i}.txt"))).await.unwrap().id);
        }

        let page = repo.list(&FileAssetFilter::new(0, 2)).await.unwrap();
        assert_eq!(page.iter().map(|a| a.id).collect::<Vec<_>>(), vec![ids[4], ids[3]]);

        let page = repo.list(&FileAssetFilter::new(4, 2)).await.unwrap();
        assert_eq!(page.iter().map(|a| a.id).collect::<Vec<_>>(), vec![ids[0]]);

        assert_eq!(repo.count(&FileAssetFilter::new(0, 2)).await.unwrap(), 5);
    }

    #[sqlx::test]
    async fn test_list_filters_by_folder_prefix(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = FileAssets::new(&mut conn);

        repo.create(&request("docs", "a.pdf")).await.unwrap();
        repo.create(&request("docs/2024", "b.pdf")).await.unwrap();
        repo.create(&request("docs_archive", "c.pdf")).await.unwrap();
        repo.create(&request("images", "d.png")).await.unwrap();

        let filter = FileAssetFilter::new(0, 10).with_folder("docs".to_string());
        let docs = repo.list(&filter).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|a| a.key.starts_with("docs/")));
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        let filter = FileAssetFilter::new(0, 10).with_folder("images".to_string());
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
    }
}
