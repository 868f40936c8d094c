//! Test helpers for building application state without a real bucket.

use crate::{
    AppState,
    config::{Config, DatabaseConfig, Environment, FilesConfig, PoolSettings, StorageConfig},
    storage::{MemoryStorage, StorageService},
};
use axum::Router;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};

pub const TEST_API_TOKEN: &str = "test-api-token";

/// Upload limit used by [`create_test_config`], small enough to exceed in a test body
pub const TEST_MAX_FILE_SIZE: u64 = 1024 * 1024;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: Environment::Local,
        database: DatabaseConfig {
            // Will get overridden by the sqlx::test pool
            url: "postgres://localhost/twiplo_test".to_string(),
            pool: PoolSettings {
                max_connections: 1,
                min_connections: 0,
                ..Default::default()
            },
        },
        api_authorization_token: Some(TEST_API_TOKEN.to_string()),
        storage: StorageConfig {
            bucket_name: "test-bucket".to_string(),
            access_key_id: "test-access-key".to_string(),
            secret_access_key: "test-secret-key".to_string(),
            presign_expiry: Duration::from_secs(3600),
            ..Default::default()
        },
        files: FilesConfig {
            max_file_size: TEST_MAX_FILE_SIZE,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A pool that never connects, for tests whose requests are rejected before touching the database
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(100))
        .connect_lazy("postgres://localhost:1/unreachable")
        .expect("Failed to build lazy pool")
}

pub fn create_test_state(pool: PgPool, config: Config) -> AppState {
    create_test_state_with_storage(pool, config, Arc::new(MemoryStorage::new()))
}

pub fn create_test_state_with_storage(pool: PgPool, config: Config, backend: Arc<MemoryStorage>) -> AppState {
    let storage = StorageService::new(backend, &config.storage);
    AppState::builder().db(pool).config(config).storage(storage).build()
}

pub fn create_test_router(state: &AppState) -> Router {
    crate::build_router(state).expect("Failed to build router")
}

pub fn auth_header() -> (String, String) {
    ("authorization".to_string(), format!("Bearer {TEST_API_TOKEN}"))
}
