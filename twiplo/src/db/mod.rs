//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! ## Example Usage
//!
//! ```ignore
//! use twiplo::db::handlers::{FileAssets, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = FileAssets::new(&mut conn);
//!
//!     let asset = repo.create(&create_request).await?;
//!     println!("Stored {} at {}", asset.filename, asset.key);
//!     Ok(())
//! }
//! ```
//!
//! # Schema
//!
//! The schema lives in `migrations/` and is applied out-of-band with `twiplo --migrate` (or
//! `sqlx migrate run`). Local environments also apply it on startup.

pub mod errors;
pub mod handlers;
pub mod models;

use crate::config::DatabaseConfig;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

/// Build the main connection pool from [`DatabaseConfig`].
///
/// Connections are opened lazily on first use.
pub fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = &config.pool;
    let mut options = PgPoolOptions::new()
        .max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs));

    if pool.idle_timeout_secs > 0 {
        options = options.idle_timeout(Duration::from_secs(pool.idle_timeout_secs));
    }
    if pool.max_lifetime_secs > 0 {
        options = options.max_lifetime(Duration::from_secs(pool.max_lifetime_secs));
    }

    options.connect_lazy(&config.url)
}
