//! Repository implementations for database tables.
//!
//! Each repository borrows a `PgConnection` (a pooled connection or an open transaction) and
//! exposes the queries for one table.
//!
//! - [`file_assets`]: create, fetch and list uploaded file metadata

pub mod file_assets;
pub mod repository;

pub use file_assets::FileAssets;
pub use repository::Repository;
