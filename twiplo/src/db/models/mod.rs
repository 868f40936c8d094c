//! Database record models matching table schemas.
//!
//! Models derive `sqlx::FromRow` and are kept separate from the API models in
//! [`crate::api::models`], so storage and wire representations can evolve independently.
//!
//! - [`file_assets`]: metadata rows for uploaded objects

pub mod file_assets;
