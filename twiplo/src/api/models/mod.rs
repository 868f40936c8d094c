//! API request and response data models.
//!
//! These structures define the public API contract. They are distinct from the database models
//! in [`crate::db::models`] and carry `utoipa` annotations for the generated OpenAPI document.
//!
//! - [`files`]: file asset responses and listing filters
//! - [`health`]: liveness probe payload
//! - [`pagination`]: page-numbered pagination parameters and metadata

pub mod files;
pub mod health;
pub mod pagination;
