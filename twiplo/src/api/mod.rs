//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! All routes live under `/api/v1`:
//!
//! - `GET /health`: liveness probe, touches neither the database nor storage
//! - `POST /base/files`: multipart upload, requires the API token
//! - `GET /base/files`: paginated listing, requires the API token and is only mounted in the
//!   `local` environment
//!
//! # OpenAPI Documentation
//!
//! Endpoints are documented with `utoipa`. The document is served at `/api/v1/openapi.json` and
//! rendered at `/docs`.

pub mod handlers;
pub mod models;
