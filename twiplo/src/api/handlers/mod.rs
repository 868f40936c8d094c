//! HTTP request handlers.
//!
//! - [`health`]: liveness probe
//! - [`files`]: file upload to object storage and metadata listing
//!
//! Protected handlers take an [`crate::auth::ApiToken`] argument, which rejects the request with
//! `401` before the handler body runs. Handlers return [`crate::errors::Error`], which maps onto
//! status codes and safe client messages.

pub mod files;
pub mod health;
