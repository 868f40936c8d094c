use crate::{
    AppState,
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::instrument;

/// Marker extractor: present only when the request carried the configured API token.
#[derive(Debug, Clone, Copy)]
pub struct ApiToken;

fn unauthenticated(message: &str) -> Error {
    Error::Unauthenticated {
        message: Some(message.to_string()),
    }
}

/// Pull the bearer token out of the `Authorization` header
fn bearer_token(parts: &Parts) -> Result<&str> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| unauthenticated("Missing authorization token"))?;

    let value = header.to_str().map_err(|_| unauthenticated("Invalid authorization header"))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthenticated("Authorization header must use the Bearer scheme"))
}

impl FromRequestParts<AppState> for ApiToken {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // With no token configured, nothing can authenticate
        let Some(expected) = state.config.api_authorization_token.as_deref().filter(|t| !t.is_empty()) else {
            tracing::warn!("Rejecting protected request: API_AUTHORIZATION_TOKEN is not configured");
            return Err(unauthenticated("Invalid authorization token"));
        };

        let provided = bearer_token(parts)?;
        if provided != expected {
            return Err(unauthenticated("Invalid authorization token"));
        }

        Ok(ApiToken)
    }
}
