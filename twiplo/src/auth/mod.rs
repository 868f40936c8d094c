//! Request authorization.
//!
//! Protected endpoints require the shared secret from `API_AUTHORIZATION_TOKEN`, passed as
//! `Authorization: Bearer <token>`. Handlers opt in by taking an [`ApiToken`] argument. There are
//! no sessions, expiry or rotation: the token is compared as-is on every request.

pub mod api_token;

pub use api_token::ApiToken;
