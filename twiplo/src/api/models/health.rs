use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness probe payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub message: String,
}
