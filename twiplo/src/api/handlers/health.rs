use crate::api::models::health::HealthResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check",
    description = "Liveness probe. Does not touch the database or object storage.",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse),
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Healthy".to_string(),
    })
}
