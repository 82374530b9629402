//! GET /health — probes the configured chat and embedding providers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use llm_service::HealthStatus;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

/// Handler: GET /health
///
/// Always answers. Returns 200 when every probed profile is reachable
/// and 503 otherwise, with per-profile detail in the body.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let statuses: Vec<HealthStatus> = state.llm_profiles.health_all().await;
    let all_ok = statuses.iter().all(|s| s.ok);

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    ApiResponse::success(statuses).into_response_with_status(status)
}
