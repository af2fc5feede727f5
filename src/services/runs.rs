use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;

use crate::models::runs::{ErrorResponse, RunOutcome};
use crate::state::AppState;
use crate::utils::error_report::error_chain;

pub async fn trigger_run(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<RunOutcome>), (StatusCode, Json<ErrorResponse>)> {
    info!(target: "cron", "🔔 Pipeline run requested over HTTP");

    match state.pipeline.run().await {
        Ok(outcome @ RunOutcome::LockContended) => Ok((StatusCode::CONFLICT, Json(outcome))),
        Ok(outcome) => Ok((StatusCode::OK, Json(outcome))),
        Err(e) => Err((
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: error_chain(&e),
            }),
        )),
    }
}

pub async fn clear_lock(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.pipeline.clear_lock().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_failure(e),
    }
}

pub async fn clear_processed(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.pipeline.clear_processed().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_failure(e),
    }
}

fn store_failure(e: crate::store::StoreError) -> axum::response::Response {
    tracing::error!("❌ Store operation failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}
