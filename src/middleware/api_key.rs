use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::warn;

use crate::models::runs::ErrorResponse;
use crate::state::AppState;

pub async fn api_key_auth(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let expected_key = &state.config.auth.x_api_key;

    let provided_key = req.headers().get("x-api-key").and_then(|v| v.to_str().ok());

    match provided_key {
        Some(key) if !expected_key.is_empty() && key == expected_key => next.run(req).await,
        _ => {
            warn!(path = %req.uri().path(), "🔒 Rejected request with invalid X-API-KEY");
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing X-API-KEY".to_string(),
                }),
            )
                .into_response()
        }
    }
}
