pub mod runs;

use crate::models::runs::HealthResponse;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let redis_ok = match state.redis_pool.get().await {
        Ok(mut conn) => redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok(),
        Err(_) => false,
    };

    let (code, status) = if redis_ok {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "REDIS_UNAVAILABLE")
    };

    (
        code,
        Json(HealthResponse {
            status,
            timestamp: Utc::now().to_rfc3339(),
        }),
    )
}

pub fn create_routes(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/", get(health_check))
        .with_state(app_state.clone())
        .nest("/api", runs::routes(app_state))
        .layer(cors)
}
