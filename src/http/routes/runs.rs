use crate::middleware::api_key::api_key_auth;
use crate::services::runs::{clear_lock, clear_processed, trigger_run};
use crate::state::AppState;

use axum::{
    middleware,
    routing::{delete, post},
    Router,
};
use std::sync::Arc;

pub fn routes(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/runs", post(trigger_run))
        .route("/v1/lock", delete(clear_lock))
        .route("/v1/processed", delete(clear_processed))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            api_key_auth,
        ))
        .with_state(app_state)
}
