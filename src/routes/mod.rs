pub mod health;
pub mod traces;

use axum::Router;
use axum::routing::{get, post};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/traces", post(traces::create_trace))
        .with_state(state)
}
