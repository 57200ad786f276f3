use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "skip-trace",
        "version": env!("CARGO_PKG_VERSION"),
        "data_source": state.source.name(),
    }))
}
