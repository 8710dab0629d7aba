use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "service": "medspa-booking",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": state.clock.now(),
    }))
}
