//! Liveness probe.

use axum::Json;
use axum::extract::State;
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /healthcheck
pub async fn healthcheck(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "uptime": state.started_at.elapsed().as_secs_f64(),
    }))
}
