//! Informational root endpoint

use axum::{
    Json,
    extract::Query,
    extract::State as AxumState,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;

use crate::SharedState;

pub const WEBHOOK_PATH: &str = "/postreceive";
pub const SUPPORTED_EVENTS: [&str; 3] = ["ping", "pull_request", "push"];

/// Root liveness endpoint listing the webhook endpoint and supported events.
/// Supports ?format=json for a JSON response
pub async fn root(
    AxumState(state): AxumState<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let uptime_seconds = (Utc::now() - state.started_at).num_seconds();

    if params.get("format").map(|s| s.as_str()) == Some("json") {
        Json(json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "started_at": state.started_at.to_rfc3339(),
            "uptime_seconds": uptime_seconds,
            "webhook_endpoint": WEBHOOK_PATH,
            "supported_events": SUPPORTED_EVENTS,
            "status": "healthy"
        }))
        .into_response()
    } else {
        format!(
            "{} {} - healthy (up {}s)\nPOST {} accepts GitHub events: {}\n",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            uptime_seconds,
            WEBHOOK_PATH,
            SUPPORTED_EVENTS.join(", ")
        )
        .into_response()
    }
}
