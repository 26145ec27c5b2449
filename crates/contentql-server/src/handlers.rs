use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::json;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

#[derive(Serialize)]
pub struct ReadyResponse<'a> {
    status: &'a str,
    generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "contentql",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Ready once a schema snapshot is published.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let live = &state.graphql.live;
    if live.is_ready() {
        let body = ReadyResponse {
            status: "ready",
            generation: live.generation(),
            error: None,
        };
        (StatusCode::OK, Json(body))
    } else {
        let body = ReadyResponse {
            status: "not-ready",
            generation: 0,
            error: live.last_error().await,
        };
        (StatusCode::SERVICE_UNAVAILABLE, Json(body))
    }
}
