use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    store: &'static str,
    database: &'static str,
    words: usize,
    strategy: &'static str,
    uptime: u64,
    timestamp: String,
}

#[derive(Serialize)]
struct LivenessResponse {
    status: &'static str,
    uptime: u64,
    timestamp: String,
}

async fn root(State(state): State<AppState>) -> Response {
    let scheduler = state.scheduler();
    let connected = match scheduler.store().ping().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "store health check failed");
            false
        }
    };

    let response = HealthResponse {
        status: if connected { "ok" } else { "degraded" },
        store: scheduler.store().kind().as_str(),
        database: if connected { "connected" } else { "disconnected" },
        words: scheduler.corpus().len(),
        strategy: scheduler.strategy_name(),
        uptime: state.uptime_seconds(),
        timestamp: now_iso(),
    };

    let status_code = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "healthy",
        uptime: state.uptime_seconds(),
        timestamp: now_iso(),
    })
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
