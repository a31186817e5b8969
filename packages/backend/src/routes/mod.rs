mod health;
mod progress;
mod words;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::{json_error, AppError};
use crate::state::AppState;

/// Largest batch a single request may ask for.
pub const MAX_COUNT: i64 = 200;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .route("/api/words", get(words::random_words))
        .route("/api/word", get(words::random_word))
        .route("/api/words/user", get(words::user_words))
        .route("/api/progress", get(progress::snapshot))
        .route("/api/progress/list", get(progress::list))
        .route("/api/progress/batch", post(progress::record_batch))
        .route("/api/progress/ensure", post(progress::ensure_minimum))
        .route("/api/progress/auto-manage", post(progress::auto_manage))
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "route not found").into_response()
}

/// Parse an optional count parameter; absent means `default`, anything
/// non-positive or unparsable is rejected.
pub(crate) fn parse_count(raw: Option<&str>, default: usize) -> Result<usize, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    let value: i64 = raw
        .parse()
        .map_err(|_| AppError::validation(format!("count must be an integer, got {raw:?}")))?;
    if value <= 0 {
        return Err(AppError::validation("count must be positive"));
    }
    Ok(value.min(MAX_COUNT) as usize)
}
