use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::response::{AppError, SuccessResponse};
use crate::services::progress::{ProgressQuery, ProgressRow};
use crate::services::scheduling::{
    AutoManageResult, EnsureResult, OutcomeInput, OutcomeResult, ProgressSnapshot,
};
use crate::state::AppState;

use super::MAX_COUNT;

const ENSURE_DEFAULT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    results: Vec<OutcomeInput>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    updated: usize,
    results: Vec<OutcomeResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnsureRequest {
    min: Option<i64>,
}

/// Raw list parameters; unknown values fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    sort_by: Option<String>,
    sort_dir: Option<String>,
    progress: Option<String>,
    new_within_hours: Option<String>,
}

impl ListParams {
    fn into_query(self) -> ProgressQuery {
        ProgressQuery {
            sort_by: self
                .sort_by
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            sort_dir: self
                .sort_dir
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            filter: self
                .progress
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            new_within_hours: self
                .new_within_hours
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|h| h.is_finite() && *h > 0.0),
        }
    }
}

#[derive(Serialize)]
pub struct ListResponse {
    progress: Vec<ProgressRow>,
}

pub async fn snapshot(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SuccessResponse<ProgressSnapshot>>, AppError> {
    let snapshot = state.scheduler().progress(&user.id).await?;
    Ok(SuccessResponse::new(snapshot))
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<SuccessResponse<ListResponse>>, AppError> {
    let query = params.into_query();
    let progress = state.scheduler().progress_list(&user.id, &query).await?;
    Ok(SuccessResponse::new(ListResponse { progress }))
}

pub async fn record_batch(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse<BatchResponse>>, AppError> {
    let Json(request) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let results = state
        .scheduler()
        .record_outcomes(&user.id, &request.results)
        .await?;
    Ok(SuccessResponse::new(BatchResponse {
        updated: results.iter().filter(|r| r.is_updated()).count(),
        results,
    }))
}

pub async fn ensure_minimum(
    State(state): State<AppState>,
    user: AuthUser,
    body: Bytes,
) -> Result<Json<SuccessResponse<EnsureResult>>, AppError> {
    // an absent body means the default; anything else must parse
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        EnsureRequest::default()
    } else {
        serde_json::from_slice::<EnsureRequest>(&body)
            .map_err(|err| AppError::bad_request(format!("invalid request body: {err}")))?
    };
    let minimum = request.min.unwrap_or(ENSURE_DEFAULT);
    if minimum <= 0 {
        return Err(AppError::validation("min must be positive"));
    }
    let result = state
        .scheduler()
        .ensure_minimum_active(&user.id, minimum.min(MAX_COUNT) as usize)
        .await?;
    Ok(SuccessResponse::new(result))
}

pub async fn auto_manage(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SuccessResponse<AutoManageResult>>, AppError> {
    let result = state.scheduler().auto_manage(&user.id).await?;
    Ok(SuccessResponse::new(result))
}
