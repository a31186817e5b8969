use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use spellbrew_algo::Word;

use crate::auth::AuthUser;
use crate::response::{AppError, SuccessResponse};
use crate::services::scheduling::SessionBatch;
use crate::state::AppState;

use super::parse_count;

const RANDOM_DEFAULT: usize = 10;
const SESSION_DEFAULT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    count: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomWordsResponse {
    words: Vec<String>,
    total_available: usize,
    details: Vec<Word>,
}

pub async fn random_words(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> Result<Json<SuccessResponse<RandomWordsResponse>>, AppError> {
    let count = parse_count(query.count.as_deref(), RANDOM_DEFAULT)?;
    let details = state.scheduler().random_words(count);
    Ok(SuccessResponse::new(RandomWordsResponse {
        words: details.iter().map(|w| w.hebrew.clone()).collect(),
        total_available: state.scheduler().corpus().len(),
        details,
    }))
}

pub async fn random_word(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<Word>>, AppError> {
    state
        .scheduler()
        .random_words(1)
        .into_iter()
        .next()
        .map(SuccessResponse::new)
        .ok_or_else(|| AppError::not_found("corpus is empty"))
}

pub async fn user_words(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CountQuery>,
) -> Result<Json<SuccessResponse<SessionBatch>>, AppError> {
    let count = parse_count(query.count.as_deref(), SESSION_DEFAULT)?;
    let batch = state.scheduler().select_batch(&user.id, count).await?;
    Ok(SuccessResponse::new(batch))
}
