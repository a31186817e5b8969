//! Corpus seeding from an already-parsed JSON vocabulary file.
//!
//! The file is an array of `{ hebrew, rank, english, transliteration }`
//! objects; `english` and `transliteration` may be a string or a list, and an
//! optional `id` overrides the position-based id.

use std::path::Path;

use serde::Deserialize;
use spellbrew_algo::types::one_or_many;
use spellbrew_algo::{Word, WordId};

use crate::store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid vocabulary json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
struct VocabEntry {
    #[serde(default)]
    id: Option<WordId>,
    hebrew: String,
    #[serde(default)]
    rank: Option<i64>,
    #[serde(default, deserialize_with = "one_or_many")]
    english: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    transliteration: Vec<String>,
}

/// Parse vocabulary JSON into corpus words. Entries with a blank script form
/// are dropped; a missing rank sorts last.
pub fn parse_vocab(json: &str) -> Result<Vec<Word>, SeedError> {
    let entries: Vec<VocabEntry> = serde_json::from_str(json)?;
    let words = entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let hebrew = entry.hebrew.trim().to_string();
            if hebrew.is_empty() {
                tracing::debug!(index = idx, "skipping vocabulary entry without script form");
                return None;
            }
            Some(Word {
                id: entry.id.unwrap_or(idx as WordId + 1),
                hebrew,
                english: entry.english,
                transliteration: entry.transliteration,
                rank: entry.rank.unwrap_or(i64::MAX),
            })
        })
        .collect();
    Ok(words)
}

/// Load `path` into the store unless the corpus already has words.
/// Returns the number of words inserted.
pub async fn seed_corpus(store: &Store, path: &Path) -> Result<usize, SeedError> {
    let existing = store.count_words().await?;
    if existing > 0 {
        tracing::debug!(existing, "corpus already seeded");
        return Ok(0);
    }

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let words = parse_vocab(&raw)?;
    let inserted = store.insert_words(&words).await?;
    tracing::info!(
        path = %path.display(),
        parsed = words.len(),
        inserted,
        "seeded vocabulary corpus"
    );
    Ok(inserted)
}
