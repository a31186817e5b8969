//! Priority/Selection Engine
//!
//! Builds the ordered batch of words for one session from a user's progress
//! records and the shared corpus. Each scheme is a named
//! [`SelectionStrategy`] that can be tested on its own:
//!
//! - [`ColdStartStrategy`] - most frequent corpus words for a user without history
//! - [`ReviewDueStrategy`] - due words by ascending retrievability, backfilled with new words
//! - [`PriorityScoreStrategy`] - heuristic priority score, reserved new-word slots, shuffled
//!
//! Every selected word carries a display time from the context's
//! [`DisplayTimePolicy`].

pub mod display;
pub mod priority;
pub mod review_due;
pub mod stats;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::memory::MemoryModel;
use crate::types::{ProgressRecord, Word};

pub use display::DisplayTimePolicy;
pub use priority::{word_priority, PriorityConfig, PriorityScoreStrategy, WordPriority};
pub use review_due::{ColdStartStrategy, ReviewDueStrategy};
pub use stats::{learning_stats, LearningStats};

// ==================== Data Structures ====================

/// Everything a strategy may look at.
#[derive(Clone, Copy, Debug)]
pub struct SelectionContext<'a> {
    pub user_id: &'a str,
    pub corpus: &'a Corpus,
    pub progress: &'a [ProgressRecord],
    /// Model used to derive live retrievability
    pub model: &'a MemoryModel,
    pub now: DateTime<Utc>,
    pub display: DisplayTimePolicy,
}

/// One word of a session batch with its scheduling annotations.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionWord {
    pub word: Word,
    /// Existing record, or the seed record the word would be introduced with
    pub progress: ProgressRecord,
    /// True when the user had no record for this word
    pub is_new: bool,
    /// Live retrievability at selection time
    pub retrievability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<WordPriority>,
    /// `None` means unlimited
    pub display_time_ms: Option<u32>,
}

impl SessionWord {
    pub(crate) fn existing(ctx: &SelectionContext<'_>, word: &Word, record: &ProgressRecord) -> Self {
        Self {
            word: word.clone(),
            progress: record.clone(),
            is_new: false,
            retrievability: ctx.model.current_retrievability(record, ctx.now),
            priority: None,
            display_time_ms: ctx.display.display_time_ms(record),
        }
    }

    pub(crate) fn fresh(ctx: &SelectionContext<'_>, word: &Word) -> Self {
        let record = ProgressRecord::seed(ctx.user_id, word.id, ctx.now);
        Self {
            word: word.clone(),
            display_time_ms: ctx.display.display_time_ms(&record),
            progress: record,
            is_new: true,
            retrievability: 0.0,
            priority: None,
        }
    }

    pub(crate) fn with_priority(mut self, priority: WordPriority) -> Self {
        self.priority = Some(priority);
        self
    }
}

// ==================== Strategy ====================

pub trait SelectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Select at most `count` distinct words. Empty corpus or `count == 0`
    /// yields an empty batch.
    fn select_batch(
        &self,
        ctx: &SelectionContext<'_>,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<SessionWord>;
}

/// Named strategy, used to pick one from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    ReviewDue,
    PriorityScore,
    ColdStart,
}

impl StrategyKind {
    pub fn build(self, priority: PriorityConfig) -> Box<dyn SelectionStrategy> {
        match self {
            Self::ReviewDue => Box::new(ReviewDueStrategy),
            Self::PriorityScore => Box::new(PriorityScoreStrategy::new(priority)),
            Self::ColdStart => Box::new(ColdStartStrategy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStrategyError(String);

impl fmt::Display for ParseStrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown selection strategy: {}", self.0)
    }
}

impl std::error::Error for ParseStrategyError {}

impl FromStr for StrategyKind {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "review_due" | "fsrs" => Ok(Self::ReviewDue),
            "priority_score" | "priority" => Ok(Self::PriorityScore),
            "cold_start" => Ok(Self::ColdStart),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

// ==================== Helpers ====================

/// Uniform in-place Fisher-Yates shuffle.
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RngCore) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
