//! Vocabulary Lifecycle Manager
//!
//! Decides from aggregate progress statistics whether new words should enter
//! a user's active set, and picks which ones. Nothing here mutates state: the
//! functions return plans that the caller persists as seed records.
//!
//! Introduction triggers (any one fires):
//! - Staleness: a day or more since the last introduction
//! - Starvation: fewer than `min_learning` words below stability 1
//! - Saturation: most words mastered
//! - Cold user: no records at all (fixed batch, overrides the others)

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::types::{ProgressRecord, Word, WordId, MS_PER_DAY};

// ==================== Configuration ====================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleConfig {
    /// Records below this stability count as actively learning
    pub learning_below: f64,
    /// Records at or above this stability count as mastered
    pub mastered_at: f64,
    pub stale_after_days: f64,
    pub max_daily_addition: usize,
    pub min_learning: usize,
    pub mastery_rate_threshold: f64,
    pub mastery_addition: usize,
    pub first_time_addition: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            learning_below: 1.0,
            mastered_at: 5.0,
            stale_after_days: 1.0,
            max_daily_addition: 5,
            min_learning: 10,
            mastery_rate_threshold: 0.8,
            mastery_addition: 5,
            first_time_addition: 20,
        }
    }
}

/// How new words are picked from the not-yet-introduced part of the corpus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntroductionOrder {
    /// Most frequent first
    #[default]
    Frequency,
    /// Uniformly random; deterministic for a seeded rng
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOrderError(String);

impl fmt::Display for ParseOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown introduction order: {}", self.0)
    }
}

impl std::error::Error for ParseOrderError {}

impl FromStr for IntroductionOrder {
    type Err = ParseOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frequency" | "rank" => Ok(Self::Frequency),
            "random" => Ok(Self::Random),
            other => Err(ParseOrderError(other.to_string())),
        }
    }
}

// ==================== Statistics ====================

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub total: usize,
    pub learning: usize,
    pub reviewing: usize,
    pub mastered: usize,
    pub last_introduced_at: Option<DateTime<Utc>>,
}

impl ProgressStats {
    pub fn from_records(records: &[ProgressRecord], config: &LifecycleConfig) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Default::default()
        };
        for record in records {
            if record.stability < config.learning_below {
                stats.learning += 1;
            } else if record.stability < config.mastered_at {
                stats.reviewing += 1;
            } else {
                stats.mastered += 1;
            }
            stats.last_introduced_at = stats.last_introduced_at.max(Some(record.first_seen_at));
        }
        stats
    }

    pub fn mastery_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.mastered as f64 / self.total as f64
        }
    }

    pub fn days_since_last_introduction(&self, now: DateTime<Utc>) -> Option<f64> {
        self.last_introduced_at
            .map(|last| ((now - last).num_milliseconds() as f64 / MS_PER_DAY).max(0.0))
    }
}

// ==================== Auto-manage ====================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    #[serde(rename = "daily addition")]
    DailyAddition,
    #[serde(rename = "low learning words")]
    LowLearningWords,
    #[serde(rename = "high mastery rate")]
    HighMasteryRate,
    #[serde(rename = "first time user")]
    FirstTimeUser,
}

impl Trigger {
    pub fn reason(&self) -> &'static str {
        match self {
            Trigger::DailyAddition => "daily addition",
            Trigger::LowLearningWords => "low learning words",
            Trigger::HighMasteryRate => "high mastery rate",
            Trigger::FirstTimeUser => "first time user",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    AddedWords,
    NoActionNeeded,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoManageDecision {
    pub action: LifecycleAction,
    /// Last trigger that fired
    pub reason: Option<Trigger>,
    /// Every trigger that fired, in evaluation order
    pub triggers: Vec<Trigger>,
    /// Requested introductions before capping by corpus availability
    pub count_to_add: usize,
}

pub fn auto_manage(
    stats: &ProgressStats,
    now: DateTime<Utc>,
    config: &LifecycleConfig,
) -> AutoManageDecision {
    if stats.total == 0 {
        return AutoManageDecision {
            action: LifecycleAction::AddedWords,
            reason: Some(Trigger::FirstTimeUser),
            triggers: vec![Trigger::FirstTimeUser],
            count_to_add: config.first_time_addition,
        };
    }

    let mut triggers = Vec::new();
    let mut count = 0usize;

    if let Some(days) = stats.days_since_last_introduction(now) {
        if days >= config.stale_after_days {
            triggers.push(Trigger::DailyAddition);
            count = config.max_daily_addition.min(days.floor() as usize);
        }
    }

    if stats.learning < config.min_learning {
        triggers.push(Trigger::LowLearningWords);
        count = count.max(config.min_learning - stats.learning);
    }

    if stats.mastery_rate() >= config.mastery_rate_threshold {
        triggers.push(Trigger::HighMasteryRate);
        count = count.max(config.mastery_addition);
    }

    let action = if triggers.is_empty() {
        LifecycleAction::NoActionNeeded
    } else {
        LifecycleAction::AddedWords
    };

    AutoManageDecision {
        action,
        reason: triggers.last().copied(),
        triggers,
        count_to_add: count,
    }
}

// ==================== Introductions ====================

/// Pick up to `count` words the user has not been introduced to.
pub fn plan_introductions<'a>(
    corpus: &'a Corpus,
    progress: &[ProgressRecord],
    count: usize,
    order: IntroductionOrder,
    rng: &mut dyn RngCore,
) -> Vec<&'a Word> {
    if count == 0 {
        return Vec::new();
    }
    let introduced: HashSet<WordId> = progress.iter().map(|r| r.word_id).collect();
    let available = corpus.unintroduced(&introduced);

    match order {
        IntroductionOrder::Frequency => available.take(count).collect(),
        IntroductionOrder::Random => {
            let pool: Vec<&Word> = available.collect();
            pool.choose_multiple(rng, count).copied().collect()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsurePlan {
    pub minimum: usize,
    /// Records below the learning threshold before topping up
    pub active_before: usize,
    pub to_introduce: Vec<WordId>,
}

/// Plan enough introductions to bring actively learning words up to `minimum`.
pub fn ensure_minimum_active(
    corpus: &Corpus,
    progress: &[ProgressRecord],
    minimum: usize,
    order: IntroductionOrder,
    config: &LifecycleConfig,
    rng: &mut dyn RngCore,
) -> EnsurePlan {
    let active_before = progress
        .iter()
        .filter(|r| r.stability < config.learning_below)
        .count();
    let missing = minimum.saturating_sub(active_before);

    let to_introduce = plan_introductions(corpus, progress, missing, order, rng)
        .into_iter()
        .map(|w| w.id)
        .collect();

    EnsurePlan {
        minimum,
        active_before,
        to_introduce,
    }
}

/// Seed records for the planned words.
pub fn introduce(user_id: &str, word_ids: &[WordId], now: DateTime<Utc>) -> Vec<ProgressRecord> {
    word_ids
        .iter()
        .map(|&id| ProgressRecord::seed(user_id, id, now))
        .collect()
}
