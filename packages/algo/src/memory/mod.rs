//! Memory-State Model
//!
//! Tracks how well a learner remembers a word through two persisted
//! quantities, stability (days until recall probability decays to the target)
//! and difficulty (bounded 1..=10), plus a derived retrievability.
//!
//! Core rules:
//! - Retrievability follows `base ^ (elapsed_days / stability)`, so that at
//!   `elapsed_days == stability` it equals the target success rate
//! - A raw right/wrong outcome is turned into a four-level [`Rating`] using
//!   the model's own confidence at review time
//! - Ratings update stability and difficulty through a fixed table
//!
//! The rating mapping deliberately rewards *surprising* success: a correct
//! answer at low retrievability is rated `Easy`, a correct answer the model
//! already expected is rated `Hard`. The update table below assumes this
//! mapping.
//!
//! All parameters come from an immutable [`MemoryModelConfig`] so several
//! policies can coexist in one process.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::sanitize::{clamp_finite, finite_or, normalize};
use crate::types::{LearningStatus, ProgressRecord, MS_PER_DAY, SEED_DIFFICULTY};

// ==================== Constants ====================

/// Upper bound for a scheduled interval (100 years)
const MAX_INTERVAL_DAYS: f64 = 36_500.0;

// ==================== Ratings ====================

/// Qualitative review rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }
}

/// Effect of one rating on the memory state
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEffect {
    pub stability_multiplier: f64,
    pub difficulty_delta: f64,
}

// ==================== Configuration ====================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryModelConfig {
    /// Recall probability the scheduler aims for at the due date
    pub target_retrievability: f64,
    /// Base of the forgetting curve
    pub decay_base: f64,
    /// Correct answers below this retrievability are rated `Easy`
    pub easy_below: f64,
    /// Correct answers below this retrievability (and above `easy_below`) are rated `Good`
    pub good_below: f64,
    pub again: RatingEffect,
    pub hard: RatingEffect,
    pub good: RatingEffect,
    pub easy: RatingEffect,
    pub min_stability: f64,
    pub max_stability: f64,
    pub min_difficulty: f64,
    pub max_difficulty: f64,
    /// Stability at which the progress stability factor saturates
    pub progress_stability_cap: f64,
    /// Review count at which the progress review factor saturates
    pub progress_review_cap: f64,
    pub progress_stability_weight: f64,
    pub progress_review_weight: f64,
    pub progress_difficulty_weight: f64,
}

impl Default for MemoryModelConfig {
    fn default() -> Self {
        Self {
            target_retrievability: 0.9,
            decay_base: 0.9,
            easy_below: 0.6,
            good_below: 0.8,
            again: RatingEffect { stability_multiplier: 0.8, difficulty_delta: 0.2 },
            hard: RatingEffect { stability_multiplier: 0.9, difficulty_delta: 0.1 },
            good: RatingEffect { stability_multiplier: 1.1, difficulty_delta: -0.05 },
            easy: RatingEffect { stability_multiplier: 1.3, difficulty_delta: -0.1 },
            min_stability: 0.1,
            max_stability: 100.0,
            min_difficulty: 1.0,
            max_difficulty: 10.0,
            progress_stability_cap: 10.0,
            progress_review_cap: 10.0,
            progress_stability_weight: 0.5,
            progress_review_weight: 0.3,
            progress_difficulty_weight: 0.2,
        }
    }
}

impl MemoryModelConfig {
    pub fn effect(&self, rating: Rating) -> RatingEffect {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }
}

// ==================== Model ====================

/// Result of applying one observed outcome to a progress record
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub record: ProgressRecord,
    pub rating: Rating,
    /// Retrievability the rating was derived from
    pub retrievability_before: f64,
    pub interval_days: u32,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryModel {
    config: MemoryModelConfig,
}

impl MemoryModel {
    pub fn new(config: MemoryModelConfig) -> Self {
        Self { config }
    }

    /// Probability of recall after `elapsed_days` for a given stability.
    ///
    /// Returns 0 for `stability <= 0`, `elapsed_days <= 0` or non-finite input.
    pub fn retrievability(&self, stability: f64, elapsed_days: f64) -> f64 {
        if !stability.is_finite() || !elapsed_days.is_finite() {
            return 0.0;
        }
        if stability <= 0.0 || elapsed_days <= 0.0 {
            return 0.0;
        }
        finite_or(self.config.decay_base.powf(elapsed_days / stability), 0.0).clamp(0.0, 1.0)
    }

    /// Retrievability of a record at `now`, derived from its stability and last review.
    pub fn current_retrievability(&self, record: &ProgressRecord, now: DateTime<Utc>) -> f64 {
        record
            .elapsed_days(now)
            .map(|elapsed| self.retrievability(record.stability, elapsed))
            .unwrap_or(0.0)
    }

    /// Days until retrievability reaches `target`, rounded, at least one day.
    pub fn next_interval(&self, stability: f64, target: f64) -> u32 {
        if !stability.is_finite() || stability <= 0.0 {
            return 1;
        }
        let target = clamp_finite(target, 0.0001, 0.9999);
        let days = stability * target.ln() / self.config.decay_base.ln();
        clamp_finite(days.round(), 1.0, MAX_INTERVAL_DAYS) as u32
    }

    /// Interval at the configured target retrievability.
    pub fn scheduled_interval(&self, stability: f64) -> u32 {
        self.next_interval(stability, self.config.target_retrievability)
    }

    /// Derive a rating from the raw outcome and the model's confidence at review time.
    pub fn rating_from_outcome(&self, correct: bool, current_retrievability: f64) -> Rating {
        if !correct {
            return Rating::Again;
        }
        let r = finite_or(current_retrievability, 0.0);
        if r < self.config.easy_below {
            Rating::Easy
        } else if r < self.config.good_below {
            Rating::Good
        } else {
            Rating::Hard
        }
    }

    /// Table-driven (stability, difficulty) update, clamped to the configured bounds.
    pub fn apply_rating(&self, stability: f64, difficulty: f64, rating: Rating) -> (f64, f64) {
        let cfg = &self.config;
        let effect = cfg.effect(rating);

        let stability = finite_or(stability, cfg.min_stability);
        let difficulty = finite_or(difficulty, SEED_DIFFICULTY);

        let new_stability = clamp_finite(
            stability * effect.stability_multiplier,
            cfg.min_stability,
            cfg.max_stability,
        );
        let new_difficulty = clamp_finite(
            difficulty + effect.difficulty_delta,
            cfg.min_difficulty,
            cfg.max_difficulty,
        );
        (new_stability, new_difficulty)
    }

    /// Presentational progress score in `0..=100`.
    pub fn progress_percentage(&self, stability: f64, difficulty: f64, review_count: u32) -> u8 {
        let cfg = &self.config;
        let stability_factor = normalize(stability, cfg.progress_stability_cap);
        let review_factor = normalize(review_count as f64, cfg.progress_review_cap);
        let difficulty_factor = clamp_finite(
            (cfg.max_difficulty - finite_or(difficulty, cfg.max_difficulty))
                / (cfg.max_difficulty - cfg.min_difficulty),
            0.0,
            1.0,
        );

        let progress = (stability_factor * cfg.progress_stability_weight
            + review_factor * cfg.progress_review_weight
            + difficulty_factor * cfg.progress_difficulty_weight)
            * 100.0;
        clamp_finite(progress.round(), 0.0, 100.0) as u8
    }

    pub fn stage_label(&self, stability: f64, review_count: u32) -> LearningStatus {
        LearningStatus::classify(stability, review_count)
    }

    /// Apply one observed outcome to `record`, producing the complete new record.
    pub fn review(
        &self,
        record: &ProgressRecord,
        correct: bool,
        now: DateTime<Utc>,
    ) -> EngineResult<ReviewOutcome> {
        check_invariants(record)?;

        let retrievability = self.current_retrievability(record, now);
        let rating = self.rating_from_outcome(correct, retrievability);
        let (stability, difficulty) = self.apply_rating(record.stability, record.difficulty, rating);
        let interval_days = self.scheduled_interval(stability);

        let updated = ProgressRecord {
            stability,
            difficulty,
            retrievability,
            review_count: record.review_count.saturating_add(1),
            times_seen: record.times_seen.saturating_add(1),
            times_wrong: record.times_wrong.saturating_add(u32::from(!correct)),
            last_review_at: Some(now),
            next_review_at: Some(now + Duration::days(i64::from(interval_days))),
            ..record.clone()
        };

        check_invariants(&updated)?;

        Ok(ReviewOutcome {
            record: updated,
            rating,
            retrievability_before: retrievability,
            interval_days,
        })
    }
}

/// Whole days until `next_review_at`, rounded up; 0 when nothing is scheduled.
pub fn days_until_next_review(next_review_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match next_review_at {
        Some(next) => ((next - now).num_milliseconds() as f64 / MS_PER_DAY).ceil() as i64,
        None => 0,
    }
}

/// Verify the progress-record invariants.
pub fn check_invariants(record: &ProgressRecord) -> EngineResult<()> {
    if record.times_wrong > record.times_seen {
        return Err(EngineError::InvariantViolation(format!(
            "word {}: timesWrong {} exceeds timesSeen {}",
            record.word_id, record.times_wrong, record.times_seen
        )));
    }
    if !record.stability.is_finite() || record.stability <= 0.0 {
        return Err(EngineError::InvariantViolation(format!(
            "word {}: stability {} must be positive",
            record.word_id, record.stability
        )));
    }
    if !record.difficulty.is_finite() {
        return Err(EngineError::InvariantViolation(format!(
            "word {}: difficulty is not finite",
            record.word_id
        )));
    }
    if let (Some(last), Some(next)) = (record.last_review_at, record.next_review_at) {
        if next < last {
            return Err(EngineError::InvariantViolation(format!(
                "word {}: next review precedes last review",
                record.word_id
            )));
        }
    }
    Ok(())
}
