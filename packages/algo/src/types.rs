//! Common Types and Constants
//!
//! Shared data structures used across the scheduling modules: corpus words,
//! per-user progress records and the derived stage classifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ==================== Constants ====================

/// Stability assigned to a freshly introduced word
pub const SEED_STABILITY: f64 = 0.1;

/// Difficulty assigned to a freshly introduced word
pub const SEED_DIFFICULTY: f64 = 5.0;

/// Milliseconds in one day
pub const MS_PER_DAY: f64 = 86_400_000.0;

pub type WordId = i64;
pub type UserId = String;

// ==================== Corpus ====================

/// A vocabulary item from the shared corpus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: WordId,
    /// Script form the learner has to recall
    pub hebrew: String,
    #[serde(deserialize_with = "one_or_many")]
    pub english: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub transliteration: Vec<String>,
    /// Corpus frequency rank, 1 = most frequent
    pub rank: i64,
}

/// Accepts either `"a"` or `["a", "b"]`.
pub fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

// ==================== Progress ====================

/// Scheduling state of one (user, word) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub word_id: WordId,
    pub stability: f64,
    pub difficulty: f64,
    /// Snapshot taken at the last review. Audit only: scheduling derives
    /// retrievability from `stability` and `last_review_at`.
    pub retrievability: f64,
    pub review_count: u32,
    pub times_seen: u32,
    pub times_wrong: u32,
    pub last_review_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub first_seen_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Seed record for a word being introduced into the user's active set.
    pub fn seed(user_id: impl Into<UserId>, word_id: WordId, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            word_id,
            stability: SEED_STABILITY,
            difficulty: SEED_DIFFICULTY,
            retrievability: 0.0,
            review_count: 0,
            times_seen: 0,
            times_wrong: 0,
            last_review_at: None,
            next_review_at: None,
            first_seen_at: now,
        }
    }

    /// Due when the next review was never scheduled or has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at.map_or(true, |next| next <= now)
    }

    /// Fractional days since the last review, `None` if never reviewed.
    pub fn elapsed_days(&self, now: DateTime<Utc>) -> Option<f64> {
        self.last_review_at
            .map(|last| (now - last).num_milliseconds() as f64 / MS_PER_DAY)
    }

    pub fn error_rate(&self) -> f64 {
        if self.times_seen == 0 {
            0.0
        } else {
            self.times_wrong as f64 / self.times_seen as f64
        }
    }

    pub fn stability_stage(&self) -> LearningStatus {
        LearningStatus::classify(self.stability, self.review_count)
    }

    pub fn exposure_stage(&self) -> ExposureStage {
        ExposureStage::classify(self.times_seen)
    }
}

// ==================== Stages ====================

/// Stage derived from stability and review count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStatus {
    New,
    Learning,
    Reviewing,
    Mastered,
}

impl LearningStatus {
    pub fn classify(stability: f64, review_count: u32) -> Self {
        if review_count == 0 {
            Self::New
        } else if stability < 1.0 {
            Self::Learning
        } else if stability < 5.0 {
            Self::Reviewing
        } else {
            Self::Mastered
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Reviewing => "reviewing",
            Self::Mastered => "mastered",
        }
    }
}

/// Stage derived from raw exposure count (`times_seen`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureStage {
    New,
    Learning,
    Practicing,
    Known,
}

impl ExposureStage {
    pub fn classify(times_seen: u32) -> Self {
        match times_seen {
            0..=2 => Self::New,
            3..=9 => Self::Learning,
            10..=24 => Self::Practicing,
            _ => Self::Known,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Practicing => "practicing",
            Self::Known => "known",
        }
    }
}

/// Which stage classification a deployment uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageScheme {
    #[default]
    Stability,
    Exposure,
}

/// A stage produced by one of the two schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WordStage {
    Stability(LearningStatus),
    Exposure(ExposureStage),
}

impl WordStage {
    pub fn of(record: &ProgressRecord, scheme: StageScheme) -> Self {
        match scheme {
            StageScheme::Stability => Self::Stability(record.stability_stage()),
            StageScheme::Exposure => Self::Exposure(record.exposure_stage()),
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(
            self,
            Self::Stability(LearningStatus::New) | Self::Exposure(ExposureStage::New)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Stability(status) => status.as_str(),
            Self::Exposure(stage) => stage.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_seed_record_defaults() {
        let now = Utc::now();
        let record = ProgressRecord::seed("u1", 7, now);
        assert_eq!(record.stability, SEED_STABILITY);
        assert_eq!(record.difficulty, SEED_DIFFICULTY);
        assert_eq!(record.review_count, 0);
        assert!(record.last_review_at.is_none());
        assert!(record.is_due(now));
        assert_eq!(record.first_seen_at, now);
    }

    #[test]
    fn test_is_due_respects_next_review() {
        let now = Utc::now();
        let mut record = ProgressRecord::seed("u1", 1, now);
        record.next_review_at = Some(now + Duration::days(2));
        assert!(!record.is_due(now));
        assert!(record.is_due(now + Duration::days(2)));
    }

    #[test]
    fn test_elapsed_days() {
        let now = Utc::now();
        let mut record = ProgressRecord::seed("u1", 1, now);
        assert_eq!(record.elapsed_days(now), None);
        record.last_review_at = Some(now - Duration::hours(36));
        let elapsed = record.elapsed_days(now).unwrap();
        assert!((elapsed - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_learning_status_thresholds() {
        assert_eq!(LearningStatus::classify(50.0, 0), LearningStatus::New);
        assert_eq!(LearningStatus::classify(0.5, 1), LearningStatus::Learning);
        assert_eq!(LearningStatus::classify(1.0, 3), LearningStatus::Reviewing);
        assert_eq!(LearningStatus::classify(4.99, 3), LearningStatus::Reviewing);
        assert_eq!(LearningStatus::classify(5.0, 3), LearningStatus::Mastered);
    }

    #[test]
    fn test_exposure_stage_thresholds() {
        assert_eq!(ExposureStage::classify(0), ExposureStage::New);
        assert_eq!(ExposureStage::classify(2), ExposureStage::New);
        assert_eq!(ExposureStage::classify(3), ExposureStage::Learning);
        assert_eq!(ExposureStage::classify(9), ExposureStage::Learning);
        assert_eq!(ExposureStage::classify(10), ExposureStage::Practicing);
        assert_eq!(ExposureStage::classify(24), ExposureStage::Practicing);
        assert_eq!(ExposureStage::classify(25), ExposureStage::Known);
    }

    #[test]
    fn test_schemes_are_not_conflated() {
        let now = Utc::now();
        let mut record = ProgressRecord::seed("u1", 1, now);
        record.times_seen = 12;
        record.review_count = 12;
        record.stability = 0.4;

        let by_stability = WordStage::of(&record, StageScheme::Stability);
        let by_exposure = WordStage::of(&record, StageScheme::Exposure);
        assert_eq!(by_stability.label(), "learning");
        assert_eq!(by_exposure.label(), "practicing");
        assert!(!by_stability.is_new());
    }

    #[test]
    fn test_word_accepts_single_or_multiple_glosses() {
        let single: Word = serde_json::from_str(
            r#"{"id":1,"hebrew":"של","english":"of","transliteration":"shel","rank":1}"#,
        )
        .unwrap();
        assert_eq!(single.english, vec!["of".to_string()]);

        let many: Word = serde_json::from_str(
            r#"{"id":2,"hebrew":"את","english":["you","with"],"transliteration":["at","et"],"rank":2}"#,
        )
        .unwrap();
        assert_eq!(many.english.len(), 2);
        assert_eq!(many.transliteration, vec!["at".to_string(), "et".to_string()]);
    }
}
