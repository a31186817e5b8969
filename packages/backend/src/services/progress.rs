//! Progress listing: per-word rows annotated with derived scheduling values,
//! plus the sort and filter options of the list endpoint.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use spellbrew_algo::{
    days_until_next_review, DisplayTimePolicy, LearningStatus, LifecycleConfig, MemoryModel,
    ProgressRecord, Word, WordId,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRow {
    pub word_id: WordId,
    pub hebrew: String,
    pub english: Vec<String>,
    pub transliteration: Vec<String>,
    pub rank: i64,
    pub stability: f64,
    pub difficulty: f64,
    /// Live value at listing time
    pub retrievability: f64,
    pub review_count: u32,
    pub times_seen: u32,
    pub times_wrong: u32,
    pub last_review_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub first_seen_at: DateTime<Utc>,
    pub progress_percentage: u8,
    pub learning_status: LearningStatus,
    pub days_until_next_review: i64,
    pub display_time_ms: Option<u32>,
}

impl ProgressRow {
    pub fn build(
        word: &Word,
        record: &ProgressRecord,
        model: &MemoryModel,
        display: &DisplayTimePolicy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            word_id: word.id,
            hebrew: word.hebrew.clone(),
            english: word.english.clone(),
            transliteration: word.transliteration.clone(),
            rank: word.rank,
            stability: record.stability,
            difficulty: record.difficulty,
            retrievability: model.current_retrievability(record, now),
            review_count: record.review_count,
            times_seen: record.times_seen,
            times_wrong: record.times_wrong,
            last_review_at: record.last_review_at,
            next_review_at: record.next_review_at,
            first_seen_at: record.first_seen_at,
            progress_percentage: model.progress_percentage(
                record.stability,
                record.difficulty,
                record.review_count,
            ),
            learning_status: model.stage_label(record.stability, record.review_count),
            days_until_next_review: days_until_next_review(record.next_review_at, now),
            display_time_ms: display.display_time_ms(record),
        }
    }

    fn last_seen(&self) -> DateTime<Utc> {
        self.last_review_at.unwrap_or(self.first_seen_at)
    }
}

// ==================== Query ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Progress,
    Stability,
    Difficulty,
    Retrievability,
    Reviews,
    Alpha,
    Seen,
    Wrong,
    LastSeen,
    NextReview,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "progress" => Self::Progress,
            "stability" => Self::Stability,
            "difficulty" => Self::Difficulty,
            "retrievability" => Self::Retrievability,
            "reviews" => Self::Reviews,
            "alpha" => Self::Alpha,
            "seen" => Self::Seen,
            "wrong" => Self::Wrong,
            "last_seen" => Self::LastSeen,
            "next_review" => Self::NextReview,
            other => return Err(format!("unknown sort key: {other}")),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDir {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

/// Stability band filter; thresholds come from [`LifecycleConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressFilter {
    #[default]
    All,
    Learning,
    Reviewing,
    Mastered,
}

impl FromStr for ProgressFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "learning" => Ok(Self::Learning),
            "reviewing" => Ok(Self::Reviewing),
            "mastered" => Ok(Self::Mastered),
            other => Err(format!("unknown progress filter: {other}")),
        }
    }
}

impl ProgressFilter {
    pub fn matches(&self, stability: f64, config: &LifecycleConfig) -> bool {
        match self {
            Self::All => true,
            Self::Learning => stability < config.learning_below,
            Self::Reviewing => {
                stability >= config.learning_below && stability < config.mastered_at
            }
            Self::Mastered => stability >= config.mastered_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressQuery {
    pub sort_by: SortKey,
    pub sort_dir: SortDir,
    pub filter: ProgressFilter,
    /// Only words introduced within this many hours
    pub new_within_hours: Option<f64>,
}

impl ProgressQuery {
    /// Filter then sort `rows` in place. Ties fall back to word id ascending.
    pub fn apply(&self, rows: &mut Vec<ProgressRow>, config: &LifecycleConfig, now: DateTime<Utc>) {
        let cutoff = self
            .new_within_hours
            .filter(|h| h.is_finite() && *h > 0.0)
            .map(|h| now - Duration::milliseconds((h * 3_600_000.0) as i64));

        rows.retain(|row| {
            self.filter.matches(row.stability, config)
                && cutoff.map_or(true, |cutoff| row.first_seen_at >= cutoff)
        });

        rows.sort_by(|a, b| {
            let primary = compare_by(self.sort_by, a, b);
            let primary = match self.sort_dir {
                SortDir::Asc => primary,
                SortDir::Desc => primary.reverse(),
            };
            primary.then(a.word_id.cmp(&b.word_id))
        });
    }
}

fn compare_by(key: SortKey, a: &ProgressRow, b: &ProgressRow) -> Ordering {
    match key {
        SortKey::Progress => a.progress_percentage.cmp(&b.progress_percentage),
        SortKey::Stability => a.stability.total_cmp(&b.stability),
        SortKey::Difficulty => a.difficulty.total_cmp(&b.difficulty),
        SortKey::Retrievability => a.retrievability.total_cmp(&b.retrievability),
        SortKey::Reviews => a.review_count.cmp(&b.review_count),
        SortKey::Alpha => a.hebrew.cmp(&b.hebrew),
        SortKey::Seen => a.times_seen.cmp(&b.times_seen),
        SortKey::Wrong => a.times_wrong.cmp(&b.times_wrong),
        SortKey::LastSeen => a.last_seen().cmp(&b.last_seen()),
        // unscheduled words are due now, so they sort first
        SortKey::NextReview => a.next_review_at.cmp(&b.next_review_at),
    }
}
