//! Heuristic priority scoring.
//!
//! Independent of due dates: a word's priority blends its error rate, the
//! time since it was last seen and a bonus for words still in the exposure
//! `new` stage. Ranking decides which seen words enter the batch; the batch is
//! shuffled before it is returned, so ranking never decides presentation order.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::types::{ExposureStage, ProgressRecord, Word, WordId, MS_PER_DAY};

use super::{shuffle, SelectionContext, SelectionStrategy, SessionWord};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityConfig {
    pub difficulty_weight: f64,
    pub time_weight: f64,
    pub stage_weight: f64,
    /// Bonus for words in the exposure `new` stage
    pub new_stage_bonus: f64,
    /// Days since last seen at which time priority saturates
    pub max_days: f64,
    /// Share of batch slots reserved for never-seen words
    pub new_word_ratio: f64,
    pub include_new_words: bool,
    /// Seen words outside `[min_difficulty, max_difficulty]` are not selected
    pub min_difficulty: f64,
    pub max_difficulty: f64,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            difficulty_weight: 0.4,
            time_weight: 0.4,
            stage_weight: 0.2,
            new_stage_bonus: 20.0,
            max_days: 30.0,
            new_word_ratio: 0.3,
            include_new_words: true,
            min_difficulty: 0.0,
            max_difficulty: 100.0,
        }
    }
}

/// Priority score with the factors it was built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordPriority {
    pub score: f64,
    /// `100 * timesWrong / timesSeen`, 0 if never seen
    pub difficulty_score: f64,
    pub time_priority: f64,
    pub stage_bonus: f64,
    pub stage: ExposureStage,
    pub error_rate: f64,
}

/// Score one word; `record` is `None` for a word the user has never been introduced to.
pub fn word_priority(
    record: Option<&ProgressRecord>,
    now: DateTime<Utc>,
    config: &PriorityConfig,
) -> WordPriority {
    let times_seen = record.map_or(0, |r| r.times_seen);
    let error_rate = record.map_or(0.0, ProgressRecord::error_rate);
    let difficulty_score = if times_seen == 0 {
        0.0
    } else {
        (100.0 * error_rate).clamp(0.0, 100.0)
    };

    let time_priority = match record.and_then(|r| r.last_review_at) {
        None => 100.0,
        Some(last) => {
            let days = ((now - last).num_milliseconds() as f64 / MS_PER_DAY).max(0.0);
            100.0 * days.min(config.max_days) / config.max_days
        }
    };

    let stage = ExposureStage::classify(times_seen);
    let stage_bonus = if stage == ExposureStage::New {
        config.new_stage_bonus
    } else {
        0.0
    };

    let score = config.difficulty_weight * difficulty_score
        + config.time_weight * time_priority
        + config.stage_weight * stage_bonus;

    WordPriority {
        score,
        difficulty_score,
        time_priority,
        stage_bonus,
        stage,
        error_rate,
    }
}

#[derive(Clone, Debug, Default)]
pub struct PriorityScoreStrategy {
    config: PriorityConfig,
}

impl PriorityScoreStrategy {
    pub fn new(config: PriorityConfig) -> Self {
        Self { config }
    }

    /// Seen words (timesSeen > 0) ranked by descending priority.
    pub fn rank<'a>(&self, ctx: &SelectionContext<'a>) -> Vec<(&'a Word, &'a ProgressRecord, WordPriority)> {
        let mut seen = HashSet::new();
        let mut ranked: Vec<(&Word, &ProgressRecord, WordPriority)> = ctx
            .progress
            .iter()
            .filter(|record| record.times_seen > 0 && seen.insert(record.word_id))
            .filter_map(|record| {
                let word = ctx.corpus.get(record.word_id)?;
                let priority = word_priority(Some(record), ctx.now, &self.config);
                let in_range = priority.difficulty_score >= self.config.min_difficulty
                    && priority.difficulty_score <= self.config.max_difficulty;
                in_range.then_some((word, record, priority))
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.2.score
                .total_cmp(&a.2.score)
                .then(a.0.rank.cmp(&b.0.rank))
                .then(a.0.id.cmp(&b.0.id))
        });
        ranked
    }

    /// Never-seen words: introduced but unseen records first, then words not
    /// yet introduced, both in frequency order.
    fn never_seen(&self, ctx: &SelectionContext<'_>) -> Vec<SessionWord> {
        let by_word: HashMap<WordId, &ProgressRecord> =
            ctx.progress.iter().map(|r| (r.word_id, r)).collect();

        let mut introduced_unseen = Vec::new();
        let mut fresh = Vec::new();
        for word in ctx.corpus.words() {
            match by_word.get(&word.id) {
                Some(record) if record.times_seen == 0 => {
                    let priority = word_priority(Some(record), ctx.now, &self.config);
                    introduced_unseen
                        .push(SessionWord::existing(ctx, word, record).with_priority(priority));
                }
                Some(_) => {}
                None => {
                    let priority = word_priority(None, ctx.now, &self.config);
                    fresh.push(SessionWord::fresh(ctx, word).with_priority(priority));
                }
            }
        }
        introduced_unseen.extend(fresh);
        introduced_unseen
    }
}

impl SelectionStrategy for PriorityScoreStrategy {
    fn name(&self) -> &'static str {
        "priority_score"
    }

    fn select_batch(
        &self,
        ctx: &SelectionContext<'_>,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<SessionWord> {
        if count == 0 || ctx.corpus.is_empty() {
            return Vec::new();
        }

        let mut new_words = if self.config.include_new_words {
            self.never_seen(ctx)
        } else {
            Vec::new()
        };
        let ratio = self.config.new_word_ratio.clamp(0.0, 1.0);
        let reserved = ((count as f64 * ratio).floor() as usize).min(new_words.len());

        let mut batch: Vec<SessionWord> = Vec::with_capacity(count);
        batch.extend(new_words.drain(..reserved));

        let open = count - batch.len();
        batch.extend(
            self.rank(ctx)
                .into_iter()
                .take(open)
                .map(|(word, record, priority)| {
                    SessionWord::existing(ctx, word, record).with_priority(priority)
                }),
        );

        // seen words ran out: give their slots to the remaining new words
        let open = count - batch.len();
        batch.extend(new_words.into_iter().take(open));

        shuffle(&mut batch, rng);
        batch
    }
}
