//! Scheduling service: binds the engine to a store.
//!
//! Every mutating operation takes the per-user lock first, then loads the
//! user's records, runs the pure engine step and persists the result before
//! releasing the lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use spellbrew_algo::lifecycle;
use spellbrew_algo::rng::session_rng;
use spellbrew_algo::{
    AutoManageDecision, Corpus, DisplayTimePolicy, EngineError, IntroductionOrder, LearningStats,
    LifecycleConfig, MemoryModel, ProgressRecord, ProgressStats, Rating, SelectionContext,
    SelectionStrategy, SessionWord, Word, WordId,
};

use crate::config::SchedulingSettings;
use crate::services::locks::UserLocks;
use crate::services::progress::{ProgressQuery, ProgressRow};
use crate::store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

// ==================== Results ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBatch {
    pub strategy: &'static str,
    pub words: Vec<SessionWord>,
    /// Words served for the first time and introduced by this call
    pub introduced: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeInput {
    /// Script form of the answered word
    pub hebrew: String,
    pub correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Updated,
    NotFound,
    InvalidInput,
    Failed,
}

impl From<&EngineError> for OutcomeStatus {
    fn from(err: &EngineError) -> Self {
        match err {
            EngineError::InvalidInput(_) => OutcomeStatus::InvalidInput,
            EngineError::NotFound(_) => OutcomeStatus::NotFound,
            EngineError::InvariantViolation(_) => OutcomeStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeResult {
    pub hebrew: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_id: Option<WordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressRecord>,
}

impl OutcomeResult {
    fn rejected(hebrew: &str, word_id: Option<WordId>, status: OutcomeStatus, error: String) -> Self {
        Self {
            hebrew: hebrew.to_string(),
            status,
            word_id,
            error: Some(error),
            rating: None,
            interval_days: None,
            progress: None,
        }
    }

    fn from_engine(hebrew: &str, word_id: Option<WordId>, err: EngineError) -> Self {
        Self::rejected(hebrew, word_id, OutcomeStatus::from(&err), err.to_string())
    }

    pub fn is_updated(&self) -> bool {
        self.status == OutcomeStatus::Updated
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureResult {
    pub minimum: usize,
    pub active_before: usize,
    pub active_after: usize,
    pub added: usize,
    pub added_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_words: usize,
    pub learning_words: usize,
    pub reviewing_words: usize,
    pub mastered_words: usize,
    pub mastery_rate: f64,
}

impl From<&ProgressStats> for StatsSummary {
    fn from(stats: &ProgressStats) -> Self {
        Self {
            total_words: stats.total,
            learning_words: stats.learning,
            reviewing_words: stats.reviewing,
            mastered_words: stats.mastered,
            mastery_rate: stats.mastery_rate(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoManageResult {
    #[serde(flatten)]
    pub decision: AutoManageDecision,
    pub words_added: usize,
    pub added_words: Vec<String>,
    /// Statistics the decision was made from
    pub stats: StatsSummary,
    /// `None` when the user has no words yet
    pub days_since_last_word: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub summary: StatsSummary,
    pub learning: LearningStats,
    pub words: Vec<ProgressRow>,
}

// ==================== Scheduler ====================

pub struct Scheduler {
    store: Store,
    corpus: Arc<Corpus>,
    model: MemoryModel,
    strategy: Box<dyn SelectionStrategy>,
    display: DisplayTimePolicy,
    lifecycle: LifecycleConfig,
    order: IntroductionOrder,
    locks: UserLocks,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("store", &self.store.kind())
            .field("corpus", &self.corpus.len())
            .field("strategy", &self.strategy.name())
            .field("display", &self.display)
            .field("order", &self.order)
            .finish()
    }
}

impl Scheduler {
    pub fn new(store: Store, corpus: Corpus, settings: &SchedulingSettings) -> Self {
        Self {
            store,
            corpus: Arc::new(corpus),
            model: MemoryModel::default(),
            strategy: settings.strategy.build(settings.priority.clone()),
            display: settings.display,
            lifecycle: LifecycleConfig::default(),
            order: settings.introduction_order,
            locks: UserLocks::new(),
        }
    }

    /// Build a scheduler over the corpus currently held by `store`.
    pub async fn load(store: Store, settings: &SchedulingSettings) -> Result<Self, SchedulingError> {
        let words = store.load_words().await?;
        let corpus = Corpus::new(words);
        tracing::info!(
            words = corpus.len(),
            strategy = ?settings.strategy,
            "scheduler loaded corpus"
        );
        Ok(Self::new(store, corpus, settings))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    // ==================== Selection ====================

    /// Build the next session batch. Words served without a record are
    /// introduced now.
    pub async fn select_batch(
        &self,
        user_id: &str,
        count: usize,
    ) -> Result<SessionBatch, SchedulingError> {
        if count == 0 {
            return Ok(SessionBatch {
                strategy: self.strategy.name(),
                words: Vec::new(),
                introduced: 0,
            });
        }

        let _guard = self.locks.acquire(user_id).await;
        let progress = self.store.user_progress(user_id).await?;
        let now = Utc::now();

        let words = {
            let ctx = self.context(user_id, &progress, now);
            let mut rng = session_rng();
            self.strategy.select_batch(&ctx, count, &mut rng)
        };

        let seeds: Vec<ProgressRecord> = words
            .iter()
            .filter(|w| w.is_new)
            .map(|w| w.progress.clone())
            .collect();
        let introduced = if seeds.is_empty() {
            0
        } else {
            self.store.introduce(&seeds).await?
        };

        tracing::info!(
            user_id,
            strategy = self.strategy.name(),
            requested = count,
            served = words.len(),
            introduced,
            "session batch selected"
        );

        Ok(SessionBatch {
            strategy: self.strategy.name(),
            words,
            introduced,
        })
    }

    /// Words drawn uniformly from the whole corpus, for anonymous practice.
    pub fn random_words(&self, count: usize) -> Vec<Word> {
        let mut rng = session_rng();
        self.corpus
            .words()
            .choose_multiple(&mut rng, count)
            .cloned()
            .collect()
    }

    // ==================== Outcomes ====================

    /// Apply a batch of recall outcomes. Failures are reported per item and
    /// never roll back the other items.
    pub async fn record_outcomes(
        &self,
        user_id: &str,
        outcomes: &[OutcomeInput],
    ) -> Result<Vec<OutcomeResult>, SchedulingError> {
        if outcomes.is_empty() {
            return Err(SchedulingError::InvalidInput(
                "results must contain at least one outcome".to_string(),
            ));
        }

        let _guard = self.locks.acquire(user_id).await;
        let now = Utc::now();
        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            results.push(self.record_one(user_id, outcome, now).await);
        }

        let updated = results.iter().filter(|r| r.is_updated()).count();
        tracing::info!(
            user_id,
            submitted = outcomes.len(),
            updated,
            "recall outcomes recorded"
        );
        Ok(results)
    }

    async fn record_one(
        &self,
        user_id: &str,
        outcome: &OutcomeInput,
        now: DateTime<Utc>,
    ) -> OutcomeResult {
        let token = outcome.hebrew.trim();
        let word = match self.corpus.resolve(token) {
            Ok(word) => word,
            Err(err) => return OutcomeResult::from_engine(&outcome.hebrew, None, err),
        };

        let record = match self.store.get_progress(user_id, word.id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return OutcomeResult::from_engine(
                    token,
                    Some(word.id),
                    EngineError::NotFound(format!("word {token:?} has not been introduced")),
                )
            }
            Err(err) => {
                tracing::warn!(user_id, word_id = word.id, error = %err, "progress lookup failed");
                return OutcomeResult::rejected(
                    token,
                    Some(word.id),
                    OutcomeStatus::Failed,
                    err.to_string(),
                );
            }
        };

        let reviewed = match self.model.review(&record, outcome.correct, now) {
            Ok(reviewed) => reviewed,
            Err(err) => {
                tracing::error!(user_id, word_id = word.id, error = %err, "review rejected");
                return OutcomeResult::from_engine(token, Some(word.id), err);
            }
        };

        if let Err(err) = self.store.save_progress(&reviewed.record).await {
            tracing::warn!(user_id, word_id = word.id, error = %err, "progress save failed");
            return OutcomeResult::rejected(
                token,
                Some(word.id),
                OutcomeStatus::Failed,
                err.to_string(),
            );
        }

        tracing::debug!(
            user_id,
            word_id = word.id,
            correct = outcome.correct,
            rating = reviewed.rating.as_str(),
            stability = reviewed.record.stability,
            interval_days = reviewed.interval_days,
            "word reviewed"
        );

        OutcomeResult {
            hebrew: token.to_string(),
            status: OutcomeStatus::Updated,
            word_id: Some(word.id),
            error: None,
            rating: Some(reviewed.rating),
            interval_days: Some(reviewed.interval_days),
            progress: Some(reviewed.record),
        }
    }

    // ==================== Lifecycle ====================

    /// Introduce words until `minimum` records are below the learning threshold.
    pub async fn ensure_minimum_active(
        &self,
        user_id: &str,
        minimum: usize,
    ) -> Result<EnsureResult, SchedulingError> {
        let _guard = self.locks.acquire(user_id).await;
        let progress = self.store.user_progress(user_id).await?;
        let now = Utc::now();

        let plan = {
            let mut rng = session_rng();
            lifecycle::ensure_minimum_active(
                &self.corpus,
                &progress,
                minimum,
                self.order,
                &self.lifecycle,
                &mut rng,
            )
        };

        let (added, added_words) = self.introduce_words(user_id, &plan.to_introduce, now).await?;

        tracing::info!(
            user_id,
            minimum,
            active_before = plan.active_before,
            added,
            "minimum active words ensured"
        );

        Ok(EnsureResult {
            minimum,
            active_before: plan.active_before,
            active_after: plan.active_before + added,
            added,
            added_words,
        })
    }

    /// Evaluate the introduction triggers and introduce the requested words.
    pub async fn auto_manage(&self, user_id: &str) -> Result<AutoManageResult, SchedulingError> {
        let _guard = self.locks.acquire(user_id).await;
        let progress = self.store.user_progress(user_id).await?;
        let now = Utc::now();

        let stats = ProgressStats::from_records(&progress, &self.lifecycle);
        let decision = lifecycle::auto_manage(&stats, now, &self.lifecycle);

        let planned: Vec<WordId> = {
            let mut rng = session_rng();
            lifecycle::plan_introductions(
                &self.corpus,
                &progress,
                decision.count_to_add,
                self.order,
                &mut rng,
            )
            .iter()
            .map(|w| w.id)
            .collect()
        };

        let (words_added, added_words) = self.introduce_words(user_id, &planned, now).await?;

        tracing::info!(
            user_id,
            action = ?decision.action,
            reason = decision.reason.map(|t| t.reason()).unwrap_or("none"),
            requested = decision.count_to_add,
            words_added,
            "auto-manage evaluated"
        );

        Ok(AutoManageResult {
            decision,
            words_added,
            added_words,
            stats: StatsSummary::from(&stats),
            days_since_last_word: stats.days_since_last_introduction(now),
        })
    }

    async fn introduce_words(
        &self,
        user_id: &str,
        word_ids: &[WordId],
        now: DateTime<Utc>,
    ) -> Result<(usize, Vec<String>), SchedulingError> {
        if word_ids.is_empty() {
            return Ok((0, Vec::new()));
        }
        let records = lifecycle::introduce(user_id, word_ids, now);
        let inserted = self.store.introduce(&records).await?;
        let names = word_ids
            .iter()
            .filter_map(|id| self.corpus.get(*id))
            .map(|w| w.hebrew.clone())
            .collect();
        Ok((inserted, names))
    }

    // ==================== Progress ====================

    pub async fn progress(&self, user_id: &str) -> Result<ProgressSnapshot, SchedulingError> {
        let progress = self.store.user_progress(user_id).await?;
        let now = Utc::now();
        let stats = ProgressStats::from_records(&progress, &self.lifecycle);
        let mut words = self.rows(&progress, now);
        ProgressQuery::default().apply(&mut words, &self.lifecycle, now);

        Ok(ProgressSnapshot {
            summary: StatsSummary::from(&stats),
            learning: spellbrew_algo::learning_stats(&progress),
            words,
        })
    }

    pub async fn progress_list(
        &self,
        user_id: &str,
        query: &ProgressQuery,
    ) -> Result<Vec<ProgressRow>, SchedulingError> {
        let progress = self.store.user_progress(user_id).await?;
        let now = Utc::now();
        let mut rows = self.rows(&progress, now);
        query.apply(&mut rows, &self.lifecycle, now);
        Ok(rows)
    }

    fn rows(&self, progress: &[ProgressRecord], now: DateTime<Utc>) -> Vec<ProgressRow> {
        progress
            .iter()
            .filter_map(|record| {
                let word = self.corpus.get(record.word_id)?;
                Some(ProgressRow::build(word, record, &self.model, &self.display, now))
            })
            .collect()
    }

    fn context<'a>(
        &'a self,
        user_id: &'a str,
        progress: &'a [ProgressRecord],
        now: DateTime<Utc>,
    ) -> SelectionContext<'a> {
        SelectionContext {
            user_id,
            corpus: &self.corpus,
            progress,
            model: &self.model,
            now,
            display: self.display,
        }
    }
}
