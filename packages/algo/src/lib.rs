//! # spellbrew-algo - spaced-repetition core for vocabulary learning
//!
//! Pure scheduling logic with no I/O. Callers load records, call into this
//! crate, and persist what comes back.
//!
//! - **Memory-State Model** - per-word stability/difficulty, retrievability, next review date
//! - **Selection Engine** - interchangeable strategies that build a session batch
//! - **Lifecycle Manager** - decides when and which new words enter the active set
//!
//! ## Modules
//!
//! - [`memory`] - review updates, intervals, progress percentage
//! - [`selection`] - selection strategies, priority score, display times, learning stats
//! - [`lifecycle`] - auto-manage triggers, minimum active set, introduction planning
//! - [`corpus`] - read-only frequency-ranked word list
//! - [`sanitize`] - numeric guards
//! - [`types`] - shared records and stage classifications
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use spellbrew_algo::{MemoryModel, ProgressRecord};
//!
//! let model = MemoryModel::default();
//! let now = Utc::now();
//! let seed = ProgressRecord::seed("user-1", 42, now);
//! let outcome = model.review(&seed, true, now).unwrap();
//! assert!(outcome.record.stability > seed.stability);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod corpus;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod sanitize;
pub mod selection;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use corpus::Corpus;
pub use error::{EngineError, EngineResult};

pub use memory::{
    check_invariants, days_until_next_review, MemoryModel, MemoryModelConfig, Rating,
    RatingEffect, ReviewOutcome,
};

pub use selection::{
    learning_stats, shuffle, ColdStartStrategy, DisplayTimePolicy, LearningStats,
    PriorityConfig, PriorityScoreStrategy, ReviewDueStrategy, SelectionContext,
    SelectionStrategy, SessionWord, StrategyKind, WordPriority,
};

pub use lifecycle::{
    auto_manage, ensure_minimum_active, introduce, plan_introductions, AutoManageDecision,
    EnsurePlan, IntroductionOrder, LifecycleAction, LifecycleConfig, ProgressStats, Trigger,
};

/// Session random number generators.
pub mod rng {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    pub fn session_rng() -> ChaCha8Rng {
        ChaCha8Rng::from_entropy()
    }

    pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }
}
