//! Property-based tests for the scheduling service
//!
//! Tests the following invariants:
//! - Session batches never repeat a word and never exceed the request
//! - Every stored record keeps timesWrong <= timesSeen and positive stability
//!   across any sequence of batches and outcomes
//! - Introductions are idempotent: a word is never introduced twice

use std::collections::HashSet;

use proptest::prelude::*;

use spellbrew_algo::{check_invariants, StrategyKind};
use spellbrew_backend::config::SchedulingSettings;
use spellbrew_backend::services::scheduling::OutcomeInput;
use spellbrew_backend::services::Scheduler;
use spellbrew_backend::store::{MemoryStore, Store};

mod common;

const USER: &str = "pbt-user";

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone)]
enum Step {
    Batch(usize),
    Answer(Vec<(i64, bool)>),
    Ensure(usize),
    AutoManage,
}

fn arb_strategy_kind() -> impl Strategy<Value = StrategyKind> {
    prop_oneof![
        Just(StrategyKind::ReviewDue),
        Just(StrategyKind::PriorityScore),
        Just(StrategyKind::ColdStart),
    ]
}

fn arb_step(corpus_size: i64) -> impl Strategy<Value = Step> {
    prop_oneof![
        (1usize..30).prop_map(Step::Batch),
        prop::collection::vec((1..=corpus_size + 5, any::<bool>()), 1..10).prop_map(Step::Answer),
        (1usize..25).prop_map(Step::Ensure),
        Just(Step::AutoManage),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn scheduler(corpus_size: i64, strategy: StrategyKind) -> Scheduler {
    let store = Store::Memory(MemoryStore::new());
    store
        .insert_words(&common::fixture_words(corpus_size))
        .await
        .unwrap();
    let settings = SchedulingSettings {
        strategy,
        ..Default::default()
    };
    Scheduler::load(store, &settings).await.unwrap()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_operation_sequences_keep_invariants(
        corpus_size in 1i64..40,
        strategy in arb_strategy_kind(),
        steps in prop::collection::vec(arb_step(40), 1..15),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let scheduler = scheduler(corpus_size, strategy).await;

            for step in &steps {
                match step {
                    Step::Batch(count) => {
                        let batch = scheduler.select_batch(USER, *count).await.unwrap();
                        assert!(batch.words.len() <= *count);
                        let ids: HashSet<i64> = batch.words.iter().map(|w| w.word.id).collect();
                        assert_eq!(ids.len(), batch.words.len());
                    }
                    Step::Answer(answers) => {
                        let outcomes: Vec<OutcomeInput> = answers
                            .iter()
                            .map(|(id, correct)| OutcomeInput {
                                hebrew: format!("מילה{id}"),
                                correct: *correct,
                            })
                            .collect();
                        let results = scheduler.record_outcomes(USER, &outcomes).await.unwrap();
                        assert_eq!(results.len(), outcomes.len());
                    }
                    Step::Ensure(min) => {
                        let result = scheduler.ensure_minimum_active(USER, *min).await.unwrap();
                        assert_eq!(result.active_after, result.active_before + result.added);
                    }
                    Step::AutoManage => {
                        let result = scheduler.auto_manage(USER).await.unwrap();
                        assert!(result.words_added <= result.decision.count_to_add);
                    }
                }

                let records = scheduler.store().user_progress(USER).await.unwrap();
                assert!(records.len() <= corpus_size as usize);

                let ids: HashSet<i64> = records.iter().map(|r| r.word_id).collect();
                assert_eq!(ids.len(), records.len());

                for record in &records {
                    assert!(check_invariants(record).is_ok(), "{record:?}");
                    assert!(record.word_id >= 1 && record.word_id <= corpus_size);
                }
            }
        });
    }

    #[test]
    fn prop_answers_for_unserved_words_are_not_found(
        corpus_size in 5i64..30,
        ids in prop::collection::vec(1i64..40, 1..10),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let scheduler = scheduler(corpus_size, StrategyKind::ReviewDue).await;
            let outcomes: Vec<OutcomeInput> = ids
                .iter()
                .map(|id| OutcomeInput {
                    hebrew: format!("מילה{id}"),
                    correct: true,
                })
                .collect();

            let results = scheduler.record_outcomes(USER, &outcomes).await.unwrap();
            assert!(results.iter().all(|r| !r.is_updated()));
            assert!(scheduler.store().user_progress(USER).await.unwrap().is_empty());
        });
    }
}
