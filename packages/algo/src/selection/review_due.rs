//! Due-date driven selection.
//!
//! A user without records gets the cold-start batch. Otherwise due records
//! are ranked lowest-confidence first and the batch is backfilled with words
//! the user has never been introduced to, in corpus frequency order. Due words
//! always come before backfill.

use std::cmp::Ordering;
use std::collections::HashSet;

use rand::RngCore;

use crate::types::{ProgressRecord, Word, WordId};

use super::{SelectionContext, SelectionStrategy, SessionWord};

/// The `count` most frequent corpus words with seed progress, in frequency order.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColdStartStrategy;

impl SelectionStrategy for ColdStartStrategy {
    fn name(&self) -> &'static str {
        "cold_start"
    }

    fn select_batch(
        &self,
        ctx: &SelectionContext<'_>,
        count: usize,
        _rng: &mut dyn RngCore,
    ) -> Vec<SessionWord> {
        ctx.corpus
            .words()
            .iter()
            .take(count)
            .map(|word| SessionWord::fresh(ctx, word))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ReviewDueStrategy;

struct DueCandidate<'a> {
    word: &'a Word,
    record: &'a ProgressRecord,
    retrievability: f64,
}

impl ReviewDueStrategy {
    fn compare(a: &DueCandidate<'_>, b: &DueCandidate<'_>) -> Ordering {
        a.retrievability
            .total_cmp(&b.retrievability)
            .then(a.record.review_count.cmp(&b.record.review_count))
            .then(b.record.times_wrong.cmp(&a.record.times_wrong))
            .then(a.word.rank.cmp(&b.word.rank))
            .then(a.word.id.cmp(&b.word.id))
    }
}

impl SelectionStrategy for ReviewDueStrategy {
    fn name(&self) -> &'static str {
        "review_due"
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
        if ctx.progress.is_empty() {
            return ColdStartStrategy.select_batch(ctx, count, rng);
        }

        let mut introduced: HashSet<WordId> = HashSet::with_capacity(ctx.progress.len());
        let mut due: Vec<DueCandidate<'_>> = Vec::new();
        for record in ctx.progress {
            if !introduced.insert(record.word_id) {
                continue;
            }
            // records whose word left the corpus cannot be shown
            let Some(word) = ctx.corpus.get(record.word_id) else {
                continue;
            };
            if record.is_due(ctx.now) {
                due.push(DueCandidate {
                    word,
                    record,
                    retrievability: ctx.model.current_retrievability(record, ctx.now),
                });
            }
        }
        due.sort_by(Self::compare);

        let mut batch: Vec<SessionWord> = due
            .into_iter()
            .take(count)
            .map(|c| SessionWord::existing(ctx, c.word, c.record))
            .collect();

        let remaining = count - batch.len();
        if remaining > 0 {
            batch.extend(
                ctx.corpus
                    .unintroduced(&introduced)
                    .take(remaining)
                    .map(|word| SessionWord::fresh(ctx, word)),
            );
        }
        batch
    }
}
