use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use spellbrew_algo::{ProgressRecord, UserId, Word, WordId};

#[derive(Debug, Default)]
struct Inner {
    words: Vec<Word>,
    word_ids: HashSet<WordId>,
    scripts: HashSet<String>,
    progress: HashMap<UserId, BTreeMap<WordId, ProgressRecord>>,
}

/// Process-local store. Cloning shares the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_words(&self) -> usize {
        self.inner.read().words.len()
    }

    pub fn insert_words(&self, words: &[Word]) -> usize {
        let mut inner = self.inner.write();
        let mut inserted = 0;
        for word in words {
            if inner.word_ids.contains(&word.id) || inner.scripts.contains(&word.hebrew) {
                continue;
            }
            inner.word_ids.insert(word.id);
            inner.scripts.insert(word.hebrew.clone());
            inner.words.push(word.clone());
            inserted += 1;
        }
        inserted
    }

    pub fn load_words(&self) -> Vec<Word> {
        self.inner.read().words.clone()
    }

    pub fn user_progress(&self, user_id: &str) -> Vec<ProgressRecord> {
        self.inner
            .read()
            .progress
            .get(user_id)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_progress(&self, user_id: &str, word_id: WordId) -> Option<ProgressRecord> {
        self.inner
            .read()
            .progress
            .get(user_id)
            .and_then(|records| records.get(&word_id))
            .cloned()
    }

    pub fn introduce(&self, records: &[ProgressRecord]) -> usize {
        let mut inner = self.inner.write();
        let mut inserted = 0;
        for record in records {
            let user = inner.progress.entry(record.user_id.clone()).or_default();
            if !user.contains_key(&record.word_id) {
                user.insert(record.word_id, record.clone());
                inserted += 1;
            }
        }
        inserted
    }

    pub fn save_progress(&self, record: &ProgressRecord) {
        self.inner
            .write()
            .progress
            .entry(record.user_id.clone())
            .or_default()
            .insert(record.word_id, record.clone());
    }
}
