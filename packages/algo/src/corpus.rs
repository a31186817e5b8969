//! Shared vocabulary corpus.
//!
//! Words are kept in frequency order (rank ascending, id as tie-breaker) with
//! lookup indexes by id and by script form.

use std::collections::{HashMap, HashSet};

use crate::error::{EngineError, EngineResult};
use crate::types::{Word, WordId};

#[derive(Clone, Debug, Default)]
pub struct Corpus {
    words: Vec<Word>,
    by_id: HashMap<WordId, usize>,
    by_script: HashMap<String, usize>,
}

impl Corpus {
    /// Build a corpus; later duplicates of an id or script form are dropped.
    pub fn new(mut words: Vec<Word>) -> Self {
        words.sort_by(|a, b| a.rank.cmp(&b.rank).then(a.id.cmp(&b.id)));

        let mut kept = Vec::with_capacity(words.len());
        let mut by_id = HashMap::with_capacity(words.len());
        let mut by_script = HashMap::with_capacity(words.len());
        for word in words {
            if by_id.contains_key(&word.id) || by_script.contains_key(&word.hebrew) {
                continue;
            }
            by_id.insert(word.id, kept.len());
            by_script.insert(word.hebrew.clone(), kept.len());
            kept.push(word);
        }

        Self {
            words: kept,
            by_id,
            by_script,
        }
    }

    /// All words in frequency order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, id: WordId) -> Option<&Word> {
        self.by_id.get(&id).map(|&idx| &self.words[idx])
    }

    pub fn find_by_script(&self, script: &str) -> Option<&Word> {
        self.by_script.get(script).map(|&idx| &self.words[idx])
    }

    /// Look up a submitted token. Surrounding whitespace is ignored; a blank
    /// token is invalid input and an unknown one is not found.
    pub fn resolve(&self, token: &str) -> EngineResult<&Word> {
        let token = token.trim();
        if token.is_empty() {
            return Err(EngineError::InvalidInput("word must not be empty".to_string()));
        }
        self.find_by_script(token)
            .ok_or_else(|| EngineError::NotFound(format!("word {token:?} is not in the corpus")))
    }

    /// Words not in `introduced`, in frequency order.
    pub fn unintroduced<'a, 'b>(
        &'a self,
        introduced: &'b HashSet<WordId>,
    ) -> impl Iterator<Item = &'a Word> + 'b
    where
        'a: 'b,
    {
        self.words
            .iter()
            .filter(move |word| !introduced.contains(&word.id))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn word(id: WordId, rank: i64) -> Word {
        Word {
            id,
            hebrew: format!("w{id}"),
            english: vec![format!("gloss {id}")],
            transliteration: vec![format!("t{id}")],
            rank,
        }
    }

    /// Corpus of `n` words where word `i` has rank `i`.
    pub fn corpus(n: i64) -> Corpus {
        Corpus::new((1..=n).map(|i| word(i, i)).collect())
    }
}
