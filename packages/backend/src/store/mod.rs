//! Persistence for the corpus and per-user progress records.
//!
//! [`Store`] dispatches to an in-process map store or a SQLite pool; which one
//! is picked from `DATABASE_URL`. Both give read-your-writes and write a
//! reviewed record as one unit.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use spellbrew_algo::{ProgressRecord, Word, WordId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unsupported database url: {0}")]
    Config(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Sqlite,
}

impl StoreKind {
    pub fn detect(database_url: Option<&str>) -> Result<Self, StoreError> {
        match database_url {
            None => Ok(StoreKind::Memory),
            Some(url) if url.starts_with("sqlite:") => Ok(StoreKind::Sqlite),
            Some(url) => Err(StoreError::Config(url.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Memory => "memory",
            StoreKind::Sqlite => "sqlite",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub async fn connect(database_url: Option<&str>) -> Result<Self, StoreError> {
        match (StoreKind::detect(database_url)?, database_url) {
            (StoreKind::Sqlite, Some(url)) => Ok(Store::Sqlite(SqliteStore::connect(url).await?)),
            _ => Ok(Store::Memory(MemoryStore::new())),
        }
    }

    pub fn kind(&self) -> StoreKind {
        match self {
            Store::Memory(_) => StoreKind::Memory,
            Store::Sqlite(_) => StoreKind::Sqlite,
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Store::Memory(_) => Ok(()),
            Store::Sqlite(store) => store.ping().await,
        }
    }

    // ==================== Corpus ====================

    pub async fn count_words(&self) -> Result<usize, StoreError> {
        match self {
            Store::Memory(store) => Ok(store.count_words()),
            Store::Sqlite(store) => store.count_words().await,
        }
    }

    /// Insert words, skipping ids or script forms already present. Returns
    /// the number inserted.
    pub async fn insert_words(&self, words: &[Word]) -> Result<usize, StoreError> {
        match self {
            Store::Memory(store) => Ok(store.insert_words(words)),
            Store::Sqlite(store) => store.insert_words(words).await,
        }
    }

    pub async fn load_words(&self) -> Result<Vec<Word>, StoreError> {
        match self {
            Store::Memory(store) => Ok(store.load_words()),
            Store::Sqlite(store) => store.load_words().await,
        }
    }

    // ==================== Progress ====================

    pub async fn user_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        match self {
            Store::Memory(store) => Ok(store.user_progress(user_id)),
            Store::Sqlite(store) => store.user_progress(user_id).await,
        }
    }

    pub async fn get_progress(
        &self,
        user_id: &str,
        word_id: WordId,
    ) -> Result<Option<ProgressRecord>, StoreError> {
        match self {
            Store::Memory(store) => Ok(store.get_progress(user_id, word_id)),
            Store::Sqlite(store) => store.get_progress(user_id, word_id).await,
        }
    }

    /// Insert seed records; existing (user, word) pairs are left untouched.
    /// Returns the number inserted.
    pub async fn introduce(&self, records: &[ProgressRecord]) -> Result<usize, StoreError> {
        match self {
            Store::Memory(store) => Ok(store.introduce(records)),
            Store::Sqlite(store) => store.introduce(records).await,
        }
    }

    /// Replace an existing record as a whole.
    pub async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        match self {
            Store::Memory(store) => {
                store.save_progress(record);
                Ok(())
            }
            Store::Sqlite(store) => store.save_progress(record).await,
        }
    }
}
