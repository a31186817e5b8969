use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use spellbrew_algo::{ProgressRecord, Word, WordId};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::StoreError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS "words" (
        "id" INTEGER PRIMARY KEY,
        "hebrew" TEXT NOT NULL UNIQUE,
        "english" TEXT NOT NULL,
        "transliteration" TEXT NOT NULL,
        "rank" INTEGER NOT NULL
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS "idx_words_rank" ON "words" ("rank", "id")"#,
    r#"
    CREATE TABLE IF NOT EXISTS "progress" (
        "user_id" TEXT NOT NULL,
        "word_id" INTEGER NOT NULL REFERENCES "words" ("id"),
        "stability" REAL NOT NULL,
        "difficulty" REAL NOT NULL,
        "retrievability" REAL NOT NULL,
        "review_count" INTEGER NOT NULL,
        "times_seen" INTEGER NOT NULL,
        "times_wrong" INTEGER NOT NULL,
        "last_review_at" TEXT,
        "next_review_at" TEXT,
        "first_seen_at" TEXT NOT NULL,
        PRIMARY KEY ("user_id", "word_id")
    )
    "#,
];

const PROGRESS_COLUMNS: &str = r#""user_id", "word_id", "stability", "difficulty", "retrievability",
    "review_count", "times_seen", "times_wrong", "last_review_at", "next_review_at", "first_seen_at""#;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::Config(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(30));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // every connection to an in-memory url opens its own database
        let mut pool_options = SqlitePoolOptions::new().max_connections(5);
        if in_memory {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(url = %database_url, "sqlite store ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ==================== Corpus ====================

    pub async fn count_words(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "words""#)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }

    pub async fn insert_words(&self, words: &[Word]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for word in words {
            let english = encode_list(&word.english)?;
            let transliteration = encode_list(&word.transliteration)?;
            let result = sqlx::query(
                r#"
                INSERT INTO "words" ("id", "hebrew", "english", "transliteration", "rank")
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(word.id)
            .bind(&word.hebrew)
            .bind(english)
            .bind(transliteration)
            .bind(word.rank)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected() as usize;
        }
        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn load_words(&self) -> Result<Vec<Word>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT "id", "hebrew", "english", "transliteration", "rank" FROM "words" ORDER BY "rank", "id""#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_word).collect()
    }

    // ==================== Progress ====================

    pub async fn user_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        let sql = format!(
            r#"SELECT {PROGRESS_COLUMNS} FROM "progress" WHERE "user_id" = ? ORDER BY "word_id""#
        );
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        rows.iter().map(map_progress).collect()
    }

    pub async fn get_progress(
        &self,
        user_id: &str,
        word_id: WordId,
    ) -> Result<Option<ProgressRecord>, StoreError> {
        let sql = format!(
            r#"SELECT {PROGRESS_COLUMNS} FROM "progress" WHERE "user_id" = ? AND "word_id" = ?"#
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(word_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_progress).transpose()
    }

    pub async fn introduce(&self, records: &[ProgressRecord]) -> Result<usize, StoreError> {
        let sql = format!(
            r#"INSERT INTO "progress" ({PROGRESS_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT ("user_id", "word_id") DO NOTHING"#
        );
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for record in records {
            let result = sqlx::query(&sql)
                .bind(&record.user_id)
                .bind(record.word_id)
                .bind(record.stability)
                .bind(record.difficulty)
                .bind(record.retrievability)
                .bind(i64::from(record.review_count))
                .bind(i64::from(record.times_seen))
                .bind(i64::from(record.times_wrong))
                .bind(record.last_review_at)
                .bind(record.next_review_at)
                .bind(record.first_seen_at)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected() as usize;
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Single-statement update so a review is never partially applied.
    pub async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE "progress" SET
                "stability" = ?, "difficulty" = ?, "retrievability" = ?,
                "review_count" = ?, "times_seen" = ?, "times_wrong" = ?,
                "last_review_at" = ?, "next_review_at" = ?
            WHERE "user_id" = ? AND "word_id" = ?
            "#,
        )
        .bind(record.stability)
        .bind(record.difficulty)
        .bind(record.retrievability)
        .bind(i64::from(record.review_count))
        .bind(i64::from(record.times_seen))
        .bind(i64::from(record.times_wrong))
        .bind(record.last_review_at)
        .bind(record.next_review_at)
        .bind(&record.user_id)
        .bind(record.word_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Corrupt(format!(
                "no progress row for user {} word {}",
                record.user_id, record.word_id
            )));
        }
        Ok(())
    }
}

fn encode_list(values: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(values).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn decode_list(raw: &str) -> Result<Vec<String>, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt(format!("string list: {e}")))
}

fn counter(row: &SqliteRow, column: &str) -> Result<u32, StoreError> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} = {value}")))
}

fn map_word(row: &SqliteRow) -> Result<Word, StoreError> {
    Ok(Word {
        id: row.try_get("id")?,
        hebrew: row.try_get("hebrew")?,
        english: decode_list(&row.try_get::<String, _>("english")?)?,
        transliteration: decode_list(&row.try_get::<String, _>("transliteration")?)?,
        rank: row.try_get("rank")?,
    })
}

fn map_progress(row: &SqliteRow) -> Result<ProgressRecord, StoreError> {
    Ok(ProgressRecord {
        user_id: row.try_get("user_id")?,
        word_id: row.try_get("word_id")?,
        stability: row.try_get("stability")?,
        difficulty: row.try_get("difficulty")?,
        retrievability: row.try_get("retrievability")?,
        review_count: counter(row, "review_count")?,
        times_seen: counter(row, "times_seen")?,
        times_wrong: counter(row, "times_wrong")?,
        last_review_at: row.try_get::<Option<DateTime<Utc>>, _>("last_review_at")?,
        next_review_at: row.try_get::<Option<DateTime<Utc>>, _>("next_review_at")?,
        first_seen_at: row.try_get::<DateTime<Utc>, _>("first_seen_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn word(id: WordId, hebrew: &str) -> Word {
        Word {
            id,
            hebrew: hebrew.to_string(),
            english: vec!["of".to_string(), "belonging to".to_string()],
            transliteration: vec!["shel".to_string()],
            rank: 10 - id,
        }
    }

    async fn store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_words_round_trip_in_rank_order() {
        let store = store().await;
        let inserted = store
            .insert_words(&[word(1, "של"), word(2, "את"), word(3, "של")])
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.count_words().await.unwrap(), 2);

        let words = store.load_words().await.unwrap();
        assert_eq!(words.iter().map(|w| w.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(words[1].english, vec!["of", "belonging to"]);
    }

    #[tokio::test]
    async fn test_introduce_and_update_progress() {
        let store = store().await;
        store.insert_words(&[word(1, "של"), word(2, "את")]).await.unwrap();
        let now = Utc::now();

        let seeds = vec![ProgressRecord::seed("u1", 1, now), ProgressRecord::seed("u1", 2, now)];
        assert_eq!(store.introduce(&seeds).await.unwrap(), 2);
        assert_eq!(store.introduce(&seeds[..1]).await.unwrap(), 0);

        let mut record = store.get_progress("u1", 1).await.unwrap().unwrap();
        assert_eq!(record.last_review_at, None);
        record.stability = 0.13;
        record.difficulty = 4.9;
        record.review_count = 1;
        record.times_seen = 1;
        record.last_review_at = Some(now);
        record.next_review_at = Some(now + ChronoDuration::days(1));
        store.save_progress(&record).await.unwrap();

        let loaded = store.get_progress("u1", 1).await.unwrap().unwrap();
        assert_eq!(loaded.review_count, 1);
        assert!((loaded.stability - 0.13).abs() < 1e-12);
        assert_eq!(
            loaded.next_review_at.map(|t| t.timestamp_millis()),
            Some((now + ChronoDuration::days(1)).timestamp_millis())
        );
        assert_eq!(store.user_progress("u1").await.unwrap().len(), 2);
        assert!(store.user_progress("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_of_missing_row_fails() {
        let store = store().await;
        let record = ProgressRecord::seed("u1", 42, Utc::now());
        assert!(matches!(
            store.save_progress(&record).await,
            Err(StoreError::Corrupt(_))
        ));
    }
}
