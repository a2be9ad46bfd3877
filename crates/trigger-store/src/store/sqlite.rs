//! SQLite-backed trigger store.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use trigger_core::{error::TriggerError, shellexpand, traits::TriggerStore, Trigger};

/// Path value that selects a private in-memory database.
const IN_MEMORY: &str = ":memory:";

/// Trigger store backed by a SQLite table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `db_path`, running migrations on first use.
    ///
    /// `timeout` bounds connection acquisition and lock waits.
    pub async fn new(db_path: &str, timeout: Duration) -> Result<Self, TriggerError> {
        let pool = if db_path == IN_MEMORY {
            let opts = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| TriggerError::StoreUnavailable(format!("invalid db path: {e}")))?;
            // One connection that never closes, or the data goes with it.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .acquire_timeout(timeout)
                .connect_with(opts)
                .await
        } else {
            let db_path = shellexpand(db_path);

            // Ensure parent directory exists.
            if let Some(parent) = std::path::Path::new(&db_path)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
            {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TriggerError::StoreUnavailable(format!("failed to create data dir: {e}"))
                })?;
            }

            let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
                .map_err(|e| TriggerError::StoreUnavailable(format!("invalid db path: {e}")))?
                .create_if_missing(true)
                .busy_timeout(timeout)
                .journal_mode(SqliteJournalMode::Wal);

            SqlitePoolOptions::new()
                .max_connections(4)
                .acquire_timeout(timeout)
                .connect_with(opts)
                .await
        }
        .map_err(|e| TriggerError::StoreUnavailable(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("SQLite trigger store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run SQL migrations, tracking which have already been applied.
    pub(super) async fn run_migrations(pool: &SqlitePool) -> Result<(), TriggerError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| {
            TriggerError::StoreUnavailable(format!("failed to create migrations table: {e}"))
        })?;

        let migrations: &[(&str, &str)] = &[(
            "001_triggers",
            include_str!("../../migrations/001_triggers.sql"),
        )];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        TriggerError::StoreUnavailable(format!(
                            "failed to check migration {name}: {e}"
                        ))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql).execute(pool).await.map_err(|e| {
                TriggerError::StoreUnavailable(format!("migration {name} failed: {e}"))
            })?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    TriggerError::StoreUnavailable(format!(
                        "failed to record migration {name}: {e}"
                    ))
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl TriggerStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn load(&self) -> Result<Vec<Trigger>, TriggerError> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT keyword, display, response FROM triggers ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| TriggerError::StoreUnavailable(format!("load triggers failed: {e}")))?;

        rows.iter()
            .map(|(keyword, display, response)| Trigger::from_parts(keyword, display, response))
            .collect()
    }

    async fn upsert(&self, trigger: &Trigger) -> Result<(), TriggerError> {
        // Identical rows are left alone so updated_at only moves on change.
        sqlx::query(
            "INSERT INTO triggers (keyword, display, response) VALUES (?, ?, ?) \
             ON CONFLICT(keyword) DO UPDATE SET display = excluded.display, \
             response = excluded.response, updated_at = datetime('now') \
             WHERE triggers.display IS NOT excluded.display \
             OR triggers.response IS NOT excluded.response",
        )
        .bind(&trigger.key)
        .bind(&trigger.display)
        .bind(&trigger.reply)
        .execute(&self.pool)
        .await
        .map_err(|e| TriggerError::StoreUnavailable(format!("upsert trigger failed: {e}")))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, TriggerError> {
        let result = sqlx::query("DELETE FROM triggers WHERE keyword = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| TriggerError::StoreUnavailable(format!("delete trigger failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, TriggerError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM triggers WHERE keyword = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| TriggerError::StoreUnavailable(format!("query failed: {e}")))?;

        Ok(row.is_some())
    }
}
