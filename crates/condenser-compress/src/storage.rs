//! Summary persistence: one forward-only record per conversation

use crate::error::{StoreError, StoreResult};
use crate::types::SaveOutcome;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use condenser_core::ConversationSummary;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage backend for conversation summaries
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    /// Create the table and index if absent
    async fn init(&self) -> StoreResult<()>;

    async fn fetch(&self, conversation_id: &str) -> StoreResult<Option<ConversationSummary>>;

    /// Insert or update only when `compressed_through` moves forward
    async fn save_forward(
        &self,
        conversation_id: &str,
        summary_text: &str,
        compressed_through: usize,
        now: DateTime<Utc>,
    ) -> StoreResult<SaveOutcome>;

    /// Most recently updated summaries first
    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<ConversationSummary>>;
}

#[derive(Debug, Clone)]
pub struct SqliteSummaryBackend {
    db_path: PathBuf,
}

impl SqliteSummaryBackend {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run `func` on a fresh connection on the blocking pool; the connection
    /// is dropped before this returns
    async fn with_connection<T, F>(&self, func: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = open_connection(&db_path)?;
            func(&mut connection)
        })
        .await
        .map_err(|error| StoreError::Task(error.to_string()))?
    }
}

fn open_connection(db_path: &Path) -> StoreResult<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let connection = Connection::open(db_path)?;
    connection.busy_timeout(BUSY_TIMEOUT)?;
    Ok(connection)
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

fn to_index(raw: i64) -> StoreResult<usize> {
    usize::try_from(raw)
        .map_err(|_| StoreError::InvalidData(format!("negative compressed_through {}", raw)))
}

fn to_column(value: usize) -> StoreResult<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("compressed_through {} overflows", value)))
}

type SummaryRow = (String, String, i64, String, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SummaryRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn row_to_summary(row: SummaryRow) -> StoreResult<ConversationSummary> {
    let (conversation_id, summary_text, compressed_through, created_at, updated_at) = row;
    Ok(ConversationSummary {
        conversation_id,
        summary_text,
        compressed_through: to_index(compressed_through)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait]
impl SummaryBackend for SqliteSummaryBackend {
    async fn init(&self) -> StoreResult<()> {
        self.with_connection(|connection| {
            connection.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS chat_summary (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    conversation_id TEXT NOT NULL UNIQUE,
                    summary_text TEXT NOT NULL,
                    compressed_through INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_chat_summary_conversation
                    ON chat_summary(conversation_id);
                ",
            )?;
            Ok(())
        })
        .await
    }

    async fn fetch(&self, conversation_id: &str) -> StoreResult<Option<ConversationSummary>> {
        let conversation_id = conversation_id.to_string();
        self.with_connection(move |connection| {
            let row = connection
                .query_row(
                    "SELECT conversation_id, summary_text, compressed_through, created_at, updated_at
                     FROM chat_summary WHERE conversation_id = ?1",
                    params![conversation_id],
                    read_row,
                )
                .optional()?;
            row.map(row_to_summary).transpose()
        })
        .await
    }

    async fn save_forward(
        &self,
        conversation_id: &str,
        summary_text: &str,
        compressed_through: usize,
        now: DateTime<Utc>,
    ) -> StoreResult<SaveOutcome> {
        let conversation_id = conversation_id.to_string();
        let summary_text = summary_text.to_string();
        let through = to_column(compressed_through)?;
        let now = format_timestamp(now);

        self.with_connection(move |connection| {
            let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT compressed_through FROM chat_summary WHERE conversation_id = ?1",
                    params![conversation_id],
                    |row| row.get(0),
                )
                .optional()?;

            let outcome = match existing {
                Some(stored) if stored >= through => SaveOutcome::Stale {
                    stored: to_index(stored)?,
                },
                Some(stored) => {
                    tx.execute(
                        "UPDATE chat_summary
                         SET summary_text = ?2,
                             compressed_through = ?3,
                             updated_at = MAX(created_at, ?4)
                         WHERE conversation_id = ?1 AND compressed_through < ?3",
                        params![conversation_id, summary_text, through, now],
                    )?;
                    SaveOutcome::Updated {
                        previous: to_index(stored)?,
                    }
                }
                None => {
                    tx.execute(
                        "INSERT INTO chat_summary
                            (conversation_id, summary_text, compressed_through, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?4)",
                        params![conversation_id, summary_text, through, now],
                    )?;
                    SaveOutcome::Created
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
        .await
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<ConversationSummary>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_connection(move |connection| {
            let mut stmt = connection.prepare(
                "SELECT conversation_id, summary_text, compressed_through, created_at, updated_at
                 FROM chat_summary ORDER BY updated_at DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![limit], read_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(row_to_summary).collect()
        })
        .await
    }
}

/// Best-effort facade over a [`SummaryBackend`]
///
/// Reads and writes never return errors: failures are logged, reads become
/// `None` and writes become [`SaveOutcome::Failed`].
#[derive(Clone)]
pub struct SummaryStore {
    backend: Arc<dyn SummaryBackend>,
}

impl SummaryStore {
    pub fn new(backend: Arc<dyn SummaryBackend>) -> Self {
        Self { backend }
    }

    pub fn sqlite(db_path: impl AsRef<Path>) -> Self {
        Self::new(Arc::new(SqliteSummaryBackend::new(db_path)))
    }

    /// Create the schema; callers decide whether a failure is fatal
    pub async fn initialize(&self) -> StoreResult<()> {
        self.backend.init().await
    }

    pub async fn load(&self, conversation_id: &str) -> Option<ConversationSummary> {
        match self.backend.fetch(conversation_id).await {
            Ok(Some(record)) => {
                tracing::debug!(
                    conversation_id,
                    compressed_through = record.compressed_through,
                    updated_at = %record.updated_at,
                    "loaded summary"
                );
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(conversation_id, error = %e, "summary read failed, continuing without summary");
                None
            }
        }
    }

    pub async fn save(
        &self,
        conversation_id: &str,
        summary_text: &str,
        compressed_through: usize,
    ) -> SaveOutcome {
        let result = self
            .backend
            .save_forward(conversation_id, summary_text, compressed_through, Utc::now())
            .await;

        match result {
            Ok(SaveOutcome::Stale { stored }) => {
                tracing::debug!(
                    conversation_id,
                    new = compressed_through,
                    stored,
                    "skipping summary update, progress did not move forward"
                );
                SaveOutcome::Stale { stored }
            }
            Ok(outcome) => {
                tracing::info!(conversation_id, compressed_through, ?outcome, "summary saved");
                outcome
            }
            Err(e) => {
                tracing::error!(conversation_id, error = %e, "summary save failed");
                SaveOutcome::Failed
            }
        }
    }

    pub async fn list_recent(&self, limit: usize) -> Vec<ConversationSummary> {
        match self.backend.list_recent(limit).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "summary listing failed");
                Vec::new()
            }
        }
    }
}
