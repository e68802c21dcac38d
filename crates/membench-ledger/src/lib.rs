//! Durable completion tracking for resumable membench runs.
//!
//! The progress ledger records ingested task ids; the result store records
//! search outcomes. Both are append-only line files whose contents define the
//! skip set of the next run.

use async_trait::async_trait;
use membench_types::ResultRecord;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

mod memory;
mod sink;
mod progress;
mod results;

pub use memory::{InMemoryProgressLedger, InMemoryResultStore};
pub use progress::{check_line_id, FileProgressLedger, PROGRESS_LEDGER_FILE_NAME};
pub use results::{JsonlResultStore, RESULT_STORE_FILE_NAME};

/// Result type for ledger and result store operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Persistence failures. A failed append counts as a failed task.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to load {path}: {reason}")]
    Load { path: PathBuf, reason: String },
    #[error("failed to reset {path}: {reason}")]
    Reset { path: PathBuf, reason: String },
    #[error("sink rejected append: {0}")]
    Rejected(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Append-only record of task ids whose backend call succeeded.
#[async_trait]
pub trait ProgressLedger: Send + Sync {
    /// Ids already handled. Read once before a run starts.
    async fn load(&self) -> LedgerResult<HashSet<String>>;

    /// Appends one id. Safe to call from many workers at once.
    async fn record_completion(&self, task_id: &str) -> LedgerResult<()>;
}

/// Append-only store of per-task search results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Ids that already have a stored result.
    async fn completed_ids(&self) -> LedgerResult<HashSet<String>>;

    /// Appends one record as a single line. Safe to call from many workers at once.
    async fn append(&self, record: &ResultRecord) -> LedgerResult<()>;

    /// Drops every stored record.
    async fn truncate(&self) -> LedgerResult<()>;
}
