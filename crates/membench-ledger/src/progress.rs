use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::sink::LineSink;
use crate::{LedgerError, LedgerResult, ProgressLedger};

pub const PROGRESS_LEDGER_FILE_NAME: &str = "success_records.txt";

/// Rejects ids the line format cannot store and read back unchanged.
///
/// Lines are trimmed on load, so an id with surrounding whitespace or a line
/// break would never match itself on resume.
pub fn check_line_id(task_id: &str) -> LedgerResult<()> {
    let reason = if task_id.is_empty() {
        "is empty"
    } else if task_id.contains(['\n', '\r']) {
        "contains a line break"
    } else if task_id.trim() != task_id {
        "has leading or trailing whitespace"
    } else {
        return Ok(());
    };
    Err(LedgerError::Rejected(format!(
        "task id {task_id:?} {reason} and cannot be stored as a ledger line"
    )))
}

/// Line-per-id ledger file. A missing file is an empty ledger.
#[derive(Debug)]
pub struct FileProgressLedger {
    sink: LineSink,
}

impl FileProgressLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            sink: LineSink::new(path.into()),
        }
    }

    /// Ledger at `<record_dir>/success_records.txt`.
    pub fn in_dir(record_dir: &Path) -> Self {
        Self::new(record_dir.join(PROGRESS_LEDGER_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        self.sink.path()
    }
}

#[async_trait]
impl ProgressLedger for FileProgressLedger {
    async fn load(&self) -> LedgerResult<HashSet<String>> {
        let lines = self
            .sink
            .load_blocking(membench_core::read_trimmed_lines)
            .await?;
        let completed = lines.into_iter().collect::<HashSet<_>>();
        debug!(path = %self.path().display(), count = completed.len(), "loaded progress ledger");
        Ok(completed)
    }

    async fn record_completion(&self, task_id: &str) -> LedgerResult<()> {
        check_line_id(task_id)?;
        self.sink.append_line(task_id).await
    }
}
