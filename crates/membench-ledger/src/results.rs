use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use membench_types::ResultRecord;
use serde::Deserialize;
use tracing::{info, warn};

use crate::sink::LineSink;
use crate::{LedgerError, LedgerResult, ResultStore};

pub const RESULT_STORE_FILE_NAME: &str = "search_results.jsonl";

#[derive(Debug, Deserialize)]
struct StoredId {
    id: String,
}

/// JSONL file of [`ResultRecord`]s, one per line.
#[derive(Debug)]
pub struct JsonlResultStore {
    sink: LineSink,
}

impl JsonlResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            sink: LineSink::new(path.into()),
        }
    }

    /// Store at `<result_dir>/search_results.jsonl`.
    pub fn in_dir(result_dir: &Path) -> Self {
        Self::new(result_dir.join(RESULT_STORE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        self.sink.path()
    }

    /// Every decodable record, in file order.
    pub fn load_records(&self) -> LedgerResult<Vec<ResultRecord>> {
        let load = membench_core::read_jsonl_file::<ResultRecord>(self.path()).map_err(|error| {
            LedgerError::Load {
                path: self.path().to_path_buf(),
                reason: format!("{error:#}"),
            }
        })?;
        Ok(load.records)
    }
}

#[async_trait]
impl ResultStore for JsonlResultStore {
    async fn completed_ids(&self) -> LedgerResult<HashSet<String>> {
        let load = self
            .sink
            .load_blocking(membench_core::read_jsonl_file::<StoredId>)
            .await?;
        if !load.skipped.is_empty() {
            warn!(
                path = %self.path().display(),
                skipped = load.skipped.len(),
                "result store contains unreadable lines; their tasks will be searched again"
            );
        }
        Ok(load.records.into_iter().map(|stored| stored.id).collect())
    }

    async fn append(&self, record: &ResultRecord) -> LedgerResult<()> {
        let line = serde_json::to_string(record)?;
        self.sink.append_line(&line).await
    }

    async fn truncate(&self) -> LedgerResult<()> {
        info!(path = %self.path().display(), "clearing result store");
        self.sink.reset().await
    }
}
