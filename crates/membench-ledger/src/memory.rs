use std::collections::HashSet;

use async_trait::async_trait;
use membench_types::ResultRecord;
use tokio::sync::RwLock;

use crate::{LedgerResult, ProgressLedger, ResultStore};

/// In-memory ledger for tests and dry runs. Keeps every append, duplicates included.
#[derive(Debug, Default)]
pub struct InMemoryProgressLedger {
    entries: RwLock<Vec<String>>,
}

impl InMemoryProgressLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_completed<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: RwLock::new(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Appended ids in append order.
    pub async fn entries(&self) -> Vec<String> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl ProgressLedger for InMemoryProgressLedger {
    async fn load(&self) -> LedgerResult<HashSet<String>> {
        Ok(self.entries.read().await.iter().cloned().collect())
    }

    async fn record_completion(&self, task_id: &str) -> LedgerResult<()> {
        self.entries.write().await.push(task_id.to_string());
        Ok(())
    }
}

/// In-memory result store for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    records: RwLock<Vec<ResultRecord>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ResultRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Stored records in append order.
    pub async fn records(&self) -> Vec<ResultRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn completed_ids(&self) -> LedgerResult<HashSet<String>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .map(|record| record.id.clone())
            .collect())
    }

    async fn append(&self, record: &ResultRecord) -> LedgerResult<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn truncate(&self) -> LedgerResult<()> {
        self.records.write().await.clear();
        Ok(())
    }
}
