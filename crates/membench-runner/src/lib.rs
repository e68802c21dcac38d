//! Bounded-concurrency ingestion and search runs against a memory backend.

use anyhow::Result;
use membench_types::{BackendKind, DEFAULT_RUN_VERSION};

mod aggregate;
mod plan;
mod runner;

pub use aggregate::{dedup_memories, AggregationError, ResultAggregator};
pub use plan::{natural_id_cmp, plan_search_run, SearchPlan, SearchPolicy};
pub use runner::{RunProgress, RunSummary, TaskError, TaskRunner};

/// Library default for [`RunnerConfig::workers`].
pub const DEFAULT_WORKERS: usize = 16;
pub const DEFAULT_TOP_K: usize = 10;

/// Run-wide settings, captured once so workers never consult the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub workers: usize,
    pub backend_kind: BackendKind,
    /// Run version embedded in every session key.
    pub version: String,
    pub top_k: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            backend_kind: BackendKind::MemosApi,
            version: DEFAULT_RUN_VERSION.to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl RunnerConfig {
    pub fn new(backend_kind: BackendKind) -> Self {
        Self {
            backend_kind,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be greater than 0");
        }
        if self.top_k == 0 {
            anyhow::bail!("top_k must be greater than 0");
        }
        if self.version.trim().is_empty() {
            anyhow::bail!("version cannot be empty");
        }
        Ok(())
    }
}
