use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use membench_backend::{BackendError, ContextRenderer, MemoryBackend};
use membench_ledger::{check_line_id, LedgerError, ProgressLedger, ResultStore};
use membench_types::{BackendKind, Task};
use thiserror::Error;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::{ResultAggregator, RunnerConfig};

/// Why one task did not complete.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("backend call failed: {0}")]
    Backend(#[from] BackendError),
    #[error("failed to persist completion: {0}")]
    Persistence(#[from] LedgerError),
}

/// Counts reported once a run has drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    /// Tasks submitted after resume filtering and duplicate removal.
    pub total: usize,
    pub failed: usize,
    /// Duplicate ids plus tasks left unsubmitted by shutdown.
    pub skipped: usize,
}

/// Live counter of finished tasks, successes and failures alike.
#[derive(Debug, Default)]
pub struct RunProgress {
    finished: AtomicUsize,
    total: AtomicUsize,
}

impl RunProgress {
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    fn start(&self, total: usize) {
        self.finished.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    fn record_finished(&self) -> usize {
        self.finished.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Work done for one task once it holds a worker slot.
#[async_trait]
trait TaskJob: Send + Sync + 'static {
    async fn process(&self, task: &Task) -> Result<(), TaskError>;
}

struct IngestJob {
    backend: Arc<dyn MemoryBackend>,
    ledger: Arc<dyn ProgressLedger>,
    kind: BackendKind,
    version: String,
}

#[async_trait]
impl TaskJob for IngestJob {
    async fn process(&self, task: &Task) -> Result<(), TaskError> {
        // An id the ledger cannot read back would be re-added on every resume.
        check_line_id(&task.id)?;
        let session = task.session_key(self.kind, &self.version);
        self.backend.add(task.turns(), &session).await?;
        self.ledger.record_completion(&task.id).await?;
        Ok(())
    }
}

struct SearchJob {
    aggregator: ResultAggregator,
    store: Arc<dyn ResultStore>,
}

#[async_trait]
impl TaskJob for SearchJob {
    async fn process(&self, task: &Task) -> Result<(), TaskError> {
        let record = self.aggregator.aggregate(task).await;
        self.store.append(&record).await?;
        Ok(())
    }
}

/// Bounded worker pool dispatching tasks against one memory backend.
pub struct TaskRunner {
    backend: Arc<dyn MemoryBackend>,
    config: RunnerConfig,
    progress: Arc<RunProgress>,
}

impl TaskRunner {
    /// Creates a runner bound to `backend`. The config must name the same backend kind.
    pub fn new(backend: Arc<dyn MemoryBackend>, config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        if backend.kind() != config.backend_kind {
            anyhow::bail!(
                "runner configured for backend '{}' but was given '{}'",
                config.backend_kind,
                backend.kind()
            );
        }
        Ok(Self {
            backend,
            config,
            progress: Arc::new(RunProgress::default()),
        })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Shared progress handle; valid across runs.
    pub fn progress(&self) -> Arc<RunProgress> {
        self.progress.clone()
    }

    /// Adds every task not yet in `ledger`, recording each success.
    #[instrument(skip_all, fields(backend = %self.config.backend_kind, candidates = tasks.len()))]
    pub async fn run_ingestion(
        &self,
        tasks: Vec<Task>,
        ledger: Arc<dyn ProgressLedger>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary> {
        let completed = ledger
            .load()
            .await
            .context("failed to load progress ledger")?;
        let pending = tasks
            .into_iter()
            .filter(|task| !completed.contains(&task.id))
            .collect::<Vec<_>>();
        info!(
            already_completed = completed.len(),
            pending = pending.len(),
            "resuming ingestion"
        );

        let job = Arc::new(IngestJob {
            backend: self.backend.clone(),
            ledger,
            kind: self.config.backend_kind,
            version: self.config.version.clone(),
        });
        Ok(self.dispatch(job, pending, shutdown).await)
    }

    /// Searches every task and appends one result record per success.
    ///
    /// `tasks` is taken as planned; see [`crate::plan_search_run`].
    #[instrument(skip_all, fields(backend = %self.config.backend_kind, candidates = tasks.len()))]
    pub async fn run_search(
        &self,
        tasks: Vec<Task>,
        store: Arc<dyn ResultStore>,
        renderer: Arc<dyn ContextRenderer>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary> {
        let job = Arc::new(SearchJob {
            aggregator: ResultAggregator::new(
                self.backend.clone(),
                renderer,
                self.config.version.clone(),
                self.config.top_k,
            ),
            store,
        });
        Ok(self.dispatch(job, tasks, shutdown).await)
    }

    async fn dispatch(
        &self,
        job: Arc<dyn TaskJob>,
        tasks: Vec<Task>,
        mut shutdown: watch::Receiver<bool>,
    ) -> RunSummary {
        let (tasks, duplicates) = dedup_tasks(tasks);
        let mut summary = RunSummary {
            total: tasks.len(),
            skipped: duplicates,
            ..RunSummary::default()
        };
        self.progress.start(summary.total);

        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let mut workers = JoinSet::new();
        let mut queue = tasks.into_iter();

        while let Some(task) = queue.next() {
            let Some(permit) = acquire_or_shutdown(&semaphore, &mut shutdown).await else {
                let unsubmitted = 1 + queue.len();
                info!(unsubmitted, "shutdown requested; draining in-flight tasks");
                summary.skipped += unsubmitted;
                break;
            };
            let job = job.clone();
            let progress = self.progress.clone();
            workers.spawn(async move {
                let _permit = permit;
                let outcome = job.process(&task).await;
                let finished = progress.record_finished();
                match &outcome {
                    Ok(()) => info!(task_id = %task.id, finished, total = progress.total(), "task completed"),
                    Err(error) => warn!(task_id = %task.id, %error, finished, total = progress.total(), "task failed"),
                }
                outcome.is_ok()
            });
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(true) => summary.completed += 1,
                Ok(false) => summary.failed += 1,
                Err(error) => {
                    self.progress.record_finished();
                    warn!(%error, "task worker panicked");
                    summary.failed += 1;
                }
            }
        }

        info!(
            completed = summary.completed,
            total = summary.total,
            failed = summary.failed,
            skipped = summary.skipped,
            "run finished"
        );
        summary
    }
}

/// Waits for a worker slot. Returns `None` once shutdown has been requested.
async fn acquire_or_shutdown(
    semaphore: &Arc<Semaphore>,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<OwnedSemaphorePermit> {
    loop {
        if *shutdown.borrow() {
            return None;
        }
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Sender gone: shutdown can no longer be requested.
                    return semaphore.clone().acquire_owned().await.ok();
                }
            }
            permit = semaphore.clone().acquire_owned() => return permit.ok(),
        }
    }
}

fn dedup_tasks(tasks: Vec<Task>) -> (Vec<Task>, usize) {
    let mut seen = HashSet::new();
    let mut duplicates = 0;
    let unique = tasks
        .into_iter()
        .filter(|task| {
            if seen.insert(task.id.clone()) {
                true
            } else {
                warn!(task_id = %task.id, "duplicate task id; dispatching first occurrence only");
                duplicates += 1;
                false
            }
        })
        .collect();
    (unique, duplicates)
}
