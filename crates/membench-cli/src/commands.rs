use std::sync::Arc;

use anyhow::{Context, Result};
use membench_backend::{resolve_backend, BackendContextRenderer};
use membench_ledger::{FileProgressLedger, JsonlResultStore};
use membench_runner::{plan_search_run, RunSummary, RunnerConfig, SearchPolicy, TaskRunner};
use membench_types::Task;
use tracing::info;

use crate::bootstrap_helpers::shutdown_on_ctrl_c;
use crate::cli_args::{BackendArgs, IngestArgs, SearchArgs};
use crate::task_loading::{
    filter_by_category, load_ingestion_tasks, load_search_entries, read_ids_file, select_ids,
};

fn build_runner(backend: &BackendArgs, workers: usize, top_k: usize) -> Result<TaskRunner> {
    let adapter = resolve_backend(backend.backend.as_str())
        .with_context(|| format!("failed to configure backend '{}'", backend.backend))?;
    let config = RunnerConfig {
        workers,
        backend_kind: backend.backend,
        version: backend.version.clone(),
        top_k,
    };
    TaskRunner::new(adapter, config)
}

pub(crate) async fn run_ingest(args: IngestArgs) -> Result<RunSummary> {
    let runner = build_runner(&args.backend, args.workers, membench_runner::DEFAULT_TOP_K)?;
    let tasks = load_ingestion_tasks(&args.backend.data_dir)?;
    let ledger = Arc::new(FileProgressLedger::in_dir(&args.record_dir));
    info!(
        backend = %args.backend.backend,
        version = %args.backend.version,
        ledger = %ledger.path().display(),
        tasks = tasks.len(),
        "starting ingestion"
    );

    runner
        .run_ingestion(tasks, ledger, shutdown_on_ctrl_c())
        .await
}

pub(crate) async fn run_search(args: SearchArgs) -> Result<RunSummary> {
    let runner = build_runner(&args.backend, args.num_threads, args.top_k)?;

    let entries = load_search_entries(&args.backend.data_dir)?;
    let entries = if args.run_ids {
        let ids = read_ids_file(&args.ids_file)?;
        select_ids(entries, &ids)
    } else {
        filter_by_category(entries, &args.test_category)
    };
    let candidates = entries.into_iter().map(Task::from).collect::<Vec<_>>();

    let store = Arc::new(JsonlResultStore::in_dir(&args.result_dir));
    let plan = plan_search_run(
        candidates,
        store.as_ref(),
        SearchPolicy {
            overwrite: args.allow_overwrite,
            run_ids: args.run_ids,
        },
    )
    .await
    .context("failed to plan search run")?;
    info!(
        backend = %args.backend.backend,
        store = %store.path().display(),
        planned = plan.tasks.len(),
        already_stored = plan.excluded,
        "starting search"
    );

    runner
        .run_search(
            plan.tasks,
            store,
            Arc::new(BackendContextRenderer::new(args.backend.backend)),
            shutdown_on_ctrl_c(),
        )
        .await
}
