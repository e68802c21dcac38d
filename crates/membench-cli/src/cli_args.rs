use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use membench_types::{BackendKind, DEFAULT_RUN_VERSION};

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_backend_kind(value: &str) -> Result<BackendKind, String> {
    value.parse::<BackendKind>().map_err(|error| error.to_string())
}

#[derive(Debug, Parser)]
#[command(
    name = "membench",
    about = "Ingest benchmark conversations into memory services and collect search results",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Add every trajectory to the memory backend, resuming from the progress ledger.
    Ingest(IngestArgs),
    /// Search memories for every benchmark question and store the results.
    Search(SearchArgs),
}

#[derive(Debug, Clone, Args)]
pub(crate) struct BackendArgs {
    #[arg(
        long = "lib",
        env = "FRAME",
        default_value = "memos-api",
        value_parser = parse_backend_kind,
        help = "Memory backend: mem0, mem0_graph, memos-api, memos-api-online, memobase, memu, supermemory"
    )]
    pub backend: BackendKind,

    #[arg(
        long,
        env = "VERSION",
        default_value = DEFAULT_RUN_VERSION,
        help = "Run version embedded in backend session keys"
    )]
    pub version: String,

    #[arg(
        long = "data-dir",
        default_value = "data/bfcl-v4",
        help = "Directory of *.jsonl task files"
    )]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct IngestArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    #[arg(
        long,
        default_value_t = 5,
        value_parser = parse_positive_usize,
        help = "Concurrent ingestion workers"
    )]
    pub workers: usize,

    #[arg(
        long = "record-dir",
        default_value = "results/bfcl-default",
        help = "Directory holding success_records.txt"
    )]
    pub record_dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct SearchArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    #[arg(
        long = "num-threads",
        default_value_t = 10,
        value_parser = parse_positive_usize,
        help = "Concurrent search workers"
    )]
    pub num_threads: usize,

    #[arg(
        long = "result-dir",
        default_value = "results/bfcl-default",
        help = "Directory holding search_results.jsonl"
    )]
    pub result_dir: PathBuf,

    #[arg(
        short = 'o',
        long = "allow-overwrite",
        help = "Clear stored results before searching (kept when --run-ids is set)"
    )]
    pub allow_overwrite: bool,

    #[arg(long = "run-ids", help = "Search only the ids listed in --ids-file")]
    pub run_ids: bool,

    #[arg(
        long = "ids-file",
        default_value = "test_case_ids_to_generate.json",
        help = "JSON array, JSON object of id arrays, or one id per line"
    )]
    pub ids_file: PathBuf,

    #[arg(
        long = "test-category",
        num_args = 1..,
        default_value = "all",
        help = "Id prefixes to search; 'all' searches everything"
    )]
    pub test_category: Vec<String>,

    #[arg(
        long = "top-k",
        default_value_t = 10,
        value_parser = parse_positive_usize,
        help = "Memories requested per question"
    )]
    pub top_k: usize,
}
