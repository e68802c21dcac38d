mod bootstrap_helpers;
mod cli_args;
mod commands;
mod task_loading;

use anyhow::Result;
use clap::Parser;

use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let summary = match cli.command {
        Command::Ingest(args) => commands::run_ingest(args).await?,
        Command::Search(args) => commands::run_search(args).await?,
    };
    println!("{}/{}", summary.completed, summary.total);
    Ok(())
}
