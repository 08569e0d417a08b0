//! Greenhouse CLI - Field observation entry from the command line
//!
//! Records observations into the offline queue and uploads them once the
//! greenhouse backend is reachable.

mod cli;
mod commands;
mod error;


use clap::{CommandFactory, Parser};
use greenhouse_core::NewObservation;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::clear::run_clear_synced;
use crate::commands::common::resolve_data_dir;
use crate::commands::completions::run_completions;
use crate::commands::list::run_list;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "greenhouse_core=info,greenhouse_cli=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir);
    let backend = cli.backend;

    match cli.command {
        Some(Commands::Add {
            crop,
            stage,
            height,
            pests,
            notes,
        }) => {
            let mut draft = NewObservation::new(crop, stage, height);
            if let Some(pests) = pests {
                draft = draft.with_pest_count(pests);
            }
            if let Some(notes) = notes {
                draft = draft.with_notes(notes);
            }
            run_add(draft, &data_dir, backend).await?;
        }
        Some(Commands::List {
            pending,
            limit,
            json,
        }) => run_list(pending, limit, json, &data_dir, backend).await?,
        Some(Commands::Status { json }) => run_status(json, &data_dir, backend).await?,
        Some(Commands::Sync {
            mark_only,
            api_url,
            json,
        }) => run_sync(mark_only, api_url, json, &data_dir, backend).await?,
        Some(Commands::ClearSynced { yes }) => run_clear_synced(yes, &data_dir, backend).await?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
