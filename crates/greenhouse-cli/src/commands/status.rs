use std::path::Path;

use crate::cli::StorageBackend;
use crate::commands::common::open_queue;
use crate::error::CliError;

pub async fn run_status(
    as_json: bool,
    data_dir: &Path,
    backend: StorageBackend,
) -> Result<(), CliError> {
    let queue = open_queue(data_dir, backend).await?;
    let summary = queue.try_summary().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Total:   {}", summary.total);
        println!("Pending: {}", summary.pending);
        println!("Synced:  {}", summary.synced);
    }
    Ok(())
}
