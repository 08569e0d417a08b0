use std::path::Path;

use crate::cli::StorageBackend;
use crate::commands::common::open_queue;
use crate::error::CliError;

pub async fn run_clear_synced(
    confirmed: bool,
    data_dir: &Path,
    backend: StorageBackend,
) -> Result<(), CliError> {
    let removed = clear_synced(confirmed, data_dir, backend).await?;
    println!("Removed {removed} synced observation(s)");
    Ok(())
}

/// Returns how many records were dropped.
pub async fn clear_synced(
    confirmed: bool,
    data_dir: &Path,
    backend: StorageBackend,
) -> Result<usize, CliError> {
    if !confirmed {
        return Err(CliError::ClearNotConfirmed);
    }

    let queue = open_queue(data_dir, backend).await?;
    let (_, removed) = queue.try_clear_synced_counted().await?;
    Ok(removed)
}
