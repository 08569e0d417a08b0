use std::path::Path;

use greenhouse_core::sync::{HttpObservationUploader, SyncCoordinator, SyncReport};

use crate::cli::StorageBackend;
use crate::commands::common::{open_queue, resolve_upload_config};
use crate::error::CliError;

pub async fn run_sync(
    mark_only: bool,
    api_url: Option<String>,
    as_json: bool,
    data_dir: &Path,
    backend: StorageBackend,
) -> Result<(), CliError> {
    let report = if mark_only {
        mark_all_synced(data_dir, backend).await?
    } else {
        upload_pending(api_url, data_dir, backend).await?
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.attempted == 0 {
        println!("Nothing to sync");
    } else {
        println!(
            "Synced {} of {} observation(s)",
            report.uploaded, report.attempted
        );
    }

    match report.error {
        Some(reason) => Err(CliError::SyncIncomplete {
            uploaded: report.uploaded,
            attempted: report.attempted,
            reason,
        }),
        None => Ok(()),
    }
}

/// Flag every pending record synced without contacting the backend.
pub async fn mark_all_synced(
    data_dir: &Path,
    backend: StorageBackend,
) -> Result<SyncReport, CliError> {
    let queue = open_queue(data_dir, backend).await?;
    let (_, flagged) = queue.try_sync_all_counted().await?;

    Ok(SyncReport {
        attempted: flagged,
        uploaded: flagged,
        remaining: 0,
        error: None,
    })
}

async fn upload_pending(
    api_url: Option<String>,
    data_dir: &Path,
    backend: StorageBackend,
) -> Result<SyncReport, CliError> {
    let config = resolve_upload_config(api_url)?.ok_or(CliError::SyncNotConfigured)?;
    let batch_size = config.batch_size;
    tracing::debug!("Uploading pending observations to {}", config.batch_url());

    let queue = open_queue(data_dir, backend).await?;
    let coordinator =
        SyncCoordinator::new(HttpObservationUploader::new(config)?).with_batch_size(batch_size);
    Ok(coordinator.sync_pending(&queue).await?)
}
