use std::path::Path;

use greenhouse_core::FieldObservation;

use crate::cli::StorageBackend;
use crate::commands::common::{
    format_observation_lines, observation_to_list_item, open_queue, ObservationListItem,
};
use crate::error::CliError;

pub async fn run_list(
    pending_only: bool,
    limit: Option<usize>,
    as_json: bool,
    data_dir: &Path,
    backend: StorageBackend,
) -> Result<(), CliError> {
    let records = list_observations(pending_only, limit, data_dir, backend).await?;

    if as_json {
        let json_items = records
            .iter()
            .map(observation_to_list_item)
            .collect::<Vec<ObservationListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No observations queued.");
        return Ok(());
    }

    for line in format_observation_lines(&records) {
        println!("{line}");
    }
    Ok(())
}

pub async fn list_observations(
    pending_only: bool,
    limit: Option<usize>,
    data_dir: &Path,
    backend: StorageBackend,
) -> Result<Vec<FieldObservation>, CliError> {
    let queue = open_queue(data_dir, backend).await?;
    let mut records = if pending_only {
        queue.try_pending().await?
    } else {
        queue.try_get_all().await?
    };

    if let Some(limit) = limit {
        records.truncate(limit);
    }
    Ok(records)
}
