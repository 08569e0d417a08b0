use std::path::Path;

use greenhouse_core::{FieldObservation, NewObservation};

use crate::cli::StorageBackend;
use crate::commands::common::open_queue;
use crate::error::CliError;

pub async fn run_add(
    draft: NewObservation,
    data_dir: &Path,
    backend: StorageBackend,
) -> Result<(), CliError> {
    let record = add_observation(draft, data_dir, backend).await?;
    println!("{}", record.id);
    Ok(())
}

pub async fn add_observation(
    draft: NewObservation,
    data_dir: &Path,
    backend: StorageBackend,
) -> Result<FieldObservation, CliError> {
    let record = draft.into_observation()?;
    let queue = open_queue(data_dir, backend).await?;
    queue.try_add(record.clone()).await?;
    Ok(record)
}
