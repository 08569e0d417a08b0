//! Pending-record upload loop.

use serde::Serialize;

use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::Result;
use crate::models::{FieldObservation, ObservationId};
use crate::queue::OfflineQueueStore;
use crate::storage::KeyValueStore;

use super::ObservationUploader;

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Pending records found at the start of the pass
    pub attempted: usize,
    /// Records uploaded and flagged synced
    pub uploaded: usize,
    /// Pending records this pass did not upload
    pub remaining: usize,
    /// Upload error that stopped the pass, if any
    pub error: Option<String>,
}

impl SyncReport {
    pub const fn is_complete(&self) -> bool {
        self.error.is_none() && self.remaining == 0
    }
}

/// Uploads pending observations in batches and flags the confirmed ones.
pub struct SyncCoordinator<U> {
    uploader: U,
    batch_size: usize,
}

impl<U: ObservationUploader> SyncCoordinator<U> {
    pub const fn new(uploader: U) -> Self {
        Self {
            uploader,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the maximum records per upload call. Zero is treated as one.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = if batch_size == 0 { 1 } else { batch_size };
        self
    }

    pub const fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Upload every record that is pending when the pass starts.
    ///
    /// Records are sent oldest first. After each acknowledged batch only that
    /// batch is flagged synced, so records added mid-pass stay pending. The
    /// pass stops at the first failed batch, or at the first batch that was
    /// acknowledged but could not be flagged locally; either failure is
    /// reported in [`SyncReport::error`] rather than returned. Only a failure
    /// to read the pending set up front is returned as an error.
    pub async fn sync_pending<S: KeyValueStore>(
        &self,
        queue: &OfflineQueueStore<S>,
    ) -> Result<SyncReport> {
        let mut pending = queue.try_pending().await?;
        pending.reverse();

        let mut report = SyncReport {
            attempted: pending.len(),
            remaining: pending.len(),
            ..SyncReport::default()
        };

        if pending.is_empty() {
            tracing::debug!("No pending observations to sync");
            return Ok(report);
        }

        for batch in pending.chunks(self.batch_size) {
            if let Err(error) = self.uploader.upload(batch).await {
                tracing::warn!(
                    "Upload of {} observations failed: {}; {} left pending",
                    batch.len(),
                    error,
                    report.remaining
                );
                report.error = Some(error.to_string());
                break;
            }

            report.uploaded += batch.len();
            report.remaining -= batch.len();

            let ids = batch_ids(batch);
            if let Err(error) = queue.try_mark_synced(&ids).await {
                tracing::error!(
                    "Backend accepted {} observations but flagging them synced failed: {}",
                    batch.len(),
                    error
                );
                report.error = Some(format!(
                    "uploaded records could not be marked synced locally: {error}"
                ));
                break;
            }
        }

        tracing::info!(
            "Sync pass finished: {} uploaded, {} remaining",
            report.uploaded,
            report.remaining
        );
        Ok(report)
    }
}

fn batch_ids(batch: &[FieldObservation]) -> Vec<ObservationId> {
    batch.iter().map(|record| record.id.clone()).collect()
}
