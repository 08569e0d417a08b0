//! Durable offline queue of field observations.
//!
//! The whole record set lives in one JSON array under a single storage key.
//! Every mutation is a read-modify-write of that blob, serialized through an
//! internal async mutex shared by all clones of the store.
//!
//! Each operation comes in two forms:
//! - `try_*` returns [`Result`] so callers can tell "empty" from "broken".
//! - the plain form never fails: it logs the error and returns an empty set
//!   (read failures) or the attempted, unpersisted set (write failures).

mod summary;

pub use summary::QueueSummary;

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::QueueConfig;
use crate::error::{Error, Result};
use crate::models::{FieldObservation, ObservationId};
use crate::storage::KeyValueStore;

/// Offline queue store over a [`KeyValueStore`] backend.
pub struct OfflineQueueStore<S> {
    backend: Arc<S>,
    config: Arc<QueueConfig>,
    lock: Arc<Mutex<()>>,
}

impl<S> Clone for OfflineQueueStore<S> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: Arc::clone(&self.config),
            lock: Arc::clone(&self.lock),
        }
    }
}

/// A failed mutation plus the record set a lenient caller should fall back to.
struct MutationFailure {
    error: Error,
    fallback: Vec<FieldObservation>,
}

impl MutationFailure {
    const fn new(error: Error, fallback: Vec<FieldObservation>) -> Self {
        Self { error, fallback }
    }
}

impl<S: KeyValueStore> OfflineQueueStore<S> {
    pub fn new(backend: S, config: QueueConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            config: Arc::new(config),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a store using the default key and retry policy
    pub fn with_defaults(backend: S) -> Self {
        Self::new(backend, QueueConfig::default())
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// All queued records, newest first.
    ///
    /// An absent key is an empty queue; an unreadable or corrupt blob is an error.
    pub async fn try_get_all(&self) -> Result<Vec<FieldObservation>> {
        let _guard = self.lock.lock().await;
        let raw = self.read_raw().await?;
        raw.as_deref().map_or_else(|| Ok(Vec::new()), parse_records)
    }

    /// All queued records, or an empty set if storage cannot be read.
    pub async fn get_all(&self) -> Vec<FieldObservation> {
        match self.try_get_all().await {
            Ok(records) => records,
            Err(error) => {
                tracing::error!("Failed to load queued observations: {error}");
                Vec::new()
            }
        }
    }

    /// Prepend `record` and persist the new set.
    ///
    /// Rejects a record whose id is already queued. Field ranges are not
    /// checked here; see [`NewObservation::validate`](crate::NewObservation::validate).
    pub async fn try_add(&self, record: FieldObservation) -> Result<Vec<FieldObservation>> {
        self.mutate(|records| insert_front(records, record))
            .await
            .map(|(records, ())| records)
            .map_err(|failure| failure.error)
    }

    pub async fn add(&self, record: FieldObservation) -> Vec<FieldObservation> {
        self.mutate(|records| insert_front(records, record))
            .await
            .map_or_else(
                |failure| log_fallback("save observation", failure),
                |(records, ())| records,
            )
    }

    /// Flag every record as synced. Idempotent.
    ///
    /// Call only after the caller confirmed every pending record was uploaded.
    pub async fn try_sync_all(&self) -> Result<Vec<FieldObservation>> {
        self.try_sync_all_counted()
            .await
            .map(|(records, _)| records)
    }

    /// Same as [`try_sync_all`](Self::try_sync_all), also returning how many
    /// records were pending when the update ran.
    pub async fn try_sync_all_counted(&self) -> Result<(Vec<FieldObservation>, usize)> {
        self.mutate(mark_all_synced)
            .await
            .map_err(|failure| failure.error)
    }

    pub async fn sync_all(&self) -> Vec<FieldObservation> {
        self.mutate(mark_all_synced).await.map_or_else(
            |failure| log_fallback("sync observations", failure),
            |(records, _)| records,
        )
    }

    /// Flag only the records whose ids are listed. Unknown ids are ignored.
    pub async fn try_mark_synced(&self, ids: &[ObservationId]) -> Result<Vec<FieldObservation>> {
        self.mutate(|records| mark_ids_synced(records, ids))
            .await
            .map(|(records, _)| records)
            .map_err(|failure| failure.error)
    }

    pub async fn mark_synced(&self, ids: &[ObservationId]) -> Vec<FieldObservation> {
        self.mutate(|records| mark_ids_synced(records, ids))
            .await
            .map_or_else(
                |failure| log_fallback("mark observations synced", failure),
                |(records, _)| records,
            )
    }

    /// Drop every synced record; pending records keep their relative order.
    pub async fn try_clear_synced(&self) -> Result<Vec<FieldObservation>> {
        self.try_clear_synced_counted()
            .await
            .map(|(records, _)| records)
    }

    /// Same as [`try_clear_synced`](Self::try_clear_synced), also returning
    /// how many records were removed.
    pub async fn try_clear_synced_counted(&self) -> Result<(Vec<FieldObservation>, usize)> {
        self.mutate(remove_synced)
            .await
            .map_err(|failure| failure.error)
    }

    pub async fn clear_synced(&self) -> Vec<FieldObservation> {
        self.mutate(remove_synced).await.map_or_else(
            |failure| log_fallback("clear synced observations", failure),
            |(records, _)| records,
        )
    }

    /// Records still waiting for upload, newest first
    pub async fn try_pending(&self) -> Result<Vec<FieldObservation>> {
        let mut records = self.try_get_all().await?;
        records.retain(FieldObservation::is_pending);
        Ok(records)
    }

    /// Counts for status displays
    pub async fn try_summary(&self) -> Result<QueueSummary> {
        Ok(QueueSummary::from_records(&self.try_get_all().await?))
    }

    pub async fn summary(&self) -> QueueSummary {
        QueueSummary::from_records(&self.get_all().await)
    }

    async fn read_raw(&self) -> Result<Option<String>> {
        let raw = self.backend.read(&self.config.storage_key).await?;
        Ok(raw.filter(|value| !value.trim().is_empty()))
    }

    /// Load the record set for an update.
    ///
    /// A corrupt blob is copied aside under a quarantine key and the queue
    /// restarts empty, so one bad write cannot block new entries forever.
    async fn load_for_update(&self) -> Result<Vec<FieldObservation>> {
        let Some(raw) = self.read_raw().await? else {
            return Ok(Vec::new());
        };

        match parse_records(&raw) {
            Ok(records) => Ok(records),
            Err(error @ Error::Corrupt(_)) => {
                let quarantine_key = format!(
                    "{}.corrupt-{}-{}",
                    self.config.storage_key,
                    chrono::Utc::now().timestamp_millis(),
                    Uuid::now_v7().simple()
                );
                self.backend.write(&quarantine_key, &raw).await?;
                tracing::warn!(
                    "Queue data under {} was unreadable ({}); moved it to {} and started a new queue",
                    self.config.storage_key,
                    error,
                    quarantine_key
                );
                Ok(Vec::new())
            }
            Err(error) => Err(error),
        }
    }

    /// Read-modify-write under the queue lock. `apply` may return a value
    /// computed from the same snapshot it modified.
    async fn mutate<T, F>(
        &self,
        apply: F,
    ) -> std::result::Result<(Vec<FieldObservation>, T), MutationFailure>
    where
        F: FnOnce(&mut Vec<FieldObservation>) -> Result<T>,
    {
        let _guard = self.lock.lock().await;

        let mut records = self
            .load_for_update()
            .await
            .map_err(|error| MutationFailure::new(error, Vec::new()))?;

        let outcome = match apply(&mut records) {
            Ok(outcome) => outcome,
            Err(error) => return Err(MutationFailure::new(error, records)),
        };

        match self.persist(&records).await {
            Ok(()) => Ok((records, outcome)),
            Err(error) => Err(MutationFailure::new(error, records)),
        }
    }

    /// Write the full record set, retrying transient backend failures.
    async fn persist(&self, records: &[FieldObservation]) -> Result<()> {
        let payload = serde_json::to_string(records)?;
        let attempts = self.config.write_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.backend.write(&self.config.storage_key, &payload).await {
                Ok(()) => {
                    tracing::debug!(
                        "Persisted {} queued observations under {}",
                        records.len(),
                        self.config.storage_key
                    );
                    return Ok(());
                }
                Err(error) if attempt < attempts && error.is_transient() => {
                    tracing::warn!(
                        "Queue write attempt {attempt}/{attempts} failed: {error}; retrying"
                    );
                    attempt += 1;
                    if !self.config.retry_backoff.is_zero() {
                        tokio::time::sleep(self.config.retry_backoff).await;
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }
}

fn parse_records(raw: &str) -> Result<Vec<FieldObservation>> {
    serde_json::from_str(raw).map_err(|error| Error::Corrupt(error.to_string()))
}

fn log_fallback(operation: &str, failure: MutationFailure) -> Vec<FieldObservation> {
    tracing::error!("Failed to {operation}: {}", failure.error);
    failure.fallback
}

fn insert_front(records: &mut Vec<FieldObservation>, record: FieldObservation) -> Result<()> {
    if records.iter().any(|existing| existing.id == record.id) {
        return Err(Error::DuplicateId(record.id.to_string()));
    }
    records.insert(0, record);
    Ok(())
}

/// Returns how many records were still pending.
#[allow(clippy::unnecessary_wraps)]
fn mark_all_synced(records: &mut Vec<FieldObservation>) -> Result<usize> {
    let mut flagged = 0usize;
    for record in records.iter_mut().filter(|record| record.is_pending()) {
        record.synced = true;
        flagged += 1;
    }
    Ok(flagged)
}

#[allow(clippy::unnecessary_wraps)]
fn mark_ids_synced(records: &mut Vec<FieldObservation>, ids: &[ObservationId]) -> Result<usize> {
    let ids = ids.iter().collect::<HashSet<_>>();
    let mut flagged = 0usize;
    for record in records.iter_mut().filter(|record| ids.contains(&record.id)) {
        if !record.synced {
            record.synced = true;
            flagged += 1;
        }
    }
    tracing::debug!("Marked {flagged} observations synced");
    Ok(flagged)
}

/// Returns how many records were removed.
#[allow(clippy::unnecessary_wraps)]
fn remove_synced(records: &mut Vec<FieldObservation>) -> Result<usize> {
    let before = records.len();
    records.retain(FieldObservation::is_pending);
    Ok(before - records.len())
}
