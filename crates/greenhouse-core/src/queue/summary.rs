use serde::Serialize;

use crate::models::FieldObservation;

/// Record counts by sync state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub total: usize,
    pub pending: usize,
    pub synced: usize,
}

impl QueueSummary {
    pub fn from_records(records: &[FieldObservation]) -> Self {
        let pending = records.iter().filter(|record| record.is_pending()).count();
        Self {
            total: records.len(),
            pending,
            synced: records.len() - pending,
        }
    }

    /// Whether there is anything for a sync pass to upload
    pub const fn has_pending(&self) -> bool {
        self.pending > 0
    }

    /// Whether a clear pass would remove anything
    pub const fn has_synced(&self) -> bool {
        self.synced > 0
    }
}
