//! Uploading queued observations to the greenhouse backend.
//!
//! The queue never talks to the network. [`SyncCoordinator`] reads the
//! pending records, hands them to an [`ObservationUploader`], and flags only
//! the records the uploader confirmed.

mod coordinator;
mod http;

pub use coordinator::{SyncCoordinator, SyncReport};
pub use http::{interpret_upload_response, HttpObservationUploader};

use crate::error::Result;
use crate::models::FieldObservation;

/// Remote endpoint that accepts a batch of observations (async)
#[allow(async_fn_in_trait)]
pub trait ObservationUploader {
    /// Upload the batch; `Ok` means the backend stored every record in it
    async fn upload(&self, batch: &[FieldObservation]) -> Result<()>;
}
