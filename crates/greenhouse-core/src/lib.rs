//! greenhouse-core - Core library for Smart Greenhouse
//!
//! This crate contains the field observation model, the durable offline
//! queue, its storage backends, and the sync coordinator used to upload
//! pending observations to the greenhouse backend.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod queue;
pub mod storage;
pub mod sync;
pub mod util;

pub use config::{QueueConfig, UploadConfig, DEFAULT_BATCH_SIZE, DEFAULT_STORAGE_KEY};
pub use error::{Error, Result};
pub use models::{FieldObservation, NewObservation, ObservationId};
pub use queue::{OfflineQueueStore, QueueSummary};
