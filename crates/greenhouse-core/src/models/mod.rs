//! Data models for Smart Greenhouse field entry

mod draft;
mod observation;

pub use draft::{NewObservation, CROP_TYPES, GROWTH_STAGES};
pub use observation::{FieldObservation, ObservationId};
