//! Unsaved observation captured from the data-entry form

use crate::error::{Error, Result};
use crate::util::{iso_timestamp_now, normalize_text_option};

use super::{FieldObservation, ObservationId};

/// Crop labels offered by the data-entry form.
pub const CROP_TYPES: [&str; 5] = ["tomato", "cucumber", "sweet-pepper", "strawberry", "eggplant"];

/// Growth stage labels offered by the data-entry form.
pub const GROWTH_STAGES: [&str; 4] = ["seedling", "vegetative", "flowering", "fruiting"];

/// Form input for a new observation, before id and timestamp are assigned.
///
/// Labels are free-form; the presets above are suggestions, not a closed set.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObservation {
    pub crop_type: String,
    pub growth_stage: String,
    pub height: f64,
    pub pest_count: Option<i64>,
    pub notes: Option<String>,
}

impl NewObservation {
    pub fn new(crop_type: impl Into<String>, growth_stage: impl Into<String>, height: f64) -> Self {
        Self {
            crop_type: crop_type.into(),
            growth_stage: growth_stage.into(),
            height,
            pest_count: None,
            notes: None,
        }
    }

    #[must_use]
    pub const fn with_pest_count(mut self, pest_count: i64) -> Self {
        self.pest_count = Some(pest_count);
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Check the form values the queue itself does not enforce.
    pub fn validate(&self) -> Result<()> {
        if self.crop_type.trim().is_empty() {
            return Err(Error::InvalidInput("Crop type is required".to_string()));
        }
        if self.growth_stage.trim().is_empty() {
            return Err(Error::InvalidInput("Growth stage is required".to_string()));
        }
        if !self.height.is_finite() || self.height < 0.0 {
            return Err(Error::InvalidInput(format!(
                "Height must be a non-negative number of centimetres, got {}",
                self.height
            )));
        }
        if let Some(pest_count) = self.pest_count {
            if pest_count < 0 {
                return Err(Error::InvalidInput(format!(
                    "Pest count cannot be negative, got {pest_count}"
                )));
            }
        }
        Ok(())
    }

    /// Validate and stamp the draft with a fresh id and capture time.
    pub fn into_observation(self) -> Result<FieldObservation> {
        self.validate()?;
        Ok(FieldObservation {
            id: ObservationId::generate(),
            crop_type: self.crop_type.trim().to_string(),
            growth_stage: self.growth_stage.trim().to_string(),
            height: self.height,
            pest_count: self.pest_count.unwrap_or(0),
            notes: normalize_text_option(self.notes).unwrap_or_default(),
            timestamp: iso_timestamp_now(),
            synced: false,
        })
    }
}
