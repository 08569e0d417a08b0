//! Field observation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Identifier of a queued observation.
///
/// Stored as a plain string so records written by older clients (which used
/// millisecond timestamps) keep parsing. New ids are UUID v7, which sort by
/// creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationId(String);

impl ObservationId {
    /// Create a new time-ordered id
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObservationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput(
                "Observation id cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for ObservationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ObservationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One manually captured crop measurement.
///
/// Serialized with camelCase keys; this is the on-disk shape of every queue
/// entry and must stay stable across versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldObservation {
    /// Unique identifier
    pub id: ObservationId,
    /// Crop label (e.g. "tomato")
    pub crop_type: String,
    /// Growth stage label (e.g. "flowering")
    pub growth_stage: String,
    /// Plant height in centimetres
    pub height: f64,
    /// Number of pests counted
    #[serde(default)]
    pub pest_count: i64,
    /// Free-form notes
    #[serde(default)]
    pub notes: String,
    /// ISO-8601 capture time
    pub timestamp: String,
    /// Whether the record has been uploaded
    #[serde(default)]
    pub synced: bool,
}

impl FieldObservation {
    /// Parse the capture timestamp.
    ///
    /// Returns `None` for timestamps that are not valid RFC 3339.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|value| value.with_timezone(&Utc))
    }

    pub const fn is_pending(&self) -> bool {
        !self.synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> FieldObservation {
        FieldObservation {
            id: ObservationId::from("1"),
            crop_type: "tomato".to_string(),
            growth_stage: "flowering".to_string(),
            height: 42.0,
            pest_count: 0,
            notes: String::new(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            synced: false,
        }
    }

    #[test]
    fn test_observation_id_unique() {
        let id1 = ObservationId::generate();
        let id2 = ObservationId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_observation_id_parse_rejects_blank() {
        assert!("   ".parse::<ObservationId>().is_err());
        let parsed: ObservationId = " 1704067200000 ".parse().unwrap();
        assert_eq!(parsed.as_str(), "1704067200000");
    }

    #[test]
    fn test_serializes_with_camel_case_keys() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "1",
                "cropType": "tomato",
                "growthStage": "flowering",
                "height": 42.0,
                "pestCount": 0,
                "notes": "",
                "timestamp": "2024-01-01T00:00:00Z",
                "synced": false
            })
        );
    }

    #[test]
    fn test_round_trip_keeps_precision() {
        let mut record = sample();
        record.height = 37.125;
        record.synced = true;
        record.notes = "leaf curl on row 3".to_string();

        let json = serde_json::to_string(&vec![record.clone()]).unwrap();
        let parsed: Vec<FieldObservation> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![record]);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let parsed: FieldObservation = serde_json::from_str(
            r#"{"id":"7","cropType":"pepper","growthStage":"seedling","height":3.5,"timestamp":"2024-02-01T08:30:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(parsed.pest_count, 0);
        assert_eq!(parsed.notes, "");
        assert!(parsed.is_pending());
    }

    #[test]
    fn test_captured_at() {
        let record = sample();
        assert_eq!(
            record.captured_at().map(|value| value.timestamp()),
            Some(1_704_067_200)
        );

        let mut bad = sample();
        bad.timestamp = "yesterday".to_string();
        assert_eq!(bad.captured_at(), None);
    }
}
