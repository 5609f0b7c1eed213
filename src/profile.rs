//! Named, reusable ammunition/environment snapshots.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{DEFAULT_MAX_RANGE_M, DEFAULT_VITAL_ZONE_M, DEFAULT_ZERO_DISTANCE_M};
use crate::error::{BallisticsError, Result};
use crate::{Ammunition, EnvironmentalData};

/// A saved ballistic setup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BallisticProfile {
    pub name: String,
    pub ammunition: Ammunition,
    pub environment: EnvironmentalData,
    pub zero_distance: f64,
    pub max_range: f64,
    pub vital_zone_diameter: f64,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire shape accepted on load; older documents omit most fields.
#[derive(Debug, Deserialize)]
struct StoredProfile {
    name: String,
    ammunition: Ammunition,
    #[serde(default)]
    environment: EnvironmentalData,
    zero_distance: Option<f64>,
    max_range: Option<f64>,
    vital_zone_diameter: Option<f64>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    // Naive ISO timestamps are taken as UTC
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| BallisticsError::Validation(format!("{field}: invalid timestamp '{raw}': {e}")))
}

impl BallisticProfile {
    pub fn new(name: impl Into<String>, ammunition: Ammunition, environment: EnvironmentalData) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            ammunition,
            environment,
            zero_distance: DEFAULT_ZERO_DISTANCE_M,
            max_range: DEFAULT_MAX_RANGE_M,
            vital_zone_diameter: DEFAULT_VITAL_ZONE_M,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_zero_distance(mut self, meters: f64) -> Self {
        self.zero_distance = meters;
        self
    }

    pub fn with_max_range(mut self, meters: f64) -> Self {
        self.max_range = meters;
        self
    }

    pub fn with_vital_zone_diameter(mut self, meters: f64) -> Self {
        self.vital_zone_diameter = meters;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Mark the profile as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }

    pub fn to_value(&self) -> Value {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Build a profile from a stored JSON record, filling defaults for
    /// missing optional fields.
    pub fn from_value(value: Value) -> Result<Self> {
        let stored: StoredProfile = serde_path_to_error::deserialize(value).map_err(|e| {
            let path = e.path().to_string();
            BallisticsError::Validation(format!("profile field '{path}': {}", e.into_inner()))
        })?;

        let name = stored.name.trim().to_string();
        if name.is_empty() {
            return Err(BallisticsError::Validation("profile name must not be empty".into()));
        }

        let ammunition = stored.ammunition.with_derived_name();
        ammunition
            .validate()
            .map_err(|e| BallisticsError::Validation(format!("profile '{name}': {e}")))?;

        let zero_distance = stored.zero_distance.unwrap_or(DEFAULT_ZERO_DISTANCE_M);
        let max_range = stored.max_range.unwrap_or(DEFAULT_MAX_RANGE_M);
        let vital_zone_diameter = stored.vital_zone_diameter.unwrap_or(DEFAULT_VITAL_ZONE_M);
        if !zero_distance.is_finite() || zero_distance <= 0.0 {
            return Err(BallisticsError::Validation(format!(
                "profile '{name}': zero_distance must be positive, got {zero_distance}"
            )));
        }
        if !max_range.is_finite() || max_range < 0.0 {
            return Err(BallisticsError::Validation(format!(
                "profile '{name}': max_range must not be negative, got {max_range}"
            )));
        }
        if !vital_zone_diameter.is_finite() || vital_zone_diameter < 0.0 {
            return Err(BallisticsError::Validation(format!(
                "profile '{name}': vital_zone_diameter must not be negative, got {vital_zone_diameter}"
            )));
        }

        let created_at = match stored.created_at.as_deref() {
            Some(raw) => parse_timestamp("created_at", raw)?,
            None => Utc::now(),
        };
        let updated_at = match stored.updated_at.as_deref() {
            Some(raw) => parse_timestamp("updated_at", raw)?,
            None => created_at,
        };

        Ok(Self {
            name,
            ammunition,
            environment: stored.environment,
            zero_distance,
            max_range,
            vital_zone_diameter,
            notes: stored.notes.unwrap_or_default(),
            created_at,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_record() -> Value {
        json!({
            "name": "Legacy 308",
            "ammunition": {
                "name": "308 Win 168gr",
                "caliber": ".308",
                "bullet_weight": 168,
                "muzzle_velocity": 820,
                "ballistic_coefficient": 0.475,
                "drag_model": "G1",
                "bullet_diameter": 7.82,
                "case_length": 51.18,
                "overall_length": 71.12
            },
            "environment": {
                "temperature": 15, "pressure": 1013.25, "humidity": 55,
                "altitude": 320, "wind_speed": 3.2, "wind_direction": 45
            },
            "zero_distance": 100,
            "max_range": 800,
            "vital_zone_diameter": 0.3,
            "notes": "Legacy profile without version"
        })
    }

    #[test]
    fn test_legacy_record_gets_timestamps() {
        let before = Utc::now();
        let profile = BallisticProfile::from_value(legacy_record()).unwrap();
        assert_eq!(profile.name, "Legacy 308");
        assert_eq!(profile.ammunition.bullet_weight, 168.0);
        assert_eq!(profile.max_range, 800.0);
        assert!(profile.created_at >= before);
        assert_eq!(profile.updated_at, profile.created_at);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let profile = BallisticProfile::from_value(json!({
            "name": "Minimal",
            "ammunition": {"caliber": ".223 Rem", "bullet_weight": 55}
        }))
        .unwrap();
        assert_eq!(profile.zero_distance, 100.0);
        assert_eq!(profile.max_range, 1000.0);
        assert_eq!(profile.vital_zone_diameter, 0.2);
        assert_eq!(profile.notes, "");
        assert_eq!(profile.ammunition.name, ".223 Rem 55gr");
        assert_eq!(profile.environment, EnvironmentalData::default());
    }

    #[test]
    fn test_round_trip() {
        let mut profile = BallisticProfile::new("Elk", Ammunition::default(), EnvironmentalData::default())
            .with_notes("north ridge")
            .with_zero_distance(200.0);
        profile.touch();
        let restored = BallisticProfile::from_value(profile.to_value()).unwrap();
        assert_eq!(restored, profile);
    }

    #[test]
    fn test_validation_errors_carry_field_path() {
        let mut record = legacy_record();
        record["ammunition"]["bullet_weight"] = json!("heavy");
        let err = BallisticProfile::from_value(record).unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, BallisticsError::Validation(_)));
        assert!(text.contains("ammunition.bullet_weight"), "{text}");
    }

    #[test]
    fn test_rejects_bad_records() {
        assert!(BallisticProfile::from_value(json!({"ammunition": {}})).is_err());
        assert!(BallisticProfile::from_value(json!({"name": "  ", "ammunition": {}})).is_err());
        assert!(BallisticProfile::from_value(json!(["not", "an", "object"])).is_err());

        let mut record = legacy_record();
        record["ammunition"]["muzzle_velocity"] = json!(0);
        assert!(BallisticProfile::from_value(record).is_err());

        let mut record = legacy_record();
        record["zero_distance"] = json!(-5);
        assert!(BallisticProfile::from_value(record).is_err());
    }

    #[test]
    fn test_naive_and_offset_timestamps() {
        let mut record = legacy_record();
        record["created_at"] = json!("2023-05-01T06:30:00");
        record["updated_at"] = json!("2023-05-02T08:00:00+02:00");
        let profile = BallisticProfile::from_value(record).unwrap();
        assert_eq!(profile.created_at.to_rfc3339(), "2023-05-01T06:30:00+00:00");
        assert_eq!(profile.updated_at.to_rfc3339(), "2023-05-02T06:00:00+00:00");

        let mut record = legacy_record();
        record["created_at"] = json!("yesterday");
        assert!(BallisticProfile::from_value(record).is_err());
    }

    #[test]
    fn test_touch_moves_updated_at_forward() {
        let mut profile = BallisticProfile::new("Deer", Ammunition::default(), EnvironmentalData::default());
        let original = profile.updated_at;
        profile.touch();
        assert!(profile.updated_at >= original);
        assert_eq!(profile.created_at, original);
    }
}
