//! Engine configuration: solver defaults, profile store options and advisor
//! thresholds. Every field has a default, so a partial JSON file is enough.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    BALLISTIC_PROFILE_SCHEMA_VERSION, DEFAULT_BACKUP_RETENTION, DEFAULT_MAX_RANGE_M,
    DEFAULT_STEP_SIZE_M, DEFAULT_VITAL_ZONE_M, DEFAULT_ZERO_DISTANCE_M,
};
use crate::error::{BallisticsError, Result};

/// Defaults applied when a caller does not supply solver parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverDefaults {
    pub step_size: f64,
    pub max_range: f64,
    pub zero_distance: f64,
    pub vital_zone_diameter: f64,
}

impl Default for SolverDefaults {
    fn default() -> Self {
        Self {
            step_size: DEFAULT_STEP_SIZE_M,
            max_range: DEFAULT_MAX_RANGE_M,
            zero_distance: DEFAULT_ZERO_DISTANCE_M,
            vital_zone_diameter: DEFAULT_VITAL_ZONE_M,
        }
    }
}

/// Profile store behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Directory for migration backups; the store's own directory when unset.
    pub backup_dir: Option<PathBuf>,
    /// Rotating backups kept after each write.
    pub retention: usize,
    /// Schema version documents are migrated to on open.
    pub schema_version: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            backup_dir: None,
            retention: DEFAULT_BACKUP_RETENTION,
            schema_version: BALLISTIC_PROFILE_SCHEMA_VERSION,
        }
    }
}

/// Divergence thresholds for the adaptive advisor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorThresholds {
    /// Minimum crosswind change that produces a suggestion (m/s)
    pub crosswind_delta: f64,
    /// Sensed crosswind at or above this is a warning (m/s)
    pub crosswind_warning: f64,
    /// °C
    pub temperature_delta: f64,
    /// Percentage points
    pub humidity_delta: f64,
    /// hPa
    pub pressure_delta: f64,
    /// Relative density change that makes an environment suggestion a warning
    pub density_warning: f64,
    /// Rangefinder offset, in the unit reported by the device
    pub range_offset: f64,
    /// Degrees
    pub inclination_drift: f64,
}

impl Default for AdvisorThresholds {
    fn default() -> Self {
        Self {
            crosswind_delta: 1.0,
            crosswind_warning: 3.0,
            temperature_delta: 5.0,
            humidity_delta: 15.0,
            pressure_delta: 10.0,
            density_warning: 0.03,
            range_offset: 0.3,
            inclination_drift: 0.5,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub solver: SolverDefaults,
    pub store: StoreOptions,
    pub advisor: AdvisorThresholds,
}

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: String,
    pub title: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(field: &str, title: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            title: title.to_string(),
            message: message.into(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| BallisticsError::storage(path, e))?;
        let de = &mut serde_json::Deserializer::from_str(&text);
        serde_path_to_error::deserialize(de).map_err(|e| {
            BallisticsError::configuration(format!(
                "{}: invalid value at '{}': {}",
                path.display(),
                e.path(),
                e.inner()
            ))
        })
    }

    /// Every problem found; empty when the configuration is usable.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let positive = [
            ("solver.step_size", self.solver.step_size),
            ("solver.zero_distance", self.solver.zero_distance),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                issues.push(ConfigIssue::new(
                    field,
                    "Must Be Positive",
                    format!("{field} must be greater than zero, got {value}"),
                ));
            }
        }

        let non_negative = [
            ("solver.max_range", self.solver.max_range),
            ("solver.vital_zone_diameter", self.solver.vital_zone_diameter),
            ("advisor.crosswind_delta", self.advisor.crosswind_delta),
            ("advisor.crosswind_warning", self.advisor.crosswind_warning),
            ("advisor.temperature_delta", self.advisor.temperature_delta),
            ("advisor.humidity_delta", self.advisor.humidity_delta),
            ("advisor.pressure_delta", self.advisor.pressure_delta),
            ("advisor.density_warning", self.advisor.density_warning),
            ("advisor.range_offset", self.advisor.range_offset),
            ("advisor.inclination_drift", self.advisor.inclination_drift),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                issues.push(ConfigIssue::new(
                    field,
                    "Must Not Be Negative",
                    format!("{field} must be zero or greater, got {value}"),
                ));
            }
        }

        if self.store.schema_version == 0 {
            issues.push(ConfigIssue::new(
                "store.schema_version",
                "Unsupported Schema",
                "schema version 0 is the legacy list format and cannot be a migration target",
            ));
        }

        issues
    }

    /// The configuration itself, or a ConfigurationError listing every issue.
    pub fn into_validated(self) -> Result<Self> {
        let issues = self.validate();
        if issues.is_empty() {
            return Ok(self);
        }
        let details: Vec<String> = issues.iter().map(|i| i.message.clone()).collect();
        Err(BallisticsError::configuration(details.join("; ")))
    }
}
