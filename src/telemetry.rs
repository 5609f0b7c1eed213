//! Structured event logging for calculations, storage and sensors.
//!
//! `Telemetry` is an explicit handle passed to the solver, the profile store
//! and the advisor. It never installs a subscriber; binaries decide where
//! events go.

use std::path::Path;

use serde_json::Value;

/// Cloneable logging handle tagged with a session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telemetry {
    session_id: String,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    /// New handle with a fresh eight-character session id.
    pub fn new() -> Self {
        Self {
            session_id: format!("{:08x}", rand::random::<u32>()),
        }
    }

    pub fn with_session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Audit record of a calculation with its inputs and results.
    pub fn calculation(&self, kind: &str, inputs: &Value, results: &Value) {
        tracing::info!(
            target: "ballistics::calculation",
            session = %self.session_id,
            kind,
            inputs = %inputs,
            results = %results,
            "BALLISTICS: {kind}"
        );
    }

    pub fn migration(&self, path: &Path, from_version: u32, to_version: u32, backup: Option<&Path>) {
        tracing::info!(
            target: "ballistics::migration",
            session = %self.session_id,
            path = %path.display(),
            from_version,
            to_version,
            backup = %backup.map(|p| p.display().to_string()).unwrap_or_default(),
            "Profile store migrated"
        );
    }

    pub fn storage(&self, event: &str, path: &Path) {
        tracing::info!(
            target: "ballistics::storage",
            session = %self.session_id,
            path = %path.display(),
            "{event}"
        );
    }

    pub fn storage_warning(&self, event: &str, path: &Path, detail: &str) {
        tracing::warn!(
            target: "ballistics::storage",
            session = %self.session_id,
            path = %path.display(),
            detail,
            "{event}"
        );
    }

    /// A sensor reading taken into the advisor context.
    pub fn sensor(&self, device_id: &str, label: &str, value: f64, unit: &str) {
        tracing::debug!(
            target: "ballistics::sensor",
            session = %self.session_id,
            device_id,
            label,
            value,
            unit,
            "SENSOR: {label}={value}{unit}"
        );
    }

    /// A sensor metric the advisor could not use.
    pub fn sensor_ignored(&self, device_id: &str, label: &str, raw: &str, reason: &str) {
        tracing::debug!(
            target: "ballistics::sensor",
            session = %self.session_id,
            device_id,
            label,
            raw,
            reason,
            "Sensor metric ignored"
        );
    }
}
