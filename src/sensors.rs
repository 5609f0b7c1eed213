//! Sensor diagnostic snapshots and metric value parsing.
//!
//! Snapshots come from paired field devices (weather meters, rangefinders).
//! Each metric carries a free-text value such as `"6.4 m/s"` or `"-0.72°"`;
//! [`parse_metric_value`] turns that text into a number and a unit.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::CELSIUS_TO_KELVIN;

/// A single diagnostic reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorMetric {
    pub label: String,
    pub value: String,
    #[serde(default = "default_metric_status")]
    pub status: String,
    #[serde(default)]
    pub hint: String,
}

fn default_metric_status() -> String {
    "nominal".to_string()
}

impl SensorMetric {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            status: default_metric_status(),
            hint: String::new(),
        }
    }
}

/// Diagnostics for one paired device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDiagnosticSnapshot {
    pub device_id: String,
    pub status: String,
    #[serde(default)]
    pub signal_quality: i32,
    #[serde(default)]
    pub battery_level: i32,
    #[serde(default)]
    pub metrics: Vec<SensorMetric>,
    #[serde(default)]
    pub alerts: Vec<String>,
    #[serde(default)]
    pub calibration_recommended: bool,
    #[serde(default)]
    pub last_calibrated: Option<String>,
}

/// Units recognised in metric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    Degrees,
    Percent,
    MetersPerSecond,
    KilometersPerHour,
    MilesPerHour,
    Knots,
    Hectopascal,
    Millibar,
    InchesOfMercury,
    Celsius,
    Fahrenheit,
    Yards,
    Meters,
}

impl MetricUnit {
    fn parse(token: &str) -> Option<Self> {
        let compact: String = token.chars().filter(|c| !c.is_whitespace()).collect();
        let unit = match compact.to_lowercase().as_str() {
            "°" | "deg" | "degs" | "degrees" => MetricUnit::Degrees,
            "%" => MetricUnit::Percent,
            "m/s" | "mps" => MetricUnit::MetersPerSecond,
            "km/h" | "kph" => MetricUnit::KilometersPerHour,
            "mph" => MetricUnit::MilesPerHour,
            "kn" | "kt" | "kts" => MetricUnit::Knots,
            "hpa" => MetricUnit::Hectopascal,
            "mbar" | "mb" => MetricUnit::Millibar,
            "inhg" => MetricUnit::InchesOfMercury,
            "°c" | "degc" | "c" => MetricUnit::Celsius,
            "°f" | "degf" | "f" => MetricUnit::Fahrenheit,
            "yd" | "yds" => MetricUnit::Yards,
            "m" => MetricUnit::Meters,
            _ => return None,
        };
        Some(unit)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            MetricUnit::Degrees => "°",
            MetricUnit::Percent => "%",
            MetricUnit::MetersPerSecond => "m/s",
            MetricUnit::KilometersPerHour => "km/h",
            MetricUnit::MilesPerHour => "mph",
            MetricUnit::Knots => "kn",
            MetricUnit::Hectopascal => "hPa",
            MetricUnit::Millibar => "mbar",
            MetricUnit::InchesOfMercury => "inHg",
            MetricUnit::Celsius => "°C",
            MetricUnit::Fahrenheit => "°F",
            MetricUnit::Yards => "yd",
            MetricUnit::Meters => "m",
        }
    }
}

impl fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Parsed numeric reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub value: f64,
    pub unit: Option<MetricUnit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricParseError {
    #[error("metric value is empty")]
    Empty,
    #[error("no number in metric value '{0}'")]
    MissingNumber(String),
    #[error("unrecognised unit '{unit}' in metric value '{raw}'")]
    UnknownUnit { raw: String, unit: String },
}

/// Parse text like `"+0.6 yd"`, `"994.5 hPa"` or `"-0.72°"`.
///
/// Grammar: optional sign, decimal number, optional unit suffix.
pub fn parse_metric_value(raw: &str) -> Result<MetricValue, MetricParseError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(MetricParseError::Empty);
    }

    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in text.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !seen_digit {
        return Err(MetricParseError::MissingNumber(raw.to_string()));
    }

    let value: f64 = text[..end]
        .parse()
        .map_err(|_| MetricParseError::MissingNumber(raw.to_string()))?;

    let suffix = text[end..].trim();
    let unit = if suffix.is_empty() {
        None
    } else {
        Some(MetricUnit::parse(suffix).ok_or_else(|| MetricParseError::UnknownUnit {
            raw: raw.to_string(),
            unit: suffix.to_string(),
        })?)
    };

    Ok(MetricValue { value, unit })
}

/// Why a parsed reading cannot be used for its metric.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MetricRejection {
    #[error("unit does not fit metric")]
    UnitMismatch,
    #[error("reading {0} is outside the physical range")]
    NonPhysical(f64),
}

/// Metric labels the advisor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Temperature,
    Humidity,
    WindSpeed,
    WindDirection,
    Pressure,
    RangeOffset,
    InclinationDrift,
}

impl MetricKind {
    /// Case-insensitive label lookup.
    pub fn from_label(label: &str) -> Option<Self> {
        let kind = match label.trim().to_lowercase().as_str() {
            "ambient temperature" | "temperature" => MetricKind::Temperature,
            "relative humidity" | "humidity" => MetricKind::Humidity,
            "wind speed" => MetricKind::WindSpeed,
            "wind direction" => MetricKind::WindDirection,
            "barometric pressure" | "pressure" => MetricKind::Pressure,
            "range offset" => MetricKind::RangeOffset,
            "inclination drift" => MetricKind::InclinationDrift,
            _ => return None,
        };
        Some(kind)
    }

    /// Convert to the advisor's working unit: °C, %, m/s, degrees, hPa.
    ///
    /// Range offsets stay in the unit they were reported in. Faulted sensors
    /// often report sentinels such as `-999 °C`; those are rejected.
    pub fn normalize(&self, metric: &MetricValue) -> Result<f64, MetricRejection> {
        let value = self.convert(metric).ok_or(MetricRejection::UnitMismatch)?;
        if self.is_physical(value) {
            Ok(value)
        } else {
            Err(MetricRejection::NonPhysical(value))
        }
    }

    /// Whether a normalized value can occur in the field.
    pub fn is_physical(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            MetricKind::Temperature => value > -CELSIUS_TO_KELVIN,
            MetricKind::Humidity => (0.0..=100.0).contains(&value),
            MetricKind::WindSpeed => value >= 0.0,
            MetricKind::Pressure => value > 0.0,
            MetricKind::WindDirection | MetricKind::RangeOffset | MetricKind::InclinationDrift => true,
        }
    }

    fn convert(&self, metric: &MetricValue) -> Option<f64> {
        use MetricUnit::*;

        let v = metric.value;
        match (self, metric.unit) {
            (MetricKind::Temperature, None | Some(Celsius) | Some(Degrees)) => Some(v),
            (MetricKind::Temperature, Some(Fahrenheit)) => Some((v - 32.0) * 5.0 / 9.0),
            (MetricKind::Humidity, None | Some(Percent)) => Some(v),
            (MetricKind::WindSpeed, None | Some(MetersPerSecond)) => Some(v),
            (MetricKind::WindSpeed, Some(KilometersPerHour)) => Some(v / 3.6),
            (MetricKind::WindSpeed, Some(MilesPerHour)) => Some(v * 0.44704),
            (MetricKind::WindSpeed, Some(Knots)) => Some(v * 0.514444),
            (MetricKind::WindDirection, None | Some(Degrees)) => Some(v),
            (MetricKind::Pressure, None | Some(Hectopascal) | Some(Millibar)) => Some(v),
            (MetricKind::Pressure, Some(InchesOfMercury)) => Some(v * 33.8639),
            (MetricKind::RangeOffset, None | Some(Yards) | Some(Meters)) => Some(v),
            (MetricKind::InclinationDrift, None | Some(Degrees)) => Some(v),
            _ => None,
        }
    }
}
