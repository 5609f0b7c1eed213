//! Adaptive correction advice from live sensor telemetry.
//!
//! The advisor keeps the environment a trajectory was computed for as its
//! baseline, folds in readings from weather meters and rangefinders, and
//! reports where the two disagree enough to change the shot.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::AdvisorThresholds;
use crate::constants::{MOA_PER_CLICK, MOA_PER_RADIAN, WIND_DRIFT_FACTOR};
use crate::sensors::{parse_metric_value, MetricKind, SensorDiagnosticSnapshot};
use crate::trajectory_solver::InitialConditions;
use crate::{BallisticsResult, EnvironmentalData, Telemetry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestionFocus {
    Crosswind,
    Environment,
    #[serde(rename = "Range Calibration")]
    RangeCalibration,
    #[serde(rename = "Cant Error")]
    CantError,
}

impl SuggestionFocus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionFocus::Crosswind => "Crosswind",
            SuggestionFocus::Environment => "Environment",
            SuggestionFocus::RangeCalibration => "Range Calibration",
            SuggestionFocus::CantError => "Cant Error",
        }
    }
}

impl fmt::Display for SuggestionFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

impl Severity {
    fn rank(&self) -> u8 {
        match self {
            Severity::Warning => 0,
            Severity::Info => 1,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
        })
    }
}

/// One piece of correction advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub focus: SuggestionFocus,
    pub severity: Severity,
    pub recommendation: String,
    pub justification: String,
    /// How far the reading is past its threshold, as a multiple of it.
    pub exceedance: f64,
}

/// A normalized reading and the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub raw: String,
    pub device_id: String,
}

/// Latest reading per field; later snapshots replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorContext {
    pub temperature: Option<Reading>,
    pub humidity: Option<Reading>,
    pub wind_speed: Option<Reading>,
    pub wind_direction: Option<Reading>,
    pub pressure: Option<Reading>,
    pub range_offset: Option<Reading>,
    pub inclination_drift: Option<Reading>,
}

impl SensorContext {
    fn slot(&mut self, kind: MetricKind) -> &mut Option<Reading> {
        match kind {
            MetricKind::Temperature => &mut self.temperature,
            MetricKind::Humidity => &mut self.humidity,
            MetricKind::WindSpeed => &mut self.wind_speed,
            MetricKind::WindDirection => &mut self.wind_direction,
            MetricKind::Pressure => &mut self.pressure,
            MetricKind::RangeOffset => &mut self.range_offset,
            MetricKind::InclinationDrift => &mut self.inclination_drift,
        }
    }

    /// `base` with every sensed weather field substituted.
    fn apply_to(&self, base: &EnvironmentalData) -> EnvironmentalData {
        let pick = |reading: &Option<Reading>, fallback: f64| reading.as_ref().map_or(fallback, |r| r.value);
        EnvironmentalData {
            temperature: pick(&self.temperature, base.temperature),
            humidity: pick(&self.humidity, base.humidity),
            pressure: pick(&self.pressure, base.pressure),
            wind_speed: pick(&self.wind_speed, base.wind_speed),
            wind_direction: pick(&self.wind_direction, base.wind_direction),
            altitude: base.altitude,
        }
    }
}

pub struct AdaptiveBallisticAdvisor {
    telemetry: Telemetry,
    thresholds: AdvisorThresholds,
    baseline: Option<EnvironmentalData>,
    context: SensorContext,
}

impl AdaptiveBallisticAdvisor {
    pub fn new(telemetry: Telemetry, thresholds: AdvisorThresholds) -> Self {
        Self {
            telemetry,
            thresholds,
            baseline: None,
            context: SensorContext::default(),
        }
    }

    pub fn thresholds(&self) -> &AdvisorThresholds {
        &self.thresholds
    }

    pub fn sensor_context(&self) -> &SensorContext {
        &self.context
    }

    /// Environment the advice is measured against. Without one, each
    /// result's own environment is used.
    pub fn update_baseline_environment(&mut self, env: EnvironmentalData) {
        self.baseline = Some(env);
    }

    pub fn clear_sensor_context(&mut self) {
        self.context = SensorContext::default();
    }

    /// Fold a device snapshot into the sensor context.
    ///
    /// Unknown labels and unusable values are logged and skipped.
    pub fn ingest_sensor_snapshot(&mut self, snapshot: &SensorDiagnosticSnapshot) {
        let device = snapshot.device_id.as_str();
        for metric in &snapshot.metrics {
            let Some(kind) = MetricKind::from_label(&metric.label) else {
                self.telemetry
                    .sensor_ignored(device, &metric.label, &metric.value, "unknown label");
                continue;
            };

            let parsed = match parse_metric_value(&metric.value) {
                Ok(parsed) => parsed,
                Err(e) => {
                    self.telemetry
                        .sensor_ignored(device, &metric.label, &metric.value, &e.to_string());
                    continue;
                }
            };

            let value = match kind.normalize(&parsed) {
                Ok(value) => value,
                Err(e) => {
                    self.telemetry
                        .sensor_ignored(device, &metric.label, &metric.value, &e.to_string());
                    continue;
                }
            };

            let unit = parsed.unit.map(|u| u.symbol()).unwrap_or("");
            self.telemetry.sensor(device, &metric.label, value, unit);
            *self.context.slot(kind) = Some(Reading {
                value,
                raw: metric.value.trim().to_string(),
                device_id: device.to_string(),
            });
        }
    }

    /// Ranked suggestions for `result` at its farthest sample.
    pub fn generate_suggestions(&self, result: &BallisticsResult) -> Vec<Suggestion> {
        let baseline = self.baseline.unwrap_or(result.environment);
        let sensed = self.context.apply_to(&baseline);

        let mut suggestions: Vec<Suggestion> = [
            self.crosswind_suggestion(result, &baseline, &sensed),
            self.environment_suggestion(result, &baseline, &sensed),
            self.range_suggestion(),
            self.cant_suggestion(),
        ]
        .into_iter()
        .flatten()
        .collect();

        suggestions.sort_by(|a, b| {
            a.severity
                .rank()
                .cmp(&b.severity.rank())
                .then_with(|| b.exceedance.total_cmp(&a.exceedance))
        });

        self.telemetry.calculation(
            "adaptive_suggestions",
            &json!({
                "ammunition": result.ammunition.name,
                "baseline": format!("{}°C, {}hPa", baseline.temperature, baseline.pressure),
            }),
            &json!({
                "suggestions": suggestions.iter().map(|s| s.focus.as_str()).collect::<Vec<_>>(),
            }),
        );

        suggestions
    }

    fn crosswind_suggestion(
        &self,
        result: &BallisticsResult,
        baseline: &EnvironmentalData,
        sensed: &EnvironmentalData,
    ) -> Option<Suggestion> {
        if self.context.wind_speed.is_none() && self.context.wind_direction.is_none() {
            return None;
        }

        let assumed = baseline.crosswind();
        let observed = sensed.crosswind();
        let delta = observed - assumed;
        let t = &self.thresholds;
        if delta.abs() < t.crosswind_delta {
            return None;
        }

        let sign_flip = assumed.abs() > f64::EPSILON && observed.signum() != assumed.signum();
        let severity = if observed.abs() >= t.crosswind_warning || sign_flip {
            Severity::Warning
        } else {
            Severity::Info
        };

        let (distance, time) = result.last_point().map_or((0.0, 0.0), |p| (p.distance, p.time));
        let drift = delta * time * WIND_DRIFT_FACTOR;
        let moa = if distance > 0.0 { drift / distance * MOA_PER_RADIAN } else { 0.0 };
        let clicks = (moa.abs() / MOA_PER_CLICK).round() as i64;
        // Bullet pushed right means holding left
        let side = if drift >= 0.0 { "left" } else { "right" };

        let wind_text = self
            .context
            .wind_speed
            .as_ref()
            .map_or_else(|| format!("{} m/s", sensed.wind_speed), |r| r.raw.clone());
        let direction_text = self
            .context
            .wind_direction
            .as_ref()
            .map_or_else(|| format!("{}°", sensed.wind_direction), |r| r.raw.clone());

        Some(Suggestion {
            focus: SuggestionFocus::Crosswind,
            severity,
            recommendation: format!(
                "Hold {:.1} MOA {side} ({clicks} clicks) at {distance:.0} m",
                moa.abs()
            ),
            justification: format!(
                "Sensed wind {wind_text} at {direction_text} gives a {observed:.1} m/s crosswind \
                 against {assumed:.1} m/s assumed, moving impact {:.1} cm",
                drift.abs() * 100.0
            ),
            exceedance: delta.abs() / t.crosswind_delta.max(f64::EPSILON),
        })
    }

    fn environment_suggestion(
        &self,
        result: &BallisticsResult,
        baseline: &EnvironmentalData,
        sensed: &EnvironmentalData,
    ) -> Option<Suggestion> {
        let t = &self.thresholds;
        let fields = [
            ("temperature", &self.context.temperature, baseline.temperature, t.temperature_delta, "°C"),
            ("humidity", &self.context.humidity, baseline.humidity, t.humidity_delta, "%"),
            ("pressure", &self.context.pressure, baseline.pressure, t.pressure_delta, " hPa"),
        ];

        let mut diverging = Vec::new();
        let mut exceedance: f64 = 0.0;
        for (name, reading, assumed, threshold, unit) in fields {
            let Some(reading) = reading else { continue };
            let delta = reading.value - assumed;
            if delta.abs() >= threshold {
                diverging.push(format!("{name} {} vs {assumed}{unit} assumed", reading.raw));
                exceedance = exceedance.max(delta.abs() / threshold.max(f64::EPSILON));
            }
        }
        if diverging.is_empty() {
            return None;
        }

        let density_change = sensed.air_density_ratio() / baseline.air_density_ratio() - 1.0;
        let severity = if density_change.abs() >= t.density_warning {
            Severity::Warning
        } else {
            Severity::Info
        };
        let effect = if density_change > 0.0 { "steepen" } else { "flatten" };

        let energy_note = match result.last_point() {
            Some(point) if sensed.validate().is_ok() => {
                let sensed_point = InitialConditions::prepare(&result.ammunition, sensed, result.zero_distance)
                    .point_at(point.distance);
                format!(
                    "; retained energy at {:.0} m changes by {:+.0} J",
                    point.distance,
                    sensed_point.energy - point.energy
                )
            }
            _ => String::new(),
        };

        Some(Suggestion {
            focus: SuggestionFocus::Environment,
            severity,
            recommendation: "Recompute the trajectory with the sensed conditions before dialing".to_string(),
            justification: format!(
                "{}. Air density {:+.1}% will {effect} drop{energy_note}",
                diverging.join(", "),
                density_change * 100.0
            ),
            exceedance,
        })
    }

    fn range_suggestion(&self) -> Option<Suggestion> {
        let reading = self.context.range_offset.as_ref()?;
        let threshold = self.thresholds.range_offset;
        if reading.value.abs() <= threshold {
            return None;
        }

        Some(Suggestion {
            focus: SuggestionFocus::RangeCalibration,
            severity: Severity::Warning,
            recommendation: format!(
                "Recalibrate {} against a known benchmark; ranges read {} off",
                reading.device_id, reading.raw
            ),
            justification: format!(
                "Range offset {:.2} exceeds the {threshold} tolerance and shifts every hold-over",
                reading.value.abs()
            ),
            exceedance: reading.value.abs() / threshold.max(f64::EPSILON),
        })
    }

    fn cant_suggestion(&self) -> Option<Suggestion> {
        let reading = self.context.inclination_drift.as_ref()?;
        let threshold = self.thresholds.inclination_drift;
        if reading.value.abs() <= threshold {
            return None;
        }

        Some(Suggestion {
            focus: SuggestionFocus::CantError,
            severity: Severity::Warning,
            recommendation: "Re-level the rifle and reset the inclinometer reference".to_string(),
            justification: format!(
                "Inclination drift of {} from {} exceeds the ±{threshold}° tolerance",
                reading.raw, reading.device_id
            ),
            exceedance: reading.value.abs() / threshold.max(f64::EPSILON),
        })
    }
}
