//! Environmental model for the trajectory engine.
//!
//! Simplified field corrections: air-density ratio relative to the standard
//! sea-level atmosphere and the local speed of sound.

use serde::{Deserialize, Serialize};

use crate::constants::{
    AIR_DENSITY_SEA_LEVEL, CELSIUS_TO_KELVIN, DENSITY_SCALE_HEIGHT_M, HUMIDITY_DENSITY_COEFF,
    SPEED_OF_SOUND_0C, STANDARD_PRESSURE_HPA, STANDARD_TEMPERATURE_K,
};
use crate::error::{BallisticsError, Result};

/// Environmental conditions for a ballistics calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentalData {
    /// Temperature (°C)
    pub temperature: f64,
    /// Station pressure (hPa)
    pub pressure: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Altitude (m)
    pub altitude: f64,
    /// Wind speed (m/s)
    pub wind_speed: f64,
    /// Wind direction in degrees; 0 = headwind, 90 = right crosswind
    pub wind_direction: f64,
}

impl Default for EnvironmentalData {
    fn default() -> Self {
        Self {
            temperature: 15.0,
            pressure: STANDARD_PRESSURE_HPA,
            humidity: 50.0,
            altitude: 0.0,
            wind_speed: 0.0,
            wind_direction: 0.0,
        }
    }
}

impl EnvironmentalData {
    /// Reject conditions no atmosphere can have.
    ///
    /// Every field must be finite, the temperature above absolute zero, the
    /// pressure positive, humidity within 0-100 % and wind speed non-negative.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("temperature", self.temperature),
            ("pressure", self.pressure),
            ("humidity", self.humidity),
            ("altitude", self.altitude),
            ("wind_speed", self.wind_speed),
            ("wind_direction", self.wind_direction),
        ];
        if let Some((field, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(BallisticsError::configuration(format!(
                "environment: {field} must be finite, got {value}"
            )));
        }

        if self.temperature <= -CELSIUS_TO_KELVIN {
            return Err(BallisticsError::configuration(format!(
                "environment: temperature must be above absolute zero, got {} °C",
                self.temperature
            )));
        }
        if self.pressure <= 0.0 {
            return Err(BallisticsError::configuration(format!(
                "environment: pressure must be positive, got {} hPa",
                self.pressure
            )));
        }
        if !(0.0..=100.0).contains(&self.humidity) {
            return Err(BallisticsError::configuration(format!(
                "environment: humidity must be within 0-100 %, got {}",
                self.humidity
            )));
        }
        if self.wind_speed < 0.0 {
            return Err(BallisticsError::configuration(format!(
                "environment: wind_speed must not be negative, got {}",
                self.wind_speed
            )));
        }
        Ok(())
    }

    /// Air density relative to the standard atmosphere.
    pub fn air_density_ratio(&self) -> f64 {
        air_density_ratio(self)
    }

    /// Lateral wind component (m/s), positive pushes the bullet right.
    pub fn crosswind(&self) -> f64 {
        self.wind_speed * self.wind_direction.to_radians().sin()
    }

    /// Longitudinal wind component (m/s), positive into the shooter's face.
    pub fn headwind(&self) -> f64 {
        self.wind_speed * self.wind_direction.to_radians().cos()
    }

    pub fn speed_of_sound(&self) -> f64 {
        speed_of_sound(self)
    }

    pub fn air_density(&self) -> f64 {
        air_density(self)
    }
}

/// Calculate the air density ratio.
///
/// Product of pressure ratio, temperature ratio, humidity factor and an
/// exponential altitude factor.
pub fn air_density_ratio(env: &EnvironmentalData) -> f64 {
    let pressure_ratio = env.pressure / STANDARD_PRESSURE_HPA;
    let temp_ratio = STANDARD_TEMPERATURE_K / (env.temperature + CELSIUS_TO_KELVIN);
    let humidity_factor = 1.0 - HUMIDITY_DENSITY_COEFF * (env.humidity / 100.0);
    let altitude_factor = (-env.altitude / DENSITY_SCALE_HEIGHT_M).exp();

    pressure_ratio * temp_ratio * humidity_factor * altitude_factor
}

/// Local speed of sound (m/s)
pub fn speed_of_sound(env: &EnvironmentalData) -> f64 {
    SPEED_OF_SOUND_0C * (1.0 + env.temperature / CELSIUS_TO_KELVIN).sqrt()
}

/// Air density in kg/m³
pub fn air_density(env: &EnvironmentalData) -> f64 {
    air_density_ratio(env) * AIR_DENSITY_SEA_LEVEL
}
