//! Unit conversions and small field formulas.
//!
//! The engine works in metric internally; these helpers convert at the
//! edges and provide rule-of-thumb figures used in the field.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BallisticsError;

const YARDS_PER_METER: f64 = 1.09361;
const METERS_PER_YARD: f64 = 0.9144;
const FPS_PER_MPS: f64 = 3.28084;
const MPS_PER_FPS: f64 = 0.3048;
const FTLBS_PER_JOULE: f64 = 0.737562;
const JOULES_PER_FTLB: f64 = 1.35582;
const GRAMS_PER_GRAIN: f64 = 0.0647989;
const GRAINS_PER_GRAM: f64 = 15.4324;
const INHG_PER_HPA: f64 = 0.02953;
const HPA_PER_INHG: f64 = 33.8639;
const GRAINS_PER_POUND: f64 = 7000.0;
const GRAVITY_IMPERIAL: f64 = 32.174;
/// Approximate powder gas velocity used for recoil (ft/s)
const POWDER_GAS_VELOCITY_FPS: f64 = 4000.0;

pub fn meters_to_yards(meters: f64) -> f64 {
    meters * YARDS_PER_METER
}

pub fn yards_to_meters(yards: f64) -> f64 {
    yards * METERS_PER_YARD
}

pub fn mps_to_fps(mps: f64) -> f64 {
    mps * FPS_PER_MPS
}

pub fn fps_to_mps(fps: f64) -> f64 {
    fps * MPS_PER_FPS
}

pub fn joules_to_ft_lbs(joules: f64) -> f64 {
    joules * FTLBS_PER_JOULE
}

pub fn ft_lbs_to_joules(ft_lbs: f64) -> f64 {
    ft_lbs * JOULES_PER_FTLB
}

pub fn grains_to_grams(grains: f64) -> f64 {
    grains * GRAMS_PER_GRAIN
}

pub fn grams_to_grains(grams: f64) -> f64 {
    grams * GRAINS_PER_GRAM
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub fn hpa_to_inhg(hpa: f64) -> f64 {
    hpa * INHG_PER_HPA
}

pub fn inhg_to_hpa(inhg: f64) -> f64 {
    inhg * HPA_PER_INHG
}

/// Sectional density (lb/in²) from weight in grains and diameter in inches.
pub fn sectional_density(bullet_weight_grains: f64, diameter_inches: f64) -> f64 {
    bullet_weight_grains / (GRAINS_PER_POUND * diameter_inches * diameter_inches)
}

/// Bullet profile used for the rough BC estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulletShape {
    #[default]
    Spitzer,
    BoatTail,
    FlatBase,
    RoundNose,
}

impl BulletShape {
    fn bc_multiplier(&self) -> f64 {
        match self {
            BulletShape::Spitzer => 0.5,
            BulletShape::BoatTail => 0.55,
            BulletShape::FlatBase => 0.45,
            BulletShape::RoundNose => 0.35,
        }
    }
}

impl FromStr for BulletShape {
    type Err = BallisticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "spitzer" => Ok(BulletShape::Spitzer),
            "boat_tail" => Ok(BulletShape::BoatTail),
            "flat_base" => Ok(BulletShape::FlatBase),
            "round_nose" => Ok(BulletShape::RoundNose),
            _ => Err(BallisticsError::configuration(format!("unknown bullet shape '{s}'"))),
        }
    }
}

/// Very rough BC estimate; real BC depends on the full bullet profile.
pub fn estimate_bc_from_sd(sectional_density: f64, shape: BulletShape) -> f64 {
    sectional_density * shape.bc_multiplier()
}

/// Kinetic energy (J)
pub fn kinetic_energy(mass_kg: f64, velocity_mps: f64) -> f64 {
    0.5 * mass_kg * velocity_mps * velocity_mps
}

/// Momentum (kg·m/s)
pub fn momentum(mass_kg: f64, velocity_mps: f64) -> f64 {
    mass_kg * velocity_mps
}

/// Taylor knock-out factor.
pub fn taylor_ko_factor(bullet_weight_grains: f64, velocity_fps: f64, diameter_inches: f64) -> f64 {
    bullet_weight_grains * velocity_fps * diameter_inches / GRAINS_PER_POUND
}

/// Free recoil energy estimate (ft·lbf).
pub fn estimate_recoil_energy(
    bullet_weight_grains: f64,
    powder_weight_grains: f64,
    muzzle_velocity_fps: f64,
    rifle_weight_lbs: f64,
) -> f64 {
    if rifle_weight_lbs <= 0.0 {
        return 0.0;
    }
    let bullet_momentum = bullet_weight_grains * muzzle_velocity_fps;
    let powder_momentum = powder_weight_grains * POWDER_GAS_VELOCITY_FPS;
    let total_momentum = (bullet_momentum + powder_momentum) / GRAINS_PER_POUND;
    let rifle_slugs = rifle_weight_lbs / GRAVITY_IMPERIAL;
    let recoil_velocity = total_momentum / rifle_slugs;
    0.5 * rifle_slugs * recoil_velocity * recoil_velocity
}

/// BC correction factor against 59°F, 29.92 inHg, 78% humidity.
pub fn atmospheric_correction_factor(temperature_f: f64, pressure_inhg: f64, humidity_percent: f64) -> f64 {
    let temp_factor = (459.4 + temperature_f) / 518.4;
    let pressure_factor = pressure_inhg / 29.92;
    let humidity_factor = (100.0 - humidity_percent) / 22.0;
    pressure_factor / temp_factor * humidity_factor
}

/// Unit system used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Metres to metres or yards
    pub fn distance_from_metric(&self, meters: f64) -> f64 {
        match self {
            UnitSystem::Metric => meters,
            UnitSystem::Imperial => meters_to_yards(meters),
        }
    }

    /// Metres or yards to metres
    pub fn distance_to_metric(&self, value: f64) -> f64 {
        match self {
            UnitSystem::Metric => value,
            UnitSystem::Imperial => yards_to_meters(value),
        }
    }

    pub fn velocity_from_metric(&self, mps: f64) -> f64 {
        match self {
            UnitSystem::Metric => mps,
            UnitSystem::Imperial => mps_to_fps(mps),
        }
    }

    pub fn energy_from_metric(&self, joules: f64) -> f64 {
        match self {
            UnitSystem::Metric => joules,
            UnitSystem::Imperial => joules_to_ft_lbs(joules),
        }
    }

    pub fn distance_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m",
            UnitSystem::Imperial => "yd",
        }
    }

    pub fn velocity_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "ft/s",
        }
    }

    pub fn energy_label(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "J",
            UnitSystem::Imperial => "ft·lbf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_temperature_round_trip() {
        assert_relative_eq!(celsius_to_fahrenheit(15.0), 59.0, epsilon = 1e-12);
        assert_relative_eq!(fahrenheit_to_celsius(-40.0), -40.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sectional_density_and_bc() {
        // .308, 168 gr
        let sd = sectional_density(168.0, 0.308);
        assert_relative_eq!(sd, 0.253, epsilon = 1e-3);
        assert_relative_eq!(estimate_bc_from_sd(sd, BulletShape::BoatTail), sd * 0.55, epsilon = 1e-12);
        assert_eq!("boat-tail".parse::<BulletShape>().unwrap(), BulletShape::BoatTail);
        assert!("wadcutter".parse::<BulletShape>().is_err());
    }

    #[test]
    fn test_taylor_ko() {
        assert_relative_eq!(taylor_ko_factor(180.0, 2700.0, 0.308), 21.384, epsilon = 1e-3);
    }

    #[test]
    fn test_recoil_energy() {
        let energy = estimate_recoil_energy(168.0, 44.0, 2650.0, 8.5);
        let momentum = (168.0 * 2650.0 + 44.0 * 4000.0) / 7000.0;
        let slugs = 8.5 / 32.174;
        assert_relative_eq!(energy, momentum * momentum / (2.0 * slugs), epsilon = 1e-6);
        // Energy falls off inversely with rifle weight
        let heavy = estimate_recoil_energy(168.0, 44.0, 2650.0, 17.0);
        assert_relative_eq!(heavy, energy / 2.0, epsilon = 1e-6);
        assert_eq!(estimate_recoil_energy(168.0, 44.0, 2650.0, 0.0), 0.0);
    }

    #[test]
    fn test_atmospheric_correction_at_standard() {
        assert_relative_eq!(atmospheric_correction_factor(59.0, 29.92, 78.0), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_unit_system_conversions() {
        let imperial = UnitSystem::Imperial;
        assert_relative_eq!(imperial.distance_from_metric(100.0), 109.361, epsilon = 1e-9);
        assert_relative_eq!(imperial.distance_to_metric(100.0), 91.44, epsilon = 1e-9);
        assert_relative_eq!(imperial.velocity_from_metric(800.0), 2624.672, epsilon = 1e-9);
        assert_eq!(UnitSystem::Metric.energy_from_metric(3000.0), 3000.0);
        assert_eq!(imperial.distance_label(), "yd");
    }
}
