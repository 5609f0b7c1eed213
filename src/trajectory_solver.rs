use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::angle_calculations::zero_angle;
use crate::constants::{
    G_ACCEL_MPS2, MIN_VELOCITY_FRACTION, VELOCITY_LOSS_PER_KM, WIND_DRIFT_FACTOR,
};
use crate::error::{BallisticsError, Result};
use crate::mpbr::max_point_blank_range;
use crate::{Ammunition, DragTableInterpolator, EnvironmentalData, Telemetry};

/// Single sample on the trajectory path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Distance from the muzzle (m)
    pub distance: f64,
    /// Drop relative to the line of sight (m), negative = below
    pub drop: f64,
    /// Retained velocity (m/s)
    pub velocity: f64,
    /// Retained energy (J)
    pub energy: f64,
    /// Time of flight (s)
    pub time: f64,
    /// Lateral drift (m), positive = right
    pub windage: f64,
    pub mach: f64,
    pub drag_coefficient: f64,
}

/// Complete ballistics calculation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallisticsResult {
    pub ammunition: Ammunition,
    pub environment: EnvironmentalData,
    pub zero_distance: f64,
    /// Launch angle relative to the line of sight (rad)
    pub zero_angle: f64,
    pub step_size: f64,
    pub trajectory: Vec<TrajectoryPoint>,
    pub max_point_blank_range: f64,
    pub vital_zone_diameter: f64,
}

impl BallisticsResult {
    /// Muzzle energy (J)
    pub fn muzzle_energy(&self) -> f64 {
        let v = self.ammunition.muzzle_velocity;
        0.5 * self.ammunition.mass_kg() * v * v
    }

    /// Sample closest to `distance`; the first one wins ties.
    pub fn point_nearest(&self, distance: f64) -> Option<&TrajectoryPoint> {
        self.trajectory.iter().fold(None, |best: Option<&TrajectoryPoint>, p| match best {
            Some(b) if (b.distance - distance).abs() <= (p.distance - distance).abs() => Some(b),
            _ => Some(p),
        })
    }

    /// Farthest computed sample.
    pub fn last_point(&self) -> Option<&TrajectoryPoint> {
        self.trajectory.last()
    }

    /// Plain-text report with a trajectory row every 100 m.
    pub fn summary(&self) -> String {
        let ammo = &self.ammunition;
        let env = &self.environment;
        let mut out = String::new();

        let _ = writeln!(out, "BALLISTICS SUMMARY");
        let _ = writeln!(out, "==================");
        let _ = writeln!(out, "Ammunition: {}", ammo.name);
        let _ = writeln!(out, "Caliber: {}", ammo.caliber);
        let _ = writeln!(out, "Bullet Weight: {} gr", ammo.bullet_weight);
        let _ = writeln!(out, "Muzzle Velocity: {} m/s", ammo.muzzle_velocity);
        let _ = writeln!(
            out,
            "Ballistic Coefficient: {} ({})",
            ammo.ballistic_coefficient, ammo.drag_model
        );
        let _ = writeln!(out, "Muzzle Energy: {:.0} J", self.muzzle_energy());
        let _ = writeln!(out);
        let _ = writeln!(out, "Environmental Conditions:");
        let _ = writeln!(out, "Temperature: {}°C", env.temperature);
        let _ = writeln!(out, "Pressure: {} hPa", env.pressure);
        let _ = writeln!(out, "Humidity: {}%", env.humidity);
        let _ = writeln!(out, "Altitude: {} m", env.altitude);
        let _ = writeln!(out, "Wind: {} m/s @ {}°", env.wind_speed, env.wind_direction);
        let _ = writeln!(out);
        let _ = writeln!(out, "Zero Distance: {} m", self.zero_distance);
        let _ = writeln!(out, "Maximum Point Blank Range: {:.0} m", self.max_point_blank_range);
        let _ = writeln!(out, "Vital Zone Diameter: {} m", self.vital_zone_diameter);
        let _ = writeln!(out);
        let _ = writeln!(out, "TRAJECTORY DATA (Every 100m):");
        let _ = writeln!(out, "Distance    Drop      Velocity   Energy    Time     Wind Drift");
        let _ = writeln!(out, "  (m)       (cm)      (m/s)      (J)       (s)       (cm)");
        let _ = writeln!(out, "{}", "-".repeat(62));

        for p in self.trajectory.iter().filter(|p| (p.distance % 100.0).abs() < 1e-9) {
            let _ = writeln!(
                out,
                "{:6.0}    {:6.1}    {:8.1}   {:7.0}   {:6.3}    {:6.1}",
                p.distance,
                p.drop * 100.0,
                p.velocity,
                p.energy,
                p.time,
                p.windage * 100.0
            );
        }

        out
    }
}

/// Per-shot quantities derived once before sampling
#[derive(Debug, Clone, Copy)]
pub struct InitialConditions {
    pub muzzle_velocity_mps: f64,
    pub mass_kg: f64,
    pub cross_section_m2: f64,
    pub zero_angle_rad: f64,
    pub air_density: f64,
    pub air_density_ratio: f64,
    pub speed_of_sound: f64,
    pub crosswind_mps: f64,
    drag: DragTableInterpolator,
    drag_model: crate::DragModel,
}

impl InitialConditions {
    /// Prepare initial conditions for trajectory sampling
    pub fn prepare(ammo: &Ammunition, env: &EnvironmentalData, zero_distance: f64) -> Self {
        Self {
            muzzle_velocity_mps: ammo.muzzle_velocity,
            mass_kg: ammo.mass_kg(),
            cross_section_m2: ammo.cross_section_m2(),
            zero_angle_rad: zero_angle(ammo.muzzle_velocity, zero_distance),
            air_density: env.air_density(),
            air_density_ratio: env.air_density_ratio(),
            speed_of_sound: env.speed_of_sound(),
            crosswind_mps: env.crosswind(),
            drag: DragTableInterpolator::new(),
            drag_model: ammo.drag_model,
        }
    }

    /// Trajectory sample at `distance` (m)
    pub fn point_at(&self, distance: f64) -> TrajectoryPoint {
        let v0 = self.muzzle_velocity_mps;
        let angle = self.zero_angle_rad;

        let time = distance / (v0 * angle.cos());

        let loss_factor = 1.0 - (distance / 1000.0) * VELOCITY_LOSS_PER_KM * self.air_density_ratio;
        let velocity = v0 * loss_factor.max(MIN_VELOCITY_FRACTION);

        let gravity_drop = 0.5 * G_ACCEL_MPS2 * time * time;
        let launch_compensation = distance * angle.tan();
        let drop = launch_compensation - gravity_drop;

        let energy = 0.5 * self.mass_kg * velocity * velocity;
        let windage = self.crosswind_mps * time * WIND_DRIFT_FACTOR;

        let mach = velocity / self.speed_of_sound;
        let drag_coefficient = self.drag.coefficient(mach, self.drag_model);

        TrajectoryPoint {
            distance,
            drop,
            velocity,
            energy,
            time,
            windage,
            mach,
            drag_coefficient,
        }
    }
}

/// Samples trajectories at a fixed step and records each run through telemetry.
#[derive(Debug, Clone)]
pub struct TrajectorySolver {
    telemetry: Telemetry,
}

impl TrajectorySolver {
    pub fn new(telemetry: Telemetry) -> Self {
        Self { telemetry }
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Compute a complete trajectory.
    ///
    /// Samples sit at `i * step_size` for every `i` with the distance not
    /// exceeding `max_range`, so the muzzle sample is always present.
    pub fn compute(
        &self,
        ammo: &Ammunition,
        env: &EnvironmentalData,
        zero_distance: f64,
        max_range: f64,
        step_size: f64,
        vital_zone_diameter: f64,
    ) -> Result<BallisticsResult> {
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(BallisticsError::configuration(format!(
                "step size must be positive, got {step_size}"
            )));
        }
        if !max_range.is_finite() || max_range < 0.0 {
            return Err(BallisticsError::configuration(format!(
                "max range must not be negative, got {max_range}"
            )));
        }
        if !zero_distance.is_finite() || zero_distance <= 0.0 {
            return Err(BallisticsError::configuration(format!(
                "zero distance must be positive, got {zero_distance}"
            )));
        }
        if !vital_zone_diameter.is_finite() || vital_zone_diameter < 0.0 {
            return Err(BallisticsError::configuration(format!(
                "vital zone diameter must not be negative, got {vital_zone_diameter}"
            )));
        }
        ammo.validate()?;
        env.validate()?;

        let conditions = InitialConditions::prepare(ammo, env, zero_distance);

        let samples = (max_range / step_size).floor() as usize;
        let trajectory: Vec<TrajectoryPoint> = (0..=samples)
            .map(|i| i as f64 * step_size)
            .filter(|d| *d <= max_range)
            .map(|d| conditions.point_at(d))
            .collect();

        let mpbr = max_point_blank_range(&trajectory, vital_zone_diameter);

        let result = BallisticsResult {
            ammunition: ammo.clone(),
            environment: *env,
            zero_distance,
            zero_angle: conditions.zero_angle_rad,
            step_size,
            trajectory,
            max_point_blank_range: mpbr,
            vital_zone_diameter,
        };

        self.telemetry.calculation(
            "trajectory",
            &json!({
                "ammunition": ammo.name,
                "zero_distance": zero_distance,
                "max_range": max_range,
                "step_size": step_size,
                "environment": format!("{}°C, {}hPa", env.temperature, env.pressure),
            }),
            &json!({
                "muzzle_energy": result.muzzle_energy(),
                "mpbr": mpbr,
                "trajectory_points": result.trajectory.len(),
            }),
        );

        Ok(result)
    }
}

impl Default for TrajectorySolver {
    fn default() -> Self {
        Self::new(Telemetry::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DragModel;
    use approx::assert_relative_eq;

    fn reference_load() -> Ammunition {
        Ammunition::new("Test", ".308", 150.0, 800.0, 0.4, DragModel::G1, 7.82, 51.0)
    }

    fn solve(max_range: f64, step: f64) -> BallisticsResult {
        TrajectorySolver::default()
            .compute(&reference_load(), &EnvironmentalData::default(), 100.0, max_range, step, 0.2)
            .unwrap()
    }

    #[test]
    fn test_sample_count_and_spacing() {
        let result = solve(500.0, 25.0);
        assert_eq!(result.trajectory.len(), 21);
        assert_eq!(result.trajectory[0].distance, 0.0);
        assert_eq!(result.trajectory[20].distance, 500.0);
    }

    #[test]
    fn test_muzzle_sample() {
        let result = solve(500.0, 25.0);
        let muzzle = result.trajectory[0];
        assert_eq!(muzzle.drop, 0.0);
        assert_eq!(muzzle.time, 0.0);
        assert_eq!(muzzle.windage, 0.0);
        assert_eq!(muzzle.velocity, 800.0);
        assert_relative_eq!(muzzle.energy, result.muzzle_energy(), epsilon = 1e-9);
    }

    #[test]
    fn test_zeroed_at_zero_distance() {
        let result = solve(500.0, 25.0);
        let at_zero = result.point_nearest(100.0).unwrap();
        assert_eq!(at_zero.distance, 100.0);
        assert!(at_zero.drop.abs() < 0.05, "drop at zero: {}", at_zero.drop);
    }

    #[test]
    fn test_velocity_strictly_decreasing() {
        let result = solve(500.0, 25.0);
        for pair in result.trajectory.windows(2) {
            assert!(pair[1].velocity < pair[0].velocity);
            assert!(pair[1].time > pair[0].time);
        }
    }

    #[test]
    fn test_velocity_floor() {
        let result = solve(5000.0, 500.0);
        let last = result.last_point().unwrap();
        assert_relative_eq!(last.velocity, 800.0 * 0.3, epsilon = 1e-9);
    }

    #[test]
    fn test_max_range_below_step_yields_muzzle_only() {
        let result = solve(10.0, 25.0);
        assert_eq!(result.trajectory.len(), 1);
        assert_eq!(result.trajectory[0].distance, 0.0);
    }

    #[test]
    fn test_max_range_zero() {
        let result = solve(0.0, 25.0);
        assert_eq!(result.trajectory.len(), 1);
    }

    #[test]
    fn test_crosswind_drift_direction() {
        let solver = TrajectorySolver::default();
        let right = EnvironmentalData { wind_speed: 5.0, wind_direction: 90.0, ..Default::default() };
        let result = solver.compute(&reference_load(), &right, 100.0, 300.0, 100.0, 0.2).unwrap();
        let p = result.trajectory[3];
        assert_relative_eq!(p.windage, 5.0 * p.time * 0.5, epsilon = 1e-12);
        assert!(p.windage > 0.0);
    }

    #[test]
    fn test_mach_and_drag_recorded() {
        let result = solve(200.0, 100.0);
        let muzzle = result.trajectory[0];
        let sound = EnvironmentalData::default().speed_of_sound();
        assert_relative_eq!(muzzle.mach, 800.0 / sound, epsilon = 1e-12);
        assert!(muzzle.drag_coefficient > 0.2 && muzzle.drag_coefficient < 0.7);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let solver = TrajectorySolver::default();
        let ammo = reference_load();
        let env = EnvironmentalData::default();

        for (zero, range, step) in [(100.0, 500.0, 0.0), (100.0, 500.0, -5.0), (100.0, -1.0, 25.0), (0.0, 500.0, 25.0)] {
            let err = solver.compute(&ammo, &env, zero, range, step, 0.2).unwrap_err();
            assert!(matches!(err, BallisticsError::Configuration(_)), "{zero} {range} {step}");
        }

        let bad_ammo = ammo.clone().with_muzzle_velocity(0.0);
        assert!(solver.compute(&bad_ammo, &env, 100.0, 500.0, 25.0, 0.2).is_err());

        for bad_env in [
            EnvironmentalData { temperature: -300.0, ..env },
            EnvironmentalData { pressure: -1013.25, ..env },
            EnvironmentalData { humidity: f64::NAN, ..env },
        ] {
            let err = solver.compute(&ammo, &bad_env, 100.0, 500.0, 25.0, 0.2).unwrap_err();
            assert!(matches!(err, BallisticsError::Configuration(_)), "{bad_env:?}");
        }
    }

    #[test]
    fn test_point_nearest_tie_prefers_first() {
        let result = solve(200.0, 100.0);
        assert_eq!(result.point_nearest(150.0).unwrap().distance, 100.0);
        assert_eq!(result.point_nearest(-40.0).unwrap().distance, 0.0);
        assert_eq!(result.point_nearest(9000.0).unwrap().distance, 200.0);
    }

    #[test]
    fn test_summary_lists_every_hundred_metres() {
        let result = solve(300.0, 25.0);
        let summary = result.summary();
        assert!(summary.starts_with("BALLISTICS SUMMARY"));
        assert!(summary.contains("Ammunition: Test"));
        assert!(summary.contains("Ballistic Coefficient: 0.4 (G1)"));
        let rows = summary
            .lines()
            .skip_while(|l| !l.starts_with("----"))
            .skip(1)
            .count();
        assert_eq!(rows, 4);
    }
}
