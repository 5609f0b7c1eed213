use crate::constants::G_ACCEL_MPS2;

/// Vacuum drop (m) over `distance` at constant `velocity`.
///
/// Used only to derive the launch angle; the trajectory itself carries the
/// velocity decay model.
pub fn basic_drop(distance: f64, velocity: f64) -> f64 {
    if velocity <= 0.0 {
        return 0.0;
    }
    let time = distance / velocity;
    0.5 * G_ACCEL_MPS2 * time * time
}

/// Launch angle (radians) that places the bullet on the line of sight at
/// `zero_distance`.
///
/// Depends on muzzle velocity and zero distance only; drag and environment
/// do not enter.
pub fn zero_angle(muzzle_velocity: f64, zero_distance: f64) -> f64 {
    if zero_distance <= 0.0 {
        return 0.0;
    }
    (basic_drop(zero_distance, muzzle_velocity) / zero_distance).atan()
}
