//! Scope adjustments (come-ups) derived from a computed trajectory.

use serde::{Deserialize, Serialize};

use crate::constants::{MOA_PER_CLICK, MOA_PER_RADIAN};
use crate::error::{BallisticsError, Result};
use crate::BallisticsResult;

/// Elevation and windage adjustment for one requested distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComeUp {
    /// Requested distance (m)
    pub distance: f64,
    pub elevation_moa: f64,
    pub windage_moa: f64,
    pub elevation_clicks: i32,
    pub windage_clicks: i32,
    pub velocity: f64,
    pub energy: f64,
    pub time_of_flight: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn to_moa(value: f64, distance: f64) -> f64 {
    if distance == 0.0 {
        return 0.0;
    }
    value / distance * MOA_PER_RADIAN
}

/// Come-up table, one entry per requested distance in request order.
///
/// Each entry uses the trajectory sample nearest the requested distance;
/// out-of-range requests resolve to the nearest end of the trajectory.
pub fn come_ups(result: &BallisticsResult, distances: &[f64]) -> Vec<ComeUp> {
    if result.trajectory.is_empty() {
        return Vec::new();
    }

    distances
        .iter()
        .filter_map(|&distance| {
            let point = result.point_nearest(distance)?;
            let elevation = to_moa(point.drop, distance);
            let windage = to_moa(point.windage, distance);

            Some(ComeUp {
                distance,
                elevation_moa: round_to(elevation, 2),
                windage_moa: round_to(windage, 2),
                elevation_clicks: (elevation / MOA_PER_CLICK).round() as i32,
                windage_clicks: (windage / MOA_PER_CLICK).round() as i32,
                velocity: round_to(point.velocity, 1),
                energy: point.energy.round(),
                time_of_flight: round_to(point.time, 3),
            })
        })
        .collect()
}

/// Parse a comma or whitespace separated list of distances.
pub fn parse_distance_list(input: &str) -> Result<Vec<f64>> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            let value: f64 = token.parse().map_err(|_| {
                BallisticsError::configuration(format!("invalid distance '{token}'"))
            })?;
            if !value.is_finite() || value < 0.0 {
                return Err(BallisticsError::configuration(format!(
                    "distance must be a non-negative number, got '{token}'"
                )));
            }
            Ok(value)
        })
        .collect()
}
