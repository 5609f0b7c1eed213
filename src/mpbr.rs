use crate::TrajectoryPoint;

/// Maximum point-blank range (m).
///
/// Scans from the farthest sample back toward the muzzle and returns the
/// first distance whose |drop| fits inside half the vital zone, or 0.0.
pub fn max_point_blank_range(trajectory: &[TrajectoryPoint], vital_zone_diameter: f64) -> f64 {
    let radius = vital_zone_diameter / 2.0;
    trajectory
        .iter()
        .rev()
        .find(|p| p.drop.abs() <= radius)
        .map(|p| p.distance)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(distance: f64, drop: f64) -> TrajectoryPoint {
        TrajectoryPoint {
            distance,
            drop,
            velocity: 800.0,
            energy: 3000.0,
            time: distance / 800.0,
            windage: 0.0,
            mach: 2.3,
            drag_coefficient: 0.6,
        }
    }

    #[test]
    fn test_empty_trajectory() {
        assert_eq!(max_point_blank_range(&[], 0.2), 0.0);
    }

    #[test]
    fn test_farthest_point_inside_zone() {
        let trajectory = [point(0.0, 0.0), point(100.0, -0.02), point(200.0, -0.09), point(300.0, -0.25)];
        assert_eq!(max_point_blank_range(&trajectory, 0.2), 200.0);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let trajectory = [point(0.0, 0.0), point(100.0, -0.1)];
        assert_eq!(max_point_blank_range(&trajectory, 0.2), 100.0);
    }

    #[test]
    fn test_zero_width_zone_keeps_muzzle() {
        let trajectory = [point(0.0, 0.0), point(100.0, -0.01)];
        assert_eq!(max_point_blank_range(&trajectory, 0.0), 0.0);
    }

    #[test]
    fn test_reentry_after_leaving_zone_is_counted() {
        // A path that leaves the zone and comes back is resolved at the far
        // re-entry point; no continuity check is made.
        let trajectory = [
            point(0.0, 0.0),
            point(100.0, 0.15),
            point(200.0, 0.05),
            point(300.0, -0.3),
        ];
        assert_eq!(max_point_blank_range(&trajectory, 0.2), 200.0);
    }
}
