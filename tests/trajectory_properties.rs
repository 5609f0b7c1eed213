use approx::assert_relative_eq;
use field_ballistics::{
    come_ups, max_point_blank_range, Ammunition, BallisticProfile, DragModel, EnvironmentalData,
    TrajectorySolver,
};
use proptest::prelude::*;

fn reference_load() -> Ammunition {
    Ammunition::new("Reference", ".308 Win", 150.0, 800.0, 0.4, DragModel::G1, 7.82, 51.0)
}

#[test]
fn test_reference_scenario() {
    let result = TrajectorySolver::default()
        .compute(&reference_load(), &EnvironmentalData::default(), 100.0, 500.0, 25.0, 0.2)
        .unwrap();

    assert_eq!(result.trajectory.len(), 21);
    let at_zero = result.point_nearest(100.0).unwrap();
    assert_eq!(at_zero.distance, 100.0);
    assert!(at_zero.drop.abs() < 0.05, "drop at zero {}", at_zero.drop);

    for pair in result.trajectory.windows(2) {
        assert!(pair[1].velocity < pair[0].velocity);
        assert!(pair[1].time > pair[0].time);
    }

    let first = &result.trajectory[0];
    assert_eq!(first.distance, 0.0);
    assert_eq!(first.velocity, 800.0);
    assert_relative_eq!(first.energy, result.muzzle_energy(), max_relative = 1e-12);

    // Past zero the bullet is below the line of sight
    assert!(result.last_point().unwrap().drop < -0.5);
    assert!(result.max_point_blank_range > 100.0);
    assert!(result.max_point_blank_range < 500.0);
}

#[test]
fn test_come_ups_grow_with_distance() {
    let env = EnvironmentalData { wind_speed: 5.0, wind_direction: 90.0, ..Default::default() };
    let result = TrajectorySolver::default()
        .compute(&reference_load(), &env, 100.0, 600.0, 50.0, 0.2)
        .unwrap();
    let table = come_ups(&result, &[200.0, 400.0, 600.0]);

    assert!(table[0].elevation_moa.abs() < table[1].elevation_moa.abs());
    assert!(table[1].elevation_moa.abs() < table[2].elevation_moa.abs());
    assert!(table.iter().all(|c| c.windage_moa > 0.0));
}

proptest! {
    #[test]
    fn prop_drop_grows_past_zero(
        velocity in 300.0f64..1200.0,
        zero in 25.0f64..500.0,
        bc in 0.1f64..0.8,
    ) {
        let ammo = reference_load().with_muzzle_velocity(velocity).with_ballistic_coefficient(bc);
        let result = TrajectorySolver::default()
            .compute(&ammo, &EnvironmentalData::default(), zero, 2.0 * zero, zero, 0.2)
            .unwrap();

        let at_zero = result.point_nearest(zero).unwrap();
        let at_double = result.point_nearest(2.0 * zero).unwrap();
        prop_assert!(at_zero.drop.abs() < at_double.drop.abs());
    }

    #[test]
    fn prop_mpbr_non_decreasing_in_vital_zone(
        velocity in 500.0f64..1100.0,
        zero in 50.0f64..300.0,
        small in 0.0f64..0.5,
        extra in 0.0f64..0.5,
    ) {
        let ammo = reference_load().with_muzzle_velocity(velocity);
        let result = TrajectorySolver::default()
            .compute(&ammo, &EnvironmentalData::default(), zero, 800.0, 25.0, small)
            .unwrap();

        let narrow = max_point_blank_range(&result.trajectory, small);
        let wide = max_point_blank_range(&result.trajectory, small + extra);
        prop_assert_eq!(narrow, result.max_point_blank_range);
        prop_assert!(wide >= narrow);
    }

    #[test]
    fn prop_profile_value_round_trip(
        name in "[A-Za-z][A-Za-z0-9 ]{0,20}[A-Za-z0-9]",
        weight in 20.0f64..300.0,
        velocity in 200.0f64..1300.0,
        bc in 0.05f64..1.0,
        temperature in -30.0f64..45.0,
        zero in 10.0f64..600.0,
        notes in ".{0,40}",
    ) {
        let ammo = reference_load()
            .with_bullet_weight(weight)
            .with_muzzle_velocity(velocity)
            .with_ballistic_coefficient(bc)
            .with_drag_model(DragModel::G7);
        let env = EnvironmentalData { temperature, ..Default::default() };
        let profile = BallisticProfile::new(name, ammo, env)
            .with_zero_distance(zero)
            .with_notes(notes);

        let restored = BallisticProfile::from_value(profile.to_value()).unwrap();
        prop_assert_eq!(restored, profile);
    }
}
