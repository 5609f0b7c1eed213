// Unit conversion round trips through the public API

use approx::assert_relative_eq;
use field_ballistics::units::*;
use field_ballistics::{Ammunition, EnvironmentalData, TrajectorySolver};

#[test]
fn test_imperial_input_to_metric_processing() {
    let velocity_mps = fps_to_mps(2800.0);
    let mass_g = grains_to_grams(180.0);
    let distance_m = UnitSystem::Imperial.distance_to_metric(1000.0);

    assert_relative_eq!(velocity_mps, 853.44, epsilon = 1e-9);
    assert_relative_eq!(mass_g, 11.6638, epsilon = 1e-4);
    assert_relative_eq!(distance_m, 914.4, epsilon = 1e-9);
}

#[test]
fn test_metric_processing_to_imperial_output() {
    let units = UnitSystem::Imperial;
    // Factors are rounded, so the round trip is close but not exact
    assert_relative_eq!(units.velocity_from_metric(fps_to_mps(2800.0)), 2800.0, max_relative = 1e-5);
    assert_relative_eq!(units.distance_from_metric(units.distance_to_metric(1000.0)), 1000.0, max_relative = 1e-5);
    assert_relative_eq!(ft_lbs_to_joules(joules_to_ft_lbs(3000.0)), 3000.0, max_relative = 1e-5);
    assert_relative_eq!(inhg_to_hpa(hpa_to_inhg(1013.25)), 1013.25, max_relative = 1e-4);
    assert_relative_eq!(grams_to_grains(grains_to_grams(168.0)), 168.0, max_relative = 1e-5);
}

#[test]
fn test_metric_in_out_is_unchanged() {
    let units = UnitSystem::Metric;
    assert_eq!(units.velocity_from_metric(850.0), 850.0);
    assert_eq!(units.distance_to_metric(900.0), 900.0);
    assert_eq!(units.distance_label(), "m");
    assert_eq!(units.velocity_label(), "m/s");
}

#[test]
fn test_energy_matches_solver_muzzle_energy() {
    let ammo = Ammunition::default().with_name("Energy check");
    let result = TrajectorySolver::default()
        .compute(&ammo, &EnvironmentalData::default(), 100.0, 100.0, 50.0, 0.2)
        .unwrap();
    let expected = kinetic_energy(ammo.mass_kg(), ammo.muzzle_velocity);
    assert_relative_eq!(result.muzzle_energy(), expected, max_relative = 1e-9);
    assert_relative_eq!(momentum(ammo.mass_kg(), 800.0), ammo.mass_kg() * 800.0);
}

#[test]
fn test_sea_level_standard_correction() {
    let env = EnvironmentalData::default();
    let factor = atmospheric_correction_factor(
        celsius_to_fahrenheit(env.temperature),
        hpa_to_inhg(env.pressure),
        78.0,
    );
    assert_relative_eq!(factor, 1.0, epsilon = 2e-3);
}
