//! Ammunition description and the factory-load catalog.

use serde::{Deserialize, Serialize};

use crate::error::{BallisticsError, Result};
use crate::DragModel;

/// Ammunition data for ballistics calculations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ammunition {
    pub name: String,
    pub caliber: String,
    /// Bullet weight (grains)
    pub bullet_weight: f64,
    /// Muzzle velocity (m/s)
    pub muzzle_velocity: f64,
    pub ballistic_coefficient: f64,
    pub drag_model: DragModel,
    /// Bullet diameter (mm)
    pub bullet_diameter: f64,
    /// Case length (mm)
    pub case_length: f64,
    /// Cartridge overall length (mm)
    pub overall_length: f64,
}

impl Default for Ammunition {
    fn default() -> Self {
        Self {
            name: String::new(),
            caliber: String::new(),
            bullet_weight: 150.0,
            muzzle_velocity: 800.0,
            ballistic_coefficient: 0.4,
            drag_model: DragModel::G1,
            bullet_diameter: 7.62,
            case_length: 51.0,
            overall_length: 78.0,
        }
    }
}

impl Ammunition {
    /// Create a load; an empty name becomes `"<caliber> <weight>gr"`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        caliber: impl Into<String>,
        bullet_weight: f64,
        muzzle_velocity: f64,
        ballistic_coefficient: f64,
        drag_model: DragModel,
        bullet_diameter: f64,
        case_length: f64,
    ) -> Self {
        Self {
            name: name.into(),
            caliber: caliber.into(),
            bullet_weight,
            muzzle_velocity,
            ballistic_coefficient,
            drag_model,
            bullet_diameter,
            case_length,
            ..Default::default()
        }
        .with_derived_name()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.with_derived_name()
    }

    pub fn with_caliber(mut self, caliber: impl Into<String>) -> Self {
        self.caliber = caliber.into();
        self
    }

    pub fn with_bullet_weight(mut self, grains: f64) -> Self {
        self.bullet_weight = grains;
        self
    }

    pub fn with_muzzle_velocity(mut self, mps: f64) -> Self {
        self.muzzle_velocity = mps;
        self
    }

    pub fn with_ballistic_coefficient(mut self, bc: f64) -> Self {
        self.ballistic_coefficient = bc;
        self
    }

    pub fn with_drag_model(mut self, drag_model: DragModel) -> Self {
        self.drag_model = drag_model;
        self
    }

    pub fn with_bullet_diameter(mut self, mm: f64) -> Self {
        self.bullet_diameter = mm;
        self
    }

    pub fn with_case_length(mut self, mm: f64) -> Self {
        self.case_length = mm;
        self
    }

    pub fn with_overall_length(mut self, mm: f64) -> Self {
        self.overall_length = mm;
        self
    }

    /// Fill in the display name when it is blank.
    pub fn with_derived_name(mut self) -> Self {
        if self.name.trim().is_empty() {
            self.name = format!("{} {}gr", self.caliber, self.bullet_weight);
        }
        self
    }

    /// Reject non-positive or non-finite physical quantities.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("bullet_weight", self.bullet_weight),
            ("muzzle_velocity", self.muzzle_velocity),
            ("bullet_diameter", self.bullet_diameter),
        ];
        for (field, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(BallisticsError::configuration(format!(
                    "ammunition '{}': {field} must be positive, got {value}",
                    self.name
                )));
            }
        }
        if !self.ballistic_coefficient.is_finite() || self.ballistic_coefficient < 0.0 {
            return Err(BallisticsError::configuration(format!(
                "ammunition '{}': ballistic_coefficient must be non-negative, got {}",
                self.name, self.ballistic_coefficient
            )));
        }
        Ok(())
    }

    /// Bullet mass (kg)
    pub fn mass_kg(&self) -> f64 {
        self.bullet_weight * crate::constants::GRAINS_TO_KG
    }

    /// Frontal area (m²)
    pub fn cross_section_m2(&self) -> f64 {
        let radius = self.bullet_diameter * crate::constants::MM_TO_M / 2.0;
        std::f64::consts::PI * radius * radius
    }
}

/// Queryable in-memory list of factory loads.
#[derive(Debug, Clone)]
pub struct AmmunitionCatalog {
    entries: Vec<Ammunition>,
}

impl Default for AmmunitionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl AmmunitionCatalog {
    /// Catalog pre-populated with common factory loads.
    pub fn new() -> Self {
        use DragModel::{G1, G7};

        let presets = [
            ("Federal Gold Medal Match", ".308 Win", 175.0, 792.0, 0.496, G7, 7.82, 51.18),
            ("Winchester Super-X", ".308 Win", 150.0, 823.0, 0.411, G1, 7.82, 51.18),
            ("Hornady Precision Hunter", ".308 Win", 178.0, 777.0, 0.530, G7, 7.82, 51.18),
            ("Federal Power-Shok", ".30-06", 150.0, 853.0, 0.435, G1, 7.82, 63.35),
            ("Remington Core-Lokt", ".30-06", 180.0, 792.0, 0.481, G1, 7.82, 63.35),
            ("Federal American Eagle", ".223 Rem", 55.0, 990.0, 0.243, G1, 5.70, 44.70),
            ("Hornady V-MAX", ".223 Rem", 55.0, 1006.0, 0.255, G1, 5.70, 44.70),
            ("Black Hills Match", ".223 Rem", 77.0, 838.0, 0.372, G1, 5.70, 44.70),
            ("Winchester Power-Point", ".270 Win", 130.0, 960.0, 0.408, G1, 6.98, 64.51),
            ("Federal Premium", ".270 Win", 150.0, 914.0, 0.465, G1, 6.98, 64.51),
            ("Federal Premium", ".300 Win Mag", 180.0, 945.0, 0.507, G1, 7.82, 67.00),
            ("Nosler AccuBond", ".300 Win Mag", 200.0, 914.0, 0.588, G1, 7.82, 67.00),
            ("Hornady Precision Hunter", "6.5 Creedmoor", 143.0, 823.0, 0.623, G7, 6.71, 48.77),
            ("Federal Gold Medal Match", "6.5 Creedmoor", 140.0, 838.0, 0.596, G7, 6.71, 48.77),
        ];

        let entries = presets
            .into_iter()
            .map(|(name, caliber, weight, velocity, bc, model, diameter, case)| {
                Ammunition::new(name, caliber, weight, velocity, bc, model, diameter, case)
            })
            .collect();

        Self { entries }
    }

    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn all(&self) -> &[Ammunition] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads whose caliber matches exactly.
    pub fn by_caliber(&self, caliber: &str) -> Vec<&Ammunition> {
        self.entries.iter().filter(|a| a.caliber == caliber).collect()
    }

    /// Distinct calibers, sorted.
    pub fn all_calibers(&self) -> Vec<String> {
        let mut calibers: Vec<String> = self.entries.iter().map(|a| a.caliber.clone()).collect();
        calibers.sort();
        calibers.dedup();
        calibers
    }

    /// Case-insensitive substring search over name and caliber.
    pub fn search(&self, query: &str) -> Vec<&Ammunition> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|a| {
                a.name.to_lowercase().contains(&needle) || a.caliber.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Append a load. Duplicates are kept.
    pub fn add_custom(&mut self, ammo: Ammunition) {
        self.entries.push(ammo.with_derived_name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_derived_name() {
        let ammo = Ammunition::new("", ".308 Win", 168.0, 820.0, 0.475, DragModel::G1, 7.82, 51.18);
        assert_eq!(ammo.name, ".308 Win 168gr");

        let named = Ammunition::default().with_caliber("6.5 Creedmoor").with_name("  ");
        assert_eq!(named.name, "6.5 Creedmoor 150gr");
    }

    #[test]
    fn test_defaults() {
        let ammo = Ammunition::default();
        assert_eq!(ammo.overall_length, 78.0);
        assert_eq!(ammo.drag_model, DragModel::G1);
        assert!(ammo.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        let zero_weight = Ammunition::default().with_bullet_weight(0.0);
        assert!(matches!(zero_weight.validate(), Err(BallisticsError::Configuration(_))));

        let negative_velocity = Ammunition::default().with_muzzle_velocity(-800.0);
        assert!(negative_velocity.validate().is_err());

        let nan_diameter = Ammunition::default().with_bullet_diameter(f64::NAN);
        assert!(nan_diameter.validate().is_err());
    }

    #[test]
    fn test_mass_and_cross_section() {
        let ammo = Ammunition::default();
        assert_relative_eq!(ammo.mass_kg(), 150.0 * 0.00006479891, epsilon = 1e-15);
        let r = 0.00762 / 2.0;
        assert_relative_eq!(ammo.cross_section_m2(), std::f64::consts::PI * r * r, epsilon = 1e-15);
    }

    #[test]
    fn test_catalog_presets() {
        let catalog = AmmunitionCatalog::new();
        assert_eq!(catalog.len(), 14);
        assert_eq!(catalog.by_caliber(".308 Win").len(), 3);
        assert_eq!(catalog.by_caliber(".308").len(), 0);
        assert_eq!(
            catalog.all_calibers(),
            vec![".223 Rem", ".270 Win", ".30-06", ".300 Win Mag", ".308 Win", "6.5 Creedmoor"]
        );
    }

    #[test]
    fn test_catalog_search() {
        let catalog = AmmunitionCatalog::new();
        let hits = catalog.search("creedmoor");
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|a| a.drag_model == DragModel::G7));

        let federal = catalog.search("FEDERAL");
        assert_eq!(federal.len(), 6);
        assert!(catalog.search("nothing like this").is_empty());
    }

    #[test]
    fn test_add_custom_keeps_duplicates() {
        let mut catalog = AmmunitionCatalog::empty();
        let ammo = Ammunition::default().with_caliber(".300 BLK");
        catalog.add_custom(ammo.clone());
        catalog.add_custom(ammo);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.all_calibers(), vec![".300 BLK"]);
        assert_eq!(catalog.all()[0].name, ".300 BLK 150gr");
    }

    #[test]
    fn test_ammunition_from_partial_json() {
        let ammo: Ammunition = serde_json::from_str(
            r#"{"name": "308 Win 168gr", "caliber": ".308", "bullet_weight": 168,
                "muzzle_velocity": 820, "drag_model": "G1"}"#,
        )
        .unwrap();
        assert_eq!(ammo.bullet_weight, 168.0);
        assert_eq!(ammo.overall_length, 78.0);
    }
}
