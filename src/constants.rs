//! Physical constants used in ballistics calculations

/// Gravitational acceleration in m/s²
pub const G_ACCEL_MPS2: f64 = 9.80665;

/// Conversion factor: grains to kilograms
pub const GRAINS_TO_KG: f64 = 0.00006479891;

/// Conversion factor: millimetres to metres
pub const MM_TO_M: f64 = 0.001;

/// Air density at sea level (kg/m³)
pub const AIR_DENSITY_SEA_LEVEL: f64 = 1.225;

/// Standard sea-level pressure (hPa)
pub const STANDARD_PRESSURE_HPA: f64 = 1013.25;

/// Standard sea-level temperature (K), 15°C
pub const STANDARD_TEMPERATURE_K: f64 = 288.15;

/// Offset between Celsius and Kelvin
pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Speed of sound at 0°C (m/s)
///
/// Temperature dependence: c = 331.3 * sqrt(1 + T_celsius / 273.15)
pub const SPEED_OF_SOUND_0C: f64 = 331.3;

/// Atmospheric scale height used for the altitude density factor (m)
pub const DENSITY_SCALE_HEIGHT_M: f64 = 8400.0;

/// Humidity coefficient for the simplified density correction
///
/// Humid air is lighter than dry air; the factor is 1 - 0.0065 * RH/100.
pub const HUMIDITY_DENSITY_COEFF: f64 = 0.0065;

/// Drag coefficient returned for the Custom drag model
pub const CUSTOM_DRAG_COEFFICIENT: f64 = 0.5;

// Velocity decay model

/// Fraction of muzzle velocity lost per 1000 m at standard density
pub const VELOCITY_LOSS_PER_KM: f64 = 0.3;

/// Retained velocity never drops below this fraction of muzzle velocity
pub const MIN_VELOCITY_FRACTION: f64 = 0.3;

/// Scale applied to crosswind * time-of-flight for lateral drift
pub const WIND_DRIFT_FACTOR: f64 = 0.5;

// Scope adjustments

/// Minutes of angle per radian-equivalent unit (value / distance * 3437.75)
pub const MOA_PER_RADIAN: f64 = 3437.75;

/// Scope click value in MOA (quarter-MOA turrets)
pub const MOA_PER_CLICK: f64 = 0.25;

// Solver defaults

/// Default distance between trajectory samples (m)
pub const DEFAULT_STEP_SIZE_M: f64 = 25.0;

/// Default maximum computed range (m)
pub const DEFAULT_MAX_RANGE_M: f64 = 1000.0;

/// Default zero distance (m)
pub const DEFAULT_ZERO_DISTANCE_M: f64 = 100.0;

/// Default vital zone diameter (m)
pub const DEFAULT_VITAL_ZONE_M: f64 = 0.2;

// Profile storage

/// Current on-disk schema version of the ballistic profile store
pub const BALLISTIC_PROFILE_SCHEMA_VERSION: u32 = 2;

/// Number of rotating store backups kept by default
pub const DEFAULT_BACKUP_RETENTION: usize = 5;
