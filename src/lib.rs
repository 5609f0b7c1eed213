//! # Field Ballistics
//!
//! Exterior-ballistics engine for field use: drag-table trajectories under
//! environmental corrections, scope come-ups, maximum point-blank range, a
//! versioned ballistic profile store, and an advisor that reconciles
//! predictions against live sensor telemetry.

// Re-export the main types and functions
pub use advisor::{AdaptiveBallisticAdvisor, Severity, Suggestion, SuggestionFocus};
pub use ammunition::{Ammunition, AmmunitionCatalog};
pub use atmosphere::EnvironmentalData;
pub use come_ups::{come_ups, parse_distance_list, ComeUp};
pub use config::{AdvisorThresholds, EngineConfig, SolverDefaults, StoreOptions};
pub use drag::DragTableInterpolator;
pub use drag_model::DragModel;
pub use error::{BallisticsError, Result};
pub use migrations::MigrationOutcome;
pub use mpbr::max_point_blank_range;
pub use profile::BallisticProfile;
pub use profile_store::{BallisticProfileStore, ImportReport};
pub use sensors::{parse_metric_value, MetricRejection, MetricValue, SensorDiagnosticSnapshot, SensorMetric};
pub use telemetry::Telemetry;
pub use trajectory_solver::{BallisticsResult, TrajectoryPoint, TrajectorySolver};

// Module declarations
pub mod advisor;
pub mod ammunition;
pub mod angle_calculations;
pub mod atmosphere;
pub mod come_ups;
pub mod config;
pub mod constants;
pub mod drag;
pub mod drag_model;
pub mod error;
pub mod export;
pub mod migrations;
pub mod mpbr;
pub mod profile;
pub mod profile_store;
pub mod sensors;
pub mod telemetry;
pub mod trajectory_solver;
pub mod units;
