use clap::{Args, Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use field_ballistics::advisor::Severity;
use field_ballistics::export;
use field_ballistics::units::UnitSystem;
use field_ballistics::{
    come_ups, parse_distance_list, AdaptiveBallisticAdvisor, Ammunition, AmmunitionCatalog,
    BallisticProfile, BallisticProfileStore, BallisticsResult, ComeUp, DragModel, EngineConfig,
    EnvironmentalData, SensorDiagnosticSnapshot, Suggestion, Telemetry, TrajectorySolver,
};

#[derive(Parser)]
#[command(name = "ballistics-cli")]
#[command(version)]
#[command(about = "Field ballistics calculator: trajectories, come-ups, profiles and sensor advice", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a trajectory
    Trajectory {
        #[command(flatten)]
        load: LoadArgs,

        #[command(flatten)]
        env: EnvArgs,

        #[command(flatten)]
        range: RangeArgs,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,

        /// Display units for table output
        #[arg(long, default_value = "metric")]
        units: Units,

        /// Also write the result to this file (.csv or .json)
        #[arg(long = "export")]
        export_path: Option<PathBuf>,
    },

    /// Scope come-ups for a list of distances
    ComeUps {
        #[command(flatten)]
        load: LoadArgs,

        #[command(flatten)]
        env: EnvArgs,

        #[command(flatten)]
        range: RangeArgs,

        /// Distances in metres, comma or space separated
        #[arg(short = 'd', long, default_value = "100,200,300,400,500")]
        distances: String,

        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Browse factory loads
    Catalog {
        /// Only loads of this caliber (exact match)
        #[arg(long)]
        caliber: Option<String>,

        /// Case-insensitive search over name and caliber
        #[arg(short = 's', long)]
        search: Option<String>,

        /// List distinct calibers instead of loads
        #[arg(long)]
        calibers: bool,

        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Manage a ballistic profile store
    Profile {
        /// Store file
        #[arg(long, default_value = "ballistic_profiles.json")]
        store: PathBuf,

        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Compare a trajectory against sensor snapshots and print corrections
    Advise {
        #[command(flatten)]
        load: LoadArgs,

        #[command(flatten)]
        env: EnvArgs,

        #[command(flatten)]
        range: RangeArgs,

        /// Sensor diagnostic snapshot files (JSON object or array)
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,

        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// List stored profiles
    List,
    /// Print one profile as JSON
    Show { name: String },
    /// Save (or replace) a profile
    Save {
        name: String,

        #[command(flatten)]
        load: LoadArgs,

        #[command(flatten)]
        env: EnvArgs,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Delete a profile
    Delete { name: String },
    /// Export profiles to a file
    Export {
        path: PathBuf,
        /// Profiles to export (all when omitted)
        #[arg(long = "name")]
        names: Vec<String>,
    },
    /// Import profiles from a file
    Import {
        path: PathBuf,
        /// Replace profiles that already exist
        #[arg(long)]
        overwrite: bool,
    },
    /// Write a backup copy of the store
    Backup,
}

/// Ammunition selection, from a catalog preset, a stored profile or explicit values.
#[derive(Args, Clone)]
struct LoadArgs {
    /// Catalog load name (see `catalog`)
    #[arg(long)]
    preset: Option<String>,

    /// Start from a stored profile (requires --profile-store)
    #[arg(long, conflicts_with = "preset")]
    profile: Option<String>,

    /// Store used with --profile
    #[arg(long = "profile-store", requires = "profile")]
    profile_store: Option<PathBuf>,

    /// Display name for the load
    #[arg(long = "load-name")]
    load_name: Option<String>,

    #[arg(long)]
    caliber: Option<String>,

    /// Bullet weight (grains)
    #[arg(short = 'w', long)]
    weight: Option<f64>,

    /// Muzzle velocity (m/s)
    #[arg(long)]
    velocity: Option<f64>,

    /// Ballistic coefficient
    #[arg(short = 'b', long)]
    bc: Option<f64>,

    /// Drag model (G1, G7, Custom)
    #[arg(long)]
    drag_model: Option<DragModel>,

    /// Bullet diameter (mm)
    #[arg(long)]
    diameter: Option<f64>,
}

#[derive(Args, Clone)]
struct EnvArgs {
    /// Temperature (°C)
    #[arg(long)]
    temperature: Option<f64>,

    /// Pressure (hPa)
    #[arg(long)]
    pressure: Option<f64>,

    /// Relative humidity (%)
    #[arg(long)]
    humidity: Option<f64>,

    /// Altitude (m)
    #[arg(long)]
    altitude: Option<f64>,

    /// Wind speed (m/s)
    #[arg(long)]
    wind_speed: Option<f64>,

    /// Wind direction (degrees, 90 = full value from the right)
    #[arg(long)]
    wind_direction: Option<f64>,
}

#[derive(Args, Clone)]
struct RangeArgs {
    /// Zero distance (m)
    #[arg(short = 'z', long)]
    zero: Option<f64>,

    /// Maximum range (m)
    #[arg(long)]
    max_range: Option<f64>,

    /// Sample spacing (m)
    #[arg(long)]
    step: Option<f64>,

    /// Vital zone diameter (m)
    #[arg(long)]
    vital_zone: Option<f64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Table,
    Full,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Units {
    Metric,
    Imperial,
}

impl From<Units> for UnitSystem {
    fn from(units: Units) -> Self {
        match units {
            Units::Metric => UnitSystem::Metric,
            Units::Imperial => UnitSystem::Imperial,
        }
    }
}

/// Everything needed for one solver run.
struct Setup {
    ammunition: Ammunition,
    environment: EnvironmentalData,
    zero_distance: f64,
    max_range: f64,
    step_size: f64,
    vital_zone_diameter: f64,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?.into_validated()?,
        None => EngineConfig::default(),
    };
    let telemetry = Telemetry::new();

    match cli.command {
        Commands::Trajectory { load, env, range, output, units, export_path } => {
            let setup = resolve_setup(&load, &env, &range, &config, &telemetry)?;
            let result = solve(&setup, &telemetry)?;

            if let Some(path) = export_path {
                export_result(&result, &path)?;
            }
            display_trajectory(&result, output, units.into())?;
        }

        Commands::ComeUps { load, env, range, distances, output } => {
            let distances = parse_distance_list(&distances)?;
            let mut setup = resolve_setup(&load, &env, &range, &config, &telemetry)?;
            // The trajectory must reach the farthest requested distance
            if range.max_range.is_none() {
                let farthest = distances.iter().copied().fold(0.0_f64, f64::max);
                setup.max_range = setup.max_range.max(farthest);
            }
            let result = solve(&setup, &telemetry)?;
            display_come_ups(&result, &come_ups(&result, &distances), output)?;
        }

        Commands::Catalog { caliber, search, calibers, output } => {
            let catalog = AmmunitionCatalog::new();
            if calibers {
                display_calibers(&catalog.all_calibers(), output)?;
            } else {
                let mut loads: Vec<&Ammunition> = match &search {
                    Some(query) => catalog.search(query),
                    None => catalog.all().iter().collect(),
                };
                if let Some(caliber) = &caliber {
                    loads.retain(|a| &a.caliber == caliber);
                }
                display_catalog(&loads, output)?;
            }
        }

        Commands::Profile { store, action } => {
            let mut store = BallisticProfileStore::open(store, config.store.clone(), telemetry.clone())?;
            run_profile_action(&mut store, action, &config, &telemetry)?;
        }

        Commands::Advise { load, env, range, snapshots, output } => {
            let setup = resolve_setup(&load, &env, &range, &config, &telemetry)?;
            let result = solve(&setup, &telemetry)?;

            let mut advisor = AdaptiveBallisticAdvisor::new(telemetry.clone(), config.advisor);
            advisor.update_baseline_environment(setup.environment);
            for path in &snapshots {
                for snapshot in read_snapshots(path)? {
                    advisor.ingest_sensor_snapshot(&snapshot);
                }
            }
            display_suggestions(&advisor.generate_suggestions(&result), output)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_setup(
    load: &LoadArgs,
    env: &EnvArgs,
    range: &RangeArgs,
    config: &EngineConfig,
    telemetry: &Telemetry,
) -> Result<Setup, Box<dyn Error>> {
    let defaults = config.solver;
    let mut setup = match (&load.profile, &load.profile_store) {
        (Some(name), Some(path)) => {
            let store = BallisticProfileStore::open(path, config.store.clone(), telemetry.clone())?;
            let profile = store
                .get(name)
                .ok_or_else(|| format!("profile '{name}' not found in {}", path.display()))?;
            Setup {
                ammunition: profile.ammunition,
                environment: profile.environment,
                zero_distance: profile.zero_distance,
                max_range: profile.max_range,
                step_size: defaults.step_size,
                vital_zone_diameter: profile.vital_zone_diameter,
            }
        }
        (Some(_), None) => return Err("--profile requires --profile-store".into()),
        _ => Setup {
            ammunition: select_ammunition(load)?,
            environment: EnvironmentalData::default(),
            zero_distance: defaults.zero_distance,
            max_range: defaults.max_range,
            step_size: defaults.step_size,
            vital_zone_diameter: defaults.vital_zone_diameter,
        },
    };

    setup.ammunition = apply_load_overrides(setup.ammunition, load);
    apply_env_overrides(&mut setup.environment, env);
    if let Some(zero) = range.zero {
        setup.zero_distance = zero;
    }
    if let Some(max_range) = range.max_range {
        setup.max_range = max_range;
    }
    if let Some(step) = range.step {
        setup.step_size = step;
    }
    if let Some(vital) = range.vital_zone {
        setup.vital_zone_diameter = vital;
    }
    Ok(setup)
}

fn select_ammunition(load: &LoadArgs) -> Result<Ammunition, Box<dyn Error>> {
    let Some(preset) = &load.preset else {
        return Ok(Ammunition::default());
    };
    let catalog = AmmunitionCatalog::new();
    catalog
        .all()
        .iter()
        .filter(|a| a.name.eq_ignore_ascii_case(preset))
        .find(|a| load.caliber.as_ref().map_or(true, |c| &a.caliber == c))
        .cloned()
        .ok_or_else(|| format!("no catalog load named '{preset}'").into())
}

fn apply_load_overrides(mut ammo: Ammunition, load: &LoadArgs) -> Ammunition {
    if let Some(caliber) = &load.caliber {
        ammo = ammo.with_caliber(caliber.clone());
    }
    if let Some(weight) = load.weight {
        ammo = ammo.with_bullet_weight(weight);
    }
    if let Some(velocity) = load.velocity {
        ammo = ammo.with_muzzle_velocity(velocity);
    }
    if let Some(bc) = load.bc {
        ammo = ammo.with_ballistic_coefficient(bc);
    }
    if let Some(model) = load.drag_model {
        ammo = ammo.with_drag_model(model);
    }
    if let Some(diameter) = load.diameter {
        ammo = ammo.with_bullet_diameter(diameter);
    }
    match &load.load_name {
        Some(name) => ammo.with_name(name.clone()),
        None => ammo.with_derived_name(),
    }
}

fn apply_env_overrides(environment: &mut EnvironmentalData, env: &EnvArgs) {
    let fields = [
        (&mut environment.temperature, env.temperature),
        (&mut environment.pressure, env.pressure),
        (&mut environment.humidity, env.humidity),
        (&mut environment.altitude, env.altitude),
        (&mut environment.wind_speed, env.wind_speed),
        (&mut environment.wind_direction, env.wind_direction),
    ];
    for (slot, value) in fields {
        if let Some(value) = value {
            *slot = value;
        }
    }
}

fn solve(setup: &Setup, telemetry: &Telemetry) -> Result<BallisticsResult, Box<dyn Error>> {
    let solver = TrajectorySolver::new(telemetry.clone());
    Ok(solver.compute(
        &setup.ammunition,
        &setup.environment,
        setup.zero_distance,
        setup.max_range,
        setup.step_size,
        setup.vital_zone_diameter,
    )?)
}

fn export_result(result: &BallisticsResult, path: &Path) -> Result<(), Box<dyn Error>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        export::write_csv(result, path)?;
    } else {
        export::write_json(result, path)?;
    }
    eprintln!("Exported to {}", path.display());
    Ok(())
}

fn read_snapshots(path: &Path) -> Result<Vec<SensorDiagnosticSnapshot>, Box<dyn Error>> {
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let snapshots = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(snapshots)
}

fn run_profile_action(
    store: &mut BallisticProfileStore,
    action: ProfileAction,
    config: &EngineConfig,
    telemetry: &Telemetry,
) -> Result<(), Box<dyn Error>> {
    match action {
        ProfileAction::List => {
            let profiles = store.load_all();
            if profiles.is_empty() {
                println!("No profiles in {}", store.path().display());
                return Ok(());
            }
            println!("┌──────────────────────────┬──────────────────────────────┬──────────┬──────────┐");
            println!("│ Profile                  │ Ammunition                   │ Zero (m) │ Max (m)  │");
            println!("├──────────────────────────┼──────────────────────────────┼──────────┼──────────┤");
            for profile in profiles.values() {
                println!(
                    "│ {:<24} │ {:<28} │ {:>8.0} │ {:>8.0} │",
                    truncate(&profile.name, 24),
                    truncate(&profile.ammunition.name, 28),
                    profile.zero_distance,
                    profile.max_range
                );
            }
            println!("└──────────────────────────┴──────────────────────────────┴──────────┴──────────┘");
        }
        ProfileAction::Show { name } => {
            let profile = store.get(&name).ok_or_else(|| format!("profile '{name}' not found"))?;
            println!("{}", serde_json::to_string_pretty(&profile.to_value())?);
        }
        ProfileAction::Save { name, load, env, range, notes } => {
            let setup = resolve_setup(&load, &env, &range, config, telemetry)?;
            let created_at = store.get(&name).map(|existing| existing.created_at);
            let mut profile = BallisticProfile::new(name, setup.ammunition, setup.environment)
                .with_zero_distance(setup.zero_distance)
                .with_max_range(setup.max_range)
                .with_vital_zone_diameter(setup.vital_zone_diameter)
                .with_notes(notes);
            if let Some(created_at) = created_at {
                profile.created_at = created_at;
                profile.touch();
            }
            let name = profile.name.clone();
            store.save(profile)?;
            println!("Saved profile '{}'", name.trim());
        }
        ProfileAction::Delete { name } => {
            if store.delete(&name)? {
                println!("Deleted profile '{name}'");
            } else {
                return Err(format!("profile '{name}' not found").into());
            }
        }
        ProfileAction::Export { path, names } => {
            let selection = (!names.is_empty()).then_some(names.as_slice());
            let exported = store.export(&path, selection)?;
            println!("Exported {} profile(s) to {}", exported.len(), path.display());
        }
        ProfileAction::Import { path, overwrite } => {
            let report = store.import(&path, overwrite)?;
            println!(
                "Imported {}, overwrote {}, skipped {}",
                report.imported.len(),
                report.overwritten.len(),
                report.skipped.len()
            );
            for name in &report.skipped {
                println!("  skipped '{name}' (already exists; use --overwrite)");
            }
        }
        ProfileAction::Backup => match store.create_backup()? {
            Some(path) => println!("Backup written to {}", path.display()),
            None => println!("Nothing to back up"),
        },
    }
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

fn display_trajectory(result: &BallisticsResult, format: OutputFormat, units: UnitSystem) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&export::to_json_value(result))?);
        }

        OutputFormat::Csv => {
            print!("{}", export::to_csv_string(result)?);
        }

        OutputFormat::Table => {
            let d = units.distance_label();
            let v = units.velocity_label();
            let e = units.energy_label();
            println!("╔════════════════════════════════════════╗");
            println!("║         TRAJECTORY RESULTS             ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ {:<38} ║", truncate(&result.ammunition.name, 38));
            println!("║ Zero Distance:     {:>10.1} {:<7} ║", units.distance_from_metric(result.zero_distance), d);
            println!("║ Muzzle Velocity:   {:>10.1} {:<7} ║", units.velocity_from_metric(result.ammunition.muzzle_velocity), v);
            println!("║ Muzzle Energy:     {:>10.0} {:<7} ║", units.energy_from_metric(result.muzzle_energy()), e);
            println!("║ Point Blank Range: {:>10.1} {:<7} ║", units.distance_from_metric(result.max_point_blank_range), d);
            println!("╚════════════════════════════════════════╝");

            println!();
            println!("┌──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐");
            println!(
                "│ {:>8} │ {:>8} │ {:>8} │ {:>8} │ {:>8} │ {:>8} │",
                format!("Dist({d})"),
                "Drop(cm)",
                format!("Vel({v})"),
                "Energy",
                "Time(s)",
                "Wind(cm)"
            );
            println!("├──────────┼──────────┼──────────┼──────────┼──────────┼──────────┤");
            for p in &result.trajectory {
                println!(
                    "│ {:>8.0} │ {:>8.1} │ {:>8.1} │ {:>8.0} │ {:>8.3} │ {:>8.1} │",
                    units.distance_from_metric(p.distance),
                    p.drop * 100.0,
                    units.velocity_from_metric(p.velocity),
                    units.energy_from_metric(p.energy),
                    p.time,
                    p.windage * 100.0
                );
            }
            println!("└──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘");
        }

        OutputFormat::Full => {
            println!("{}", result.summary());
        }
    }
    Ok(())
}

fn display_come_ups(result: &BallisticsResult, table: &[ComeUp], format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(table)?),

        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for row in table {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }

        OutputFormat::Table | OutputFormat::Full => {
            println!("╔════════════════════════════════════════╗");
            println!("║              COME-UPS                  ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ {:<38} ║", truncate(&result.ammunition.name, 38));
            println!("║ Zeroed at {:>6.0} m, 1/4 MOA clicks      ║", result.zero_distance);
            println!("╚════════════════════════════════════════╝");
            println!();
            println!("┌──────────┬──────────┬────────┬──────────┬────────┬──────────┐");
            println!("│ Dist (m) │ Elev MOA │ Clicks │ Wind MOA │ Clicks │ Vel(m/s) │");
            println!("├──────────┼──────────┼────────┼──────────┼────────┼──────────┤");
            for row in table {
                println!(
                    "│ {:>8.0} │ {:>8.2} │ {:>6} │ {:>8.2} │ {:>6} │ {:>8.1} │",
                    row.distance,
                    row.elevation_moa,
                    row.elevation_clicks,
                    row.windage_moa,
                    row.windage_clicks,
                    row.velocity
                );
            }
            println!("└──────────┴──────────┴────────┴──────────┴────────┴──────────┘");
        }
    }
    Ok(())
}

fn display_calibers(calibers: &[String], format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(calibers)?),
        _ => {
            for caliber in calibers {
                println!("{caliber}");
            }
        }
    }
    Ok(())
}

fn display_catalog(loads: &[&Ammunition], format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(loads)?),

        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for load in loads {
                writer.serialize(load)?;
            }
            writer.flush()?;
        }

        OutputFormat::Table | OutputFormat::Full => {
            println!("┌──────────────────────────┬───────────────┬────────┬──────────┬───────┬──────┐");
            println!("│ Load                     │ Caliber       │ Weight │ Vel(m/s) │  BC   │ Drag │");
            println!("├──────────────────────────┼───────────────┼────────┼──────────┼───────┼──────┤");
            for load in loads {
                println!(
                    "│ {:<24} │ {:<13} │ {:>4.0}gr │ {:>8.0} │ {:>5.3} │ {:<4} │",
                    truncate(&load.name, 24),
                    truncate(&load.caliber, 13),
                    load.bullet_weight,
                    load.muzzle_velocity,
                    load.ballistic_coefficient,
                    load.drag_model
                );
            }
            println!("└──────────────────────────┴───────────────┴────────┴──────────┴───────┴──────┘");
            println!("{} load(s)", loads.len());
        }
    }
    Ok(())
}

fn display_suggestions(suggestions: &[Suggestion], format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(suggestions)?),

        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["focus", "severity", "recommendation", "justification"])?;
            for s in suggestions {
                writer.write_record([
                    s.focus.as_str(),
                    s.severity.to_string().as_str(),
                    s.recommendation.as_str(),
                    s.justification.as_str(),
                ])?;
            }
            writer.flush()?;
        }

        OutputFormat::Table | OutputFormat::Full => {
            if suggestions.is_empty() {
                println!("No corrections suggested.");
                return Ok(());
            }
            for s in suggestions {
                let marker = match s.severity {
                    Severity::Warning => "!",
                    Severity::Info => "i",
                };
                println!("[{marker}] {}: {}", s.focus.as_str(), s.recommendation);
                println!("    {}", s.justification);
            }
        }
    }
    Ok(())
}
