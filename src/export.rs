//! CSV and JSON export of a computed trajectory.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use crate::error::{BallisticsError, Result};
use crate::BallisticsResult;

pub const CSV_COLUMNS: [&str; 6] = [
    "Distance (m)",
    "Drop (cm)",
    "Velocity (m/s)",
    "Energy (J)",
    "Time (s)",
    "Wind Drift (cm)",
];

/// CSV text: context rows, a blank line, the column header and one row per sample.
pub fn to_csv_string(result: &BallisticsResult) -> Result<String> {
    let mut context = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());
    context.write_record(["Ballistics Calculation"])?;
    context.write_record([format!("Ammunition: {}", result.ammunition.name)])?;
    context.write_record([format!("Zero Distance: {} m", result.zero_distance)])?;
    context.write_record([format!(
        "Environment: {}°C, {} hPa",
        result.environment.temperature, result.environment.pressure
    )])?;
    let mut buffer = into_bytes(context)?;
    buffer.push(b'\n');

    let mut writer = csv::Writer::from_writer(buffer);
    writer.write_record(CSV_COLUMNS)?;
    for p in &result.trajectory {
        writer.write_record([
            format!("{:.0}", p.distance),
            format!("{:.1}", p.drop * 100.0),
            format!("{:.1}", p.velocity),
            format!("{:.0}", p.energy),
            format!("{:.3}", p.time),
            format!("{:.1}", p.windage * 100.0),
        ])?;
    }

    let bytes = into_bytes(writer)?;
    String::from_utf8(bytes).map_err(|e| BallisticsError::Validation(e.to_string()))
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| BallisticsError::Csv(csv::Error::from(e.into_error())))
}

/// JSON document with the inputs, muzzle energy, MPBR and every sample.
pub fn to_json_value(result: &BallisticsResult) -> Value {
    let ammo = &result.ammunition;
    let env = &result.environment;
    json!({
        "ammunition": {
            "name": ammo.name,
            "caliber": ammo.caliber,
            "bullet_weight": ammo.bullet_weight,
            "muzzle_velocity": ammo.muzzle_velocity,
            "ballistic_coefficient": ammo.ballistic_coefficient,
            "drag_model": ammo.drag_model.as_str(),
        },
        "environment": {
            "temperature": env.temperature,
            "pressure": env.pressure,
            "humidity": env.humidity,
            "altitude": env.altitude,
            "wind_speed": env.wind_speed,
            "wind_direction": env.wind_direction,
        },
        "zero_distance": result.zero_distance,
        "max_point_blank_range": result.max_point_blank_range,
        "muzzle_energy": result.muzzle_energy(),
        "trajectory": result.trajectory.iter().map(|p| json!({
            "distance": p.distance,
            "drop": p.drop,
            "velocity": p.velocity,
            "energy": p.energy,
            "time": p.time,
            "windage": p.windage,
        })).collect::<Vec<_>>(),
    })
}

pub fn write_csv(result: &BallisticsResult, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = to_csv_string(result)?;
    fs::write(path, text).map_err(|e| BallisticsError::storage(path, e))?;
    tracing::info!(path = %path.display(), rows = result.trajectory.len(), "Exported trajectory CSV");
    Ok(())
}

pub fn write_json(result: &BallisticsResult, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(&to_json_value(result))?;
    fs::write(path, text).map_err(|e| BallisticsError::storage(path, e))?;
    tracing::info!(path = %path.display(), "Exported trajectory JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Ammunition, EnvironmentalData, TrajectorySolver};

    fn result() -> BallisticsResult {
        let ammo = Ammunition::default().with_name("Export Load");
        TrajectorySolver::default()
            .compute(&ammo, &EnvironmentalData::default(), 100.0, 300.0, 100.0, 0.2)
            .unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let text = to_csv_string(&result()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Ballistics Calculation");
        assert_eq!(lines[1], "Ammunition: Export Load");
        assert_eq!(lines[2], "Zero Distance: 100 m");
        assert!(lines[3].starts_with("\"Environment: 15°C, 1013.25 hPa\""));
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], CSV_COLUMNS.join(","));
        assert_eq!(lines.len(), 6 + 4);
        assert!(lines[6].starts_with("0,0.0,800.0,"));
    }

    #[test]
    fn test_csv_reads_back_with_csv_crate() {
        let text = to_csv_string(&result()).unwrap();
        let body: String = text.lines().skip(5).collect::<Vec<_>>().join("\n");
        let mut reader = csv::Reader::from_reader(body.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 6);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[3][0], "300");
    }

    #[test]
    fn test_json_document() {
        let result = result();
        let value = to_json_value(&result);
        assert_eq!(value["ammunition"]["drag_model"], "G1");
        assert_eq!(value["trajectory"].as_array().unwrap().len(), 4);
        assert_eq!(value["muzzle_energy"].as_f64().unwrap(), result.muzzle_energy());
        assert_eq!(value["max_point_blank_range"].as_f64().unwrap(), result.max_point_blank_range);
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let result = result();
        write_csv(&result, dir.path().join("out.csv")).unwrap();
        write_json(&result, dir.path().join("out.json")).unwrap();
        let json: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("out.json")).unwrap()).unwrap();
        assert_eq!(json["zero_distance"], 100.0);
    }
}
