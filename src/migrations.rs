//! Schema migration and on-disk safety helpers for the profile store.
//!
//! Store documents have gone through three shapes:
//! a bare list of profiles (version 0), an object with an `entries` list,
//! and the current object with `version` and a `profiles` list.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::error::{BallisticsError, Result};
use crate::{BallisticProfile, Telemetry};

/// What opening a store did to the file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// Absent, or already current and normalized.
    Unchanged,
    /// Unparseable; moved aside to the given path.
    Quarantined { path: PathBuf },
    /// Rewritten in the current shape after a backup.
    Rewritten {
        previous_version: u32,
        new_version: u32,
        backup_path: Option<PathBuf>,
    },
}

impl MigrationOutcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, MigrationOutcome::Unchanged)
    }
}

/// A store document split into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDocument {
    pub version: u32,
    pub profiles: Vec<Value>,
    /// Top-level keys other than `version`, `profiles` and `entries`.
    pub metadata: Map<String, Value>,
    /// True when the profiles were found under `profiles` in an object.
    pub current_shape: bool,
}

impl StoreDocument {
    /// Recognise one of the known document shapes.
    pub fn parse(raw: Value, source: &Path) -> Result<Self> {
        match raw {
            Value::Array(profiles) => Ok(Self {
                version: 0,
                profiles,
                metadata: Map::new(),
                current_shape: false,
            }),
            Value::Object(mut object) => {
                let version = match object.remove("version") {
                    None | Some(Value::Null) => 0,
                    Some(Value::Number(n)) => n
                        .as_u64()
                        .and_then(|v| u32::try_from(v).ok())
                        .ok_or_else(|| {
                            BallisticsError::Migration(format!(
                                "profile store '{}' has an invalid version {n}",
                                source.display()
                            ))
                        })?,
                    Some(other) => {
                        return Err(BallisticsError::Migration(format!(
                            "profile store '{}' has an invalid version {other}",
                            source.display()
                        )))
                    }
                };

                let (profiles, current_shape) = match (object.remove("profiles"), object.remove("entries")) {
                    (Some(Value::Array(list)), _) => (list, true),
                    (_, Some(Value::Array(list))) => (list, false),
                    _ => {
                        return Err(BallisticsError::Migration(format!(
                            "profile store '{}' is missing a profiles list",
                            source.display()
                        )))
                    }
                };

                Ok(Self {
                    version,
                    profiles,
                    metadata: object,
                    current_shape,
                })
            }
            _ => Err(BallisticsError::Migration(format!(
                "profile store '{}' has an unsupported structure",
                source.display()
            ))),
        }
    }
}

/// UTC timestamp safe for file names, with microseconds.
pub(crate) fn file_timestamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%S%.6fZ").to_string()
}

/// File stem and extension (with its dot) of `path`.
pub(crate) fn stem_and_ext(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}

/// Write JSON to `target` via a uniquely named temporary sibling and a rename.
///
/// The temporary file is removed if anything fails before the rename.
pub fn write_json_atomic(target: &Path, payload: &Value) -> Result<()> {
    let parent = match target.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(|e| BallisticsError::storage(parent, e))?;
            parent.to_path_buf()
        }
        None => PathBuf::from("."),
    };

    let text = serde_json::to_string_pretty(payload)?;
    let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| BallisticsError::storage(&parent, e))?;
    tmp.write_all(text.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| BallisticsError::storage(tmp.path(), e))?;

    tmp.persist(target)
        .map(|_| ())
        .map_err(|e| BallisticsError::storage(target, e.error))
}

/// Copy `source` to `<stem>-v<version>-<prefix>-backup-<ts><ext>`.
///
/// Returns `None` when there is nothing to back up.
pub fn create_backup(
    source: &Path,
    prefix: &str,
    version: u32,
    backup_dir: Option<&Path>,
) -> Result<Option<PathBuf>> {
    if !source.exists() {
        return Ok(None);
    }

    let dir = match backup_dir {
        Some(dir) => dir.to_path_buf(),
        None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(&dir).map_err(|e| BallisticsError::storage(&dir, e))?;
    }

    let (stem, ext) = stem_and_ext(source);
    let backup = dir.join(format!("{stem}-v{version}-{prefix}-backup-{}{ext}", file_timestamp()));
    fs::copy(source, &backup).map_err(|e| BallisticsError::storage(&backup, e))?;
    Ok(Some(backup))
}

/// Move an unreadable store aside as `<stem>-corrupted-<ts><ext>`.
pub fn quarantine_corrupt(path: &Path, telemetry: &Telemetry, reason: &str) -> Result<PathBuf> {
    let (stem, ext) = stem_and_ext(path);
    let target = path.with_file_name(format!("{stem}-corrupted-{}{ext}", file_timestamp()));
    fs::rename(path, &target).map_err(|e| BallisticsError::storage(path, e))?;
    telemetry.storage_warning("Quarantined corrupt profile store", &target, reason);
    Ok(target)
}

/// Normalize profile records: valid ones are re-serialized and sorted by
/// name, malformed ones are kept verbatim after them.
pub(crate) fn normalize_profiles(raw: &[Value], source: &Path, telemetry: &Telemetry) -> Vec<Value> {
    let mut valid: Vec<BallisticProfile> = Vec::new();
    let mut malformed: Vec<Value> = Vec::new();

    for record in raw {
        match BallisticProfile::from_value(record.clone()) {
            Ok(profile) => valid.push(profile),
            Err(e) => {
                telemetry.storage_warning("Keeping malformed profile record", source, &e.to_string());
                malformed.push(record.clone());
            }
        }
    }

    valid.sort_by(|a, b| a.name.cmp(&b.name));
    valid
        .iter()
        .map(BallisticProfile::to_value)
        .chain(malformed)
        .collect()
}

/// Bring the store at `path` to `target_version`.
///
/// Bytes that do not parse as JSON (including invalid UTF-8) are
/// quarantined rather than reported as an error.
pub fn migrate_profile_store(
    path: &Path,
    target_version: u32,
    backup_dir: Option<&Path>,
    telemetry: &Telemetry,
) -> Result<MigrationOutcome> {
    if !path.exists() {
        return Ok(MigrationOutcome::Unchanged);
    }

    let bytes = fs::read(path).map_err(|e| BallisticsError::storage(path, e))?;
    let raw: Value = match serde_json::from_slice(&bytes) {
        Ok(raw) => raw,
        Err(e) => {
            let quarantined = quarantine_corrupt(path, telemetry, &e.to_string())?;
            return Ok(MigrationOutcome::Quarantined { path: quarantined });
        }
    };

    let document = StoreDocument::parse(raw, path)?;
    if document.version > target_version {
        return Err(BallisticsError::Migration(format!(
            "profile store '{}' has version {} but this build only understands up to {}",
            path.display(),
            document.version,
            target_version
        )));
    }

    let normalized = normalize_profiles(&document.profiles, path, telemetry);
    let requires_migration = document.version != target_version;
    let requires_rewrite =
        requires_migration || !document.current_shape || document.profiles != normalized;
    if !requires_rewrite {
        return Ok(MigrationOutcome::Unchanged);
    }

    let now = Utc::now().to_rfc3339();
    let mut payload = document.metadata;
    payload.insert("version".into(), Value::from(target_version));
    payload.insert("profiles".into(), Value::Array(normalized));
    payload.insert("updated_at".into(), Value::from(now.clone()));
    if requires_migration {
        payload.insert("migrated_at".into(), Value::from(now));
        payload.insert("migrated_from_version".into(), Value::from(document.version));
    }

    let backup_path = create_backup(path, "migration", document.version, backup_dir)?;
    if let Err(e) = write_json_atomic(path, &Value::Object(payload)) {
        if let Some(backup) = &backup_path {
            let _ = fs::remove_file(backup);
        }
        return Err(e);
    }

    telemetry.migration(path, document.version, target_version, backup_path.as_deref());

    Ok(MigrationOutcome::Rewritten {
        previous_version: document.version,
        new_version: target_version,
        backup_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(name: &str) -> Value {
        json!({
            "name": name,
            "ammunition": {"caliber": ".308", "bullet_weight": 168, "muzzle_velocity": 820},
        })
    }

    #[test]
    fn test_parse_shapes() {
        let src = Path::new("p.json");

        let list = StoreDocument::parse(json!([record("a")]), src).unwrap();
        assert_eq!(list.version, 0);
        assert!(!list.current_shape);

        let entries = StoreDocument::parse(json!({"version": 1, "entries": [], "owner": "x"}), src).unwrap();
        assert_eq!(entries.version, 1);
        assert!(!entries.current_shape);
        assert_eq!(entries.metadata.get("owner"), Some(&json!("x")));

        let current = StoreDocument::parse(json!({"version": 2, "profiles": []}), src).unwrap();
        assert!(current.current_shape);

        for bad in [json!({"profiles": "nope"}), json!("text"), json!(42), json!({"version": "two", "profiles": []})] {
            let err = StoreDocument::parse(bad, src).unwrap_err();
            assert!(matches!(err, BallisticsError::Migration(_)));
        }
    }

    #[test]
    fn test_migrates_legacy_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        let backups = dir.path().join("backups");
        fs::write(&path, serde_json::to_string(&json!([record("Zulu"), record("Alpha")])).unwrap()).unwrap();

        let outcome = migrate_profile_store(&path, 2, Some(&backups), &Telemetry::default()).unwrap();
        let MigrationOutcome::Rewritten {
            previous_version,
            new_version,
            backup_path,
        } = &outcome
        else {
            panic!("expected a rewrite, got {outcome:?}");
        };
        assert_eq!(*previous_version, 0);
        assert_eq!(*new_version, 2);
        let backup = backup_path.clone().unwrap();
        assert!(backup.exists());
        assert!(backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("profiles-v0-migration-backup-"));

        let payload: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(payload["version"], json!(2));
        assert_eq!(payload["migrated_from_version"], json!(0));
        assert!(payload.get("migrated_at").is_some());
        let profiles = payload["profiles"].as_array().unwrap();
        assert_eq!(profiles[0]["name"], json!("Alpha"));
        assert_eq!(profiles[1]["name"], json!("Zulu"));
        assert!(profiles[0].get("created_at").is_some());
        assert_eq!(profiles[0]["ammunition"]["drag_model"], json!("G1"));
    }

    #[test]
    fn test_second_run_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, json!({"entries": [record("One")]}).to_string()).unwrap();

        let telemetry = Telemetry::default();
        assert!(!migrate_profile_store(&path, 2, None, &telemetry).unwrap().is_unchanged());
        let after_first = fs::read_to_string(&path).unwrap();
        assert_eq!(
            migrate_profile_store(&path, 2, None, &telemetry).unwrap(),
            MigrationOutcome::Unchanged
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
    }

    #[test]
    fn test_metadata_preserved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, json!({"version": 1, "profiles": [], "owner": "range-day"}).to_string()).unwrap();

        migrate_profile_store(&path, 2, None, &Telemetry::default()).unwrap();
        let payload: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(payload["owner"], json!("range-day"));
        assert_eq!(payload["migrated_from_version"], json!(1));
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, json!({"version": 9, "profiles": []}).to_string()).unwrap();

        let err = migrate_profile_store(&path, 2, None, &Telemetry::default()).unwrap_err();
        assert!(matches!(err, BallisticsError::Migration(_)));
    }

    #[test]
    fn test_corrupt_file_quarantined() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, "{ not json").unwrap();

        let outcome = migrate_profile_store(&path, 2, None, &Telemetry::default()).unwrap();
        assert!(matches!(&outcome, MigrationOutcome::Quarantined { path: q } if q.exists()));
        assert!(!path.exists());
        let quarantined: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("profiles-corrupted-") && n.ends_with(".json"))
            .collect();
        assert_eq!(quarantined.len(), 1);
    }

    #[test]
    fn test_invalid_utf8_quarantined() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x7b]).unwrap();

        let outcome = migrate_profile_store(&path, 2, None, &Telemetry::default()).unwrap();
        let MigrationOutcome::Quarantined { path: quarantined } = &outcome else {
            panic!("expected quarantine, got {outcome:?}");
        };
        assert_eq!(fs::read(quarantined).unwrap(), vec![0xff, 0xfe, 0x00, 0x7b]);
        assert!(!path.exists());
    }

    #[test]
    fn test_malformed_records_kept_verbatim() {
        let telemetry = Telemetry::default();
        let raw = vec![json!({"name": "broken"}), record("Good")];
        let normalized = normalize_profiles(&raw, Path::new("p.json"), &telemetry);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0]["name"], json!("Good"));
        assert_eq!(normalized[1], json!({"name": "broken"}));
    }

    #[test]
    fn test_write_json_atomic_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        write_json_atomic(&path, &json!({"b": 1, "a": 2})).unwrap();
        write_json_atomic(&path, &json!({"b": 3, "a": 4})).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["store.json".to_string()]);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(
            migrate_profile_store(&path, 2, None, &Telemetry::default()).unwrap(),
            MigrationOutcome::Unchanged
        );
        assert!(create_backup(&path, "migration", 2, None).unwrap().is_none());
    }
}
