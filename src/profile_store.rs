//! JSON-backed store of named ballistic profiles.
//!
//! The store file is migrated to the current schema on open. Every write
//! first copies the previous file to a rotating backup, then replaces the
//! store atomically, then prunes old backups.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::StoreOptions;
use crate::error::{BallisticsError, Result};
use crate::migrations::{
    file_timestamp, migrate_profile_store, quarantine_corrupt, stem_and_ext, write_json_atomic,
    MigrationOutcome, StoreDocument,
};
use crate::{BallisticProfile, Telemetry};

/// Names affected by an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: Vec<String>,
    pub skipped: Vec<String>,
    pub overwritten: Vec<String>,
}

impl ImportReport {
    pub fn changed(&self) -> bool {
        !self.imported.is_empty() || !self.overwritten.is_empty()
    }
}

/// Store contents as read for a rewrite.
#[derive(Debug, Default)]
struct Contents {
    profiles: BTreeMap<String, BallisticProfile>,
    malformed: Vec<Value>,
    metadata: Map<String, Value>,
}

#[derive(Debug)]
pub struct BallisticProfileStore {
    path: PathBuf,
    options: StoreOptions,
    telemetry: Telemetry,
    opened: MigrationOutcome,
}

impl BallisticProfileStore {
    /// Open the store at `path`, migrating it when needed.
    ///
    /// A missing file is fine; a corrupt one is quarantined and the store
    /// starts empty. Unknown shapes and newer schema versions are errors.
    pub fn open(path: impl Into<PathBuf>, options: StoreOptions, telemetry: Telemetry) -> Result<Self> {
        let path = path.into();
        let opened = migrate_profile_store(
            &path,
            options.schema_version,
            options.backup_dir.as_deref(),
            &telemetry,
        )?;
        telemetry.storage("Profile store opened", &path);
        Ok(Self {
            path,
            options,
            telemetry,
            opened,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// What `open` did to the file.
    pub fn open_outcome(&self) -> &MigrationOutcome {
        &self.opened
    }

    /// Every valid profile keyed by name. Read failures degrade to an empty map.
    pub fn load_all(&self) -> BTreeMap<String, BallisticProfile> {
        match self.read_contents() {
            Ok(contents) => contents.profiles,
            Err(e) => {
                self.telemetry
                    .storage_warning("Failed to load profile store", &self.path, &e.to_string());
                BTreeMap::new()
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<BallisticProfile> {
        self.load_all().remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.load_all().into_keys().collect()
    }

    /// Insert or replace a profile by name.
    pub fn save(&mut self, mut profile: BallisticProfile) -> Result<()> {
        profile.name = profile.name.trim().to_string();
        if profile.name.is_empty() {
            return Err(BallisticsError::Validation("profile name must not be empty".into()));
        }
        profile.ammunition.validate().map_err(|e| {
            BallisticsError::Validation(format!("profile '{}': {e}", profile.name))
        })?;

        let mut contents = self.read_contents()?;
        contents.profiles.insert(profile.name.clone(), profile);
        self.write_contents(contents)
    }

    /// Remove a profile. Returns false, without touching the file, when absent.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        let mut contents = self.read_contents()?;
        if contents.profiles.remove(name).is_none() {
            return Ok(false);
        }
        self.write_contents(contents)?;
        Ok(true)
    }

    /// Write the selected profiles (all when `names` is `None`) to `path`
    /// in the store's own document format. Returns the exported names.
    pub fn export(&self, path: impl AsRef<Path>, names: Option<&[String]>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let mut profiles = self.read_contents()?.profiles;
        if let Some(wanted) = names {
            profiles.retain(|name, _| wanted.iter().any(|w| w == name));
        }

        let exported: Vec<String> = profiles.keys().cloned().collect();
        let document = self.document(Map::new(), profiles.values().map(BallisticProfile::to_value).collect());
        write_json_atomic(path, &document)?;
        self.telemetry.storage("Profiles exported", path);
        Ok(exported)
    }

    /// Merge profiles from an exported document or any legacy store shape.
    pub fn import(&mut self, path: impl AsRef<Path>, overwrite: bool) -> Result<ImportReport> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| BallisticsError::storage(path, e))?;
        let raw: Value = serde_json::from_slice(&bytes)?;
        let document = StoreDocument::parse(raw, path)?;
        if document.version > self.options.schema_version {
            return Err(BallisticsError::Migration(format!(
                "import file '{}' has version {} but this build only understands up to {}",
                path.display(),
                document.version,
                self.options.schema_version
            )));
        }

        let mut contents = self.read_contents()?;
        let mut report = ImportReport::default();

        for record in document.profiles {
            let mut profile = match BallisticProfile::from_value(record) {
                Ok(profile) => profile,
                Err(e) => {
                    self.telemetry
                        .storage_warning("Skipping malformed import record", path, &e.to_string());
                    continue;
                }
            };

            let name = profile.name.clone();
            if contents.profiles.contains_key(&name) {
                if !overwrite {
                    report.skipped.push(name);
                    continue;
                }
                profile.touch();
                report.overwritten.push(name.clone());
            } else {
                report.imported.push(name.clone());
            }
            contents.profiles.insert(name, profile);
        }

        if report.changed() {
            self.write_contents(contents)?;
        }
        Ok(report)
    }

    /// Copy the current store file to a rotating backup and prune old ones.
    pub fn create_backup(&self) -> Result<Option<PathBuf>> {
        let backup = self.backup_copy()?;
        if backup.is_some() {
            self.prune_backups()?;
        }
        Ok(backup)
    }

    /// Rotating backups currently on disk, oldest first.
    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        let dir = self.backup_dir();
        let (stem, ext) = stem_and_ext(&self.path);
        let prefix = format!("{stem}-backup-");

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BallisticsError::storage(&dir, e)),
        };

        let mut backups: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy())
                    .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(&ext))
            })
            .collect();
        backups.sort();
        Ok(backups)
    }

    fn backup_dir(&self) -> PathBuf {
        match &self.options.backup_dir {
            Some(dir) => dir.clone(),
            None => self.path.parent().map(Path::to_path_buf).unwrap_or_default(),
        }
    }

    fn backup_copy(&self) -> Result<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let dir = self.backup_dir();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(&dir).map_err(|e| BallisticsError::storage(&dir, e))?;
        }

        let (stem, ext) = stem_and_ext(&self.path);
        let timestamp = file_timestamp();
        let mut counter = 0u32;
        let backup = loop {
            let candidate = dir.join(format!("{stem}-backup-{timestamp}-{counter:02}{ext}"));
            if !candidate.exists() {
                break candidate;
            }
            counter += 1;
        };

        fs::copy(&self.path, &backup).map_err(|e| BallisticsError::storage(&backup, e))?;
        Ok(Some(backup))
    }

    fn prune_backups(&self) -> Result<()> {
        let backups = self.backups()?;
        let excess = backups.len().saturating_sub(self.options.retention);
        for old in &backups[..excess] {
            fs::remove_file(old).map_err(|e| BallisticsError::storage(old, e))?;
            self.telemetry.storage("Pruned profile store backup", old);
        }
        Ok(())
    }

    /// Read the store for modification. Corrupt files are quarantined and
    /// read as empty; I/O failures and unknown shapes are errors.
    fn read_contents(&self) -> Result<Contents> {
        if !self.path.exists() {
            return Ok(Contents::default());
        }

        let bytes = fs::read(&self.path).map_err(|e| BallisticsError::storage(&self.path, e))?;
        let raw: Value = match serde_json::from_slice(&bytes) {
            Ok(raw) => raw,
            Err(e) => {
                quarantine_corrupt(&self.path, &self.telemetry, &e.to_string())?;
                return Ok(Contents::default());
            }
        };

        let document = StoreDocument::parse(raw, &self.path)?;
        if document.version > self.options.schema_version {
            return Err(BallisticsError::Migration(format!(
                "profile store '{}' has version {} but this build only understands up to {}",
                self.path.display(),
                document.version,
                self.options.schema_version
            )));
        }

        let mut contents = Contents {
            metadata: document.metadata,
            ..Default::default()
        };
        for record in document.profiles {
            match BallisticProfile::from_value(record.clone()) {
                Ok(profile) => {
                    contents.profiles.insert(profile.name.clone(), profile);
                }
                Err(e) => {
                    self.telemetry
                        .storage_warning("Skipping malformed profile record", &self.path, &e.to_string());
                    contents.malformed.push(record);
                }
            }
        }
        Ok(contents)
    }

    fn document(&self, mut metadata: Map<String, Value>, profiles: Vec<Value>) -> Value {
        metadata.insert("version".into(), Value::from(self.options.schema_version));
        metadata.insert("updated_at".into(), Value::from(Utc::now().to_rfc3339()));
        metadata.insert("profiles".into(), Value::Array(profiles));
        Value::Object(metadata)
    }

    fn write_contents(&self, contents: Contents) -> Result<()> {
        let profiles: Vec<Value> = contents
            .profiles
            .values()
            .map(BallisticProfile::to_value)
            .chain(contents.malformed)
            .collect();
        let document = self.document(contents.metadata, profiles);

        let backup = self.backup_copy()?;
        if let Err(e) = write_json_atomic(&self.path, &document) {
            if let Some(backup) = &backup {
                let _ = fs::remove_file(backup);
            }
            return Err(e);
        }

        self.telemetry.storage("Profile store saved", &self.path);
        // The new document is already in place
        if let Err(e) = self.prune_backups() {
            self.telemetry
                .storage_warning("Failed to prune profile store backups", &self.path, &e.to_string());
        }
        Ok(())
    }
}
