use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::JobRecord;

const LOG_SUFFIX: &str = "_log.json";
const BACKUP_LOG_SUFFIX: &str = "_log_backup.json";

/// In-memory tracker contents: job records keyed by job name, in the order
/// they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<(String, JobRecord)>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&JobRecord> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, record)| record)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut JobRecord> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, record)| record)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace. A replaced record keeps its position.
    pub fn insert(&mut self, key: String, record: JobRecord) -> Option<JobRecord> {
        match self.get_mut(&key) {
            Some(existing) => Some(std::mem::replace(existing, record)),
            None => {
                self.entries.push((key, record));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<JobRecord> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &JobRecord) -> bool,
    {
        self.entries.retain(|(k, record)| keep(k, record));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JobRecord)> {
        self.entries.iter().map(|(k, record)| (k.as_str(), record))
    }

    pub fn records(&self) -> impl Iterator<Item = &JobRecord> {
        self.entries.iter().map(|(_, record)| record)
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut JobRecord> {
        self.entries.iter_mut().map(|(_, record)| record)
    }
}

impl Serialize for Ledger {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, record) in &self.entries {
            map.serialize_entry(key, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Ledger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct LedgerVisitor;

        impl<'de> Visitor<'de> for LedgerVisitor {
            type Value = Ledger;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of job names to job records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Ledger, A::Error> {
                let mut ledger = Ledger::new();
                while let Some((key, record)) = access.next_entry::<String, JobRecord>()? {
                    ledger.insert(key, record);
                }
                Ok(ledger)
            }
        }

        deserializer.deserialize_map(LedgerVisitor)
    }
}

/// Render the way the shop's tracker files have always looked: four-space
/// indented JSON.
pub fn to_json_pretty(ledger: &Ledger) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    ledger.serialize(&mut serializer)?;
    Ok(buf)
}

/// Condition of the tracker file on disk.
#[derive(Debug)]
pub enum LedgerState {
    Missing,
    Valid(Ledger),
    Corrupt(serde_json::Error),
}

/// True when the file parsed as JSON but its contents are not job records,
/// as opposed to truncated or malformed JSON.
pub fn is_schema_mismatch(error: &serde_json::Error) -> bool {
    error.classify() == serde_json::error::Category::Data
}

/// Backup path next to `tracker_file`: `<x>_log.json` becomes
/// `<x>_log_backup.json`, any other name gets `_backup` before its extension.
pub fn backup_path_for(tracker_file: &Path) -> PathBuf {
    let file_name = tracker_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let backup_name = if let Some(stem) = file_name.strip_suffix(LOG_SUFFIX) {
        format!("{}{}", stem, BACKUP_LOG_SUFFIX)
    } else {
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!("{}_backup.{}", stem, ext),
            _ => format!("{}_backup", file_name),
        }
    };

    tracker_file.with_file_name(backup_name)
}

/// The tracker file and its single backup generation.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    backup_path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_path = backup_path_for(&path);
        Self { path, backup_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn backup_exists(&self) -> bool {
        self.backup_path.is_file()
    }

    pub fn state(&self) -> Result<LedgerState> {
        read_state(&self.path)
    }

    pub fn backup_state(&self) -> Result<LedgerState> {
        read_state(&self.backup_path)
    }

    pub fn read(&self) -> Result<Ledger> {
        match self.state()? {
            LedgerState::Valid(ledger) => {
                debug!("Read {} jobs from {}", ledger.len(), self.path.display());
                Ok(ledger)
            }
            LedgerState::Missing => Err(Error::MissingLedger(self.path.clone())),
            LedgerState::Corrupt(source) => Err(Error::CorruptLedger {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Replace the tracker file with `ledger`. The new contents are written
    /// next to it first and renamed into place.
    pub fn write(&self, ledger: &Ledger) -> Result<()> {
        let json = to_json_pretty(ledger)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!("Wrote {} jobs to {}", ledger.len(), self.path.display());
        Ok(())
    }

    pub fn write_empty(&self) -> Result<()> {
        self.write(&Ledger::new())
    }

    /// Copy the tracker file over the backup, dropping the previous backup.
    pub fn make_backup(&self) -> Result<()> {
        match fs::remove_file(&self.backup_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::copy(&self.path, &self.backup_path)?;
        debug!("Backed up {} to {}", self.path.display(), self.backup_path.display());
        Ok(())
    }

    /// Move the backup into place over the tracker file.
    pub fn restore_backup(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::rename(&self.backup_path, &self.path)?;
        info!("Restored {} from {}", self.path.display(), self.backup_path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn read_state(path: &Path) -> Result<LedgerState> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LedgerState::Missing),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_slice::<Ledger>(&bytes) {
        Ok(ledger) => Ok(LedgerState::Valid(ledger)),
        Err(e) => Ok(LedgerState::Corrupt(e)),
    }
}
