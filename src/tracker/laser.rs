use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{folder_name, subdirectories, today, JobFolder, JobTracker};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::ledger::LedgerStore;
use crate::model::{JobFile, JobKind, JobRecord, JobStatus, NewJob};

/// File name a laser file is stored under inside its job folder:
/// `<material>_<thickness>mm_<amount>x_<original>`, unless the original name
/// already mentions all three.
pub fn laser_file_name(material: &str, thickness: &str, amount: &str, original: &str) -> String {
    if original.contains(material) && original.contains(thickness) && original.contains(amount) {
        original.to_string()
    } else {
        format!("{}_{}mm_{}x_{}", material, thickness, amount, original)
    }
}

/// Material, thickness and amount encoded in a name built by
/// [`laser_file_name`].
pub fn parse_laser_file_name(file_name: &str) -> Option<(String, String, String)> {
    let mut parts = file_name.splitn(4, '_');
    let material = parts.next()?;
    let thickness = parts.next()?.strip_suffix("mm")?;
    let amount = parts.next()?.strip_suffix('x')?;
    let rest = parts.next()?;
    if material.is_empty() || thickness.is_empty() || amount.is_empty() || rest.is_empty() {
        return None;
    }
    Some((material.to_string(), thickness.to_string(), amount.to_string()))
}

const FOLDER_DATE_FORMAT: &str = "%d-%m";

/// Laser job folders are named `<DD-MM>_<job_name>` after the day the job
/// came in.
pub fn laser_job_folder_name(job_name: &str, created_on: NaiveDate) -> String {
    format!("{}_{}", created_on.format(FOLDER_DATE_FORMAT), job_name)
}

/// Job name part of a folder named by [`laser_job_folder_name`]. Folders
/// without the date prefix are returned whole.
pub fn strip_folder_date(folder_name: &str) -> &str {
    let Some(prefix) = folder_name.get(..6) else {
        return folder_name;
    };
    let b = prefix.as_bytes();
    let dated = b[0].is_ascii_digit()
        && b[1].is_ascii_digit()
        && b[2] == b'-'
        && b[3].is_ascii_digit()
        && b[4].is_ascii_digit()
        && b[5] == b'_';
    let rest = &folder_name[6..];
    if dated && !rest.is_empty() {
        rest
    } else {
        folder_name
    }
}

/// Tracker for laser cutting jobs. Every job lists the files to cut with
/// their material, thickness and amount. Job folders sit directly in the
/// jobs directory, prefixed with the day the job was added.
pub struct LaserJobTracker<'a> {
    config: &'a AppConfig,
    store: LedgerStore,
}

impl<'a> LaserJobTracker<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            store: LedgerStore::new(config.tracker_file(JobKind::Laser)),
        }
    }

    /// Every material used by a tracked job, sorted.
    pub fn existing_materials(&self) -> Result<Vec<String>> {
        let ledger = self.read_ledger()?;
        let materials: BTreeSet<String> = ledger
            .records()
            .flat_map(|r| r.files.values())
            .map(|f| f.material.clone())
            .collect();
        Ok(materials.into_iter().collect())
    }

    /// Configured materials plus those already in use.
    pub fn known_materials(&self) -> Result<Vec<String>> {
        let mut materials: BTreeSet<String> =
            self.config.accepted_materials.iter().cloned().collect();
        materials.extend(self.existing_materials()?);
        Ok(materials.into_iter().collect())
    }

    pub fn mark_file_done(&self, job_name: &str, file_key: &str, done: bool) -> Result<JobRecord> {
        let record = self.modify(|ledger| {
            let record = ledger
                .get_mut(job_name)
                .ok_or_else(|| Error::JobNotFound(job_name.to_string()))?;
            let file = record
                .files
                .get_mut(file_key)
                .ok_or_else(|| Error::FileNotFound {
                    job_name: job_name.to_string(),
                    file_key: file_key.to_string(),
                })?;
            file.done = done;
            Ok(record.clone())
        })?;

        let remaining = record.files.values().filter(|f| !f.done).count();
        info!("{} in {} marked done={}, {} files left", file_key, job_name, done, remaining);
        Ok(record)
    }
}

impl JobTracker for LaserJobTracker<'_> {
    fn kind(&self) -> JobKind {
        JobKind::Laser
    }

    fn config(&self) -> &AppConfig {
        self.config
    }

    fn store(&self) -> &LedgerStore {
        &self.store
    }

    fn status_label(&self, status: JobStatus) -> &'static str {
        match status {
            JobStatus::Queued => "queued",
            JobStatus::InProgress => "cutting",
            JobStatus::Ready => "cut",
            JobStatus::Processed => "processed",
        }
    }

    fn validate_new_job(&self, job: &NewJob) -> Result<()> {
        if job.files.is_empty() {
            return Err(Error::InvalidJob(format!(
                "laser job {} has no files",
                job.job_name
            )));
        }
        for file in job.files.values() {
            JobFile::new(
                file.file_name.as_str(),
                file.file_global_path.as_path(),
                &file.material,
                &file.thickness,
                &file.amount,
            )?;
        }
        Ok(())
    }

    fn default_job_folder(&self, job_name: &str) -> PathBuf {
        self.jobs_dir().join(laser_job_folder_name(job_name, today()))
    }

    fn job_name_for_folder(&self, folder: &JobFolder) -> String {
        strip_folder_date(&folder.name).to_string()
    }

    fn job_folders_on_disk(&self) -> Result<Vec<JobFolder>> {
        Ok(subdirectories(&self.jobs_dir())?
            .into_iter()
            .map(|path| JobFolder {
                name: folder_name(&path),
                path,
                status: None,
            })
            .collect())
    }

    fn synthesize_files(&self, job_name: &str, folder: &Path) -> Result<BTreeMap<String, JobFile>> {
        let mut files = BTreeMap::new();

        for entry in walkdir::WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Cannot read {}: {}", folder.display(), e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
        {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !self.config.is_accepted_extension(&file_name) {
                continue;
            }

            let Some((material, thickness, amount)) = parse_laser_file_name(&file_name) else {
                warn!("Cannot read material info from {}, skipping", entry.path().display());
                continue;
            };

            match JobFile::new(file_name.as_str(), entry.path(), &material, &thickness, &amount) {
                Ok(file) => {
                    files.insert(format!("{}_{}", job_name, file_name), file);
                }
                Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
            }
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laser_file_name_prefixes_info() {
        assert_eq!(laser_file_name("mdf", "3", "2", "box.dxf"), "mdf_3mm_2x_box.dxf");
    }

    #[test]
    fn test_laser_file_name_keeps_informative_name() {
        assert_eq!(laser_file_name("mdf", "3", "2", "mdf_3mm_2x_box.dxf"), "mdf_3mm_2x_box.dxf");
    }

    #[test]
    fn test_parse_laser_file_name() {
        assert_eq!(
            parse_laser_file_name("mdf_3mm_2x_my_box.dxf"),
            Some(("mdf".to_string(), "3".to_string(), "2".to_string()))
        );
        assert_eq!(parse_laser_file_name("box.dxf"), None);
        assert_eq!(parse_laser_file_name("mdf_3_2x_box.dxf"), None);
    }

    #[test]
    fn test_folder_name_carries_day_and_month() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(laser_job_folder_name("Jan", day), "05-03_Jan");
        assert_eq!(strip_folder_date("05-03_Jan"), "Jan");
        assert_eq!(strip_folder_date("05-03_Jan_(2)"), "Jan_(2)");
    }

    #[test]
    fn test_undated_folder_name_is_kept() {
        assert_eq!(strip_folder_date("Jan"), "Jan");
        assert_eq!(strip_folder_date("05-03_"), "05-03_");
        assert_eq!(strip_folder_date("5-03_Jan"), "5-03_Jan");
        assert_eq!(strip_folder_date("Café_x"), "Café_x");
    }

    #[test]
    fn test_unreadable_folder_synthesizes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::with_data_dir(dir.path());
        let tracker = LaserJobTracker::new(&config);

        let files = tracker
            .synthesize_files("Jan", &dir.path().join("gone"))
            .unwrap();
        assert!(files.is_empty());
    }
}
