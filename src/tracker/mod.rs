pub mod laser;
pub mod print;

pub use laser::LaserJobTracker;
pub use print::PrintJobTracker;

use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::health::{self, Confirm, HealthOutcome};
use crate::ledger::{Ledger, LedgerStore};
use crate::model::{JobFile, JobKind, JobNames, JobRecord, JobStatus, NewJob};
use crate::naming;

pub const DATE_FORMAT: &str = "%d-%m-%Y";

pub fn parse_created_on(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| Error::InvalidDate(date.to_string()))
}

pub fn format_created_on(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// A job is old once strictly more than `days_to_keep` whole days have
/// passed since it was created.
pub fn is_job_old_at(created_on_date: &str, today: NaiveDate, days_to_keep: i64) -> Result<bool> {
    let created = parse_created_on(created_on_date)?;
    Ok((today - created).num_days() > days_to_keep)
}

/// Look up the record whose folder is exactly `folder_path`.
pub fn folder_to_record<'a>(
    ledger: &'a Ledger,
    folder_path: &Path,
) -> Option<(&'a str, &'a JobRecord)> {
    ledger
        .iter()
        .find(|(_, record)| record.folder_path == folder_path)
}

/// A job folder found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFolder {
    pub name: String,
    pub path: PathBuf,
    /// Status implied by where the folder sits, if the layout encodes one.
    pub status: Option<JobStatus>,
}

/// Operations shared by the print and laser trackers. The variants supply
/// their store, layout on disk and job validation; everything else is
/// provided here on top of a read-modify-write of the whole tracker file.
pub trait JobTracker {
    fn kind(&self) -> JobKind;

    fn config(&self) -> &AppConfig;

    fn store(&self) -> &LedgerStore;

    /// Operator-facing name of a status for this kind of job.
    fn status_label(&self, status: JobStatus) -> &'static str;

    fn validate_new_job(&self, job: &NewJob) -> Result<()>;

    /// Where a new job with this name should get its folder.
    fn default_job_folder(&self, job_name: &str) -> PathBuf;

    /// Job folders currently present under the jobs directory.
    fn job_folders_on_disk(&self) -> Result<Vec<JobFolder>>;

    /// Job name to record for a folder that has no tracker entry.
    fn job_name_for_folder(&self, folder: &JobFolder) -> String {
        folder.name.clone()
    }

    /// File entries to record for a job folder that has no tracker entry.
    fn synthesize_files(&self, _job_name: &str, _folder: &Path) -> Result<BTreeMap<String, JobFile>> {
        Ok(BTreeMap::new())
    }

    /// Create directories this tracker expects under the jobs directory.
    fn ensure_job_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.jobs_dir())?;
        Ok(())
    }

    fn jobs_dir(&self) -> PathBuf {
        self.config().jobs_dir(self.kind())
    }

    /// Repair the tracker file if needed, then make sure the jobs directory
    /// layout exists.
    fn check_health(&self, prompt: &mut dyn Confirm) -> Result<HealthOutcome> {
        let outcome = health::check_tracker_file_health(self.store(), prompt)?;
        if outcome.is_usable() {
            self.ensure_job_dirs()?;
        }
        Ok(outcome)
    }

    fn make_backup(&self) -> Result<()> {
        self.store().make_backup()
    }

    fn read_ledger(&self) -> Result<Ledger> {
        self.store().read()
    }

    /// Read, snapshot the current file as backup, apply `change`, write back.
    fn modify<T, F>(&self, change: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Ledger) -> Result<T>,
    {
        let mut ledger = self.store().read()?;
        let result = change(&mut ledger)?;
        self.store().make_backup()?;
        self.store().write(&ledger)?;
        Ok(result)
    }

    fn add_job(&self, job: NewJob) -> Result<JobRecord>
    where
        Self: Sized,
    {
        self.add_job_on(job, today())
    }

    fn add_job_on(&self, job: NewJob, created_on: NaiveDate) -> Result<JobRecord>
    where
        Self: Sized,
    {
        if job.job_name.trim().is_empty() {
            return Err(Error::InvalidJob("job name is empty".to_string()));
        }
        if job.folder_path.as_os_str().is_empty() {
            return Err(Error::InvalidJob("folder path is empty".to_string()));
        }
        self.validate_new_job(&job)?;

        let record = JobRecord {
            job_name: job.job_name.clone(),
            dynamic_job_name: job.job_name.clone(),
            status: JobStatus::Queued,
            folder_path: job.folder_path,
            created_on_date: format_created_on(created_on),
            sender_name: job.sender_name,
            sender_mail_address: job.sender_mail_address,
            sender_mail_receive_time: job.sender_mail_receive_time,
            files: job.files,
        };

        self.modify(|ledger| {
            if ledger.contains_key(&record.job_name)
                || ledger
                    .records()
                    .any(|r| naming::same_job_name(&r.job_name, &record.job_name))
            {
                return Err(Error::DuplicateJobName(record.job_name.clone()));
            }
            if let Some((name, _)) = folder_to_record(ledger, &record.folder_path) {
                return Err(Error::DuplicateFolder {
                    folder: record.folder_path.clone(),
                    job_name: name.to_string(),
                });
            }
            ledger.insert(record.job_name.clone(), record.clone());
            Ok(())
        })?;

        info!(
            "Added {} job {} ({} files)",
            self.kind().as_str(),
            record.job_name,
            record.files.len()
        );
        Ok(record)
    }

    fn get_job(&self, job_name: &str) -> Result<JobRecord> {
        self.read_ledger()?
            .get(job_name)
            .cloned()
            .ok_or_else(|| Error::JobNotFound(job_name.to_string()))
    }

    fn jobs_with_status(&self, status: JobStatus) -> Result<Vec<JobNames>> {
        Ok(self
            .read_ledger()?
            .records()
            .filter(|r| r.status == status)
            .map(JobRecord::names)
            .collect())
    }

    fn all_job_names(&self) -> Result<Vec<JobNames>> {
        Ok(self.read_ledger()?.records().map(JobRecord::names).collect())
    }

    fn count_jobs_with_status(&self, statuses: &[JobStatus]) -> Result<usize> {
        Ok(self
            .read_ledger()?
            .records()
            .filter(|r| statuses.contains(&r.status))
            .count())
    }

    fn count_jobs_in_queue(&self) -> Result<usize> {
        self.count_jobs_with_status(&[JobStatus::Queued])
    }

    /// Move a job to `new_status`. Reaching `Processed` marks every file of
    /// the job done.
    fn update_job_status(&self, job_name: &str, new_status: JobStatus) -> Result<JobRecord>
    where
        Self: Sized,
    {
        let updated = self.modify(|ledger| {
            let record = ledger
                .get_mut(job_name)
                .ok_or_else(|| Error::JobNotFound(job_name.to_string()))?;
            debug!("{}: {} -> {}", job_name, record.status, new_status);
            record.set_status(new_status);
            Ok(record.clone())
        })?;

        info!(
            "Job {} is now {}",
            job_name,
            self.status_label(updated.status)
        );
        Ok(updated)
    }

    fn set_dynamic_job_name(&self, job_name: &str, display_name: &str) -> Result<JobRecord>
    where
        Self: Sized,
    {
        self.modify(|ledger| {
            let record = ledger
                .get_mut(job_name)
                .ok_or_else(|| Error::JobNotFound(job_name.to_string()))?;
            record.dynamic_job_name = display_name.to_string();
            Ok(record.clone())
        })
    }

    fn make_job_name_unique(&self, job_name: &str) -> Result<String> {
        let ledger = self.read_ledger()?;
        Ok(naming::make_unique(
            job_name,
            ledger.records().map(|r| r.job_name.as_str()),
        ))
    }

    fn is_job_old(&self, created_on_date: &str) -> Result<bool> {
        is_job_old_at(created_on_date, today(), self.config().days_to_keep_jobs)
    }

    fn find_by_folder(&self, folder_path: &Path) -> Result<Option<(String, JobRecord)>> {
        let ledger = self.read_ledger()?;
        Ok(folder_to_record(&ledger, folder_path)
            .map(|(name, record)| (name.to_string(), record.clone())))
    }

    /// Processed jobs past the retention threshold.
    fn old_jobs(&self) -> Result<Vec<JobNames>> {
        let ledger = self.read_ledger()?;
        let days = self.config().days_to_keep_jobs;
        let today = today();

        let mut old = Vec::new();
        for record in ledger.records().filter(|r| r.status == JobStatus::Processed) {
            match is_job_old_at(&record.created_on_date, today, days) {
                Ok(true) => old.push(record.names()),
                Ok(false) => {}
                Err(e) => warn!("Skipping {}: {}", record.job_name, e),
            }
        }
        Ok(old)
    }

    /// Drop processed jobs past the retention threshold from the tracker.
    /// Their folders are left on disk.
    fn prune_old_jobs(&self) -> Result<Vec<JobRecord>>
    where
        Self: Sized,
    {
        let old: Vec<String> = self.old_jobs()?.into_iter().map(|n| n.job_name).collect();
        if old.is_empty() {
            return Ok(Vec::new());
        }

        let removed = self.modify(|ledger| {
            Ok(old
                .iter()
                .filter_map(|name| ledger.remove(name))
                .collect::<Vec<_>>())
        })?;
        info!("Removed {} old jobs from the tracker", removed.len());
        Ok(removed)
    }
}

/// Immediate subdirectories of `dir`, sorted by name. A missing `dir`
/// yields nothing.
pub(crate) fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let message = e.to_string();
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, message))
        })?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

pub(crate) fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
