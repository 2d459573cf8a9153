use std::fs;
use std::path::PathBuf;

use super::{folder_name, subdirectories, JobFolder, JobTracker};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::ledger::LedgerStore;
use crate::model::{JobKind, JobStatus, NewJob};

/// Tracker for 3D print jobs.
///
/// Print job folders live in one stage folder per status under the jobs
/// directory (`WACHTRIJ/<job>`, `GESLICED/<job>`, ...), so the folder a job
/// sits in tells which stage it has reached.
pub struct PrintJobTracker<'a> {
    config: &'a AppConfig,
    store: LedgerStore,
}

impl<'a> PrintJobTracker<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            store: LedgerStore::new(config.tracker_file(JobKind::Print)),
        }
    }

    pub fn stage_dir(&self, status: JobStatus) -> PathBuf {
        self.jobs_dir().join(status.stage_folder())
    }

    /// Folder a job would have at `status`.
    pub fn job_folder(&self, status: JobStatus, job_name: &str) -> PathBuf {
        self.stage_dir(status).join(job_name)
    }
}

impl JobTracker for PrintJobTracker<'_> {
    fn kind(&self) -> JobKind {
        JobKind::Print
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
            JobStatus::InProgress => "printing",
            JobStatus::Ready => "sliced",
            JobStatus::Processed => "processed",
        }
    }

    fn validate_new_job(&self, job: &NewJob) -> Result<()> {
        if !job.files.is_empty() {
            return Err(Error::InvalidJob(
                "print jobs do not track individual files".to_string(),
            ));
        }
        Ok(())
    }

    fn default_job_folder(&self, job_name: &str) -> PathBuf {
        self.job_folder(JobStatus::Queued, job_name)
    }

    fn job_folders_on_disk(&self) -> Result<Vec<JobFolder>> {
        let mut folders = Vec::new();
        for status in JobStatus::ALL {
            for path in subdirectories(&self.stage_dir(status))? {
                folders.push(JobFolder {
                    name: folder_name(&path),
                    path,
                    status: Some(status),
                });
            }
        }
        Ok(folders)
    }

    fn ensure_job_dirs(&self) -> Result<()> {
        for status in JobStatus::ALL {
            fs::create_dir_all(self.stage_dir(status))?;
        }
        Ok(())
    }
}
