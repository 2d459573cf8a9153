//! Reconcile a tracker file with the job folders on disk.
//!
//! [`plan_repair`] only looks; [`apply_repair`] rewrites the tracker file.
//! Folders are never touched.

use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::Result;
use crate::model::{JobRecord, JobStatus};
use crate::naming;
use crate::tracker::{folder_name, folder_to_record, format_created_on, today, JobFolder, JobTracker};

const UNKNOWN_SENDER: &str = "No Sender Name";

/// A tracked job whose folder now lives somewhere else under the jobs dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedJob {
    pub job_name: String,
    pub from: PathBuf,
    pub to: PathBuf,
    pub status: Option<JobStatus>,
}

/// A tracked job whose folder is in a stage that disagrees with its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestagedJob {
    pub job_name: String,
    pub recorded: JobStatus,
    pub on_disk: JobStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingJob {
    pub job_name: String,
    pub folder_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairPlan {
    pub moved: Vec<MovedJob>,
    pub restaged: Vec<RestagedJob>,
    pub missing: Vec<MissingJob>,
    pub untracked: Vec<JobFolder>,
}

impl RepairPlan {
    pub fn is_clean(&self) -> bool {
        self.moved.is_empty()
            && self.restaged.is_empty()
            && self.missing.is_empty()
            && self.untracked.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairSummary {
    pub moved: usize,
    pub restaged: usize,
    pub added: Vec<String>,
}

pub fn plan_repair<T: JobTracker>(tracker: &T) -> Result<RepairPlan> {
    let ledger = tracker.read_ledger()?;
    let folders = tracker.job_folders_on_disk()?;

    let tracked: HashSet<&PathBuf> = ledger.records().map(|r| &r.folder_path).collect();
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut plan = RepairPlan::default();

    for (job_name, record) in ledger.iter() {
        if let Some(folder) = folders.iter().find(|f| f.path == record.folder_path) {
            if let Some(on_disk) = folder.status {
                if on_disk != record.status {
                    plan.restaged.push(RestagedJob {
                        job_name: job_name.to_string(),
                        recorded: record.status,
                        on_disk,
                    });
                }
            }
            continue;
        }

        let wanted = folder_name(&record.folder_path);
        let relocated = folders.iter().find(|f| {
            f.name == wanted && !tracked.contains(&f.path) && !claimed.contains(&f.path)
        });

        if let Some(folder) = relocated {
            claimed.insert(folder.path.clone());
            plan.moved.push(MovedJob {
                job_name: job_name.to_string(),
                from: record.folder_path.clone(),
                to: folder.path.clone(),
                status: folder.status,
            });
        } else if !record.folder_path.is_dir() {
            plan.missing.push(MissingJob {
                job_name: job_name.to_string(),
                folder_path: record.folder_path.clone(),
            });
        }
    }

    plan.untracked = folders
        .into_iter()
        .filter(|f| folder_to_record(&ledger, &f.path).is_none() && !claimed.contains(&f.path))
        .collect();

    Ok(plan)
}

pub fn apply_repair<T: JobTracker>(tracker: &T, plan: &RepairPlan) -> Result<RepairSummary> {
    if plan.is_clean() {
        return Ok(RepairSummary::default());
    }

    for missing in &plan.missing {
        warn!(
            "Folder of job {} not found: {}",
            missing.job_name,
            missing.folder_path.display()
        );
    }

    let created_on = format_created_on(today());

    let summary = tracker.modify(|ledger| {
        let mut summary = RepairSummary::default();

        for moved in &plan.moved {
            if let Some(record) = ledger.get_mut(&moved.job_name) {
                record.folder_path = moved.to.clone();
                if let Some(status) = moved.status {
                    record.set_status(status);
                }
                summary.moved += 1;
            }
        }

        for restaged in &plan.restaged {
            if let Some(record) = ledger.get_mut(&restaged.job_name) {
                record.set_status(restaged.on_disk);
                summary.restaged += 1;
            }
        }

        for folder in &plan.untracked {
            if folder_to_record(ledger, &folder.path).is_some() {
                continue;
            }
            let job_name = naming::make_unique(
                &tracker.job_name_for_folder(folder),
                ledger.records().map(|r| r.job_name.as_str()),
            );
            let mut record = JobRecord {
                job_name: job_name.clone(),
                dynamic_job_name: job_name.clone(),
                status: JobStatus::Queued,
                folder_path: folder.path.clone(),
                created_on_date: created_on.clone(),
                sender_name: UNKNOWN_SENDER.to_string(),
                sender_mail_address: None,
                sender_mail_receive_time: None,
                files: tracker.synthesize_files(&job_name, &folder.path)?,
            };
            record.set_status(folder.status.unwrap_or(JobStatus::Queued));
            ledger.insert(job_name.clone(), record);
            summary.added.push(job_name);
        }

        Ok(summary)
    })?;

    info!(
        "Repair: {} moved, {} restaged, {} added",
        summary.moved,
        summary.restaged,
        summary.added.len()
    );
    Ok(summary)
}
