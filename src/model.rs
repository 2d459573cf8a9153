use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Which tracker a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Print,
    Laser,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Print => "print",
            JobKind::Laser => "laser",
        }
    }
}

/// Workflow stage of a job.
///
/// Serialized as snake_case. The stage folder names used on the shop's
/// print share are accepted when reading older tracker files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[serde(alias = "WACHTRIJ")]
    Queued,
    #[serde(alias = "AAN_HET_PRINTEN", alias = "AAN_HET_SNIJDEN")]
    InProgress,
    #[serde(alias = "GESLICED")]
    Ready,
    #[serde(alias = "VERWERKT")]
    Processed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Queued,
        JobStatus::InProgress,
        JobStatus::Ready,
        JobStatus::Processed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::InProgress => "in_progress",
            JobStatus::Ready => "ready",
            JobStatus::Processed => "processed",
        }
    }

    /// Name of the stage folder a print job sits in for this status.
    pub fn stage_folder(&self) -> &'static str {
        match self {
            JobStatus::Queued => "WACHTRIJ",
            JobStatus::InProgress => "AAN_HET_PRINTEN",
            JobStatus::Ready => "GESLICED",
            JobStatus::Processed => "VERWERKT",
        }
    }

    pub fn from_stage_folder(name: &str) -> Option<JobStatus> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.stage_folder().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        JobStatus::ALL
            .into_iter()
            .find(|status| {
                status.as_str().eq_ignore_ascii_case(trimmed)
                    || status.stage_folder().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| Error::InvalidJob(format!("unknown status '{}'", s)))
    }
}

/// One file of a laser job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFile {
    pub file_name: String,
    pub file_global_path: PathBuf,
    pub material: String,
    pub thickness: String,
    pub amount: String,
    #[serde(default)]
    pub done: bool,
}

impl JobFile {
    /// Validated file entry. Thickness must be a positive number (comma or
    /// dot decimal separator), amount a positive whole number.
    pub fn new(
        file_name: impl Into<String>,
        file_global_path: impl Into<PathBuf>,
        material: &str,
        thickness: &str,
        amount: &str,
    ) -> Result<Self, Error> {
        let material = material.trim();
        let thickness = thickness.trim();
        let amount = amount.trim();

        if material.is_empty() {
            return Err(Error::InvalidFile("material is empty".to_string()));
        }

        match thickness.replace(',', ".").parse::<f64>() {
            Ok(value) if value > 0.0 && value.is_finite() => {}
            _ => {
                return Err(Error::InvalidFile(format!(
                    "thickness '{}' is not a positive number",
                    thickness
                )))
            }
        }

        match amount.parse::<u32>() {
            Ok(value) if value > 0 => {}
            _ => {
                return Err(Error::InvalidFile(format!(
                    "amount '{}' is not a positive whole number",
                    amount
                )))
            }
        }

        Ok(Self {
            file_name: file_name.into(),
            file_global_path: file_global_path.into(),
            material: material.to_string(),
            thickness: thickness.to_string(),
            amount: amount.to_string(),
            done: false,
        })
    }
}

/// A job as stored in the tracker file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_name: String,
    pub dynamic_job_name: String,
    pub status: JobStatus,
    #[serde(alias = "job_folder_global_path")]
    pub folder_path: PathBuf,
    pub created_on_date: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_mail_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_mail_receive_time: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", alias = "laser_files")]
    pub files: BTreeMap<String, JobFile>,
}

impl JobRecord {
    /// Change the status. Reaching `Processed` marks every file done.
    pub fn set_status(&mut self, status: JobStatus) {
        self.status = status;
        if status == JobStatus::Processed {
            for file in self.files.values_mut() {
                file.done = true;
            }
        }
    }

    pub fn names(&self) -> JobNames {
        JobNames {
            job_name: self.job_name.clone(),
            dynamic_job_name: self.dynamic_job_name.clone(),
        }
    }
}

/// Static and display name of a job, as shown in job lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobNames {
    pub job_name: String,
    pub dynamic_job_name: String,
}

/// Input for adding a job to a tracker.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_name: String,
    pub sender_name: String,
    pub folder_path: PathBuf,
    pub files: BTreeMap<String, JobFile>,
    pub sender_mail_address: Option<String>,
    pub sender_mail_receive_time: Option<String>,
}

impl NewJob {
    pub fn new(
        job_name: impl Into<String>,
        sender_name: impl Into<String>,
        folder_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            sender_name: sender_name.into(),
            folder_path: folder_path.into(),
            files: BTreeMap::new(),
            sender_mail_address: None,
            sender_mail_receive_time: None,
        }
    }

    /// Add a file keyed `<job_name>_<file_name>`.
    pub fn with_file(mut self, file: JobFile) -> Self {
        let key = format!("{}_{}", self.job_name, file.file_name);
        self.files.insert(key, file);
        self
    }

    pub fn with_sender_mail(
        mut self,
        address: impl Into<String>,
        receive_time: Option<String>,
    ) -> Self {
        self.sender_mail_address = Some(address.into());
        self.sender_mail_receive_time = receive_time;
        self
    }
}
