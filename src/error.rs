use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Tracker file not found: {}", .0.display())]
    MissingLedger(PathBuf),

    #[error("Tracker file {} is corrupt: {source}", path.display())]
    CorruptLedger {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Could not serialize tracker: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("File {file_key} not found in job {job_name}")]
    FileNotFound { job_name: String, file_key: String },

    #[error("Job name already in tracker: {0}")]
    DuplicateJobName(String),

    #[error("Folder {} already tracked by job {job_name}", folder.display())]
    DuplicateFolder { folder: PathBuf, job_name: String },

    #[error("Invalid date '{0}', expected DD-MM-YYYY")]
    InvalidDate(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("Invalid file info: {0}")]
    InvalidFile(String),
}
