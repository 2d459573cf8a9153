use clap::{Parser, Subcommand, ValueEnum};
use job_ledger::{JobKind, JobStatus};
use std::path::PathBuf;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "job-ledger")]
#[command(about = "Job tracker for the print and laser workshop", long_about = None)]
pub struct Cli {
    /// Tracker to work on
    #[arg(long, value_enum, default_value_t = Kind::Laser, global = true)]
    pub kind: Kind,

    /// Answer yes to every recovery question
    #[arg(long, global = true, conflicts_with = "no")]
    pub yes: bool,

    /// Answer no to every recovery question
    #[arg(long, global = true)]
    pub no: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Kind {
    Print,
    Laser,
}

impl From<Kind> for JobKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Print => JobKind::Print,
            Kind::Laser => JobKind::Laser,
        }
    }
}

/// A laser file given on the command line as `material:thickness:amount:path`.
#[derive(Debug, Clone)]
pub struct FileSpec {
    pub material: String,
    pub thickness: String,
    pub amount: String,
    pub path: PathBuf,
}

pub fn parse_file_spec(s: &str) -> Result<FileSpec, String> {
    let mut parts = s.splitn(4, ':');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(material), Some(thickness), Some(amount), Some(path)) if !path.is_empty() => {
            Ok(FileSpec {
                material: material.to_string(),
                thickness: thickness.to_string(),
                amount: amount.to_string(),
                path: PathBuf::from(path),
            })
        }
        _ => Err(format!(
            "expected material:thickness:amount:path, got '{}'",
            s
        )),
    }
}

pub fn parse_status(s: &str) -> Result<JobStatus, String> {
    s.parse::<JobStatus>().map_err(|e| e.to_string())
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check the tracker file and restore or recreate it if needed
    CheckHealth,
    /// Copy the tracker file over its backup
    Backup,
    /// Add a job; the name is made unique first
    Add {
        name: String,
        #[arg(long, default_value = "No Sender Name")]
        sender: String,
        /// Job folder, defaults to a folder named after the job
        #[arg(long)]
        folder: Option<PathBuf>,
        /// Laser file as material:thickness:amount:path (repeatable)
        #[arg(long = "file", value_parser = parse_file_spec)]
        files: Vec<FileSpec>,
        #[arg(long)]
        mail: Option<String>,
        /// When the request mail was received
        #[arg(long)]
        received: Option<String>,
    },
    /// List jobs
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<JobStatus>,
        /// Also write the list to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Count jobs having any of the given statuses
    Count {
        #[arg(required = true, value_parser = parse_status)]
        statuses: Vec<JobStatus>,
    },
    /// Move a job to another status
    SetStatus {
        job: String,
        #[arg(value_parser = parse_status)]
        status: JobStatus,
    },
    /// Change the display name of a job
    Rename { job: String, display_name: String },
    /// Print the unique version of a job name
    UniqueName { name: String },
    /// Tell whether a job created on DD-MM-YYYY is past retention
    IsOld { date: String },
    /// Compare the tracker with the job folders on disk
    Repair {
        /// Write the fixes to the tracker file
        #[arg(long)]
        apply: bool,
    },
    /// List processed jobs past retention
    Prune {
        /// Remove them from the tracker file
        #[arg(long)]
        apply: bool,
    },
    /// List configured and used laser materials
    Materials,
    /// Mark a laser file done
    FileDone {
        job: String,
        file_key: String,
        /// Mark it not done instead
        #[arg(long)]
        undo: bool,
    },
    /// Print configuration values
    PrintConfig,
    /// Write the effective configuration as TOML
    WriteConfig {
        #[arg(default_value = "Config.toml")]
        path: PathBuf,
    },
}
