pub mod prompt;

use colored::{ColoredString, Colorize};
use job_ledger::JobStatus;

pub fn colored_status(status: JobStatus, label: &str) -> ColoredString {
    match status {
        JobStatus::Queued => label.yellow(),
        JobStatus::InProgress => label.cyan(),
        JobStatus::Ready => label.green(),
        JobStatus::Processed => label.dimmed(),
    }
}
