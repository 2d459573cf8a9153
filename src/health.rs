//! Tracker file health check and recovery.
//!
//! A missing tracker file is recreated (or restored from its backup), a
//! corrupt one is only replaced after the operator agrees. When the operator
//! declines every option the file is left untouched.

use std::collections::VecDeque;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::ledger::{is_schema_mismatch, LedgerState, LedgerStore};

/// Asks the operator a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Answers every question the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _question: &str) -> bool {
        self.0
    }
}

/// Replays a fixed list of answers and records the questions asked.
/// Once the answers run out every further question is declined.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    pub asked: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        self.asked.push(question.to_string());
        self.answers.pop_front().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthOutcome {
    AlreadyValid,
    CreatedEmpty,
    RestoredBackup,
    ReplacedWithEmpty,
    NeedsManualRepair,
}

impl HealthOutcome {
    pub fn is_usable(&self) -> bool {
        !matches!(self, HealthOutcome::NeedsManualRepair)
    }
}

fn has_valid_backup(store: &LedgerStore) -> Result<bool> {
    match store.backup_state()? {
        LedgerState::Valid(_) => Ok(true),
        LedgerState::Missing => Ok(false),
        LedgerState::Corrupt(e) => {
            warn!(
                "Backup {} is corrupt and will not be offered: {}",
                store.backup_path().display(),
                e
            );
            Ok(false)
        }
    }
}

pub fn check_tracker_file_health(
    store: &LedgerStore,
    prompt: &mut dyn Confirm,
) -> Result<HealthOutcome> {
    match store.state()? {
        LedgerState::Valid(_) => Ok(HealthOutcome::AlreadyValid),
        LedgerState::Missing => create_tracker_file(store, prompt),
        LedgerState::Corrupt(e) => {
            let readable = is_schema_mismatch(&e);
            if readable {
                warn!(
                    "Tracker file {} is valid JSON but not in tracker format: {}",
                    store.path().display(),
                    e
                );
            } else {
                warn!("Tracker file {} is corrupt: {}", store.path().display(), e);
            }
            repair_corrupt_tracker_file(store, readable, prompt)
        }
    }
}

fn create_tracker_file(store: &LedgerStore, prompt: &mut dyn Confirm) -> Result<HealthOutcome> {
    if has_valid_backup(store)? {
        let question = format!(
            "Backup file detected at: {}, do you want to restore it?",
            store.backup_path().display()
        );
        if prompt.confirm(&question) {
            store.restore_backup()?;
            info!("Backup restored!");
            return Ok(HealthOutcome::RestoredBackup);
        }
    }

    store.write_empty()?;
    info!("New job tracker file created at {}", store.path().display());
    Ok(HealthOutcome::CreatedEmpty)
}

/// `readable` means the file is valid JSON that did not match the tracker
/// format; the operator is told so before being offered an empty file.
fn repair_corrupt_tracker_file(
    store: &LedgerStore,
    readable: bool,
    prompt: &mut dyn Confirm,
) -> Result<HealthOutcome> {
    if has_valid_backup(store)?
        && prompt.confirm("Do you want to restore the backup tracker file?")
    {
        store.restore_backup()?;
        info!("Backup restored!");
        return Ok(HealthOutcome::RestoredBackup);
    }

    let question = if readable {
        format!(
            "Tracker file {} is readable JSON but not in tracker format, do you want to replace it with a new empty tracker file?",
            store.path().display()
        )
    } else {
        "Do you want to create a new empty tracker file?".to_string()
    };
    if prompt.confirm(&question) {
        store.write_empty()?;
        info!("Corrupt tracker file replaced by an empty one");
        return Ok(HealthOutcome::ReplacedWithEmpty);
    }

    error!("MANUALLY REPAIR TRACKER FILE: {}", store.path().display());
    Ok(HealthOutcome::NeedsManualRepair)
}
