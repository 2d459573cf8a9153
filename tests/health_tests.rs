use std::fs;

use job_ledger::health::check_tracker_file_health;
use job_ledger::{
    AppConfig, HealthOutcome, JobKind, JobTracker, LaserJobTracker, LedgerStore, PrintJobTracker,
    ScriptedConfirm,
};
use tempfile::tempdir;

const VALID_BACKUP: &str = r#"{
    "Jan": {
        "job_name": "Jan",
        "dynamic_job_name": "Jan",
        "status": "queued",
        "folder_path": "/jobs/Jan",
        "created_on_date": "01-02-2024",
        "sender_name": "Jan"
    }
}"#;

#[test]
fn test_missing_without_backup_creates_empty() {
    let dir = tempdir().unwrap();
    let store = LedgerStore::new(dir.path().join("laser_job_log.json"));

    let mut prompt = ScriptedConfirm::default();
    let outcome = check_tracker_file_health(&store, &mut prompt).unwrap();

    assert_eq!(outcome, HealthOutcome::CreatedEmpty);
    assert!(prompt.asked.is_empty());
    assert!(store.read().unwrap().is_empty());
}

#[test]
fn test_missing_with_backup_restores_when_accepted() {
    let dir = tempdir().unwrap();
    let store = LedgerStore::new(dir.path().join("laser_job_log.json"));
    fs::write(store.backup_path(), VALID_BACKUP).unwrap();

    let mut prompt = ScriptedConfirm::new([true]);
    let outcome = check_tracker_file_health(&store, &mut prompt).unwrap();

    assert_eq!(outcome, HealthOutcome::RestoredBackup);
    assert_eq!(prompt.asked.len(), 1);
    assert!(!store.backup_exists());
    assert_eq!(fs::read_to_string(store.path()).unwrap(), VALID_BACKUP);
}

#[test]
fn test_missing_with_backup_declined_creates_empty() {
    let dir = tempdir().unwrap();
    let store = LedgerStore::new(dir.path().join("laser_job_log.json"));
    fs::write(store.backup_path(), VALID_BACKUP).unwrap();

    let mut prompt = ScriptedConfirm::new([false]);
    let outcome = check_tracker_file_health(&store, &mut prompt).unwrap();

    assert_eq!(outcome, HealthOutcome::CreatedEmpty);
    assert!(store.read().unwrap().is_empty());
    assert!(store.backup_exists());
}

#[test]
fn test_corrupt_with_backup_restores_by_rename() {
    let dir = tempdir().unwrap();
    let store = LedgerStore::new(dir.path().join("laser_job_log.json"));
    fs::write(store.path(), "{\"Jan\": {").unwrap();
    fs::write(store.backup_path(), VALID_BACKUP).unwrap();
    let backup_bytes = fs::read(store.backup_path()).unwrap();

    let mut prompt = ScriptedConfirm::new([true]);
    let outcome = check_tracker_file_health(&store, &mut prompt).unwrap();

    assert_eq!(outcome, HealthOutcome::RestoredBackup);
    assert_eq!(fs::read(store.path()).unwrap(), backup_bytes);
    assert!(!store.backup_path().exists());
}

#[test]
fn test_corrupt_declining_restore_offers_empty() {
    let dir = tempdir().unwrap();
    let store = LedgerStore::new(dir.path().join("laser_job_log.json"));
    fs::write(store.path(), "garbage").unwrap();
    fs::write(store.backup_path(), VALID_BACKUP).unwrap();

    let mut prompt = ScriptedConfirm::new([false, true]);
    let outcome = check_tracker_file_health(&store, &mut prompt).unwrap();

    assert_eq!(outcome, HealthOutcome::ReplacedWithEmpty);
    assert_eq!(prompt.asked.len(), 2);
    assert!(store.read().unwrap().is_empty());
}

#[test]
fn test_corrupt_without_backup_replaced_when_accepted() {
    let dir = tempdir().unwrap();
    let store = LedgerStore::new(dir.path().join("laser_job_log.json"));
    fs::write(store.path(), "garbage").unwrap();

    let mut prompt = ScriptedConfirm::new([true]);
    let outcome = check_tracker_file_health(&store, &mut prompt).unwrap();

    assert_eq!(outcome, HealthOutcome::ReplacedWithEmpty);
    assert_eq!(prompt.asked.len(), 1);
}

#[test]
fn test_corrupt_declining_everything_leaves_file() {
    let dir = tempdir().unwrap();
    let store = LedgerStore::new(dir.path().join("laser_job_log.json"));
    fs::write(store.path(), "garbage").unwrap();
    fs::write(store.backup_path(), VALID_BACKUP).unwrap();

    let mut prompt = ScriptedConfirm::new([false, false]);
    let outcome = check_tracker_file_health(&store, &mut prompt).unwrap();

    assert_eq!(outcome, HealthOutcome::NeedsManualRepair);
    assert!(!outcome.is_usable());
    assert_eq!(fs::read_to_string(store.path()).unwrap(), "garbage");
    assert_eq!(fs::read_to_string(store.backup_path()).unwrap(), VALID_BACKUP);
}

#[test]
fn test_tracker_check_health_creates_job_dirs() {
    let dir = tempdir().unwrap();
    let config = AppConfig::with_data_dir(dir.path());

    let laser = LaserJobTracker::new(&config);
    let outcome = laser.check_health(&mut ScriptedConfirm::default()).unwrap();
    assert_eq!(outcome, HealthOutcome::CreatedEmpty);
    assert!(config.jobs_dir(JobKind::Laser).is_dir());
    assert!(config.tracker_file(JobKind::Laser).is_file());

    let print = PrintJobTracker::new(&config);
    print.check_health(&mut ScriptedConfirm::default()).unwrap();
    for stage in ["WACHTRIJ", "AAN_HET_PRINTEN", "GESLICED", "VERWERKT"] {
        assert!(config.jobs_dir(JobKind::Print).join(stage).is_dir());
    }
}

#[test]
fn test_tracker_check_health_skips_dirs_when_unusable() {
    let dir = tempdir().unwrap();
    let config = AppConfig::with_data_dir(dir.path());
    fs::write(config.tracker_file(JobKind::Laser), "garbage").unwrap();

    let laser = LaserJobTracker::new(&config);
    let outcome = laser.check_health(&mut ScriptedConfirm::default()).unwrap();
    assert_eq!(outcome, HealthOutcome::NeedsManualRepair);
    assert!(!config.jobs_dir(JobKind::Laser).exists());
}
