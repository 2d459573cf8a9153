use std::fs;

use chrono::Duration;
use job_ledger::tracker::{format_created_on, today};
use job_ledger::{
    AppConfig, Error, JobFile, JobKind, JobStatus, JobTracker, LaserJobTracker, NewJob,
    PrintJobTracker, ScriptedConfirm,
};
use tempfile::{tempdir, TempDir};

fn setup() -> (TempDir, AppConfig) {
    let dir = tempdir().unwrap();
    let config = AppConfig::with_data_dir(dir.path());
    (dir, config)
}

fn laser_job(tracker: &LaserJobTracker, name: &str, material: &str) -> NewJob {
    let folder = tracker.default_job_folder(name);
    let file_name = format!("{}_3mm_1x_part.dxf", material);
    let file = JobFile::new(
        file_name.as_str(),
        folder.join(&file_name),
        material,
        "3",
        "1",
    )
    .unwrap();
    NewJob::new(name, "Sender", folder).with_file(file)
}

fn print_tracker(config: &AppConfig) -> PrintJobTracker<'_> {
    let tracker = PrintJobTracker::new(config);
    tracker.check_health(&mut ScriptedConfirm::default()).unwrap();
    tracker
}

fn laser_tracker(config: &AppConfig) -> LaserJobTracker<'_> {
    let tracker = LaserJobTracker::new(config);
    tracker.check_health(&mut ScriptedConfirm::default()).unwrap();
    tracker
}

#[test]
fn test_add_job_sets_initial_fields() {
    let (_dir, config) = setup();
    let tracker = print_tracker(&config);

    let job = NewJob::new("Jan", "Jan Jansen", tracker.default_job_folder("Jan"))
        .with_sender_mail("jan@example.com", Some("05-03-2024 10:00".to_string()));
    let record = tracker.add_job(job).unwrap();

    assert_eq!(record.status, JobStatus::Queued);
    assert_eq!(record.dynamic_job_name, "Jan");
    assert_eq!(record.created_on_date, format_created_on(today()));
    assert_eq!(record.sender_mail_address.as_deref(), Some("jan@example.com"));
    assert_eq!(tracker.get_job("Jan").unwrap(), record);
}

#[test]
fn test_add_job_rejects_duplicates() {
    let (_dir, config) = setup();
    let tracker = print_tracker(&config);
    tracker
        .add_job(NewJob::new("Jan", "Jan", "/jobs/WACHTRIJ/Jan"))
        .unwrap();

    let same_name = tracker.add_job(NewJob::new("jan", "Jan", "/jobs/WACHTRIJ/other"));
    assert!(matches!(same_name, Err(Error::DuplicateJobName(_))));

    let same_folder = tracker.add_job(NewJob::new("Piet", "Piet", "/jobs/WACHTRIJ/Jan"));
    match same_folder {
        Err(Error::DuplicateFolder { job_name, .. }) => assert_eq!(job_name, "Jan"),
        other => panic!("expected duplicate folder, got {:?}", other),
    }

    assert_eq!(tracker.all_job_names().unwrap().len(), 1);
}

#[test]
fn test_add_job_folds_accents_when_checking_names() {
    let (_dir, config) = setup();
    let tracker = print_tracker(&config);
    tracker
        .add_job(NewJob::new("Cafe", "x", "/jobs/WACHTRIJ/Cafe"))
        .unwrap();

    let accented = tracker.add_job(NewJob::new("Café", "x", "/jobs/WACHTRIJ/Café"));
    assert!(matches!(accented, Err(Error::DuplicateJobName(_))));

    let shouting = tracker.add_job(NewJob::new("CAFÉ", "x", "/jobs/WACHTRIJ/CAFE"));
    assert!(matches!(shouting, Err(Error::DuplicateJobName(_))));

    let names: Vec<String> = tracker
        .all_job_names()
        .unwrap()
        .into_iter()
        .map(|n| n.job_name)
        .collect();
    assert_eq!(names, vec!["Cafe"]);
}

#[test]
fn test_unique_name_sees_accented_ledger_names() {
    let (_dir, config) = setup();
    let tracker = print_tracker(&config);
    tracker
        .add_job(NewJob::new("Café", "x", "/jobs/WACHTRIJ/Café"))
        .unwrap();

    let unique = tracker.make_job_name_unique("Café").unwrap();
    assert_eq!(unique, "Cafe_(1)");
    assert!(tracker
        .add_job(NewJob::new(unique.as_str(), "x", "/jobs/WACHTRIJ/Cafe_(1)"))
        .is_ok());
}

#[test]
fn test_add_job_validates_per_kind() {
    let (_dir, config) = setup();
    let laser = laser_tracker(&config);
    let print = print_tracker(&config);

    let no_files = laser.add_job(NewJob::new("Jan", "Jan", laser.default_job_folder("Jan")));
    assert!(matches!(no_files, Err(Error::InvalidJob(_))));

    let with_files = laser_job(&laser, "Jan", "mdf");
    assert!(matches!(print.add_job(with_files.clone()), Err(Error::InvalidJob(_))));
    assert!(laser.add_job(with_files).is_ok());

    let empty_name = print.add_job(NewJob::new("  ", "x", "/jobs/x"));
    assert!(matches!(empty_name, Err(Error::InvalidJob(_))));
}

#[test]
fn test_add_job_snapshots_previous_ledger() {
    let (_dir, config) = setup();
    let tracker = print_tracker(&config);
    tracker.add_job(NewJob::new("Jan", "Jan", "/jobs/Jan")).unwrap();
    let before_second = fs::read(tracker.store().path()).unwrap();

    tracker.add_job(NewJob::new("Piet", "Piet", "/jobs/Piet")).unwrap();

    assert_eq!(fs::read(tracker.store().backup_path()).unwrap(), before_second);
}

#[test]
fn test_status_queries() {
    let (_dir, config) = setup();
    let tracker = print_tracker(&config);

    for name in ["a", "b", "c", "d", "e"] {
        tracker
            .add_job(NewJob::new(name, name, format!("/jobs/{}", name)))
            .unwrap();
    }
    for name in ["a", "c", "e"] {
        tracker.update_job_status(name, JobStatus::Ready).unwrap();
    }

    assert_eq!(tracker.count_jobs_with_status(&[JobStatus::Ready]).unwrap(), 3);
    assert_eq!(tracker.count_jobs_in_queue().unwrap(), 2);
    assert_eq!(
        tracker
            .count_jobs_with_status(&[JobStatus::Ready, JobStatus::Queued])
            .unwrap(),
        5
    );

    let ready: Vec<String> = tracker
        .jobs_with_status(JobStatus::Ready)
        .unwrap()
        .into_iter()
        .map(|n| n.job_name)
        .collect();
    assert_eq!(ready, vec!["a", "c", "e"]);

    let all: Vec<String> = tracker
        .all_job_names()
        .unwrap()
        .into_iter()
        .map(|n| n.job_name)
        .collect();
    assert_eq!(all, vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn test_update_status_to_processed_marks_files_done() {
    let (_dir, config) = setup();
    let tracker = laser_tracker(&config);
    tracker.add_job(laser_job(&tracker, "Jan", "mdf")).unwrap();

    let cutting = tracker.update_job_status("Jan", JobStatus::InProgress).unwrap();
    assert!(cutting.files.values().all(|f| !f.done));

    let processed = tracker.update_job_status("Jan", JobStatus::Processed).unwrap();
    assert!(processed.files.values().all(|f| f.done));
    assert_eq!(tracker.get_job("Jan").unwrap(), processed);
}

#[test]
fn test_update_unknown_job_fails() {
    let (_dir, config) = setup();
    let tracker = print_tracker(&config);
    assert!(matches!(
        tracker.update_job_status("ghost", JobStatus::Ready),
        Err(Error::JobNotFound(_))
    ));
}

#[test]
fn test_dynamic_name_changes_display_only() {
    let (_dir, config) = setup();
    let tracker = print_tracker(&config);
    tracker.add_job(NewJob::new("Jan", "Jan", "/jobs/Jan")).unwrap();

    tracker.set_dynamic_job_name("Jan", "Jan (2 plates)").unwrap();

    let names = tracker.all_job_names().unwrap();
    assert_eq!(names[0].job_name, "Jan");
    assert_eq!(names[0].dynamic_job_name, "Jan (2 plates)");
}

#[test]
fn test_make_job_name_unique_against_ledger() {
    let (_dir, config) = setup();
    let tracker = print_tracker(&config);

    assert_eq!(tracker.make_job_name_unique("Jan").unwrap(), "Jan");

    for name in ["Jan", "Jan_(1)", "Jan_(3)"] {
        tracker
            .add_job(NewJob::new(name, "Jan", format!("/jobs/{}", name)))
            .unwrap();
    }
    assert_eq!(tracker.make_job_name_unique("Jan").unwrap(), "Jan_(4)");

    tracker
        .add_job(NewJob::new("Cafe", "Cafe", "/jobs/Cafe"))
        .unwrap();
    assert_eq!(tracker.make_job_name_unique("Café").unwrap(), "Cafe_(1)");
}

#[test]
fn test_find_by_folder() {
    let (_dir, config) = setup();
    let tracker = print_tracker(&config);
    let folder = tracker.default_job_folder("Jan");
    tracker.add_job(NewJob::new("Jan", "Jan", folder.as_path())).unwrap();

    let (name, record) = tracker.find_by_folder(&folder).unwrap().unwrap();
    assert_eq!(name, "Jan");
    assert_eq!(record.folder_path, folder);
    assert!(tracker
        .find_by_folder(&folder.join("nested"))
        .unwrap()
        .is_none());
}

#[test]
fn test_laser_job_folder_is_dated() {
    let (_dir, config) = setup();
    let tracker = laser_tracker(&config);

    let folder = tracker.default_job_folder("Jan");
    let expected = format!("{}_Jan", today().format("%d-%m"));
    assert_eq!(folder, config.jobs_dir(JobKind::Laser).join(expected));
}

#[test]
fn test_is_job_old_uses_configured_retention() {
    let (_dir, mut config) = setup();
    config.days_to_keep_jobs = 7;
    let tracker = print_tracker(&config);

    let now = today();
    assert!(!tracker.is_job_old(&format_created_on(now)).unwrap());
    assert!(!tracker
        .is_job_old(&format_created_on(now - Duration::days(7)))
        .unwrap());
    assert!(tracker
        .is_job_old(&format_created_on(now - Duration::days(8)))
        .unwrap());
    assert!(matches!(tracker.is_job_old("2024-01-01"), Err(Error::InvalidDate(_))));
}

#[test]
fn test_prune_drops_only_old_processed_jobs() {
    let (_dir, config) = setup();
    let tracker = print_tracker(&config);
    let long_ago = today() - Duration::days(config.days_to_keep_jobs + 1);

    tracker
        .add_job_on(NewJob::new("old_done", "x", "/jobs/old_done"), long_ago)
        .unwrap();
    tracker
        .add_job_on(NewJob::new("old_queued", "x", "/jobs/old_queued"), long_ago)
        .unwrap();
    tracker
        .add_job(NewJob::new("new_done", "x", "/jobs/new_done"))
        .unwrap();
    tracker.update_job_status("old_done", JobStatus::Processed).unwrap();
    tracker.update_job_status("new_done", JobStatus::Processed).unwrap();

    let old: Vec<String> = tracker.old_jobs().unwrap().into_iter().map(|n| n.job_name).collect();
    assert_eq!(old, vec!["old_done"]);

    let removed = tracker.prune_old_jobs().unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].job_name, "old_done");

    let left: Vec<String> = tracker
        .all_job_names()
        .unwrap()
        .into_iter()
        .map(|n| n.job_name)
        .collect();
    assert_eq!(left, vec!["old_queued", "new_done"]);
}

#[test]
fn test_laser_materials_and_file_done() {
    let (_dir, config) = setup();
    let tracker = laser_tracker(&config);
    tracker.add_job(laser_job(&tracker, "Jan", "triplex")).unwrap();
    tracker.add_job(laser_job(&tracker, "Piet", "plexiglas")).unwrap();

    assert_eq!(tracker.existing_materials().unwrap(), vec!["plexiglas", "triplex"]);
    let known = tracker.known_materials().unwrap();
    assert!(known.contains(&"mdf".to_string()));
    assert!(known.contains(&"plexiglas".to_string()));

    let key = "Jan_triplex_3mm_1x_part.dxf";
    let record = tracker.mark_file_done("Jan", key, true).unwrap();
    assert!(record.files[key].done);

    assert!(matches!(
        tracker.mark_file_done("Jan", "nope", true),
        Err(Error::FileNotFound { .. })
    ));
}

#[test]
fn test_accessors_report_corrupt_ledger() {
    let (_dir, config) = setup();
    fs::write(config.tracker_file(JobKind::Print), "{ broken").unwrap();
    let tracker = PrintJobTracker::new(&config);

    assert!(matches!(tracker.all_job_names(), Err(Error::CorruptLedger { .. })));
    assert!(matches!(
        tracker.make_job_name_unique("Jan"),
        Err(Error::CorruptLedger { .. })
    ));
}
