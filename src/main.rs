mod cli;
mod logging;
mod utils;

use std::fs;
use std::path::Path;
use std::process;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, FileSpec};
use colored::*;
use dotenv::dotenv;
use job_ledger::repair::{apply_repair, plan_repair};
use job_ledger::tracker::laser::laser_file_name;
use job_ledger::{
    AppConfig, AutoConfirm, Confirm, JobFile, JobKind, JobStatus, JobTracker, LaserJobTracker,
    NewJob, PrintJobTracker,
};
use tracing::{error, info};
use utils::prompt::TerminalConfirm;

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match job_ledger::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let mut prompt: Box<dyn Confirm> = if args.yes {
        Box::new(AutoConfirm(true))
    } else if args.no {
        Box::new(AutoConfirm(false))
    } else {
        Box::new(TerminalConfirm)
    };

    let Some(command) = args.command else {
        let _ = Cli::command().print_long_help();
        return;
    };

    let result = match JobKind::from(args.kind) {
        JobKind::Print => run(&PrintJobTracker::new(&config), &config, command, prompt.as_mut()),
        JobKind::Laser => {
            let tracker = LaserJobTracker::new(&config);
            match command {
                Commands::Materials => run_materials(&tracker, prompt.as_mut()),
                Commands::FileDone { job, file_key, undo } => {
                    run_file_done(&tracker, &job, &file_key, !undo, prompt.as_mut())
                }
                command => run(&tracker, &config, command, prompt.as_mut()),
            }
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

/// Health check every command runs first. Gives up when the tracker file
/// needs manual repair.
fn ensure_healthy<T: JobTracker>(tracker: &T, prompt: &mut dyn Confirm) -> anyhow::Result<()> {
    let outcome = tracker.check_health(prompt)?;
    if !outcome.is_usable() {
        bail!(
            "tracker file {} needs manual repair",
            tracker.store().path().display()
        );
    }
    Ok(())
}

fn run<T: JobTracker>(
    tracker: &T,
    config: &AppConfig,
    command: Commands,
    prompt: &mut dyn Confirm,
) -> anyhow::Result<()> {
    match &command {
        Commands::PrintConfig => {
            println!("Configuration: {:#?}", config);
            return Ok(());
        }
        Commands::WriteConfig { path } => {
            fs::write(path, config.to_toml()?)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Configuration written to {}", path.display());
            return Ok(());
        }
        Commands::CheckHealth => {
            let outcome = tracker.check_health(prompt)?;
            println!("{:?}", outcome);
            if !outcome.is_usable() {
                bail!("tracker file needs manual repair");
            }
            return Ok(());
        }
        _ => ensure_healthy(tracker, prompt)?,
    }

    match command {
        Commands::Backup => {
            tracker.make_backup()?;
            info!("Backup written to {}", tracker.store().backup_path().display());
        }
        Commands::Add {
            name,
            sender,
            folder,
            files,
            mail,
            received,
        } => run_add(tracker, &name, &sender, folder.as_deref(), &files, mail, received)?,
        Commands::List { status, csv } => run_list(tracker, status, csv.as_deref())?,
        Commands::Count { statuses } => {
            println!("{}", tracker.count_jobs_with_status(&statuses)?);
        }
        Commands::SetStatus { job, status } => {
            let record = tracker.update_job_status(&job, status)?;
            println!(
                "{} -> {}",
                record.job_name,
                utils::colored_status(record.status, tracker.status_label(record.status))
            );
        }
        Commands::Rename { job, display_name } => {
            let record = tracker.set_dynamic_job_name(&job, &display_name)?;
            println!("{} -> {}", record.job_name, record.dynamic_job_name);
        }
        Commands::UniqueName { name } => {
            println!("{}", tracker.make_job_name_unique(&name)?);
        }
        Commands::IsOld { date } => {
            println!("{}", tracker.is_job_old(&date)?);
        }
        Commands::Repair { apply } => run_repair(tracker, apply)?,
        Commands::Prune { apply } => {
            if apply {
                for record in tracker.prune_old_jobs()? {
                    println!("removed {}", record.job_name.red());
                }
            } else {
                for names in tracker.old_jobs()? {
                    println!("{}", names.job_name);
                }
            }
        }
        Commands::Materials | Commands::FileDone { .. } => {
            bail!("only available for laser jobs, use --kind laser");
        }
        Commands::PrintConfig | Commands::WriteConfig { .. } | Commands::CheckHealth => {}
    }

    Ok(())
}

fn run_add<T: JobTracker>(
    tracker: &T,
    name: &str,
    sender: &str,
    folder: Option<&Path>,
    files: &[FileSpec],
    mail: Option<String>,
    received: Option<String>,
) -> anyhow::Result<()> {
    let job_name = tracker.make_job_name_unique(name)?;
    if job_name != name {
        info!("Job name {} is taken, using {}", name, job_name);
    }

    let folder = folder
        .map(Path::to_path_buf)
        .unwrap_or_else(|| tracker.default_job_folder(&job_name));

    let mut job = NewJob::new(job_name.as_str(), sender, folder.as_path());
    if let Some(address) = mail {
        job = job.with_sender_mail(address, received);
    }

    for spec in files {
        let original = spec
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", spec.path.display()))?;
        let file_name = laser_file_name(&spec.material, &spec.thickness, &spec.amount, &original);
        let file = JobFile::new(
            file_name.as_str(),
            folder.join(&file_name),
            &spec.material,
            &spec.thickness,
            &spec.amount,
        )?;
        job = job.with_file(file);
    }

    let record = tracker.add_job(job)?;
    fs::create_dir_all(&record.folder_path)
        .with_context(|| format!("creating {}", record.folder_path.display()))?;

    println!(
        "{} job {} created in {}",
        tracker.kind().as_str(),
        record.job_name.green(),
        record.folder_path.display()
    );
    println!("{} jobs in queue", tracker.count_jobs_in_queue()?);
    Ok(())
}

fn run_list<T: JobTracker>(
    tracker: &T,
    status: Option<JobStatus>,
    csv_path: Option<&Path>,
) -> anyhow::Result<()> {
    let ledger = tracker.read_ledger()?;
    let records: Vec<_> = ledger
        .records()
        .filter(|r| status.map_or(true, |s| r.status == s))
        .collect();

    for record in &records {
        let label = tracker.status_label(record.status);
        let old = match tracker.is_job_old(&record.created_on_date) {
            Ok(true) => " (old)".dimmed().to_string(),
            _ => String::new(),
        };
        println!(
            "{:<30} {:<30} {}{}",
            record.job_name,
            record.dynamic_job_name,
            utils::colored_status(record.status, label),
            old
        );
    }

    if let Some(path) = csv_path {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;
        writer.write_record([
            "job_name",
            "dynamic_job_name",
            "status",
            "created_on_date",
            "folder_path",
        ])?;
        for record in &records {
            let folder = record.folder_path.to_string_lossy();
            writer.write_record([
                record.job_name.as_str(),
                record.dynamic_job_name.as_str(),
                record.status.as_str(),
                record.created_on_date.as_str(),
                folder.as_ref(),
            ])?;
        }
        writer.flush()?;
        info!("{} jobs written to {}", records.len(), path.display());
    }

    Ok(())
}

fn run_repair<T: JobTracker>(tracker: &T, apply: bool) -> anyhow::Result<()> {
    let plan = plan_repair(tracker)?;
    if plan.is_clean() {
        println!("{}", "Tracker and job folders agree".green());
        return Ok(());
    }

    for moved in &plan.moved {
        println!(
            "{} {}: {} -> {}",
            "moved".yellow(),
            moved.job_name,
            moved.from.display(),
            moved.to.display()
        );
    }
    for restaged in &plan.restaged {
        println!(
            "{} {}: {} -> {}",
            "restaged".yellow(),
            restaged.job_name,
            tracker.status_label(restaged.recorded),
            tracker.status_label(restaged.on_disk)
        );
    }
    for missing in &plan.missing {
        println!(
            "{} {}: {}",
            "missing".red(),
            missing.job_name,
            missing.folder_path.display()
        );
    }
    for folder in &plan.untracked {
        println!("{} {}", "untracked".cyan(), folder.path.display());
    }

    if apply {
        let summary = apply_repair(tracker, &plan)?;
        println!(
            "{} moved, {} restaged, {} added",
            summary.moved,
            summary.restaged,
            summary.added.len()
        );
    } else {
        println!("Run again with --apply to update the tracker file");
    }
    Ok(())
}

fn run_materials(tracker: &LaserJobTracker, prompt: &mut dyn Confirm) -> anyhow::Result<()> {
    ensure_healthy(tracker, prompt)?;
    for material in tracker.known_materials()? {
        println!("{}", material);
    }
    Ok(())
}

fn run_file_done(
    tracker: &LaserJobTracker,
    job: &str,
    file_key: &str,
    done: bool,
    prompt: &mut dyn Confirm,
) -> anyhow::Result<()> {
    ensure_healthy(tracker, prompt)?;
    let record = tracker.mark_file_done(job, file_key, done)?;
    let remaining = record.files.values().filter(|f| !f.done).count();
    println!("{} files left in {}", remaining, record.job_name);
    Ok(())
}
