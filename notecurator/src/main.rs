use dotenv::dotenv;
use notecurator::backup::BackupManager;
use notecurator::backup::retention::parse_retention;
use notecurator::pipeline::approval::{ApprovalGate, AutoApprove, StdinGate, describe_plan};
use notecurator::{ConfigResolver, CurationContext, CuratorError, Outcome, Pipeline, RunOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const USAGE: &str = "Usage:
  notecurator <note.md> [--yes] [--dry-run] [--type <category>]
  notecurator backups <note.md>
  notecurator restore <note.md>
  notecurator prune <backup-dir> [retention]";

enum Command {
    Curate {
        note: PathBuf,
        options: RunOptions,
        assume_yes: bool,
    },
    Backups(PathBuf),
    Restore(PathBuf),
    Prune {
        dir: PathBuf,
        retention: Option<String>,
    },
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut iter = args.iter();
    let first = iter.next().ok_or_else(|| USAGE.to_string())?;

    match first.as_str() {
        "backups" => iter
            .next()
            .map(|p| Command::Backups(PathBuf::from(p)))
            .ok_or_else(|| USAGE.to_string()),
        "restore" => iter
            .next()
            .map(|p| Command::Restore(PathBuf::from(p)))
            .ok_or_else(|| USAGE.to_string()),
        "prune" => {
            let dir = iter.next().ok_or_else(|| USAGE.to_string())?;
            Ok(Command::Prune {
                dir: PathBuf::from(dir),
                retention: iter.next().cloned(),
            })
        }
        "-h" | "--help" => Err(USAGE.to_string()),
        note => {
            let mut options = RunOptions::default();
            let mut assume_yes = false;
            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--yes" | "-y" => assume_yes = true,
                    "--dry-run" => options.dry_run = true,
                    "--type" => {
                        let name = iter.next().ok_or("--type needs a category name")?;
                        options.forced_type = Some(name.clone());
                    }
                    other => return Err(format!("Unknown argument '{}'\n{}", other, USAGE)),
                }
            }
            Ok(Command::Curate {
                note: PathBuf::from(note),
                options,
                assume_yes,
            })
        }
    }
}

async fn curate(note: &Path, options: &RunOptions, assume_yes: bool) -> Result<(), CuratorError> {
    let resolver = ConfigResolver::new();
    let resolved = resolver.resolve(note);
    for source in &resolved.sources {
        log::info!("[CONFIG] Loaded {} config from {}", source.tier, source.path.display());
    }
    let retention = resolved.config.backup_retention.clone();
    let ctx = CurationContext::from_config(resolver, &resolved.config);

    let gate: &dyn ApprovalGate = if assume_yes { &AutoApprove } else { &StdinGate };
    let report = Pipeline::new(&ctx).run(note, gate, options).await?;

    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    match &report.outcome {
        Outcome::NoChanges => println!(
            "{}: already curated as {}",
            report.path.display(),
            report.category
        ),
        Outcome::DryRun => println!("{}", describe_plan(&report.plan)),
        Outcome::Rejected => println!("{}: no changes made", report.path.display()),
        Outcome::Applied { backup } => {
            println!(
                "{}: curated as {} (backup at {})",
                report.path.display(),
                report.category,
                backup.backup_path.display()
            );
            for follow_up in &report.follow_ups {
                println!("  follow-up: {}", follow_up);
            }
            match parse_retention(&retention) {
                Ok(age) => {
                    let dir = ctx.backups.backup_dir_for(&backup.original_path);
                    if let Err(e) = ctx.backups.prune_older_than(&dir, age) {
                        log::warn!("[BACKUP] Pruning {} failed: {}", dir.display(), e);
                    }
                }
                Err(e) => log::warn!("[BACKUP] {}", e),
            }
        }
    }
    Ok(())
}

fn list_backups(note: &Path) {
    let backups = BackupManager::default().list_backups(note);
    if backups.is_empty() {
        println!("No backups for {}", note.display());
    }
    for record in backups {
        println!(
            "{}  {:>8} bytes  {}",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.size,
            record.backup_path.display()
        );
    }
}

fn restore_latest(note: &Path) -> Result<(), CuratorError> {
    let manager = BackupManager::default();
    let Some(record) = manager.latest_backup(note) else {
        println!("No backups for {}", note.display());
        return Ok(());
    };
    manager.restore(&record)?;
    println!("Restored {} from {}", note.display(), record.backup_path.display());
    Ok(())
}

fn prune(dir: &Path, retention: Option<String>) -> Result<(), String> {
    let retention = match retention {
        Some(r) => r,
        None => ConfigResolver::new().resolve(dir).config.backup_retention,
    };
    let age = parse_retention(&retention)?;
    let removed = BackupManager::default()
        .prune_older_than(dir, age)
        .map_err(|e| e.to_string())?;
    println!("Removed {} backup(s) older than {}", removed, retention);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::from(2);
        }
    };

    let result = match command {
        Command::Curate {
            note,
            options,
            assume_yes,
        } => curate(&note, &options, assume_yes).await.map_err(|e| match e {
            CuratorError::ProcessingFailed { message, log } => {
                let mut out = vec![format!("Processing failed: {}", message)];
                out.extend(log.into_iter().map(|l| format!("  {}", l)));
                out.join("\n")
            }
            other => other.to_string(),
        }),
        Command::Backups(note) => {
            list_backups(&note);
            Ok(())
        }
        Command::Restore(note) => restore_latest(&note).map_err(|e| e.to_string()),
        Command::Prune { dir, retention } => prune(&dir, retention),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            ExitCode::FAILURE
        }
    }
}
