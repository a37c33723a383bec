use std::{panic, process::ExitCode};

use anyhow::Error;
use clap::Parser;
use log::{error, info};
use strum::IntoEnumIterator;

use upcheck::{
    checkpoints::compare_snapshots,
    cli::{Cli, Commands},
    snapshot, CheckPointId, ExitKind,
};
use upcheck_api::{
    config::RunConfig,
    error::{ErrorKind, InternalError, InvalidInputError, UpcheckError, UpcheckResultExt},
    report::RunReport,
    snapshot::Phase,
};

fn run_upcheck(args: &Cli) -> Result<ExitKind, UpcheckError> {
    // Log version ASAP
    info!("Upcheck version: {}", upcheck::UPCHECK_VERSION);

    // Catch exit fast commands
    if let Commands::List = args.command {
        for id in CheckPointId::iter() {
            println!("{id}");
        }
        return Ok(ExitKind::Done);
    }

    let res = panic::catch_unwind(move || match &args.command {
        Commands::Collect { config, phase, out } => {
            let config = RunConfig::from_file(config).message("Failed to load configuration")?;
            let phase = Phase::from(*phase);
            let snapshot = snapshot::collect(
                &upcheck::executor_for(&config),
                phase,
                config.timeouts.command(),
            )
            .message(format!("Failed to collect '{phase}' snapshot"))?;
            snapshot::save(&snapshot, out).message("Failed to save snapshot")?;
            info!("Saved snapshot to {}", out.display());
            Ok(ExitKind::Done)
        }

        Commands::Compare {
            config,
            old,
            new,
            report,
        } => {
            let config = RunConfig::from_file(config).message("Failed to load configuration")?;
            let old = snapshot::load(old, Phase::Old).message("Failed to load old snapshot")?;
            let new = snapshot::load(new, Phase::New).message("Failed to load new snapshot")?;

            let run = RunReport {
                source_build: config.source_build.as_str().to_string(),
                target_build: config.target_build.as_str().to_string(),
                check_points: compare_snapshots(&config, upcheck::rules::SnapshotPair {
                    old: &old,
                    new: &new,
                }),
            };
            finish(&run, report.as_deref())
        }

        Commands::Check {
            config,
            old,
            new,
            report,
            check_points: ids,
        } => {
            let config = RunConfig::from_file(config).message("Failed to load configuration")?;
            let mut check_points = upcheck::connect(config)?;

            check_points
                .add_snapshot(snapshot::load(old, Phase::Old).message("Failed to load old snapshot")?)?;
            match new {
                Some(path) => check_points.add_snapshot(
                    snapshot::load(path, Phase::New).message("Failed to load new snapshot")?,
                )?,
                None if ids.iter().any(CheckPointId::needs_snapshot_pair) => {
                    check_points
                        .collect(Phase::New)
                        .message("Failed to collect 'new' snapshot")?;
                }
                None => (),
            }

            let run = check_points
                .run(ids)
                .message(format!("Failed to execute '{}' command", args.command))?;
            finish(&run, report.as_deref())
        }

        Commands::List => Err(UpcheckError::internal("Invalid command")),
    });

    match res {
        Err(e) => Err(UpcheckError::new(InternalError::Panic(format!("{e:?}")))),
        Ok(r) => r,
    }
}

/// Logs the summary of `run`, saving it to `path` when given.
fn finish(run: &RunReport, path: Option<&std::path::Path>) -> Result<ExitKind, UpcheckError> {
    for check_point in &run.check_points {
        info!("{}: {}", check_point.name, check_point.outcome);
    }
    if let Some(path) = path {
        upcheck::save_report(run, path).message("Failed to save report")?;
    }
    Ok(ExitKind::from(run))
}

fn setup_logging(args: &Cli) -> Result<(), Error> {
    upcheck::init_logging(args.verbosity, args.audit_log.as_deref())
}

/// Configuration problems are setup failures, not runtime errors.
fn is_setup_error(e: &UpcheckError) -> bool {
    matches!(
        e.kind(),
        ErrorKind::InvalidInput(
            InvalidInputError::LoadRunConfig { .. } | InvalidInputError::ParseRunConfig
        )
    )
}

fn main() -> ExitCode {
    // Parse args
    let args = Cli::parse();

    // Initialize the loggers
    if let Err(e) = setup_logging(&args) {
        eprintln!("Failed to initialize logging: {e:?}");
        return ExitCode::from(1);
    }

    match run_upcheck(&args) {
        Ok(ExitKind::Done) | Ok(ExitKind::Passed) => ExitCode::SUCCESS,
        Ok(ExitKind::ChecksFailed) => {
            error!("At least one check point failed");
            ExitCode::from(3)
        }
        Err(e) if is_setup_error(&e) => {
            error!("Upcheck setup failed: {e:?}");
            ExitCode::from(1)
        }
        Err(e) => {
            error!("Upcheck failed: {e:?}");
            ExitCode::from(2)
        }
    }
}
