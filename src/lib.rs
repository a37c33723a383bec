use std::path::Path;

use log::info;

use osutils::remote::SshExecutor;
use upcheck_api::{
    config::RunConfig,
    error::{InternalError, InvalidInputError, RemoteError, ReportError, UpcheckError},
    report::RunReport,
};

pub mod checkpoints;
pub mod checks;
pub mod cli;
pub mod group;
mod logging;
pub mod rhvm;
pub mod rules;
pub mod snapshot;
pub mod steps;
pub mod web;

pub use checkpoints::{CheckPointId, CheckPoints};
pub use logging::{audit_log::AuditLog, init as init_logging, multilog::MultiLogger};

pub const UPCHECK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How a run ended, when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// The command ran to completion without evaluating check points.
    Done,
    /// Every check point passed or did not apply.
    Passed,
    /// At least one check point failed.
    ChecksFailed,
}

impl From<&RunReport> for ExitKind {
    fn from(report: &RunReport) -> Self {
        if report.succeeded() {
            ExitKind::Passed
        } else {
            ExitKind::ChecksFailed
        }
    }
}

/// SSH executor for the host under test.
pub fn executor_for(config: &RunConfig) -> SshExecutor {
    SshExecutor::new(&config.host.address, &config.host.user)
        .with_port(config.host.port)
        .with_identity_file(config.host.identity_file.clone())
}

/// Opens a session on the host described by `config`, with the management
/// API client when the host is registered on one.
pub fn connect(config: RunConfig) -> Result<CheckPoints, UpcheckError> {
    info!("Connecting to {}", config.host.address);
    let executor = executor_for(&config);

    let probe = web::HttpProbe::new().structured(InternalError::Internal(
        "Failed to create HTTP client",
    ))?;

    let rhvm = config
        .rhvm
        .as_ref()
        .map(|connection| {
            rhvm::RhvmClient::new(connection).structured(RemoteError::Client {
                endpoint: connection.fqdn.clone(),
            })
        })
        .transpose()?;

    let check_points = CheckPoints::new(config, Box::new(executor), Box::new(probe));
    Ok(match rhvm {
        Some(client) => check_points.with_management_api(Box::new(client)),
        None => check_points,
    })
}

/// Writes `report` as YAML to `path`.
pub fn save_report(report: &RunReport, path: &Path) -> Result<(), UpcheckError> {
    let write_error = || InvalidInputError::WriteOutput {
        path: path.display().to_string(),
    };
    let yaml = serde_yaml::to_string(report).structured(write_error())?;
    std::fs::write(path, yaml).structured(write_error())
}

#[cfg(test)]
mod tests {
    use super::*;

    use upcheck_api::report::{Aggregation, CheckPointReport, CheckVerdict};

    fn report(verdict: CheckVerdict) -> RunReport {
        RunReport {
            source_build: "redhat-virtualization-host-4.1-20170522.0".into(),
            target_build: "redhat-virtualization-host-4.1-20170706.0".into(),
            check_points: vec![CheckPointReport::new(
                "signed_check",
                Aggregation::RunAll,
                vec![verdict],
            )],
        }
    }

    #[test]
    fn test_exit_kind() {
        assert_eq!(
            ExitKind::from(&report(CheckVerdict::pass("signed", "all packages are signed"))),
            ExitKind::Passed
        );
        assert_eq!(
            ExitKind::from(&report(CheckVerdict::not_applicable("signed", "n/a"))),
            ExitKind::Passed
        );
        assert_eq!(
            ExitKind::from(&report(CheckVerdict::mismatch("signed", "3 packages are not signed"))),
            ExitKind::ChecksFailed
        );
    }

    #[test]
    fn test_save_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.yaml");
        save_report(&report(CheckVerdict::pass("signed", "ok")), &path).unwrap();

        let saved: RunReport =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.check_points[0].verdicts[0].rule, "signed");

        save_report(
            &report(CheckVerdict::pass("signed", "ok")),
            &dir.path().join("missing/report.yaml"),
        )
        .unwrap_err();
    }
}
