use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use log::LevelFilter;

use upcheck_api::snapshot::Phase;

use crate::{checkpoints::CheckPointId, UPCHECK_VERSION};

#[derive(Parser, Debug)]
#[clap(version = UPCHECK_VERSION)]
pub struct Cli {
    /// Logging verbosity [OFF, ERROR, WARN, INFO, DEBUG, TRACE]
    #[arg(global = true, short, long, default_value_t = LevelFilter::Info)]
    pub verbosity: LevelFilter,

    /// Also write every log record to this file, one JSON object per line
    #[arg(global = true, long)]
    pub audit_log: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(clap::ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum PhaseArg {
    Old,
    New,
}

impl From<PhaseArg> for Phase {
    fn from(value: PhaseArg) -> Self {
        match value {
            PhaseArg::Old => Phase::Old,
            PhaseArg::New => Phase::New,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect the facts of one phase from the host and save them
    Collect {
        /// Run configuration
        #[clap(short, long, default_value = "/etc/upcheck/config.yaml")]
        config: PathBuf,

        /// Whether the host is before or after the upgrade
        #[clap(short, long)]
        phase: PhaseArg,

        /// Path to save the snapshot to
        #[clap(short, long)]
        out: PathBuf,
    },

    /// Compare two saved snapshots without contacting the host
    Compare {
        /// Run configuration
        #[clap(short, long, default_value = "/etc/upcheck/config.yaml")]
        config: PathBuf,

        /// Snapshot collected before the upgrade
        #[clap(long)]
        old: PathBuf,

        /// Snapshot collected after the upgrade
        #[clap(long)]
        new: PathBuf,

        /// Path to save the resulting report
        #[clap(short, long)]
        report: Option<PathBuf>,
    },

    /// Run check points against the upgraded host
    ///
    /// When no snapshot of the upgraded host is given, one is collected if
    /// a requested check point compares snapshots.
    Check {
        /// Run configuration
        #[clap(short, long, default_value = "/etc/upcheck/config.yaml")]
        config: PathBuf,

        /// Snapshot collected before the upgrade
        #[clap(long)]
        old: PathBuf,

        /// Snapshot collected after the upgrade
        #[clap(long)]
        new: Option<PathBuf>,

        /// Path to save the resulting report
        #[clap(short, long)]
        report: Option<PathBuf>,

        /// Check points to run, in order
        #[clap(required = true)]
        check_points: Vec<CheckPointId>,
    },

    /// List the available check points
    List,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Collect { .. } => "collect",
            Commands::Compare { .. } => "compare",
            Commands::Check { .. } => "check",
            Commands::List => "list",
        }
    }
}

impl Display for Commands {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}
