//! Collection and storage of phase snapshots.

use std::{collections::BTreeMap, path::Path, time::Duration};

use log::{debug, info};
use strum::IntoEnumIterator;

use osutils::remote::RemoteExecutor;
use upcheck_api::{
    error::{CollectionError, InvalidInputError, ReportError, SessionError, UpcheckError},
    snapshot::{Fact, Phase, PhaseSnapshot},
};

use crate::rules::SnapshotPair;

/// Runs every fact command on the host, in declaration order, and captures
/// the raw output. The first failing command aborts the collection.
pub fn collect(
    executor: &dyn RemoteExecutor,
    phase: Phase,
    timeout: Duration,
) -> Result<PhaseSnapshot, UpcheckError> {
    info!("Collecting '{phase}' facts from the host");

    let mut facts = BTreeMap::new();
    for fact in Fact::iter() {
        let command = fact.command();
        let result = executor.run_cmd(command, timeout);
        if !result.success {
            debug!("Output of '{command}':\n{}", result.output);
            return Err(UpcheckError::new(CollectionError::CommandFailed {
                phase,
                fact,
                command: command.to_string(),
            }));
        }

        info!("***{fact}***:\n{}", result.output);
        facts.insert(fact, result.output);
    }

    info!("Collected '{phase}' facts");
    PhaseSnapshot::new(phase, facts)
}

/// Reads a snapshot saved by `save`, checking that it holds `expected`.
pub fn load(path: impl AsRef<Path>, expected: Phase) -> Result<PhaseSnapshot, UpcheckError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).structured(InvalidInputError::LoadSnapshot {
        path: path.display().to_string(),
    })?;
    let snapshot: PhaseSnapshot =
        serde_yaml::from_str(&contents).structured(InvalidInputError::ParseSnapshot)?;

    if snapshot.phase() != expected {
        return Err(UpcheckError::new(InvalidInputError::UnexpectedPhase {
            expected,
            found: snapshot.phase(),
        }));
    }

    Ok(snapshot)
}

pub fn save(snapshot: &PhaseSnapshot, path: impl AsRef<Path>) -> Result<(), UpcheckError> {
    let path = path.as_ref();
    let write_error = || InvalidInputError::WriteOutput {
        path: path.display().to_string(),
    };
    let yaml = serde_yaml::to_string(snapshot).structured(write_error())?;
    std::fs::write(path, yaml).structured(write_error())
}

/// Progress of one upgrade verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RunState {
    NotStarted,
    OldSnapshotCollected,
    NewSnapshotCollected,
    RulesEvaluated,
}

/// Holds at most one snapshot per phase. Each phase is written once, `old`
/// before `new`.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    old: Option<PhaseSnapshot>,
    new: Option<PhaseSnapshot>,
    evaluated: bool,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, snapshot: PhaseSnapshot) -> Result<(), UpcheckError> {
        let phase = snapshot.phase();
        if phase == Phase::New && self.old.is_none() {
            return Err(UpcheckError::new(SessionError::PhaseNotCollected {
                phase: Phase::Old,
            }));
        }

        let slot = match phase {
            Phase::Old => &mut self.old,
            Phase::New => &mut self.new,
        };
        if slot.is_some() {
            return Err(UpcheckError::new(SessionError::PhaseAlreadyCollected {
                phase,
            }));
        }

        debug!("Stored '{phase}' snapshot");
        *slot = Some(snapshot);
        Ok(())
    }

    pub fn get(&self, phase: Phase) -> Option<&PhaseSnapshot> {
        match phase {
            Phase::Old => self.old.as_ref(),
            Phase::New => self.new.as_ref(),
        }
    }

    /// The snapshot of `phase`, failing if it was not collected.
    pub fn require(&self, phase: Phase) -> Result<&PhaseSnapshot, UpcheckError> {
        self.get(phase)
            .structured(SessionError::PhaseNotCollected { phase })
    }

    /// Both snapshots, for comparison.
    pub fn pair(&self) -> Result<SnapshotPair<'_>, UpcheckError> {
        Ok(SnapshotPair {
            old: self.require(Phase::Old)?,
            new: self.require(Phase::New)?,
        })
    }

    pub fn mark_evaluated(&mut self) {
        if self.new.is_some() {
            self.evaluated = true;
        }
    }

    pub fn state(&self) -> RunState {
        match (&self.old, &self.new, self.evaluated) {
            (None, _, _) => RunState::NotStarted,
            (Some(_), None, _) => RunState::OldSnapshotCollected,
            (Some(_), Some(_), false) => RunState::NewSnapshotCollected,
            (Some(_), Some(_), true) => RunState::RulesEvaluated,
        }
    }
}
