use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};

/// Why a rule failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FailureKind {
    /// The compared values do not satisfy the rule.
    Mismatch,
    /// The input could not be interpreted, e.g. version strings with
    /// different component counts or a missing pool metadata volume.
    MalformedInput,
    /// A remote command the rule depends on did not succeed.
    CommandFailed,
}

/// Result of evaluating one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum Outcome {
    Pass,
    Fail { kind: FailureKind },
    /// The rule does not apply to the builds under test.
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Evidence {
    pub label: String,
    pub value: String,
}

/// Verdict of a single named rule, with the explanation and the raw
/// evidence it was reached on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CheckVerdict {
    pub rule: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
}

impl CheckVerdict {
    pub fn pass(rule: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self::with_outcome(rule, Outcome::Pass, explanation)
    }

    pub fn fail(
        rule: impl Into<String>,
        kind: FailureKind,
        explanation: impl Into<String>,
    ) -> Self {
        Self::with_outcome(rule, Outcome::Fail { kind }, explanation)
    }

    pub fn mismatch(rule: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self::fail(rule, FailureKind::Mismatch, explanation)
    }

    pub fn malformed(rule: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self::fail(rule, FailureKind::MalformedInput, explanation)
    }

    pub fn command_failed(rule: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self::fail(rule, FailureKind::CommandFailed, explanation)
    }

    pub fn not_applicable(rule: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self::with_outcome(rule, Outcome::NotApplicable, explanation)
    }

    fn with_outcome(
        rule: impl Into<String>,
        outcome: Outcome,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            outcome,
            explanation: explanation.into(),
            evidence: Vec::new(),
        }
    }

    /// Attaches raw evidence, e.g. the command output the verdict is based on.
    pub fn with_evidence(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.evidence.push(Evidence {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_pass(&self) -> bool {
        matches!(self.outcome, Outcome::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self.outcome, Outcome::Fail { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self.outcome {
            Outcome::Fail { kind } => Some(kind),
            _ => None,
        }
    }
}

/// How a check point combines its member rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Aggregation {
    /// Evaluate every member, then AND the results.
    RunAll,
    /// Stop at the first failing member.
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GroupOutcome {
    Pass,
    Fail,
    NotApplicable,
}

impl GroupOutcome {
    /// Fail if any member failed, not applicable if no member applied,
    /// pass otherwise.
    pub fn aggregate<'a>(verdicts: impl IntoIterator<Item = &'a CheckVerdict>) -> Self {
        let mut any_applicable = false;
        for verdict in verdicts {
            match verdict.outcome {
                Outcome::Fail { .. } => return GroupOutcome::Fail,
                Outcome::Pass => any_applicable = true,
                Outcome::NotApplicable => (),
            }
        }

        if any_applicable {
            GroupOutcome::Pass
        } else {
            GroupOutcome::NotApplicable
        }
    }
}

/// Result of one check point group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CheckPointReport {
    pub name: String,
    pub aggregation: Aggregation,
    pub outcome: GroupOutcome,
    pub verdicts: Vec<CheckVerdict>,
}

impl CheckPointReport {
    pub fn new(name: impl Into<String>, aggregation: Aggregation, verdicts: Vec<CheckVerdict>) -> Self {
        Self {
            name: name.into(),
            aggregation,
            outcome: GroupOutcome::aggregate(&verdicts),
            verdicts,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome == GroupOutcome::Pass
    }

    pub fn failed(&self) -> bool {
        self.outcome == GroupOutcome::Fail
    }
}

/// Results of all check points evaluated in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunReport {
    pub source_build: String,
    pub target_build: String,
    pub check_points: Vec<CheckPointReport>,
}

impl RunReport {
    /// Whether no check point failed.
    pub fn succeeded(&self) -> bool {
        !self.check_points.iter().any(CheckPointReport::failed)
    }
}
