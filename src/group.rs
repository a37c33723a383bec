//! Evaluation of one check point group.

use log::{error, info};

use upcheck_api::report::{Aggregation, CheckPointReport, CheckVerdict};

/// A member rule, evaluated lazily so that sequential groups can skip it.
pub type Member<'a> = Box<dyn FnOnce() -> CheckVerdict + 'a>;

pub struct CheckGroup<'a> {
    name: &'static str,
    aggregation: Aggregation,
    members: Vec<Member<'a>>,
}

impl<'a> CheckGroup<'a> {
    pub fn new(name: &'static str, aggregation: Aggregation) -> Self {
        Self {
            name,
            aggregation,
            members: Vec::new(),
        }
    }

    pub fn run_all(name: &'static str) -> Self {
        Self::new(name, Aggregation::RunAll)
    }

    pub fn sequential(name: &'static str) -> Self {
        Self::new(name, Aggregation::Sequential)
    }

    pub fn member(mut self, rule: impl FnOnce() -> CheckVerdict + 'a) -> Self {
        self.members.push(Box::new(rule));
        self
    }

    /// A group made of one precomputed verdict.
    pub fn single(name: &'static str, verdict: CheckVerdict) -> CheckPointReport {
        Self::run_all(name).member(move || verdict).evaluate()
    }

    /// Evaluates the members in order. Run-all groups evaluate every member;
    /// sequential groups stop after the first failure.
    pub fn evaluate(self) -> CheckPointReport {
        info!("Evaluating check point {} ({})", self.name, self.aggregation);

        let mut verdicts = Vec::with_capacity(self.members.len());
        for member in self.members {
            let verdict = member();
            if verdict.is_fail() {
                error!(
                    "{}: {} failed: {}",
                    self.name, verdict.rule, verdict.explanation
                );
            } else {
                info!("{}: {}: {}", self.name, verdict.rule, verdict.explanation);
            }

            let stop = verdict.is_fail() && self.aggregation == Aggregation::Sequential;
            verdicts.push(verdict);
            if stop {
                break;
            }
        }

        let report = CheckPointReport::new(self.name, self.aggregation, verdicts);
        if report.failed() {
            error!("Check point {} failed", self.name);
        } else {
            info!("Check point {} finished: {}", self.name, report.outcome);
        }
        report
    }
}
