//! Comparison rules over the `old` and `new` snapshots.
//!
//! Every rule is a pure function returning a [`CheckVerdict`]. Rules never
//! return errors: unparsable input is a `malformed-input` failure.
//!
//! [`CheckVerdict`]: upcheck_api::report::CheckVerdict

use upcheck_api::snapshot::PhaseSnapshot;

pub mod gate;
pub mod layout;
pub mod mounts;
pub mod versions;
pub mod volumes;

/// Both snapshots of a run.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPair<'a> {
    pub old: &'a PhaseSnapshot,
    pub new: &'a PhaseSnapshot,
}
