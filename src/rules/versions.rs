use log::{error, info};

use osutils::rpm;
use upcheck_api::{
    constants::UPDATE_PLACEHOLDER_MARKER,
    primitives::{
        build::BuildName,
        version::{VersionOrderError, VersionToken},
    },
    report::CheckVerdict,
};

use super::SnapshotPair;

pub const IMGBASED_VER: &str = "imgbased_ver";
pub const UPDATE_VER: &str = "update_ver";

fn parse_imgbased_version(raw: &str) -> Result<VersionToken, String> {
    let field = rpm::version_field(raw)
        .ok_or_else(|| format!("no version field in imgbased package '{}'", raw.trim()))?;
    field.parse().map_err(|e| format!("{e}"))
}

/// The imgbased package is not downgraded by the upgrade.
pub fn imgbased_ver(pair: &SnapshotPair) -> CheckVerdict {
    let (old, new) = match (
        parse_imgbased_version(pair.old.imgbased_ver()),
        parse_imgbased_version(pair.new.imgbased_ver()),
    ) {
        (Ok(old), Ok(new)) => (old, new),
        (Err(e), _) | (_, Err(e)) => {
            error!("Cannot read imgbased version: {e}");
            return CheckVerdict::malformed(IMGBASED_VER, e)
                .with_evidence("old", pair.old.imgbased_ver())
                .with_evidence("new", pair.new.imgbased_ver());
        }
    };

    info!("Check imgbased ver: old={old}, new={new}");

    let verdict = match new.check_not_older_than(&old) {
        Ok(()) => CheckVerdict::pass(IMGBASED_VER, format!("imgbased {old} -> {new}")),
        Err(e @ VersionOrderError::LengthMismatch { .. }) => {
            error!("The old and new imgbased versions have different lengths: {e}");
            CheckVerdict::malformed(IMGBASED_VER, e.to_string())
        }
        Err(e @ VersionOrderError::Regression { .. }) => {
            error!("The old imgbased version is newer than the new one: {e}");
            CheckVerdict::mismatch(IMGBASED_VER, e.to_string())
        }
    };

    verdict
        .with_evidence("old", old.to_string())
        .with_evidence("new", new.to_string())
}

/// The update package moves from the placeholder to the target build.
pub fn update_ver(pair: &SnapshotPair, target: &BuildName) -> CheckVerdict {
    let old = pair.old.update_ver();
    let new = pair.new.update_ver();
    let target_version = target.version();

    info!("Check update ver: old={old}, new={new}, target={target_version}");

    let verdict = if !old.contains(UPDATE_PLACEHOLDER_MARKER) {
        error!("The old update version is wrong");
        CheckVerdict::mismatch(
            UPDATE_VER,
            format!("old update package is not the '{UPDATE_PLACEHOLDER_MARKER}' package"),
        )
    } else if !new.contains(target_version) {
        error!("The new update version is wrong");
        CheckVerdict::mismatch(
            UPDATE_VER,
            format!("new update package does not carry target version '{target_version}'"),
        )
    } else {
        CheckVerdict::pass(
            UPDATE_VER,
            format!("update package moved from placeholder to '{target_version}'"),
        )
    };

    verdict
        .with_evidence("old", old)
        .with_evidence("new", new)
}
