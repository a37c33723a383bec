use log::{error, info};

use osutils::{
    imgbase::{self, Layer},
    iscsi,
};
use upcheck_api::report::CheckVerdict;

use super::SnapshotPair;

pub const IMGBASE_W: &str = "imgbase_w";
pub const IMGBASE_LAYOUT: &str = "imgbase_layout";
pub const INITIATORNAME_ISCSI: &str = "initiatorname_iscsi";

/// The host booted into a strictly newer build than before.
///
/// Stamps are compared as strings, they are fixed width digits.
pub fn imgbase_w(pair: &SnapshotPair) -> CheckVerdict {
    let (old, new) = match (
        imgbase::build_stamp_window(pair.old.imgbase_w()),
        imgbase::build_stamp_window(pair.new.imgbase_w()),
    ) {
        (Some(old), Some(new)) => (old, new),
        _ => {
            return CheckVerdict::malformed(IMGBASE_W, "imgbase w output is too short to hold a build stamp")
                .with_evidence("old", pair.old.imgbase_w())
                .with_evidence("new", pair.new.imgbase_w());
        }
    };

    info!("Check imgbase w: old={old}, new={new}");

    let verdict = if new > old {
        CheckVerdict::pass(IMGBASE_W, format!("booted build {new} is newer than {old}"))
    } else {
        error!("The new build {new} is not newer than the old one {old}");
        CheckVerdict::mismatch(IMGBASE_W, format!("booted build {new} is not newer than {old}"))
    };

    verdict.with_evidence("old", old).with_evidence("new", new)
}

/// The old layer survives the upgrade and the new layer is added next to it.
pub fn imgbase_layout(pair: &SnapshotPair) -> CheckVerdict {
    let old_layout = pair.old.imgbase_layout();
    let new_layout = pair.new.imgbase_layout();

    let (old_layer, new_layer) = match (
        Layer::from_imgbase_w(pair.old.imgbase_w()),
        Layer::from_imgbase_w(pair.new.imgbase_w()),
    ) {
        (Some(old), Some(new)) => (old, new),
        _ => return CheckVerdict::malformed(IMGBASE_LAYOUT, "imgbase w output is empty"),
    };

    info!("Check imgbase layout:\n  old:\n{old_layout}\n  new:\n{new_layout}");

    let mut failures = Vec::new();
    if !old_layout.contains(old_layer.name()) {
        failures.push(format!("old layer '{}' is not in the old layout", old_layer.name()));
    }
    if !new_layout.contains(old_layout.trim()) {
        failures.push("old layout is not part of the new layout".to_string());
    }
    if !new_layout.contains(new_layer.name()) {
        failures.push(format!("new layer '{}' is not in the new layout", new_layer.name()));
    }

    let verdict = if failures.is_empty() {
        CheckVerdict::pass(
            IMGBASE_LAYOUT,
            format!("layer '{}' added on top of '{}'", new_layer.name(), old_layer.name()),
        )
    } else {
        for failure in &failures {
            error!("{failure}");
        }
        CheckVerdict::mismatch(IMGBASE_LAYOUT, failures.join("; "))
    };

    verdict
        .with_evidence("old", old_layout)
        .with_evidence("new", new_layout)
}

/// The iSCSI initiator name is kept across the upgrade.
pub fn initiatorname_iscsi(pair: &SnapshotPair) -> CheckVerdict {
    let old = iscsi::iqn_suffix(pair.old.initiatorname_iscsi());
    let new = iscsi::iqn_suffix(pair.new.initiatorname_iscsi());

    info!("Check iqn: old={old}, new={new}");

    if old == new {
        CheckVerdict::pass(INITIATORNAME_ISCSI, format!("initiator name '{old}' kept"))
    } else {
        error!("The old iqn is not equal to the new one");
        CheckVerdict::mismatch(
            INITIATORNAME_ISCSI,
            format!("initiator name changed from '{old}' to '{new}'"),
        )
        .with_evidence("old", pair.old.initiatorname_iscsi())
        .with_evidence("new", pair.new.initiatorname_iscsi())
    }
}
