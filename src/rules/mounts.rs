use log::{error, info};

use osutils::{findmnt::MountTable, imgbase::Layer};
use upcheck_api::report::CheckVerdict;

use super::SnapshotPair;

pub const FINDMNT: &str = "findmnt";

/// The new layer is mounted and, when `expected_new` is given, the separate
/// mount points appear unless they were already there.
pub fn findmnt(pair: &SnapshotPair, expected_new: Option<&[String]>) -> CheckVerdict {
    let old = MountTable::parse(pair.old.findmnt());
    let new = MountTable::parse(pair.new.findmnt());
    let diff = new.difference(&old);

    let Some(layer) = Layer::from_imgbase_w(pair.new.imgbase_w()) else {
        return CheckVerdict::malformed(FINDMNT, "new imgbase w output is empty");
    };
    let layer_key = layer.dm_name();

    info!(
        "Check findmnt: diff={:?}",
        diff.lines().collect::<Vec<_>>()
    );

    let evidence = |verdict: CheckVerdict| {
        verdict.with_evidence("added", diff.lines().collect::<Vec<_>>().join("\n"))
    };

    if old.mentions(&layer_key) {
        error!("New layer {layer_key} should not be present in old findmnt");
        return evidence(CheckVerdict::mismatch(
            FINDMNT,
            format!("new layer '{layer_key}' was already mounted before the upgrade"),
        ));
    }
    if !diff.mentions(&layer_key) {
        error!("Mount of new layer {layer_key} has not been created");
        return evidence(CheckVerdict::mismatch(
            FINDMNT,
            format!("new layer '{layer_key}' is not mounted"),
        ));
    }

    for mount_point in expected_new.unwrap_or_default() {
        match (old.mentions(mount_point), diff.mentions(mount_point)) {
            (true, true) => {
                error!("Mount point {mount_point} already exists in the old layer, it should not change");
                return evidence(CheckVerdict::mismatch(
                    FINDMNT,
                    format!("mount point '{mount_point}' existed before and was changed"),
                ));
            }
            (false, false) => {
                error!("Mount point {mount_point} has not been created in the new layer");
                return evidence(CheckVerdict::mismatch(
                    FINDMNT,
                    format!("mount point '{mount_point}' was not created"),
                ));
            }
            _ => (),
        }
    }

    CheckVerdict::pass(FINDMNT, format!("new layer '{layer_key}' is mounted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use upcheck_api::{
        constants::NEW_MOUNT_POINTS_DEFAULT,
        report::FailureKind,
        snapshot::{Fact, Phase},
    };

    use crate::rules::tests::{pair_with, set};

    fn mount_points() -> Vec<String> {
        NEW_MOUNT_POINTS_DEFAULT.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_regular_upgrade_passes() {
        let (old, new) = pair_with(|_, _| ());
        let pair = SnapshotPair { old: &old, new: &new };
        let verdict = findmnt(&pair, Some(mount_points().as_slice()));
        assert!(verdict.is_pass(), "{verdict:?}");
        assert!(findmnt(&pair, None).is_pass());
    }

    #[test]
    fn test_layer_not_mounted() {
        let (old, new) = pair_with(set(
            Phase::New,
            Fact::ImgbaseW,
            "You are on rhvh-4.1-0.20170707.0+1",
        ));
        let verdict = findmnt(&SnapshotPair { old: &old, new: &new }, None);
        assert_eq!(verdict.failure_kind(), Some(FailureKind::Mismatch));
        assert!(verdict.explanation.contains("rhvh--4.1--0.20170707.0+1"));
    }

    #[test]
    fn test_layer_mounted_before() {
        let (old, new) = pair_with(set(
            Phase::Old,
            Fact::Findmnt,
            "/mnt /dev/mapper/rhvh-rhvh--4.1--0.20170706.0+1 ext4 ro",
        ));
        let verdict = findmnt(&SnapshotPair { old: &old, new: &new }, None);
        assert!(verdict.explanation.contains("already mounted"));
    }

    #[test]
    fn test_mount_points() {
        // Gate applies but the new layout has no /tmp.
        let (old, new) = pair_with(|phase, facts| {
            if phase == Phase::New {
                let findmnt = facts[&Fact::Findmnt]
                    .replace("/tmp /dev/mapper/rhvh-tmp ext4 rw,relatime,discard\n", "");
                facts.insert(Fact::Findmnt, findmnt);
            }
        });
        let pair = SnapshotPair { old: &old, new: &new };
        let verdict = findmnt(&pair, Some(mount_points().as_slice()));
        assert!(verdict.explanation.contains("'/tmp' was not created"));
        // Without the gate the mount points are not checked.
        assert!(findmnt(&pair, None).is_pass());

        // /home existed before and shows up changed.
        let (old, new) = pair_with(set(
            Phase::Old,
            Fact::Findmnt,
            "/ /dev/mapper/rhvh-rhvh--4.1--0.20170522.0+1 ext4 rw\n/home /dev/sdb1 xfs rw",
        ));
        let verdict = findmnt(&SnapshotPair { old: &old, new: &new }, Some(mount_points().as_slice()));
        assert!(verdict.explanation.contains("'/home' existed before"));
    }
}
