use std::collections::BTreeMap;

use log::{error, info};

use osutils::{
    imgbase::Layer,
    lvs::{is_pool_tmeta, LvsListing},
};
use upcheck_api::{
    constants::{LVS_WARNING_MARKER, POOL_TMETA_MIN_SIZE_MIB},
    report::{CheckVerdict, FailureKind},
};

use super::SnapshotPair;

pub const LVS: &str = "lvs";
pub const LV_LAYERS: &str = "lv_layers";
pub const LV_NEW: &str = "lv_new";
pub const POOL_TMETA_SIZE: &str = "pool_tmeta_size";

/// Logical volumes survive the upgrade, the new layer gets its volumes and,
/// when `expected_new` is given, the separate volumes are created with
/// their expected sizes.
///
/// The old listing drops warning noise first. The only old line allowed to
/// disappear is the pool metadata volume, which may be resized.
pub fn lvs(pair: &SnapshotPair, expected_new: Option<&BTreeMap<String, String>>) -> CheckVerdict {
    let old = LvsListing::parse_filtered(pair.old.lvs(), LVS_WARNING_MARKER);
    let new = LvsListing::parse(pair.new.lvs());

    let removed = old.difference(&new);
    let tolerated = removed.is_empty()
        || (removed.len() == 1 && removed.lines().all(is_pool_tmeta));
    if !tolerated {
        let removed: Vec<&str> = removed.lines().collect();
        error!("New lvs does not include items of old lvs: {removed:?}");
        return CheckVerdict::mismatch(LVS, "volumes of the old layer are missing after the upgrade")
            .with_evidence("removed", removed.join("\n"));
    }

    info!("Check lvs");

    let mut members = vec![lv_layers(pair, &new)];
    if let Some(expected) = expected_new {
        members.push(lv_new(&old, &new, expected));
    }
    members.push(pool_tmeta_size(&old, &new));

    combine(LVS, members)
}

/// Folds sub-rule verdicts into one, failing with the kind of the first
/// failing member. Every member was already evaluated.
fn combine(rule: &str, members: Vec<CheckVerdict>) -> CheckVerdict {
    let failures: Vec<&CheckVerdict> = members.iter().filter(|v| v.is_fail()).collect();
    let mut verdict = match failures.first().and_then(|v| v.failure_kind()) {
        None => CheckVerdict::pass(
            rule,
            members
                .iter()
                .map(|v| v.explanation.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        ),
        Some(kind) => CheckVerdict::fail(
            rule,
            kind,
            failures
                .iter()
                .map(|v| format!("{}: {}", v.rule, v.explanation))
                .collect::<Vec<_>>()
                .join("; "),
        ),
    };

    for member in members {
        verdict = verdict.with_evidence(member.rule, member.explanation);
    }
    verdict
}

/// The new layer and its base both have a volume.
fn lv_layers(pair: &SnapshotPair, new: &LvsListing) -> CheckVerdict {
    let Some(layer) = Layer::from_imgbase_w(pair.new.imgbase_w()) else {
        return CheckVerdict::malformed(LV_LAYERS, "new imgbase w output is empty");
    };

    for key in [layer.name(), layer.base()] {
        if !new.contains_substring(key) {
            error!("Layer {key} does not exist");
            return CheckVerdict::mismatch(LV_LAYERS, format!("layer '{key}' has no volume"));
        }
    }

    CheckVerdict::pass(LV_LAYERS, format!("layer '{}' has its volumes", layer.name()))
}

/// Each expected volume is either untouched, if it existed before, or newly
/// created with its expected size.
fn lv_new(old: &LvsListing, new: &LvsListing, expected: &BTreeMap<String, String>) -> CheckVerdict {
    info!("Check newly added volumes");
    let added = new.difference(old);

    for (name, size) in expected {
        let in_old = old.records_named(name).next().is_some();
        let in_added = added.records_named(name).next();

        match (in_old, in_added) {
            (true, Some(_)) => {
                error!("{name} already exists in the old layer, it should not change");
                return CheckVerdict::mismatch(
                    LV_NEW,
                    format!("volume '{name}' existed before and was changed"),
                );
            }
            (false, None) => {
                error!("{name} does not exist in the old layer, it should be added");
                return CheckVerdict::mismatch(LV_NEW, format!("volume '{name}' was not added"));
            }
            (false, Some(line)) => {
                let actual = line.split_whitespace().last().unwrap_or_default();
                if actual != size {
                    error!("{name} was added with size {actual} instead of {size}");
                    return CheckVerdict::mismatch(
                        LV_NEW,
                        format!("volume '{name}' was added with size {actual}, expected {size}"),
                    );
                }
            }
            (true, None) => (),
        }
    }

    CheckVerdict::pass(LV_NEW, "separate volumes are in place")
}

/// A pool metadata volume below the minimum is grown to it, a larger one is
/// kept as is.
fn pool_tmeta_size(old: &LvsListing, new: &LvsListing) -> CheckVerdict {
    let sizes = old.pool_tmeta().and_then(|r| r.size_mib()).and_then(|old_size| {
        new.pool_tmeta()
            .and_then(|r| r.size_mib())
            .map(|new_size| (old_size, new_size))
    });
    let (old_size, new_size) = match sizes {
        Ok(sizes) => sizes,
        Err(e) => return CheckVerdict::malformed(POOL_TMETA_SIZE, e.to_string()),
    };

    info!("Check pool_tmeta size: old={old_size}, new={new_size}");

    let expected = if old_size < POOL_TMETA_MIN_SIZE_MIB {
        POOL_TMETA_MIN_SIZE_MIB
    } else {
        old_size
    };

    let verdict = if new_size == expected {
        CheckVerdict::pass(
            POOL_TMETA_SIZE,
            format!("pool metadata is {new_size}m, was {old_size}m"),
        )
    } else {
        error!("The pool metadata size is {new_size}m, expected {expected}m");
        CheckVerdict::fail(
            POOL_TMETA_SIZE,
            FailureKind::Mismatch,
            format!("pool metadata is {new_size}m, expected {expected}m (was {old_size}m)"),
        )
    };

    verdict
        .with_evidence("old", format!("{old_size}m"))
        .with_evidence("new", format!("{new_size}m"))
}
