use log::info;

use upcheck_api::primitives::build::{BuildName, BuildStamp};

/// Whether this upgrade crosses the volume layout change: the source build
/// was made on or before `cutoff` and the target build after it.
pub fn needs_new_lv_check(source: &BuildName, target: &BuildName, cutoff: BuildStamp) -> bool {
    let applies = source.stamp() <= cutoff && target.stamp() > cutoff;
    if !applies {
        info!(
            "No need to check newly added volumes: {} -> {} does not cross {cutoff}",
            source.stamp(),
            target.stamp()
        );
    }
    applies
}
