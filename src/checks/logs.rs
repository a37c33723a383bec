use log::{error, info};

use upcheck_api::report::CheckVerdict;

use super::Remote;

pub const SYSSTAT: &str = "sysstat";
pub const BOOT_DMESG_LOG: &str = "boot_dmesg_log";
pub const SEPARATE_VOLUMES: &str = "separate_volumes";
pub const AVC_DENIED: &str = "avc_denied";

const SYSSTAT_CMD: &str = "ls /var/log/sa";
const BOOT_LOG_ERRORS_CMD: &str = "egrep -i 'error|fail' /var/log/boot.log --color=never";
const DMESG_ERRORS_CMD: &str = "egrep -i 'error|fail' /var/log/dmesg --color=never";
const SEPARATE_VOLUMES_CMD: &str =
    "findmnt -D | egrep '/var|/var/log|/var/log/audit|/home|/tmp' --color=never";

/// grep exits 1 when nothing matches; only an unreadable log fails.
const AVC_DENIED_CMD: &str = "grep 'avc:  denied' /var/log/audit/audit.log; test $? -le 1";

/// sysstat has collected data under /var/log/sa.
pub fn sysstat(remote: Remote) -> CheckVerdict {
    let result = remote.run(SYSSTAT_CMD);
    if !result.success {
        return CheckVerdict::command_failed(SYSSTAT, "listing /var/log/sa failed")
            .with_evidence(SYSSTAT_CMD, result.output);
    }

    if !result.output.contains("No such file or directory") && result.output.contains("sa") {
        info!("sysstat can collect data");
        CheckVerdict::pass(SYSSTAT, "sysstat collects data")
    } else {
        CheckVerdict::mismatch(SYSSTAT, "sysstat has not collected any data")
            .with_evidence(SYSSTAT_CMD, result.output)
    }
}

/// Neither boot.log nor dmesg mention an error or a failure. Both logs are
/// always searched.
pub fn boot_dmesg_log(remote: Remote) -> CheckVerdict {
    let boot = remote.run(BOOT_LOG_ERRORS_CMD);
    let dmesg = remote.run(DMESG_ERRORS_CMD);

    let mut dirty = Vec::new();
    if !boot.output.trim().is_empty() {
        dirty.push("/var/log/boot.log");
    }
    if !dmesg.output.trim().is_empty() {
        dirty.push("/var/log/dmesg");
    }

    if dirty.is_empty() {
        return CheckVerdict::pass(BOOT_DMESG_LOG, "no errors in boot.log and dmesg");
    }

    error!("There are error or fail messages in {}", dirty.join(", "));
    CheckVerdict::mismatch(
        BOOT_DMESG_LOG,
        format!("error or fail messages in {}", dirty.join(", ")),
    )
    .with_evidence(BOOT_LOG_ERRORS_CMD, boot.output)
    .with_evidence(DMESG_ERRORS_CMD, dmesg.output)
}

/// /var, /var/log, /var/log/audit, /home and /tmp are on their own volumes.
pub fn separate_volumes(remote: Remote, expected: usize) -> CheckVerdict {
    let result = remote.run(SEPARATE_VOLUMES_CMD);
    if !result.success {
        return CheckVerdict::command_failed(SEPARATE_VOLUMES, "findmnt -D failed")
            .with_evidence(SEPARATE_VOLUMES_CMD, result.output);
    }

    // Blank lines count too, as in the raw `findmnt -D` listing.
    let found = result.output.lines().count();
    if found == expected {
        info!("Check the {found} special separate volumes right");
        CheckVerdict::pass(SEPARATE_VOLUMES, format!("found {found} separate volumes"))
    } else {
        CheckVerdict::mismatch(
            SEPARATE_VOLUMES,
            format!("found {found} separate volumes, expected {expected}"),
        )
        .with_evidence(SEPARATE_VOLUMES_CMD, result.output)
    }
}

/// The audit log holds no AVC denials.
pub fn avc_denied(remote: Remote) -> CheckVerdict {
    let result = remote.run(AVC_DENIED_CMD);
    if !result.success {
        return CheckVerdict::command_failed(AVC_DENIED, "reading the audit log failed")
            .with_evidence(AVC_DENIED_CMD, result.output);
    }

    if result.output.trim().is_empty() {
        CheckVerdict::pass(AVC_DENIED, "no avc denials")
    } else {
        error!("The result of avc denied check is {}, not null", result.output);
        CheckVerdict::mismatch(AVC_DENIED, "avc denials found in the audit log")
            .with_evidence(AVC_DENIED_CMD, result.output)
    }
}
