use const_format::formatcp;
use log::{error, info};

use upcheck_api::{constants::SYSTEMD_ACTIVE_MARKER, report::CheckVerdict};

use super::Remote;

pub const IPTABLES_STATUS: &str = "iptables_status";
pub const FIREWALLD_STATUS: &str = "firewalld_status";
pub const NTPD_STATUS: &str = "ntpd_status";
pub const OVIRT_IMAGEIO_DAEMON: &str = "ovirt_imageio_daemon";

/// `systemctl status` of `unit`, reduced to its active line.
macro_rules! active_line_of {
    ($unit:literal) => {
        formatcp!(
            "systemctl status {} | grep '{}' --color=never",
            $unit,
            SYSTEMD_ACTIVE_MARKER
        )
    };
}

const IPTABLES_STATUS_CMD: &str = active_line_of!("iptables");
const FIREWALLD_STATUS_CMD: &str = active_line_of!("firewalld");
const NTPD_STATUS_CMD: &str = active_line_of!("ntpd");
const NTPD_START_CMD: &str = "systemctl start ntpd.service";
const NTPD_ENABLE_CMD: &str = "systemctl enable ntpd.service";
const TIME_RPMS_CMD: &str = "rpm -qa | egrep 'ntp-|chrony-' --color=never";
const IMAGEIO_STATUS_CMD: &str = active_line_of!("ovirt-imageio-daemon.service");
const IMAGEIO_LOG_DIR_CMD: &str = "ls -ld /var/log/ovirt-imageio-daemon/";

/// iptables is the active firewall.
pub fn iptables_status(remote: Remote) -> CheckVerdict {
    let result = remote.run(IPTABLES_STATUS_CMD);
    if !result.success {
        return CheckVerdict::command_failed(IPTABLES_STATUS, "iptables status query failed")
            .with_evidence(IPTABLES_STATUS_CMD, result.output);
    }

    if result.output.contains(SYSTEMD_ACTIVE_MARKER) {
        CheckVerdict::pass(IPTABLES_STATUS, "iptables is active")
    } else {
        CheckVerdict::mismatch(IPTABLES_STATUS, "iptables is not active")
            .with_evidence(IPTABLES_STATUS_CMD, result.output)
    }
}

/// firewalld is not running next to iptables. A failing query means the
/// unit is not active.
pub fn firewalld_status(remote: Remote) -> CheckVerdict {
    let result = remote.run(FIREWALLD_STATUS_CMD);
    if result.output.contains(SYSTEMD_ACTIVE_MARKER) {
        error!("firewalld is active");
        CheckVerdict::mismatch(FIREWALLD_STATUS, "firewalld is active")
            .with_evidence(FIREWALLD_STATUS_CMD, result.output)
    } else {
        CheckVerdict::pass(FIREWALLD_STATUS, "firewalld is not active")
    }
}

/// ntpd runs, after being started and enabled if needed, and both the ntp
/// and chrony packages are installed.
pub fn ntpd_status(remote: Remote) -> CheckVerdict {
    let mut active = remote.run(NTPD_STATUS_CMD).output.contains(SYSTEMD_ACTIVE_MARKER);

    if !active {
        info!("Start ntpd and enable ntpd");
        for command in [NTPD_START_CMD, NTPD_ENABLE_CMD] {
            let result = remote.run(command);
            if !result.success {
                error!("'{command}' failed");
                return CheckVerdict::command_failed(NTPD_STATUS, format!("'{command}' failed"))
                    .with_evidence(command, result.output);
            }
        }
        active = remote.run(NTPD_STATUS_CMD).output.contains(SYSTEMD_ACTIVE_MARKER);
    }

    let rpms = remote.run(TIME_RPMS_CMD);
    if !rpms.success {
        return CheckVerdict::command_failed(NTPD_STATUS, "ntp and chrony package query failed")
            .with_evidence(TIME_RPMS_CMD, rpms.output);
    }
    let installed = rpms.output.contains("ntp-") && rpms.output.contains("chrony-");

    match (active, installed) {
        (true, true) => CheckVerdict::pass(NTPD_STATUS, "ntpd is active, ntp and chrony are installed"),
        (false, _) => CheckVerdict::mismatch(NTPD_STATUS, "ntpd is not active"),
        (true, false) => CheckVerdict::mismatch(NTPD_STATUS, "ntp or chrony is not installed")
            .with_evidence(TIME_RPMS_CMD, rpms.output),
    }
}

/// ovirt-imageio-daemon runs and its log directory belongs to vdsm:kvm.
pub fn ovirt_imageio_daemon(remote: Remote) -> CheckVerdict {
    let status = remote.run(IMAGEIO_STATUS_CMD);
    if !status.success {
        return CheckVerdict::command_failed(
            OVIRT_IMAGEIO_DAEMON,
            "ovirt-imageio-daemon status query failed",
        )
        .with_evidence(IMAGEIO_STATUS_CMD, status.output);
    }
    let active = status.output.contains(SYSTEMD_ACTIVE_MARKER);

    let owner = remote.run(IMAGEIO_LOG_DIR_CMD);
    if !owner.success {
        return CheckVerdict::command_failed(
            OVIRT_IMAGEIO_DAEMON,
            "ovirt-imageio-daemon ownership query failed",
        )
        .with_evidence(IMAGEIO_LOG_DIR_CMD, owner.output);
    }
    let owned = owner.output.contains("vdsm") && owner.output.contains("kvm");

    match (active, owned) {
        (true, true) => CheckVerdict::pass(OVIRT_IMAGEIO_DAEMON, "daemon is active and owned by vdsm:kvm"),
        (false, _) => CheckVerdict::mismatch(OVIRT_IMAGEIO_DAEMON, "daemon is not active"),
        (true, false) => CheckVerdict::mismatch(
            OVIRT_IMAGEIO_DAEMON,
            "log directory is not owned by vdsm:kvm",
        )
        .with_evidence(IMAGEIO_LOG_DIR_CMD, owner.output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use osutils::testutils::MockExecutor;
    use upcheck_api::report::FailureKind;

    fn remote(executor: &MockExecutor) -> Remote<'_> {
        Remote::new(executor, Duration::from_secs(5))
    }

    #[test]
    fn test_commands() {
        assert_eq!(
            NTPD_STATUS_CMD,
            "systemctl status ntpd | grep 'Active: active' --color=never"
        );
    }

    #[test]
    fn test_iptables_and_firewalld() {
        let executor = MockExecutor::new()
            .with_output(IPTABLES_STATUS_CMD, true, "   Active: active (exited)")
            .with_output(FIREWALLD_STATUS_CMD, false, "");
        assert!(iptables_status(remote(&executor)).is_pass());
        assert!(firewalld_status(remote(&executor)).is_pass());

        let executor = MockExecutor::new()
            .with_output(FIREWALLD_STATUS_CMD, true, "   Active: active (running)");
        assert!(firewalld_status(remote(&executor)).is_fail());
        assert_eq!(
            iptables_status(remote(&executor)).failure_kind(),
            Some(FailureKind::CommandFailed)
        );
    }

    #[test]
    fn test_ntpd_started_when_inactive() {
        let executor = MockExecutor::new()
            .with_output(NTPD_STATUS_CMD, false, "")
            .with_output(NTPD_STATUS_CMD, true, "   Active: active (running)")
            .with_output(NTPD_START_CMD, true, "")
            .with_output(NTPD_ENABLE_CMD, true, "Created symlink")
            .with_output(
                TIME_RPMS_CMD,
                true,
                "ntp-4.2.6p5-25.el7.x86_64\nchrony-2.1.1-4.el7.x86_64",
            );

        let verdict = ntpd_status(remote(&executor));
        assert!(verdict.is_pass(), "{verdict:?}");
        assert_eq!(executor.call_count(NTPD_STATUS_CMD), 2);
        assert_eq!(executor.call_count(NTPD_ENABLE_CMD), 1);
    }

    #[test]
    fn test_ntpd_failures() {
        let executor = MockExecutor::new()
            .with_output(NTPD_STATUS_CMD, false, "")
            .with_output(NTPD_START_CMD, false, "Failed to start ntpd.service");
        let verdict = ntpd_status(remote(&executor));
        assert_eq!(verdict.failure_kind(), Some(FailureKind::CommandFailed));
        assert_eq!(executor.call_count(NTPD_ENABLE_CMD), 0);

        let executor = MockExecutor::new()
            .with_output(NTPD_STATUS_CMD, true, "   Active: active (running)")
            .with_output(TIME_RPMS_CMD, true, "chrony-2.1.1-4.el7.x86_64");
        let verdict = ntpd_status(remote(&executor));
        assert_eq!(verdict.explanation, "ntp or chrony is not installed");
        assert_eq!(executor.call_count(NTPD_START_CMD), 0);
    }

    #[test]
    fn test_ovirt_imageio_daemon() {
        let executor = MockExecutor::new()
            .with_output(IMAGEIO_STATUS_CMD, true, "   Active: active (running)")
            .with_output(
                IMAGEIO_LOG_DIR_CMD,
                true,
                "drwxr-xr-x. 2 vdsm kvm 4096 Jul  6 10:00 /var/log/ovirt-imageio-daemon/",
            );
        assert!(ovirt_imageio_daemon(remote(&executor)).is_pass());

        let executor = MockExecutor::new()
            .with_output(IMAGEIO_STATUS_CMD, true, "   Active: active (running)")
            .with_output(
                IMAGEIO_LOG_DIR_CMD,
                true,
                "drwxr-xr-x. 2 root root 4096 Jul  6 10:00 /var/log/ovirt-imageio-daemon/",
            );
        assert!(ovirt_imageio_daemon(remote(&executor)).is_fail());
    }
}
