use std::collections::BTreeSet;

use const_format::formatcp;
use log::{error, info};

use osutils::rpm;
use upcheck_api::{
    constants::{PERSISTED_RPMS_PATH, REMOTE_RPM_DIR, USER_SPACE_RPM, USER_SPACE_RPM_QUERY},
    primitives::build::BuildName,
    report::CheckVerdict,
};

use super::Remote;

pub const KERNEL_SPACE_RPM: &str = "kernel_space_rpm";
pub const USER_SPACE_RPM_RULE: &str = "user_space_rpm";
pub const SIGNED: &str = "signed";
pub const CANNOT_UPDATE: &str = "cannot_update";
pub const CANNOT_INSTALL: &str = "cannot_install";
pub const NO_SPACE_UPDATE: &str = "no_space_update";

const KERNEL_RELEASE_CMD: &str = "uname -r";
const PERSISTED_RPMS_CMD: &str = formatcp!("ls {PERSISTED_RPMS_PATH}");
const YUM_UPDATE_CMD: &str = "yum update";
const YUM_UPDATE_YES_CMD: &str = "yum update -y";
const NO_UPDATE_MARKER: &str = "No packages marked for update";
const NOTHING_TO_DO_MARKER: &str = "Nothing to do";
const NO_SPACE_MARKERS: [&str; 3] = ["Disk Requirements", "No space left on device", "FAILED"];
const UPDATE_COMPLETE_MARKER: &str = "Complete";

/// Package set of the user space rpm, recorded the first time it is queried.
pub type UserSpaceBaseline = Option<BTreeSet<String>>;

/// Lists unsigned packages other than the update package of `target`.
fn signature_query(target: &BuildName) -> String {
    format!(
        "rpm -qa --qf '%{{name}}-%{{version}}-%{{release}}.%{{arch}} (%{{SIGPGP:pgpsig}})\\n' | \
         grep -v 'Key ID' | \
         grep -v 'update-{}' | \
         wc -l",
        target.version()
    )
}

/// The kernel module of `package` was rebuilt into weak-updates and the
/// package itself is persisted.
pub fn kernel_space_rpm(remote: Remote, package: Option<&str>) -> CheckVerdict {
    let Some(package) = package else {
        return CheckVerdict::not_applicable(KERNEL_SPACE_RPM, "no kernel space rpm configured");
    };
    let Some(module) = rpm::name_field(package, 1) else {
        return CheckVerdict::malformed(
            KERNEL_SPACE_RPM,
            format!("'{package}' has no module name field"),
        );
    };

    let kernel = remote.run(KERNEL_RELEASE_CMD);
    if !kernel.success {
        error!("Get kernel version failed");
        return CheckVerdict::command_failed(KERNEL_SPACE_RPM, "getting the kernel release failed")
            .with_evidence(KERNEL_RELEASE_CMD, kernel.output);
    }
    info!("kernel version is {}", kernel.output);

    let weak_updates_cmd = format!("ls /usr/lib/modules/{}/weak-updates/", kernel.output.trim());
    let weak_updates = remote.run(&weak_updates_cmd);
    if !weak_updates.success || !weak_updates.output.contains(module) {
        error!(
            "The result of \"{weak_updates_cmd}\" is {}, not include {module}",
            weak_updates.output
        );
        return CheckVerdict::mismatch(
            KERNEL_SPACE_RPM,
            format!("module '{module}' is not in weak-updates"),
        )
        .with_evidence(weak_updates_cmd, weak_updates.output);
    }

    let persisted = remote.run(PERSISTED_RPMS_CMD);
    if !persisted.success || !persisted.output.contains(package) {
        error!(
            "The result of \"{PERSISTED_RPMS_CMD}\" is {}, not include {package}",
            persisted.output
        );
        return CheckVerdict::mismatch(
            KERNEL_SPACE_RPM,
            format!("'{package}' is not persisted"),
        )
        .with_evidence(PERSISTED_RPMS_CMD, persisted.output);
    }

    CheckVerdict::pass(KERNEL_SPACE_RPM, format!("'{package}' survived the upgrade"))
}

/// The user space rpm is installed. The first successful call records the
/// installed package set in `baseline`; later calls require the same set.
pub fn user_space_rpm(remote: Remote, baseline: &mut UserSpaceBaseline) -> CheckVerdict {
    let result = remote.run(USER_SPACE_RPM_QUERY);
    if !result.success {
        error!("Check user space rpm {USER_SPACE_RPM} failed");
        return CheckVerdict::command_failed(
            USER_SPACE_RPM_RULE,
            format!("{USER_SPACE_RPM} is not installed"),
        )
        .with_evidence(USER_SPACE_RPM_QUERY, result.output);
    }

    let installed = rpm::package_set(&result.output);
    match baseline {
        Some(expected) if *expected != installed => {
            error!("User space rpm {USER_SPACE_RPM} is not persisted");
            CheckVerdict::mismatch(
                USER_SPACE_RPM_RULE,
                format!("{USER_SPACE_RPM} packages changed"),
            )
            .with_evidence("expected", expected.iter().cloned().collect::<Vec<_>>().join("\n"))
            .with_evidence(USER_SPACE_RPM_QUERY, result.output)
        }
        Some(_) => CheckVerdict::pass(
            USER_SPACE_RPM_RULE,
            format!("{USER_SPACE_RPM} packages persisted"),
        ),
        None => {
            info!("Recording {} {USER_SPACE_RPM} packages as baseline", installed.len());
            *baseline = Some(installed);
            CheckVerdict::pass(
                USER_SPACE_RPM_RULE,
                format!("{USER_SPACE_RPM} is installed"),
            )
        }
    }
}

/// Every installed package carries a signature, except the update package
/// of `target`.
pub fn signed(remote: Remote, target: &BuildName) -> CheckVerdict {
    let command = signature_query(target);
    let result = remote.run(&command);
    if !result.success {
        return CheckVerdict::command_failed(SIGNED, "signature query failed")
            .with_evidence(command, result.output);
    }

    let unsigned = result.output.trim();
    if unsigned == "0" {
        CheckVerdict::pass(SIGNED, "all packages are signed")
    } else {
        error!("The result of signed check is {unsigned}, not 0");
        CheckVerdict::mismatch(SIGNED, format!("{unsigned} packages are not signed"))
            .with_evidence(command, result.output)
    }
}

/// yum offers no update once the host runs the target build.
pub fn cannot_update(remote: Remote) -> CheckVerdict {
    if remote.check_strs_in_cmd_output(YUM_UPDATE_CMD, &[NO_UPDATE_MARKER]) {
        CheckVerdict::pass(CANNOT_UPDATE, "no packages marked for update")
    } else {
        CheckVerdict::mismatch(CANNOT_UPDATE, "yum still offers updates")
    }
}

/// Installing the update rpm `package` again is refused. `None` when the
/// package could not be looked up.
pub fn cannot_install(remote: Remote, package: Option<&str>) -> CheckVerdict {
    let Some(package) = package else {
        return CheckVerdict::command_failed(CANNOT_INSTALL, "update rpm name could not be found");
    };

    let command = format!("yum install {REMOTE_RPM_DIR}{package}");
    let result = remote.run(&command);
    if !result.success && result.output.contains(NOTHING_TO_DO_MARKER) {
        CheckVerdict::pass(CANNOT_INSTALL, format!("'{package}' cannot be installed again"))
    } else {
        CheckVerdict::mismatch(CANNOT_INSTALL, format!("'{package}' was not refused"))
            .with_evidence(command, result.output)
    }
}

/// An update on a host without free space does not complete.
pub fn no_space_update(remote: Remote) -> CheckVerdict {
    let result = remote.run(YUM_UPDATE_YES_CMD);

    let refused = NO_SPACE_MARKERS
        .iter()
        .any(|marker| result.output.contains(marker))
        || !result.output.contains(UPDATE_COMPLETE_MARKER);

    if refused {
        CheckVerdict::pass(NO_SPACE_UPDATE, "update without free space did not complete")
    } else {
        error!("Upgrade incorrect when no enough space left");
        CheckVerdict::mismatch(NO_SPACE_UPDATE, "update completed without free space")
            .with_evidence(YUM_UPDATE_YES_CMD, result.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use osutils::testutils::MockExecutor;
    use upcheck_api::report::FailureKind;

    const KMOD: &str = "kmod-8021q-1.0-1.el7.x86_64.rpm";

    fn remote(executor: &MockExecutor) -> Remote<'_> {
        Remote::new(executor, Duration::from_secs(5))
    }

    fn target() -> BuildName {
        "redhat-virtualization-host-4.1-20170706.0".parse().unwrap()
    }

    #[test]
    fn test_signature_query() {
        assert_eq!(
            signature_query(&target()),
            "rpm -qa --qf '%{name}-%{version}-%{release}.%{arch} (%{SIGPGP:pgpsig})\\n' | \
             grep -v 'Key ID' | grep -v 'update-4.1-20170706.0' | wc -l"
        );
    }

    #[test]
    fn test_kernel_space_rpm() {
        let executor = MockExecutor::new()
            .with_output(KERNEL_RELEASE_CMD, true, "3.10.0-693.el7.x86_64")
            .with_output(
                "ls /usr/lib/modules/3.10.0-693.el7.x86_64/weak-updates/",
                true,
                "8021q",
            )
            .with_output(PERSISTED_RPMS_CMD, true, KMOD);
        assert!(kernel_space_rpm(remote(&executor), Some(KMOD)).is_pass());

        let executor = MockExecutor::new()
            .with_output(KERNEL_RELEASE_CMD, true, "3.10.0-693.el7.x86_64")
            .with_output(
                "ls /usr/lib/modules/3.10.0-693.el7.x86_64/weak-updates/",
                true,
                "8021q",
            )
            .with_output(PERSISTED_RPMS_CMD, true, "");
        let verdict = kernel_space_rpm(remote(&executor), Some(KMOD));
        assert!(verdict.explanation.contains("is not persisted"));

        let executor = MockExecutor::new();
        assert_eq!(
            kernel_space_rpm(remote(&executor), Some(KMOD)).failure_kind(),
            Some(FailureKind::CommandFailed)
        );
        assert!(!kernel_space_rpm(remote(&executor), None).is_fail());
        assert_eq!(executor.calls().len(), 1);
    }

    #[test]
    fn test_user_space_rpm_baseline() {
        let executor = MockExecutor::new()
            .with_output(
                USER_SPACE_RPM_QUERY,
                true,
                "httpd-2.4.6-67.el7.x86_64\r\nhttpd-tools-2.4.6-67.el7.x86_64",
            )
            .with_output(
                USER_SPACE_RPM_QUERY,
                true,
                "httpd-tools-2.4.6-67.el7.x86_64\nhttpd-2.4.6-67.el7.x86_64",
            )
            .with_output(USER_SPACE_RPM_QUERY, true, "httpd-tools-2.4.6-67.el7.x86_64");

        let mut baseline = None;
        assert!(user_space_rpm(remote(&executor), &mut baseline).is_pass());
        assert_eq!(baseline.as_ref().map(BTreeSet::len), Some(2));
        // Same set in another order.
        assert!(user_space_rpm(remote(&executor), &mut baseline).is_pass());
        assert!(user_space_rpm(remote(&executor), &mut baseline).is_fail());
    }

    #[test]
    fn test_user_space_rpm_missing_keeps_baseline_unset() {
        let executor = MockExecutor::new().with_output(USER_SPACE_RPM_QUERY, false, "");
        let mut baseline = None;
        assert_eq!(
            user_space_rpm(remote(&executor), &mut baseline).failure_kind(),
            Some(FailureKind::CommandFailed)
        );
        assert!(baseline.is_none());
    }

    #[test]
    fn test_signed() {
        let command = signature_query(&target());
        let executor = MockExecutor::new().with_output(&command, true, "0");
        assert!(signed(remote(&executor), &target()).is_pass());

        let executor = MockExecutor::new().with_output(&command, true, "3");
        assert_eq!(
            signed(remote(&executor), &target()).explanation,
            "3 packages are not signed"
        );
    }

    #[test]
    fn test_cannot_update_and_install() {
        let package = "redhat-virtualization-host-image-update-4.1-20170706.0.el7_3.noarch.rpm";
        let executor = MockExecutor::new()
            .with_output(YUM_UPDATE_CMD, false, "Loaded plugins\nNo packages marked for update")
            .with_output(
                &format!("yum install /root/{package}"),
                false,
                "Package already installed\nError: Nothing to do",
            );
        assert!(cannot_update(remote(&executor)).is_pass());
        assert!(cannot_install(remote(&executor), Some(package)).is_pass());
        assert_eq!(
            cannot_install(remote(&executor), None).failure_kind(),
            Some(FailureKind::CommandFailed)
        );
    }

    #[test]
    fn test_no_space_update() {
        let executor = MockExecutor::new().with_output(
            YUM_UPDATE_YES_CMD,
            false,
            "Disk Requirements:\n  At least 512MB more space needed on the / filesystem.",
        );
        assert!(no_space_update(remote(&executor)).is_pass());

        let executor = MockExecutor::new().with_output(YUM_UPDATE_YES_CMD, true, "Complete!");
        assert!(no_space_update(remote(&executor)).is_fail());
    }
}
