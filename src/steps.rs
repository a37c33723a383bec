//! Helper steps the check points run on the host outside of a rule.

use std::{path::Path, thread, time::Duration};

use const_format::formatcp;
use log::{error, info, warn};
use url::Url;

use osutils::{remote::RemoteExecutor, rpm};
use upcheck_api::{
    config::Timeouts,
    constants::{REBOOT_TIMEOUT_SECS, REMOTE_REPO_DIR, USER_SPACE_INSTALL_LOG, USER_SPACE_RPM},
    error::{RemoteError, ReportError, UpcheckError},
    primitives::build::BuildName,
};

use crate::{checks::Remote, web::WebProbe};

const REBOOT_CMD: &str = "systemctl reboot";
const IMGBASE_W_CMD: &str = "imgbase w";
const INSTALL_USER_SPACE_RPM_CMD: &str =
    formatcp!("yum install -y {USER_SPACE_RPM} > {USER_SPACE_INSTALL_LOG}");

/// Reboots the host when `reboot` is set, then polls `imgbase w` until the
/// host answers. Returns the output of `imgbase w`.
pub fn enter_system(
    executor: &dyn RemoteExecutor,
    timeouts: &Timeouts,
    reboot: bool,
) -> Result<String, UpcheckError> {
    info!("Reboot and log into system...");

    if reboot {
        // The session drops while the command runs.
        executor.run_cmd(REBOOT_CMD, Duration::from_secs(REBOOT_TIMEOUT_SECS));
    }
    if let Err(e) = executor.disconnect() {
        warn!("Failed to close the remote session: {e:?}");
    }

    for attempt in 1..=timeouts.enter_system_max_count {
        thread::sleep(timeouts.enter_system_interval());
        let result = executor.run_cmd(IMGBASE_W_CMD, timeouts.enter_system());
        if result.success {
            info!("Reboot and log into system finished after {attempt} attempts");
            return Ok(result.output);
        }
    }

    error!(
        "Host did not come back after {} attempts",
        timeouts.enter_system_max_count
    );
    Err(UpcheckError::new(RemoteError::EnterSystem))
}

/// Uploads `repo_file` from `repo_dir` into the host's yum repo directory.
pub fn put_repo_to_host(
    executor: &dyn RemoteExecutor,
    repo_dir: &Path,
    repo_file: &str,
) -> Result<(), UpcheckError> {
    let local = repo_dir.join(repo_file);
    info!("Put repo file {} to host...", local.display());

    executor
        .put_remote_file(&local, REMOTE_REPO_DIR)
        .structured(RemoteError::PutFile {
            path: local.display().to_string(),
        })
}

/// Installs the user space rpm, logging yum's output to a file on the host.
pub fn install_user_space_rpm(remote: Remote) -> Result<(), UpcheckError> {
    info!("Start to install user space rpm...");

    if !remote.run(INSTALL_USER_SPACE_RPM_CMD).success {
        error!(
            "Install user space rpm {USER_SPACE_RPM} failed. Please check {USER_SPACE_INSTALL_LOG}"
        );
        return Err(UpcheckError::new(RemoteError::RunCommand {
            command: INSTALL_USER_SPACE_RPM_CMD.into(),
        }));
    }
    Ok(())
}

/// Moves every file in `from` on the host into `to`, creating `to` first.
pub fn move_rpm_packages(remote: Remote, from: &str, to: &str) -> Result<(), UpcheckError> {
    info!("Moving rpm packages from {from} to {to}");

    // `to` may exist already.
    remote.run(&format!("mkdir {to}"));

    let command = format!("mv {from}/* {to}");
    if !remote.run(&command).success {
        error!("Failed to mv rpm packages from {from}");
        return Err(UpcheckError::new(RemoteError::RunCommand { command }));
    }
    Ok(())
}

/// Name of the update rpm of `target` in the directory listing at
/// `listing`, or `None` when it cannot be found.
pub fn update_rpm_name(probe: &dyn WebProbe, listing: &Url, target: &BuildName) -> Option<String> {
    let body = match probe.fetch_text(listing) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to fetch the update rpm listing: {e:?}");
            return None;
        }
    };

    let name = rpm::find_package_link(&body, target.version()).map(str::to_string);
    if name.is_none() {
        error!("No update rpm for {} in {listing}", target.version());
    }
    name
}
