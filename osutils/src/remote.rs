//! Remote command execution on the host under test.
//!
//! Everything the harness does on the host goes through [`RemoteExecutor`]:
//! snapshot collection, live checks and the helper steps around them. A
//! command either succeeds or fails; its output is returned in both cases so
//! rules can inspect it.

use std::{
    path::{Path, PathBuf},
    process::Command,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Error};
use duct::cmd;
use log::{debug, trace, warn};

use crate::exe::RunAndCheck;

/// Quotes `arg` for a POSIX shell, e.g. `it's` -> `'it'\''s'`.
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Interval at which a running remote command is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of one remote command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteOutput {
    /// The command exited with status 0 before its timeout.
    pub success: bool,

    /// Combined stdout and stderr with trailing whitespace removed. May hold
    /// CR-LF line endings and warning noise.
    pub output: String,
}

impl RemoteOutput {
    pub fn new(success: bool, output: impl Into<String>) -> Self {
        Self {
            success,
            output: output.into(),
        }
    }

    pub fn contains_all(&self, strings: &[&str]) -> bool {
        strings.iter().all(|s| self.output.contains(s))
    }
}

/// A session on the host under test.
pub trait RemoteExecutor {
    /// Runs `command` in a remote shell. A non-zero exit status or exceeding
    /// `timeout` is reported as an unsuccessful output, never as an error.
    fn run_cmd(&self, command: &str, timeout: Duration) -> RemoteOutput;

    /// Copies the local file `local` into `remote_dir` on the host.
    fn put_remote_file(&self, local: &Path, remote_dir: &str) -> Result<(), Error>;

    /// Closes the session. Later commands open a new one.
    fn disconnect(&self) -> Result<(), Error>;

    /// Whether the remote file at `path` can be read and contains every
    /// string in `strings`.
    fn check_strs_in_file(&self, path: &str, strings: &[&str], timeout: Duration) -> bool {
        let result = self.run_cmd(&format!("cat {}", shell_quote(path)), timeout);
        result.success && result.contains_all(strings)
    }

    /// Whether the output of `command` contains every string in `strings`.
    /// The exit status of the command is not considered.
    fn check_strs_in_cmd_output(&self, command: &str, strings: &[&str], timeout: Duration) -> bool {
        self.run_cmd(command, timeout).contains_all(strings)
    }
}

/// Runs remote commands through the system `ssh` client.
///
/// All invocations share one control master socket, so only the first
/// command of a session pays for the handshake.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    destination: String,
    port: Option<u16>,
    identity_file: Option<PathBuf>,
    control_path: PathBuf,
}

impl SshExecutor {
    pub fn new(host: impl Into<String>, user: impl AsRef<str>) -> Self {
        let host = host.into();
        let destination = format!("{}@{}", user.as_ref(), host);
        let control_path = std::env::temp_dir().join(format!("upcheck-ssh-{destination}"));
        Self {
            destination,
            port: None,
            identity_file: None,
            control_path,
        }
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn with_identity_file(mut self, identity_file: Option<PathBuf>) -> Self {
        self.identity_file = identity_file;
        self
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Options shared by `ssh` and `scp`.
    fn common_options(&self) -> Vec<String> {
        let mut options = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
            "-o".to_string(),
            "ControlMaster=auto".to_string(),
            "-o".to_string(),
            format!("ControlPath={}", self.control_path.display()),
            "-o".to_string(),
            "ControlPersist=yes".to_string(),
        ];

        if let Some(identity_file) = &self.identity_file {
            options.push("-i".to_string());
            options.push(identity_file.display().to_string());
        }

        options
    }

    fn ssh_args(&self, command: &str, timeout: Duration) -> Vec<String> {
        let mut args = self.common_options();
        if let Some(port) = self.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        args.push("-o".to_string());
        args.push(format!("ConnectTimeout={}", timeout.as_secs().max(1)));
        args.push(self.destination.clone());
        args.push(command.to_string());
        args
    }

    fn try_run(&self, command: &str, timeout: Duration) -> Result<RemoteOutput, Error> {
        let handle = cmd("ssh", self.ssh_args(command, timeout))
            .stdin_null()
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .start()
            .context("Failed to start ssh")?;

        let started = Instant::now();
        loop {
            if let Some(output) = handle.try_wait().context("Failed to wait for ssh")? {
                let text = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
                return Ok(RemoteOutput::new(output.status.success(), text));
            }

            if started.elapsed() >= timeout {
                handle.kill().context("Failed to kill timed out ssh")?;
                warn!(
                    "Command '{command}' on '{}' timed out after {}s",
                    self.destination,
                    timeout.as_secs()
                );
                return Ok(RemoteOutput::new(
                    false,
                    format!("Timed out after {}s", timeout.as_secs()),
                ));
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl RemoteExecutor for SshExecutor {
    fn run_cmd(&self, command: &str, timeout: Duration) -> RemoteOutput {
        debug!("Running on '{}': {command}", self.destination);
        let result = match self.try_run(command, timeout) {
            Ok(result) => result,
            Err(e) => {
                warn!("Failed to run '{command}' on '{}': {e:?}", self.destination);
                RemoteOutput::new(false, format!("{e:#}"))
            }
        };
        trace!(
            "Command '{command}' finished, success: {}, output:\n{}",
            result.success,
            result.output
        );
        result
    }

    fn put_remote_file(&self, local: &Path, remote_dir: &str) -> Result<(), Error> {
        debug!(
            "Copying '{}' to '{}:{remote_dir}'",
            local.display(),
            self.destination
        );
        let mut scp = Command::new("scp");
        scp.args(self.common_options());
        if let Some(port) = self.port {
            scp.arg("-P").arg(port.to_string());
        }
        scp.arg(local)
            .arg(format!("{}:{remote_dir}", self.destination))
            .run_and_check()
            .with_context(|| format!("Failed to copy '{}' to the host", local.display()))
    }

    fn disconnect(&self) -> Result<(), Error> {
        if !self.control_path.exists() {
            trace!("No open session to '{}'", self.destination);
            return Ok(());
        }

        debug!("Closing session to '{}'", self.destination);
        Command::new("ssh")
            .arg("-o")
            .arg(format!("ControlPath={}", self.control_path.display()))
            .arg("-O")
            .arg("exit")
            .arg(&self.destination)
            .run_and_check()
            .context("Failed to close ssh control master")
    }
}
