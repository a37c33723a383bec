//! Live checks: rules that run commands on the host, or query the
//! management API, at evaluation time instead of reading a snapshot.

use std::time::Duration;

use log::info;

use osutils::remote::{RemoteExecutor, RemoteOutput};

pub mod files;
pub mod host;
pub mod logs;
pub mod packages;
pub mod services;

/// The host under test, with the timeout applied to every command.
#[derive(Clone, Copy)]
pub struct Remote<'a> {
    pub executor: &'a dyn RemoteExecutor,
    pub timeout: Duration,
}

impl<'a> Remote<'a> {
    pub fn new(executor: &'a dyn RemoteExecutor, timeout: Duration) -> Self {
        Self { executor, timeout }
    }

    /// Runs `command` and logs its result.
    pub fn run(&self, command: &str) -> RemoteOutput {
        let result = self.executor.run_cmd(command, self.timeout);
        info!(
            "The result of \"{command}\" is ({}) {}",
            if result.success { "ok" } else { "failed" },
            result.output
        );
        result
    }

    pub fn check_strs_in_file(&self, path: &str, strings: &[&str]) -> bool {
        self.executor.check_strs_in_file(path, strings, self.timeout)
    }

    pub fn check_strs_in_cmd_output(&self, command: &str, strings: &[&str]) -> bool {
        self.executor
            .check_strs_in_cmd_output(command, strings, self.timeout)
    }
}
