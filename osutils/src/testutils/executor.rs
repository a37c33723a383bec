use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Error};

use crate::remote::{RemoteExecutor, RemoteOutput};

/// Scripted executor replaying canned outputs.
///
/// Each command maps to a queue of outputs. Outputs are consumed in order
/// and the last one repeats. Commands without a script fail.
#[derive(Debug, Default)]
pub struct MockExecutor {
    scripts: RefCell<HashMap<String, VecDeque<RemoteOutput>>>,
    calls: RefCell<Vec<String>>,
    uploads: RefCell<Vec<(PathBuf, String)>>,
    fail_uploads: bool,
    disconnects: Cell<usize>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `(success, output)` to the queue of `command`.
    pub fn with_output(self, command: &str, success: bool, output: &str) -> Self {
        self.scripts
            .borrow_mut()
            .entry(command.to_string())
            .or_default()
            .push_back(RemoteOutput::new(success, output));
        self
    }

    /// Makes every `put_remote_file` call fail.
    pub fn with_failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    /// Commands run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Number of times `command` was run.
    pub fn call_count(&self, command: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == command).count()
    }

    /// Files uploaded so far, as `(local, remote_dir)`.
    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.uploads.borrow().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.get()
    }
}

impl RemoteExecutor for MockExecutor {
    fn run_cmd(&self, command: &str, _timeout: Duration) -> RemoteOutput {
        self.calls.borrow_mut().push(command.to_string());

        let mut scripts = self.scripts.borrow_mut();
        match scripts.get_mut(command) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => RemoteOutput::new(false, format!("unscripted command: {command}")),
        }
    }

    fn put_remote_file(&self, local: &Path, remote_dir: &str) -> Result<(), Error> {
        if self.fail_uploads {
            bail!("Upload of '{}' failed", local.display());
        }
        self.uploads
            .borrow_mut()
            .push((local.to_path_buf(), remote_dir.to_string()));
        Ok(())
    }

    fn disconnect(&self) -> Result<(), Error> {
        self.disconnects.set(self.disconnects.get() + 1);
        Ok(())
    }
}
