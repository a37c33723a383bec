use std::{
    os::unix::process::ExitStatusExt,
    process::{Command, ExitStatus, Output},
};

use anyhow::{bail, Context, Error};
use log::trace;

use crate::crate_private::Sealed;

/// Runs the local helper processes of a session (`scp`, `ssh -O`) and turns
/// a non-zero exit into an error carrying their output. Sealed, so it cannot
/// be implemented outside of this crate.
pub trait RunAndCheck: Sealed {
    fn run_and_check(&mut self) -> Result<(), Error>;
    fn render_command(&self) -> String;
}

impl Sealed for Command {}

impl RunAndCheck for Command {
    fn run_and_check(&mut self) -> Result<(), Error> {
        let rendered_command = self.render_command();
        trace!("Executing '{rendered_command}'");
        let output = self
            .output()
            .with_context(|| format!("Failed to execute: {rendered_command}"))?;
        trace!(
            "Executed '{rendered_command}': {}",
            explain_exit(output.status)
        );

        if !output.status.success() {
            bail!(
                "Error when running: {rendered_command}: {}\n{}",
                explain_exit(output.status),
                captured_output(&output)
            );
        }
        Ok(())
    }

    fn render_command(&self) -> String {
        std::iter::once(self.get_program().to_string_lossy())
            .chain(self.get_args().map(|arg| arg.to_string_lossy()))
            .map(|part| {
                if part.contains(' ') {
                    format!("'{part}'")
                } else {
                    part.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn explain_exit(status: ExitStatus) -> String {
    match (status.code(), status.signal()) {
        (Some(code), _) => format!("process exited with status: {code}"),
        (None, Some(signal)) => format!("process was terminated by signal: {signal}"),
        (None, None) => "process exited with unknown status".into(),
    }
}

/// Stderr if the process wrote any, stdout otherwise.
fn captured_output(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout).trim_end().to_string()
    } else {
        stderr.trim_end().to_string()
    }
}
