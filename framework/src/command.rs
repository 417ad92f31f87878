use crate::error::{self, Result};
use log::trace;
use snafu::ResultExt;
use std::process::Output;
use tokio::process::Command;

/// Run `command` to completion and capture its output. Only a failure to start the program is an
/// error here; callers decide what a non-zero exit status means.
pub(crate) async fn output(program: &str, command: &mut Command) -> Result<Output> {
    trace!("running {:?}", command);
    command
        .kill_on_drop(true)
        .output()
        .await
        .context(error::CommandSnafu { program })
}

/// Describe a failed run the same way for every external tool.
pub(crate) fn failure_message(what: &str, output: &Output) -> String {
    format!(
        "'{}' failed with exit status '{}'\n\n{}\n\n{}",
        what,
        output.status.code().unwrap_or(1),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    )
}
