use crate::command;
use crate::error::{self, Result};
use snafu::{ensure, ResultExt};
use std::io::Write;
use tempfile::NamedTempFile;
use tokio::process::Command;

/// Compiles a serialized forwarding specification into the collector's native configuration.
#[async_trait::async_trait]
pub trait ConfigGenerator: Send + Sync {
    /// Render `spec_yaml`. When `debug` is set the generator annotates its output.
    async fn generate(&self, spec_yaml: &str, debug: bool) -> Result<String>;
}

/// A `ConfigGenerator` backed by the `forwarder-generator` command line tool.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    path: String,
}

impl CommandGenerator {
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ConfigGenerator for CommandGenerator {
    async fn generate(&self, spec_yaml: &str, debug: bool) -> Result<String> {
        let mut spec_file = NamedTempFile::new().context(error::IoSnafu {
            action: "create forwarder spec file",
        })?;
        spec_file
            .write_all(spec_yaml.as_bytes())
            .context(error::IoSnafu {
                action: "write forwarder spec file",
            })?;

        let mut cmd = Command::new(&self.path);
        cmd.arg("--file").arg(spec_file.path());
        if debug {
            cmd.arg("--debug-output");
        }
        let output = command::output(&self.path, &mut cmd).await?;
        ensure!(
            output.status.success(),
            error::GenerateSnafu {
                message: command::failure_message(&self.path, &output),
            }
        );
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn missing_generator_binary() {
        let generator = CommandGenerator::new("/nonexistent/forwarder-generator");
        let err = generator.generate("kind: ClusterLogForwarder", false).await;
        assert!(matches!(err, Err(Error::Command { .. })));
    }

    #[tokio::test]
    async fn failing_generator_is_a_generation_error() {
        let generator = CommandGenerator::new("false");
        let err = generator.generate("kind: ClusterLogForwarder", false).await;
        assert!(matches!(err, Err(Error::Generate { .. })));
    }
}
