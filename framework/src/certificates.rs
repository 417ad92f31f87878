use crate::command;
use crate::constants::CERT_GENERATION_SCRIPT;
use crate::error::{self, Result};
use snafu::{ensure, ResultExt};
use std::path::Path;
use tokio::process::Command;

/// Produces the TLS material the collector serves its metrics endpoint with.
#[async_trait::async_trait]
pub trait CertificateProvisioner: Send + Sync {
    /// Generate certificates for `subject` in `namespace` into `working_dir`, using the helper
    /// scripts found in `scripts_dir`.
    async fn generate_certificates(
        &self,
        namespace: &str,
        scripts_dir: &Path,
        subject: &str,
        working_dir: &Path,
    ) -> Result<()>;
}

/// Runs `cert_generation.sh` from the scripts directory.
#[derive(Debug, Clone, Default)]
pub struct ScriptCertificates;

#[async_trait::async_trait]
impl CertificateProvisioner for ScriptCertificates {
    async fn generate_certificates(
        &self,
        namespace: &str,
        scripts_dir: &Path,
        subject: &str,
        working_dir: &Path,
    ) -> Result<()> {
        let script = scripts_dir.join(CERT_GENERATION_SCRIPT);
        let mut cmd = Command::new("bash");
        cmd.arg(&script)
            .arg(working_dir)
            .arg(namespace)
            .arg(subject);
        let output = command::output(CERT_GENERATION_SCRIPT, &mut cmd).await?;
        ensure!(
            output.status.success(),
            error::CertificatesSnafu {
                subject,
                message: command::failure_message(&script.to_string_lossy(), &output),
            }
        );
        Ok(())
    }
}

/// Read a file the certificate scripts left in `working_dir`.
pub async fn read_working_file(working_dir: &Path, name: &str) -> Result<String> {
    let path = working_dir.join(name);
    tokio::fs::read_to_string(&path)
        .await
        .context(error::FileSnafu { path })
}
