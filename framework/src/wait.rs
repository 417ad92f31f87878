use crate::command;
use crate::error::{self, Result};
use snafu::ensure;
use std::path::Path;
use tokio::process::Command;

/// Block until `resource` (e.g. `pod/test-fluent-1a2b3c4d`) in `namespace` reports `condition`,
/// or until `timeout` (e.g. `60s`) elapses. Polling is left to `kubectl`/`oc wait`.
pub async fn wait_for_condition(
    kubectl: &str,
    kubeconfig: Option<&Path>,
    namespace: &str,
    resource: &str,
    condition: &str,
    timeout: &str,
) -> Result<()> {
    let mut cmd = Command::new(kubectl);
    if let Some(kubeconfig) = kubeconfig {
        cmd.arg("--kubeconfig").arg(kubeconfig);
    }
    cmd.args(wait_args(namespace, resource, condition, timeout));
    let output = command::output(kubectl, &mut cmd).await?;
    ensure!(
        output.status.success(),
        error::WaitSnafu {
            resource,
            condition,
            message: command::failure_message(&format!("{} wait", kubectl), &output),
        }
    );
    Ok(())
}

fn wait_args(namespace: &str, resource: &str, condition: &str, timeout: &str) -> Vec<String> {
    vec![
        "wait".to_string(),
        "-n".to_string(),
        namespace.to_string(),
        resource.to_string(),
        format!("--timeout={}", timeout),
        format!("--for=condition={}", condition),
    ]
}
