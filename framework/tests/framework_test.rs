#![cfg(feature = "integ")]

use fluentd_functional::{
    init_logger, CertificateProvisioner, Error, FunctionalFramework, HttpStatusCode, Result,
    TestSession,
};
use selftest::Cluster;
use std::path::Path;
use tokio::time::Duration;

/// How long we give a namespace to disappear after `cleanup`.
const NAMESPACE_TIMEOUT: Duration = Duration::from_secs(120);

/// Writes a key but no certificate, so `deploy` stops after the config configmap.
struct HalfCertificates;

#[async_trait::async_trait]
impl CertificateProvisioner for HalfCertificates {
    async fn generate_certificates(
        &self,
        _namespace: &str,
        _scripts_dir: &Path,
        _subject: &str,
        working_dir: &Path,
    ) -> Result<()> {
        std::fs::write(working_dir.join("system.logging.fluentd.key"), "KEY").unwrap();
        Ok(())
    }
}

async fn framework(cluster: &Cluster) -> FunctionalFramework {
    let settings = data::integ_settings(&cluster.kubeconfig());
    init_logger(settings.verbosity);
    cluster
        .load_image_to_cluster(&settings.fluentd_image())
        .unwrap();
    let session = TestSession::new(cluster.k8s_client().await.unwrap())
        .await
        .unwrap();
    FunctionalFramework::new(session, settings)
        .unwrap()
        .with_config_generator(data::StaticGenerator)
}

#[tokio::test]
async fn deploy_run_command_cleanup() {
    let cluster = Cluster::new("functional-deploy").unwrap();
    let mut framework = framework(&cluster).await;
    framework
        .forwarder_mut()
        .add_pipeline(["application"], ["default"]);

    framework.deploy().await.unwrap();
    assert!(framework.is_deployed());
    assert_eq!(framework.conf(), data::FLUENT_CONF);

    let out = framework.run_command(&["echo", "hi"]).await.unwrap();
    assert_eq!(out, "hi\n");
    let out = framework.run_command_line("echo hi").await.unwrap();
    assert_eq!(out, "hi\n");
    let failed = framework.run_command(&["false"]).await;
    assert!(matches!(failed, Err(Error::ExecFailed { .. })));
    let empty = framework.run_command::<&str>(&[]).await;
    assert!(matches!(empty, Err(Error::EmptyCommand { .. })));
    let empty = framework.run_command_line("   ").await;
    assert!(matches!(empty, Err(Error::EmptyCommand { .. })));

    // Every object name is taken now.
    let err = framework.deploy().await.unwrap_err();
    assert!(err.is_conflict(), "expected a name collision, got: {}", err);

    let namespace = framework.namespace().to_string();
    framework.cleanup().await.unwrap();
    cluster
        .wait_for_namespace_deletion(&namespace, NAMESPACE_TIMEOUT)
        .await
        .unwrap();
}

#[tokio::test]
async fn cleanup_after_partial_deploy() {
    let cluster = Cluster::new("functional-partial").unwrap();
    let mut framework = framework(&cluster)
        .await
        .with_certificate_provisioner(HalfCertificates);

    let err = framework.deploy().await.unwrap_err();
    assert!(matches!(err, Error::File { .. }));
    assert!(!framework.is_deployed());
    let namespace = framework.namespace().to_string();
    assert_eq!(cluster.config_map_count(&namespace).await.unwrap(), 1);

    framework.cleanup().await.unwrap();
    cluster
        .wait_for_namespace_deletion(&namespace, NAMESPACE_TIMEOUT)
        .await
        .unwrap();
    // The namespace is already gone; closing again is not an error.
    framework.cleanup().await.unwrap();
}
