use crate::certificates::{read_working_file, CertificateProvisioner, ScriptCertificates};
use crate::constants::{
    CERTS_PREFIX, CERT_SUBJECT, CONDITION_READY, CONFIG_MOUNT_PATH, CONTAINER_LOG_LEVEL,
    ENTRYPOINT_MOUNT_PATH, ENV_LOG_LEVEL, ENV_POD_IP, FIELD_POD_IP, FLUENTD, FLUENTD_CRT_FILE,
    FLUENTD_KEY_FILE, FLUENT_CONF, LABEL_TEST_NAME, LABEL_TEST_TYPE, METRICS_MOUNT_PATH,
    METRICS_PORT, READY_TIMEOUT, RUN_SCRIPT, TEST_NAME_PREFIX, TEST_TYPE_FUNCTIONAL, TLS_CRT,
    TLS_KEY, VOLUME_CERTS, VOLUME_CONFIG, VOLUME_ENTRYPOINT,
};
use crate::error::{self, Result};
use crate::exec::{exec, split_command_line};
use crate::forwarder::{new_cluster_log_forwarder, ClusterLogForwarder};
use crate::generator::{CommandGenerator, ConfigGenerator};
use crate::logging::level_for;
use crate::session::{unique_name, TestSession};
use crate::settings::Settings;
use crate::system::{
    config_map, ConfigMapVolume, ContainerConfig, EnvVarConfig, PodConfig, ServiceConfig,
    ServicePortConfig, VolumeMountConfig,
};
use crate::wait::wait_for_condition;
use k8s_openapi::api::core::v1::Pod;
use maplit::btreemap;
use snafu::{ensure, OptionExt, ResultExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Log `$fmt` at verbosity `$v`: dropped unless the framework was configured with a verbosity of
/// at least `$v`.
macro_rules! v {
    ($framework:expr, $v:expr, $($arg:tt)+) => {
        if $v <= $framework.settings.verbosity {
            log::log!(level_for($v), $($arg)+);
        }
    };
}

/// Where certificates are generated.
#[derive(Debug)]
enum WorkingDir {
    Shared(PathBuf),
    Temp(TempDir),
}

impl WorkingDir {
    fn path(&self) -> &Path {
        match self {
            WorkingDir::Shared(path) => path,
            WorkingDir::Temp(dir) => dir.path(),
        }
    }
}

/// # Functional Framework
///
/// Deploys a stand-alone collector pod configured with the `fluent.conf` the config generator
/// renders from [`forwarder`](Self::forwarder), so that a test can exercise it end to end.
///
/// A framework moves from undeployed to deployed when [`deploy`](Self::deploy) succeeds. A
/// failed `deploy` can leave some objects behind; [`cleanup`](Self::cleanup) must be called
/// either way. Deploying twice without cleaning up fails because the object names collide.
pub struct FunctionalFramework {
    name: String,
    conf: String,
    image: String,
    labels: BTreeMap<String, String>,
    forwarder: ClusterLogForwarder,
    settings: Settings,
    session: TestSession,
    generator: Box<dyn ConfigGenerator>,
    certificates: Box<dyn CertificateProvisioner>,
    working_dir: WorkingDir,
    pod: Option<Pod>,
}

impl FunctionalFramework {
    /// Create a framework for a test owning `session`. Nothing is sent to the cluster until
    /// `deploy`.
    pub fn new(session: TestSession, settings: Settings) -> Result<Self> {
        let name = unique_name(TEST_NAME_PREFIX);
        let working_dir = match &settings.working_dir {
            Some(path) => WorkingDir::Shared(path.clone()),
            None => WorkingDir::Temp(TempDir::new().context(error::IoSnafu {
                action: "create certificate working directory",
            })?),
        };
        Ok(Self {
            labels: btreemap! {
                LABEL_TEST_TYPE.to_string() => TEST_TYPE_FUNCTIONAL.to_string(),
                LABEL_TEST_NAME.to_string() => name.clone(),
            },
            name,
            conf: String::new(),
            image: settings.component_image(FLUENTD),
            forwarder: new_cluster_log_forwarder(),
            generator: Box::new(CommandGenerator::new(settings.generator_path.clone())),
            certificates: Box::new(ScriptCertificates),
            settings,
            session,
            working_dir,
            pod: None,
        })
    }

    /// Replace the config generator.
    pub fn with_config_generator<G>(mut self, generator: G) -> Self
    where
        G: ConfigGenerator + 'static,
    {
        self.generator = Box::new(generator);
        self
    }

    /// Replace the certificate provisioner.
    pub fn with_certificate_provisioner<C>(mut self, certificates: C) -> Self
    where
        C: CertificateProvisioner + 'static,
    {
        self.certificates = Box::new(certificates);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        self.session.namespace()
    }

    /// The configuration rendered by the most recent `deploy`.
    pub fn conf(&self) -> &str {
        &self.conf
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn forwarder(&self) -> &ClusterLogForwarder {
        &self.forwarder
    }

    pub fn forwarder_mut(&mut self) -> &mut ClusterLogForwarder {
        &mut self.forwarder
    }

    /// The collector pod, once `deploy` has succeeded.
    pub fn pod(&self) -> Option<&Pod> {
        self.pod.as_ref()
    }

    pub fn is_deployed(&self) -> bool {
        self.pod.is_some()
    }

    fn certs_name(&self) -> String {
        format!("{}-{}", CERTS_PREFIX, self.name)
    }

    /// Deploy the objects needed to functional test the collector.
    pub async fn deploy(&mut self) -> Result<()> {
        v!(self, 2, "generating config for forwarder {:?}", self.forwarder.spec);
        let spec_yaml = self.forwarder.to_yaml()?;
        self.conf = self.generator.generate(&spec_yaml, false).await?;
        v!(self, 3, "generated config:\n{}", self.conf);

        v!(self, 2, "generating certificates");
        self.certificates
            .generate_certificates(
                self.session.namespace(),
                &self.settings.scripts_dir,
                CERT_SUBJECT,
                self.working_dir.path(),
            )
            .await?;

        v!(self, 2, "creating config configmap");
        let run_script = self.run_script().await?;
        let config = config_map(
            self.session.namespace(),
            &self.name,
            [
                (FLUENT_CONF, self.conf.clone()),
                (RUN_SCRIPT, run_script),
            ],
        );
        self.session.create(&config, "config configmap").await?;

        v!(self, 2, "creating certs configmap");
        let tls_key = read_working_file(self.working_dir.path(), FLUENTD_KEY_FILE).await?;
        let tls_crt = read_working_file(self.working_dir.path(), FLUENTD_CRT_FILE).await?;
        let certs = config_map(
            self.session.namespace(),
            &self.certs_name(),
            [(TLS_KEY, tls_key), (TLS_CRT, tls_crt)],
        );
        self.session.create(&certs, "certs configmap").await?;

        v!(self, 2, "creating service");
        let service = self.service_config().into_service();
        self.session.create(&service, "service").await?;

        v!(self, 2, "creating pod");
        let pod = self.pod_config().into_pod()?;
        let pod = self.session.create(&pod, "pod").await?;

        v!(self, 2, "waiting for pod to be ready");
        wait_for_condition(
            &self.settings.kubectl_path,
            self.settings.kubeconfig.as_deref(),
            self.session.namespace(),
            &format!("pod/{}", self.name),
            CONDITION_READY,
            READY_TIMEOUT,
        )
        .await?;
        self.pod = Some(pod);
        Ok(())
    }

    /// Run `command` in the collector container and return its combined stdout and stderr.
    pub async fn run_command<S>(&self, command: &[S]) -> Result<String>
    where
        S: AsRef<str>,
    {
        let pod = self.pod.as_ref().context(error::NotDeployedSnafu {
            name: self.name.as_str(),
        })?;
        let pod_name = pod.metadata.name.as_deref().unwrap_or(&self.name);
        ensure!(
            !command.is_empty(),
            error::EmptyCommandSnafu { pod: pod_name }
        );
        let command: Vec<String> = command.iter().map(|s| s.as_ref().to_string()).collect();
        v!(self, 2, "running {:?}", command);
        exec(&self.session.api::<Pod>(), pod_name, &self.name, &command).await
    }

    /// Split `line` on whitespace and run it with [`run_command`](Self::run_command). Arguments
    /// containing spaces can not be expressed this way.
    pub async fn run_command_line(&self, line: &str) -> Result<String> {
        self.run_command(split_command_line(line).as_slice()).await
    }

    /// Release everything the test created by closing its session.
    pub async fn cleanup(&self) -> Result<()> {
        v!(self, 2, "cleaning up namespace '{}'", self.session.namespace());
        self.session.close().await
    }

    async fn run_script(&self) -> Result<String> {
        let path = self.settings.share_dir.join(FLUENTD).join(RUN_SCRIPT);
        tokio::fs::read_to_string(&path)
            .await
            .context(error::FileSnafu { path })
    }

    fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            namespace: self.session.namespace().to_string(),
            name: self.name.clone(),
            ports: vec![ServicePortConfig {
                port: METRICS_PORT,
                target_port: METRICS_PORT,
            }],
            selector: self.labels.clone(),
        }
    }

    fn pod_config(&self) -> PodConfig {
        let mount = |volume: &str, mount_path: &str, sub_path: Option<&str>| VolumeMountConfig {
            volume: volume.to_string(),
            mount_path: mount_path.to_string(),
            sub_path: sub_path.map(String::from),
            read_only: true,
        };
        PodConfig {
            namespace: self.session.namespace().to_string(),
            name: self.name.clone(),
            labels: self.labels.clone(),
            volumes: vec![
                ConfigMapVolume {
                    name: VOLUME_CONFIG.to_string(),
                    config_map: self.name.clone(),
                },
                ConfigMapVolume {
                    name: VOLUME_ENTRYPOINT.to_string(),
                    config_map: self.name.clone(),
                },
                ConfigMapVolume {
                    name: VOLUME_CERTS.to_string(),
                    config_map: self.certs_name(),
                },
            ],
            container: ContainerConfig {
                name: self.name.clone(),
                image: self.image.clone(),
                env: vec![
                    EnvVarConfig::value(ENV_LOG_LEVEL, CONTAINER_LOG_LEVEL),
                    EnvVarConfig::field_ref(ENV_POD_IP, FIELD_POD_IP),
                ],
                mounts: vec![
                    mount(VOLUME_CONFIG, CONFIG_MOUNT_PATH, None),
                    mount(VOLUME_ENTRYPOINT, ENTRYPOINT_MOUNT_PATH, Some(RUN_SCRIPT)),
                    mount(VOLUME_CERTS, METRICS_MOUNT_PATH, None),
                ],
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;
    use kube::api::ObjectMeta;
    use kube::{Client, Config};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Nothing listens here, so any request that reaches the network fails.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    struct StaticGenerator(std::result::Result<String, String>);

    #[async_trait::async_trait]
    impl ConfigGenerator for StaticGenerator {
        async fn generate(&self, _spec_yaml: &str, _debug: bool) -> Result<String> {
            match &self.0 {
                Ok(conf) => Ok(conf.clone()),
                Err(message) => error::GenerateSnafu { message }.fail(),
            }
        }
    }

    #[derive(Clone, Default)]
    struct CountingCertificates {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl CertificateProvisioner for CountingCertificates {
        async fn generate_certificates(
            &self,
            _namespace: &str,
            _scripts_dir: &Path,
            subject: &str,
            _working_dir: &Path,
        ) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return error::CertificatesSnafu {
                    subject,
                    message: "no openssl",
                }
                .fail();
            }
            Ok(())
        }
    }

    fn framework() -> FunctionalFramework {
        let client = Client::try_from(Config::new(UNREACHABLE.parse().unwrap())).unwrap();
        let session = TestSession::from_existing(client, "test-unit");
        FunctionalFramework::new(session, Settings::default()).unwrap()
    }

    #[tokio::test]
    async fn identity() {
        let framework = framework();
        assert!(framework.name().starts_with("test-fluent-"));
        assert_eq!(framework.namespace(), "test-unit");
        assert_eq!(framework.labels()["testtype"], "functional");
        assert_eq!(framework.labels()["testname"], framework.name());
        assert_eq!(
            framework.image(),
            "quay.io/openshift-logging/fluentd:latest"
        );
        assert!(framework.conf().is_empty());
        assert!(!framework.is_deployed());
        assert_eq!(framework.forwarder().metadata.name.as_deref(), Some("instance"));
    }

    #[tokio::test]
    async fn names_are_unique() {
        assert_ne!(framework().name(), framework().name());
    }

    #[tokio::test]
    async fn run_command_before_deploy() {
        let framework = framework();
        let result = framework.run_command(&["echo", "hi"]).await;
        assert!(matches!(result, Err(Error::NotDeployed { .. })));
        let result = framework.run_command_line("echo hi").await;
        assert!(matches!(result, Err(Error::NotDeployed { .. })));
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let mut framework = framework();
        framework.pod = Some(Pod {
            metadata: ObjectMeta {
                name: Some(framework.name().to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        let result = framework.run_command::<&str>(&[]).await;
        assert!(matches!(result, Err(Error::EmptyCommand { .. })));
        let result = framework.run_command_line("   ").await;
        assert!(matches!(result, Err(Error::EmptyCommand { .. })));
    }

    #[tokio::test]
    async fn rejected_config_creates_nothing() {
        let certificates = CountingCertificates::default();
        let mut framework = framework()
            .with_config_generator(StaticGenerator(Err("unknown output type".to_string())))
            .with_certificate_provisioner(certificates.clone());
        let err = framework.deploy().await.unwrap_err();
        assert!(matches!(err, Error::Generate { .. }));
        assert_eq!(certificates.calls.load(Ordering::SeqCst), 0);
        assert!(!framework.is_deployed());
    }

    #[tokio::test]
    async fn certificate_failure_keeps_rendered_config() {
        let certificates = CountingCertificates {
            fail: true,
            ..Default::default()
        };
        let mut framework = framework()
            .with_config_generator(StaticGenerator(Ok("<match **>".to_string())))
            .with_certificate_provisioner(certificates.clone());
        let err = framework.deploy().await.unwrap_err();
        assert!(matches!(err, Error::Certificates { .. }));
        assert_eq!(framework.conf(), "<match **>");
        assert_eq!(certificates.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn collector_pod_layout() {
        let framework = framework();
        let pod = framework.pod_config().into_pod().unwrap();
        assert_eq!(pod.metadata.labels.as_ref(), Some(framework.labels()));

        let spec = pod.spec.unwrap();
        let volumes: Vec<(String, Option<String>)> = spec
            .volumes
            .unwrap()
            .into_iter()
            .map(|v| (v.name, v.config_map.and_then(|cm| cm.name)))
            .collect();
        assert_eq!(
            volumes,
            vec![
                ("config".to_string(), Some(framework.name().to_string())),
                ("entrypoint".to_string(), Some(framework.name().to_string())),
                ("certs".to_string(), Some(format!("certs-{}", framework.name()))),
            ]
        );

        let container = &spec.containers[0];
        assert_eq!(container.name, framework.name());
        let env: Vec<&str> = container
            .env
            .as_ref()
            .unwrap()
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(env, vec!["LOG_LEVEL", "POD_IP"]);
        let mounts: Vec<(&str, Option<&str>)> = container
            .volume_mounts
            .as_ref()
            .unwrap()
            .iter()
            .map(|m| (m.mount_path.as_str(), m.sub_path.as_deref()))
            .collect();
        assert_eq!(
            mounts,
            vec![
                ("/etc/fluent/configs.d/user", None),
                ("/opt/app-root/src/run.sh", Some("run.sh")),
                ("/etc/fluent/metrics", None),
            ]
        );
    }

    #[tokio::test]
    async fn service_selects_collector() {
        let framework = framework();
        let service = framework.service_config().into_service();
        let spec = service.spec.unwrap();
        assert_eq!(spec.selector.as_ref(), Some(framework.labels()));
        assert_eq!(spec.ports.unwrap()[0].port, 24231);
    }
}
