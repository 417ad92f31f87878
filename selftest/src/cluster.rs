use crate::test_settings::TestSettings;
use anyhow::{format_err, Result};
use k8s_openapi::api::core::v1::{ConfigMap, Namespace};
use kube::{
    api::ListParams,
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client, Config,
};
use std::convert::TryInto;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;

pub const KUBECONFIG_FILENAME: &str = "kubeconfig.yaml";

/// Represents a `kind` cluster. The `Drop` trait is implemented deleting the `kind` cluster when it
/// goes out of scope.
#[derive(Debug)]
pub struct Cluster {
    name: String,
    kubeconfig_dir: TempDir,
}

impl Cluster {
    /// Creates a `Cluster` while initializing a kind cluster. If a cluster named `cluster_name`
    ///  already exists, it will be deleted.
    pub fn new(cluster_name: &str) -> Result<Cluster> {
        let kubeconfig_dir = TempDir::new()?;
        Self::delete_kind_cluster(cluster_name)?;
        Self::create_kind_cluster(
            cluster_name,
            &kubeconfig_dir.path().join(KUBECONFIG_FILENAME),
        )?;
        Ok(Self {
            name: cluster_name.into(),
            kubeconfig_dir,
        })
    }

    /// Returns the path to the kubeconfig file in the `TempDir` created for the cluster.
    pub fn kubeconfig(&self) -> PathBuf {
        self.kubeconfig_dir.path().join(KUBECONFIG_FILENAME)
    }

    /// Uses `kind load` to load an image from the machine to the kind cluster.
    pub fn load_image_to_cluster(&self, image_name: &str) -> Result<()> {
        run_kind(
            "kind load docker-image",
            Command::new(TestSettings::kind_path())
                .arg("load")
                .arg("docker-image")
                .arg(image_name)
                .arg("--name")
                .arg(&self.name),
        )
    }

    /// Create the k8s client for the cluster.
    pub async fn k8s_client(&self) -> Result<Client> {
        let kubeconfig = Kubeconfig::read_from(self.kubeconfig())?;
        let config =
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        Ok(config.try_into()?)
    }

    /// Returns the number of config maps in `namespace`, not counting the ones Kubernetes adds to
    /// every namespace.
    pub async fn config_map_count(&self, namespace: &str) -> Result<usize> {
        let api = Api::<ConfigMap>::namespaced(self.k8s_client().await?, namespace);
        Ok(api
            .list(&ListParams::default())
            .await?
            .into_iter()
            .filter(|cm| cm.metadata.name.as_deref() != Some("kube-root-ca.crt"))
            .count())
    }

    /// Wait until `namespace` no longer exists or `timeout` has elapsed.
    pub async fn wait_for_namespace_deletion(
        &self,
        namespace: &str,
        timeout: Duration,
    ) -> Result<()> {
        let api = Api::<Namespace>::all(self.k8s_client().await?);
        tokio::time::timeout(timeout, async {
            while api.get_opt(namespace).await?.is_some() {
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            Ok::<(), kube::Error>(())
        })
        .await
        .map_err(|_| format_err!("namespace '{}' still exists after {:?}", namespace, timeout))??;
        Ok(())
    }

    fn create_kind_cluster(name: &str, kubeconfig: &Path) -> Result<()> {
        let mut command = Command::new(TestSettings::kind_path());
        command
            .arg("--kubeconfig")
            .arg(kubeconfig.to_str().ok_or_else(|| {
                format_err!("non utf-8 path '{}'", kubeconfig.to_string_lossy())
            })?)
            .arg("create")
            .arg("cluster")
            .arg("--name")
            .arg(name);
        if let Some(node_image) = TestSettings::node_image() {
            command.arg("--image").arg(node_image);
        }
        run_kind("kind create cluster", &mut command)
    }

    fn delete_kind_cluster(name: &str) -> Result<()> {
        run_kind(
            "kind delete cluster",
            Command::new(TestSettings::kind_path())
                .arg("delete")
                .arg("cluster")
                .arg("--name")
                .arg(name),
        )
    }
}

fn run_kind(what: &str, command: &mut Command) -> Result<()> {
    let output = command.output()?;
    if !output.status.success() {
        return Err(format_err!(
            "'{}' failed with exit status '{}'\n\n{}\n\n{}",
            what,
            output.status.code().unwrap_or(1),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        ));
    }
    Ok(())
}

impl Drop for Cluster {
    fn drop(&mut self) {
        if let Err(e) = Self::delete_kind_cluster(&self.name) {
            eprintln!("unable to delete kind cluster '{}': {}", self.name, e)
        }
    }
}
