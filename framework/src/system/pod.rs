use crate::error::{self, Result};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, EnvVar, EnvVarSource as K8sEnvVarSource,
    ObjectFieldSelector, Pod, PodSpec, Volume, VolumeMount,
};
use kube::api::ObjectMeta;
use snafu::ensure;
use std::collections::{BTreeMap, BTreeSet};

/// Describes a single-container pod. `into_pod` validates the description before producing the
/// k8s object so that mistakes surface before anything is sent to the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodConfig {
    pub namespace: String,
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub volumes: Vec<ConfigMapVolume>,
    pub container: ContainerConfig,
}

/// A volume populated from a config map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigMapVolume {
    pub name: String,
    pub config_map: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerConfig {
    pub name: String,
    pub image: String,
    pub env: Vec<EnvVarConfig>,
    pub mounts: Vec<VolumeMountConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVarConfig {
    pub name: String,
    pub source: EnvVarSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvVarSource {
    /// A literal value.
    Value(String),
    /// A field of the pod object, e.g. `status.podIP`.
    FieldRef(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMountConfig {
    pub volume: String,
    pub mount_path: String,
    pub sub_path: Option<String>,
    pub read_only: bool,
}

impl EnvVarConfig {
    pub fn value<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            source: EnvVarSource::Value(value.into()),
        }
    }

    pub fn field_ref<N: Into<String>, F: Into<String>>(name: N, field_path: F) -> Self {
        Self {
            name: name.into(),
            source: EnvVarSource::FieldRef(field_path.into()),
        }
    }
}

impl PodConfig {
    /// Check that the description can be submitted.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| error::InvalidPodSnafu {
            name: self.name.clone(),
            reason,
        };
        ensure!(!self.name.is_empty(), invalid("the pod has no name".into()));
        ensure!(
            !self.container.name.is_empty(),
            invalid("the container has no name".into())
        );
        ensure!(
            !self.container.image.is_empty(),
            invalid(format!("container '{}' has no image", self.container.name))
        );

        let mut volumes = BTreeSet::new();
        for volume in &self.volumes {
            ensure!(
                volumes.insert(volume.name.as_str()),
                invalid(format!("volume '{}' is declared more than once", volume.name))
            );
        }
        for mount in &self.container.mounts {
            ensure!(
                volumes.contains(mount.volume.as_str()),
                invalid(format!(
                    "mount '{}' refers to undeclared volume '{}'",
                    mount.mount_path, mount.volume
                ))
            );
        }

        let mut env = BTreeSet::new();
        for var in &self.container.env {
            ensure!(
                env.insert(var.name.as_str()),
                invalid(format!("environment variable '{}' is set twice", var.name))
            );
        }
        Ok(())
    }

    /// Validate and define the k8s `Pod`.
    pub fn into_pod(self) -> Result<Pod> {
        self.validate()?;
        let volumes = self
            .volumes
            .into_iter()
            .map(|volume| Volume {
                name: volume.name,
                config_map: Some(ConfigMapVolumeSource {
                    name: Some(volume.config_map),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .collect();
        let env = self
            .container
            .env
            .into_iter()
            .map(|var| match var.source {
                EnvVarSource::Value(value) => EnvVar {
                    name: var.name,
                    value: Some(value),
                    ..Default::default()
                },
                EnvVarSource::FieldRef(field_path) => EnvVar {
                    name: var.name,
                    value_from: Some(K8sEnvVarSource {
                        field_ref: Some(ObjectFieldSelector {
                            field_path,
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            })
            .collect();
        let volume_mounts = self
            .container
            .mounts
            .into_iter()
            .map(|mount| VolumeMount {
                name: mount.volume,
                mount_path: mount.mount_path,
                // An empty sub-path mounts the whole volume.
                sub_path: mount.sub_path.filter(|sub_path| !sub_path.is_empty()),
                read_only: Some(mount.read_only),
                ..Default::default()
            })
            .collect();

        Ok(Pod {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: Some(self.namespace),
                labels: Some(self.labels),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: self.container.name,
                    image: Some(self.container.image),
                    env: Some(env),
                    volume_mounts: Some(volume_mounts),
                    ..Default::default()
                }],
                volumes: Some(volumes),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}
