//! Encapsulates the k8s object definitions the framework deploys
mod config_map;
mod namespace;
mod pod;
mod service;

pub use config_map::config_map;
pub use namespace::test_namespace;
pub use pod::{
    ConfigMapVolume, ContainerConfig, EnvVarConfig, EnvVarSource, PodConfig, VolumeMountConfig,
};
pub use service::{ServiceConfig, ServicePortConfig};
