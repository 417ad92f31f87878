use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

/// A port exposed by a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePortConfig {
    pub port: i32,
    pub target_port: i32,
}

/// Describes a service selecting pods by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    pub namespace: String,
    pub name: String,
    pub ports: Vec<ServicePortConfig>,
    pub selector: BTreeMap<String, String>,
}

impl ServiceConfig {
    /// Defines the k8s `Service`.
    pub fn into_service(self) -> Service {
        let ports = self
            .ports
            .into_iter()
            .map(|port| ServicePort {
                name: Some(format!("port-{}", port.port)),
                port: port.port,
                target_port: Some(IntOrString::Int(port.target_port)),
                ..Default::default()
            })
            .collect();
        Service {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: Some(self.namespace),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                ports: Some(ports),
                selector: Some(self.selector),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
