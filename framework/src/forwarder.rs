use crate::constants::{FORWARDER_NAME, FORWARDER_NAMESPACE};
use crate::error::{self, Result};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::collections::BTreeMap;

/// The logical forwarding configuration under test. The `CustomResource` derive also produces a
/// struct named `ClusterLogForwarder` which represents the object as the config generator expects
/// to receive it. The framework never interprets it; it is serialized and handed over as is.
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    derive = "Default",
    derive = "PartialEq",
    group = "logging.openshift.io",
    kind = "ClusterLogForwarder",
    namespaced,
    plural = "clusterlogforwarders",
    singular = "clusterlogforwarder",
    version = "v1"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterLogForwarderSpec {
    /// Named sources of logs, in addition to the reserved `application`, `infrastructure` and
    /// `audit` inputs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputSpec>,
    /// Destinations logs are forwarded to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputSpec>,
    /// Routes from inputs to outputs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pipelines: Vec<PipelineSpec>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<ApplicationInput>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpec {
    pub name: String,
    /// The output type, e.g. `fluentdForward`, `elasticsearch`, `syslog`, `kafka`.
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<OutputSecret>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct OutputSecret {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub input_refs: Vec<String>,
    pub output_refs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse: Option<String>,
}

/// Create the empty forwarder every framework starts with.
pub fn new_cluster_log_forwarder() -> ClusterLogForwarder {
    let mut forwarder = ClusterLogForwarder::new(FORWARDER_NAME, Default::default());
    forwarder.metadata.namespace = Some(FORWARDER_NAMESPACE.to_string());
    forwarder
}

impl ClusterLogForwarder {
    /// Add an output.
    pub fn add_output(&mut self, output: OutputSpec) -> &mut Self {
        self.spec.outputs.push(output);
        self
    }

    /// Add a pipeline routing `inputs` to `outputs`.
    pub fn add_pipeline<I, O>(&mut self, inputs: I, outputs: O) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        self.spec.pipelines.push(PipelineSpec {
            input_refs: inputs.into_iter().map(Into::into).collect(),
            output_refs: outputs.into_iter().map(Into::into).collect(),
            ..Default::default()
        });
        self
    }

    /// The serialized form handed to the config generator.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context(error::SerializeSnafu)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_forwarder_yaml() {
        let yaml = new_cluster_log_forwarder().to_yaml().unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["apiVersion"].as_str(), Some("logging.openshift.io/v1"));
        assert_eq!(value["kind"].as_str(), Some("ClusterLogForwarder"));
        assert_eq!(value["metadata"]["name"].as_str(), Some("instance"));
        assert_eq!(
            value["metadata"]["namespace"].as_str(),
            Some("openshift-logging")
        );
        assert!(value["spec"]["pipelines"].is_null());
    }

    #[test]
    fn pipeline_yaml_uses_camel_case() {
        let mut forwarder = new_cluster_log_forwarder();
        forwarder
            .add_output(OutputSpec {
                name: "fluentd".to_string(),
                type_: "fluentdForward".to_string(),
                url: Some("tcp://0.0.0.0:24224".to_string()),
                secret: None,
            })
            .add_pipeline(["application"], ["fluentd"]);
        let yaml = forwarder.to_yaml().unwrap();
        assert!(yaml.contains("inputRefs"));
        assert!(yaml.contains("outputRefs"));
        assert!(yaml.contains("type: fluentdForward"));

        let parsed: ClusterLogForwarder = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.spec, forwarder.spec);
    }
}
