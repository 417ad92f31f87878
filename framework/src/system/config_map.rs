use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

/// Defines a config map holding `data` as string entries
pub fn config_map<I, K, V>(namespace: &str, name: &str, data: I) -> ConfigMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let data: BTreeMap<String, String> = data
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_map_entries() {
        let cm = config_map(
            "ns",
            "conf",
            [("fluent.conf", "<source>"), ("run.sh", "#!/bin/bash")],
        );
        assert_eq!(cm.metadata.name.as_deref(), Some("conf"));
        assert_eq!(cm.metadata.namespace.as_deref(), Some("ns"));
        let data = cm.data.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["fluent.conf"], "<source>");
    }
}
