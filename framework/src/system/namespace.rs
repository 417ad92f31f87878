use k8s_openapi::api::core::v1::Namespace;
use kube::api::ObjectMeta;

/// Defines a per-test namespace
pub fn test_namespace<S: Into<String>>(name: S) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.into()),
            ..Default::default()
        },
        ..Default::default()
    }
}
