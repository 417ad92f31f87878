use crate::constants::NAMESPACE_PREFIX;
use crate::error::{self, Result};
use crate::http_status_code::AllowNotFound;
use crate::system::test_namespace;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::PostParams;
use kube::{Api, Client, Resource as KubeResource};
use log::{debug, info};
use serde::{de::DeserializeOwned, Serialize};
use snafu::ResultExt;
use std::fmt::Debug;
use uuid::Uuid;

/// Number of random characters appended to generated names.
const SUFFIX_LEN: usize = 8;

/// Generate `<prefix>-<random>`. Names are unique within a test run with overwhelming
/// probability, but not guaranteed to be.
pub fn unique_name(prefix: &str) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(SUFFIX_LEN)
        .collect();
    format!("{}-{}", prefix, suffix)
}

/// # Test Session
///
/// A `TestSession` owns a namespace for the duration of one test. Everything a test creates
/// through the session lives in that namespace, so `close` releases all of it with a single
/// namespace deletion.
#[derive(Clone)]
pub struct TestSession {
    client: Client,
    namespace: String,
}

impl TestSession {
    /// Create a new session and its namespace.
    pub async fn new(client: Client) -> Result<Self> {
        let namespace = unique_name(NAMESPACE_PREFIX);
        let api: Api<Namespace> = Api::all(client.clone());
        api.create(&PostParams::default(), &test_namespace(namespace.as_str()))
            .await
            .context(error::NamespaceSnafu {
                action: "create",
                namespace: namespace.as_str(),
            })?;
        info!("created test namespace '{}'", namespace);
        Ok(Self { client, namespace })
    }

    /// Create a session using the default `kube::Client`.
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default()
            .await
            .context(error::CreateSnafu { what: "client" })?;
        Self::new(client).await
    }

    /// Wrap a namespace that already exists. `close` will still delete it.
    pub fn from_existing<S: Into<String>>(client: Client, namespace: S) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Creates an api of type `T` scoped to the session namespace.
    pub fn api<T>(&self) -> Api<T>
    where
        T: KubeResource<Scope = k8s_openapi::NamespaceResourceScope>,
        <T as KubeResource>::DynamicType: Default,
    {
        Api::<T>::namespaced(self.client.clone(), &self.namespace)
    }

    /// Create `data` in the session namespace. An object with the same name that already exists
    /// is an error, never overwritten.
    pub async fn create<T>(&self, data: &T, what: &str) -> Result<T>
    where
        T: KubeResource<Scope = k8s_openapi::NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Serialize
            + Debug,
        <T as KubeResource>::DynamicType: Default,
    {
        debug!("creating {} in namespace '{}'", what, self.namespace);
        self.api::<T>()
            .create(&PostParams::default(), data)
            .await
            .context(error::CreateSnafu { what })
    }

    /// Delete the session namespace and everything in it. A namespace that is already gone is not
    /// an error.
    pub async fn close(&self) -> Result<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let deleted = api
            .delete(&self.namespace, &Default::default())
            .await
            .allow_not_found()
            .context(error::NamespaceSnafu {
                action: "delete",
                namespace: self.namespace.as_str(),
            })?;
        match deleted {
            Some(_) => info!("deleting test namespace '{}'", self.namespace),
            None => debug!("test namespace '{}' was already gone", self.namespace),
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn unique_name_format() {
        let name = unique_name("test-fluent");
        assert!(name.starts_with("test-fluent-"));
        assert_eq!(name.len(), "test-fluent-".len() + SUFFIX_LEN);
    }

    #[test]
    fn unique_names_differ() {
        let names: HashSet<String> = (0..100).map(|_| unique_name("test")).collect();
        assert_eq!(names.len(), 100);
    }
}
