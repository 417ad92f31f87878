use serde::Deserialize;

/// Test settings provides a way to send arguments into the Rust tests using environment variables.
pub(super) struct TestSettings {}

impl TestSettings {
    /// The path or name of the `kind` binary.
    pub(super) fn kind_path() -> &'static str {
        TEST_SETTINGS.kind_path.as_str()
    }

    /// The node image `kind` boots the cluster with, if one was requested.
    pub(super) fn node_image() -> Option<&'static str> {
        TEST_SETTINGS.node_image.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct Inner {
    /// The path to the [kind] binary. Defaults to `kind` (i.e. by default the kind binary is
    /// expected to be found via `$PATH`).
    ///
    /// # Example
    ///
    /// ```text
    /// FUNCTIONAL_SELFTEST_KIND_PATH=/wherever/kind
    /// ```
    ///
    /// [kind]: https://kind.sigs.k8s.io/
    #[serde(default = "kind")]
    kind_path: String,
    /// The `kindest/node` image to create clusters from, which pins the Kubernetes version the
    /// collector is tested against. Defaults to whatever the `kind` binary defaults to.
    ///
    /// # Example
    ///
    /// ```text
    /// FUNCTIONAL_SELFTEST_NODE_IMAGE=kindest/node:v1.24.7
    /// ```
    node_image: Option<String>,
}

lazy_static::lazy_static! {
    static ref TEST_SETTINGS: Inner =
        envy::prefixed("FUNCTIONAL_SELFTEST_")
            .from_env::<Inner>()
            .expect("Error parsing TestSettings environment variables");
}

/// We need this to provide a default for serde.
fn kind() -> String {
    String::from("kind")
}
