use crate::constants::{DEFAULT_VERBOSITY, FLUENTD};
use crate::error::{self, Result};
use serde::Deserialize;
use snafu::ResultExt;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Prefix of the environment variables that override a component's image, e.g.
/// `RELATED_IMAGE_FLUENTD`.
pub const IMAGE_ENV_PREFIX: &str = "RELATED_IMAGE_";
/// Prefix of the environment variables that configure the framework's external tools.
pub const SETTINGS_ENV_PREFIX: &str = "FUNCTIONAL_";

const DEFAULT_IMAGE_REPOSITORY: &str = "quay.io/openshift-logging";

/// `Settings` carries everything the framework reads from its environment. It is resolved once
/// and handed to each [`FunctionalFramework`](crate::FunctionalFramework) so that instances never
/// read or mutate process-wide state on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Diagnostic verbosity, from `LOG_LEVEL`.
    pub verbosity: u8,
    /// Component image overrides keyed by lowercase component name.
    pub images: BTreeMap<String, String>,
    /// The config generator binary.
    pub generator_path: String,
    /// The `oc`/`kubectl` binary used to wait on resource conditions.
    pub kubectl_path: String,
    /// Kubeconfig handed to `kubectl_path`. When `None` the tool finds its own.
    pub kubeconfig: Option<PathBuf>,
    /// Directory holding `cert_generation.sh`.
    pub scripts_dir: PathBuf,
    /// Directory holding `fluentd/run.sh`.
    pub share_dir: PathBuf,
    /// Directory certificates are generated into. When `None` each framework instance uses its
    /// own temporary directory.
    pub working_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            verbosity: DEFAULT_VERBOSITY,
            images: BTreeMap::new(),
            generator_path: generator_path(),
            kubectl_path: kubectl_path(),
            kubeconfig: None,
            scripts_dir: scripts_dir(),
            share_dir: share_dir(),
            working_dir: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Verbosity {
    /// An integer verbosity from 0 to 255. Values that do not parse, or fall outside that range,
    /// are ignored.
    ///
    /// # Example
    ///
    /// ```text
    /// LOG_LEVEL=3
    /// ```
    log_level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Paths {
    #[serde(default = "generator_path")]
    generator_path: String,
    #[serde(default = "kubectl_path")]
    kubectl_path: String,
    kubeconfig: Option<PathBuf>,
    #[serde(default = "scripts_dir")]
    scripts_dir: PathBuf,
    #[serde(default = "share_dir")]
    share_dir: PathBuf,
    working_dir: Option<PathBuf>,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Read settings from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let verbosity = envy::from_iter::<_, Verbosity>(vars.clone())
            .context(error::SettingsSnafu)?
            .log_level
            .and_then(|level| level.trim().parse::<u8>().ok())
            .unwrap_or(DEFAULT_VERBOSITY);
        let paths = envy::prefixed(SETTINGS_ENV_PREFIX)
            .from_iter::<_, Paths>(vars.clone())
            .context(error::SettingsSnafu)?;
        let images = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(IMAGE_ENV_PREFIX)
                    .map(|component| (component.to_lowercase(), value))
            })
            .collect();

        Ok(Self {
            verbosity,
            images,
            generator_path: paths.generator_path,
            kubectl_path: paths.kubectl_path,
            kubeconfig: paths.kubeconfig,
            scripts_dir: paths.scripts_dir,
            share_dir: paths.share_dir,
            working_dir: paths.working_dir,
        })
    }

    /// Resolve the container image for a logical component name, e.g. `fluentd`.
    pub fn component_image(&self, component: &str) -> String {
        self.images
            .get(&component.to_lowercase())
            .cloned()
            .unwrap_or_else(|| format!("{}/{}:latest", DEFAULT_IMAGE_REPOSITORY, component))
    }

    /// The collector image.
    pub fn fluentd_image(&self) -> String {
        self.component_image(FLUENTD)
    }
}

// We need these to provide defaults for serde.
fn generator_path() -> String {
    String::from("forwarder-generator")
}

fn kubectl_path() -> String {
    String::from("oc")
}

fn scripts_dir() -> PathBuf {
    PathBuf::from("./scripts")
}

fn share_dir() -> PathBuf {
    PathBuf::from("./files")
}
