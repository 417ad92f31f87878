/*!

This library deploys a stand-alone log collector into a Kubernetes cluster so that functional
tests can exercise it end to end. A [`FunctionalFramework`] renders the collector configuration
from a [`ClusterLogForwarder`], provisions its certificates, creates its config maps, service and
pod in a per-test namespace, waits for the pod to be ready, and runs commands inside it.

```no_run
# async fn run() -> fluentd_functional::Result<()> {
use fluentd_functional::{init_logger, FunctionalFramework, Settings, TestSession};

let settings = Settings::from_env()?;
init_logger(settings.verbosity);
let session = TestSession::try_default().await?;
let mut framework = FunctionalFramework::new(session, settings)?;
framework.forwarder_mut().add_pipeline(["application"], ["default"]);
let result = framework.deploy().await;
if result.is_ok() {
    let out = framework.run_command(&["echo", "hi"]).await?;
    assert_eq!(out, "hi\n");
}
framework.cleanup().await?;
result
# }
```

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use certificates::{read_working_file, CertificateProvisioner, ScriptCertificates};
pub use error::{Error, Result};
pub use framework::FunctionalFramework;
pub use forwarder::{
    new_cluster_log_forwarder, ApplicationInput, ClusterLogForwarder, ClusterLogForwarderSpec,
    InputSpec, OutputSecret, OutputSpec, PipelineSpec,
};
pub use generator::{CommandGenerator, ConfigGenerator};
pub use http_status_code::{AllowNotFound, HttpStatusCode, StatusCode};
pub use logging::init_logger;
pub use session::{unique_name, TestSession};
pub use settings::Settings;

mod certificates;
mod command;
pub mod constants;
mod error;
pub mod exec;
mod forwarder;
mod framework;
mod generator;
mod http_status_code;
pub mod logging;
mod session;
mod settings;
pub mod system;
pub mod wait;
