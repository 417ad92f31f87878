use crate::http_status_code::{HttpStatusCode, StatusCode};
use snafu::Snafu;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for the functional test framework.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Unable to generate certificates for '{}': {}", subject, message))]
    Certificates { subject: String, message: String },

    #[snafu(display("Unable to run '{}': {}", program, source))]
    Command {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display("Error creating {}: {}", what, source))]
    Create {
        what: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("No command was given to run in pod '{}'", pod))]
    EmptyCommand { pod: String },

    #[snafu(display("Unable to execute {:?} in pod '{}': {}", command, pod, source))]
    Exec {
        command: Vec<String>,
        pod: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Command {:?} failed in pod '{}': {}", command, pod, message))]
    ExecFailed {
        command: Vec<String>,
        pod: String,
        message: String,
    },

    #[snafu(display("Unable to read {} of command {:?}: {}", stream, command, source))]
    ExecOutput {
        command: Vec<String>,
        stream: String,
        source: std::io::Error,
    },

    #[snafu(display("Unable to read file '{}': {}", path.display(), source))]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to generate collector configuration: {}", message))]
    Generate { message: String },

    #[snafu(display("Invalid pod '{}': {}", name, reason))]
    InvalidPod { name: String, reason: String },

    #[snafu(display("Unable to {}: {}", action, source))]
    Io {
        action: String,
        source: std::io::Error,
    },

    #[snafu(display("Unable to {} namespace '{}': {}", action, namespace, source))]
    Namespace {
        action: String,
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("The collector pod for '{}' has not been deployed", name))]
    NotDeployed { name: String },

    #[snafu(display("Unable to serialize the forwarder: {}", source))]
    Serialize { source: serde_yaml::Error },

    #[snafu(display("Error parsing settings from the environment: {}", source))]
    Settings { source: envy::Error },

    #[snafu(display(
        "Timed out or failed waiting for {} to be {}: {}",
        resource,
        condition,
        message
    ))]
    Wait {
        resource: String,
        condition: String,
        message: String,
    },
}

impl HttpStatusCode for Error {
    fn status_code(&self) -> Option<StatusCode> {
        match self {
            Error::Create { source, .. }
            | Error::Exec { source, .. }
            | Error::Namespace { source, .. } => source.status_code(),
            _ => None,
        }
    }
}
