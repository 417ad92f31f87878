/// Helper macro to avoid retyping the in-container fluentd configuration root when creating further
/// path constants from it. When given no parameters, this returns the root. When given a string
/// literal parameter it adds `/parameter` to the end.
macro_rules! fluent_etc {
    () => {
        "/etc/fluent"
    };
    ($s:literal) => {
        concat!(fluent_etc!(), "/", $s)
    };
}

// Component names
pub const FLUENTD: &str = "fluentd";
pub const CERT_SUBJECT: &str = "elasticsearch";

// Name prefixes
pub const TEST_NAME_PREFIX: &str = "test-fluent";
pub const NAMESPACE_PREFIX: &str = "test";
pub const CERTS_PREFIX: &str = "certs";

// Label keys and values
pub const LABEL_TEST_TYPE: &str = "testtype";
pub const LABEL_TEST_NAME: &str = "testname";
pub const TEST_TYPE_FUNCTIONAL: &str = "functional";

// Config map keys
pub const FLUENT_CONF: &str = "fluent.conf";
pub const RUN_SCRIPT: &str = "run.sh";
pub const TLS_KEY: &str = "tls.key";
pub const TLS_CRT: &str = "tls.crt";

// Files produced by the certificate scripts
pub const FLUENTD_KEY_FILE: &str = "system.logging.fluentd.key";
pub const FLUENTD_CRT_FILE: &str = "system.logging.fluentd.crt";
pub const CERT_GENERATION_SCRIPT: &str = "cert_generation.sh";

// Volume names
pub const VOLUME_CONFIG: &str = "config";
pub const VOLUME_ENTRYPOINT: &str = "entrypoint";
pub const VOLUME_CERTS: &str = "certs";

// Paths inside the collector container
pub const CONFIG_MOUNT_PATH: &str = fluent_etc!("configs.d/user");
pub const METRICS_MOUNT_PATH: &str = fluent_etc!("metrics");
pub const ENTRYPOINT_MOUNT_PATH: &str = "/opt/app-root/src/run.sh";

// Environment variables set on the collector container
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_POD_IP: &str = "POD_IP";
pub const CONTAINER_LOG_LEVEL: &str = "debug";
pub const FIELD_POD_IP: &str = "status.podIP";

// Networking
pub const METRICS_PORT: i32 = 24231;

// Readiness
pub const CONDITION_READY: &str = "Ready";
pub const READY_TIMEOUT: &str = "60s";

// Forwarder object defaults
pub const FORWARDER_NAME: &str = "instance";
pub const FORWARDER_NAMESPACE: &str = "openshift-logging";

// Default verbosity when `LOG_LEVEL` is not set.
pub const DEFAULT_VERBOSITY: u8 = 9;

#[test]
fn fluent_etc_macro_test() {
    assert_eq!("/etc/fluent", fluent_etc!());
    assert_eq!("/etc/fluent/configs.d/user", CONFIG_MOUNT_PATH);
    assert_eq!("/etc/fluent/metrics", METRICS_MOUNT_PATH);
}
