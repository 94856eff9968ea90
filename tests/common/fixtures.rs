//! Test fixtures and builder patterns for BootstrapConfig.

use std::time::Duration;

use admission_bootstrapper::config::{BootstrapConfig, DEFAULT_CA_SECRET_NAME};
use k8s_openapi::api::admissionregistration::v1::RuleWithOperations;

/// Rules matching pod creation
pub const POD_CREATE_RULES: &str = r#"[{"apiGroups":[""],"apiVersions":["v1"],"resources":["pods"],"operations":["CREATE"]}]"#;

/// Rules matching deployment creation and update
pub const DEPLOYMENT_RULES: &str = r#"[{"apiGroups":["apps"],"apiVersions":["v1"],"resources":["deployments"],"operations":["CREATE","UPDATE"]}]"#;

/// Parse an `ADMISSION_RULES` style JSON document.
pub fn rules(json: &str) -> Vec<RuleWithOperations> {
    serde_json::from_str(json).expect("fixture rules must parse")
}

/// Builder for creating BootstrapConfig test fixtures.
///
/// # Example
/// ```
/// let config = ConfigBuilder::new("pod-guard")
///     .mutating(true)
///     .env("LOG_LEVEL", "debug")
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    name: String,
    image: String,
    envs: Vec<(String, String)>,
    mutating: bool,
    rules: Vec<RuleWithOperations>,
    side_effect: String,
    ignore_failure: bool,
    service_account: Option<String>,
    namespace: Option<String>,
    timeout: Option<Duration>,
}

impl ConfigBuilder {
    /// Create a new builder for the given webhook name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            image: format!("registry.local/{}:1.0", name),
            name,
            envs: Vec::new(),
            mutating: false,
            rules: rules(POD_CREATE_RULES),
            side_effect: "None".to_string(),
            ignore_failure: false,
            service_account: None,
            namespace: None,
            timeout: None,
        }
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Append a container environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn mutating(mut self, mutating: bool) -> Self {
        self.mutating = mutating;
        self
    }

    /// Replace the rules with a JSON document.
    pub fn rules_json(mut self, json: &str) -> Self {
        self.rules = rules(json);
        self
    }

    pub fn side_effect(mut self, side_effect: impl Into<String>) -> Self {
        self.side_effect = side_effect.into();
        self
    }

    pub fn ignore_failure(mut self, ignore_failure: bool) -> Self {
        self.ignore_failure = ignore_failure;
        self
    }

    pub fn service_account(mut self, service_account: impl Into<String>) -> Self {
        self.service_account = Some(service_account.into());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Bound the whole run.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the BootstrapConfig.
    pub fn build(self) -> BootstrapConfig {
        BootstrapConfig {
            name: self.name,
            image: self.image,
            envs: self.envs,
            mutating: self.mutating,
            rules: self.rules,
            side_effect: self.side_effect,
            ignore_failure: self.ignore_failure,
            service_account: self.service_account,
            namespace: self.namespace,
            timeout: self.timeout,
            ca_secret_name: DEFAULT_CA_SECRET_NAME.to_string(),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new("pod-guard")
    }
}

/// A validating webhook config with defaults.
pub fn validating_config(name: &str) -> BootstrapConfig {
    ConfigBuilder::new(name).build()
}

/// A mutating webhook config with defaults.
pub fn mutating_config(name: &str) -> BootstrapConfig {
    ConfigBuilder::new(name).mutating(true).build()
}
