//! Bootstrap configuration.
//!
//! Everything the bootstrapper needs is read from the process environment up
//! front, so a malformed value fails the run before any API call is made.
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `ADMISSION_NAME` | yes | |
//! | `ADMISSION_IMAGE` | yes | |
//! | `ADMISSION_ENVS` | no | empty |
//! | `ADMISSION_MUTATING` | no | `false` |
//! | `ADMISSION_RULES` | yes | |
//! | `ADMISSION_SIDE_EFFECT` | no | `Unknown` |
//! | `ADMISSION_IGNORE_FAILURE` | no | `false` |
//! | `ADMISSION_SERVICE_ACCOUNT` | no | pod default |
//! | `POD_NAMESPACE` | no | client namespace |
//! | `ADMISSION_TIMEOUT_SECONDS` | no | no deadline |

use std::time::Duration;

use k8s_openapi::api::admissionregistration::v1::RuleWithOperations;
use thiserror::Error;
use tracing::warn;

pub const ENV_NAME: &str = "ADMISSION_NAME";
pub const ENV_IMAGE: &str = "ADMISSION_IMAGE";
pub const ENV_ENVS: &str = "ADMISSION_ENVS";
pub const ENV_MUTATING: &str = "ADMISSION_MUTATING";
pub const ENV_RULES: &str = "ADMISSION_RULES";
pub const ENV_SIDE_EFFECT: &str = "ADMISSION_SIDE_EFFECT";
pub const ENV_IGNORE_FAILURE: &str = "ADMISSION_IGNORE_FAILURE";
pub const ENV_SERVICE_ACCOUNT: &str = "ADMISSION_SERVICE_ACCOUNT";
pub const ENV_NAMESPACE: &str = "POD_NAMESPACE";
pub const ENV_TIMEOUT_SECONDS: &str = "ADMISSION_TIMEOUT_SECONDS";

/// Name of the namespace-wide root CA secret shared by every webhook.
pub const DEFAULT_CA_SECRET_NAME: &str = "admission-bootstrapper-ca";

/// Side-effect class used when none is configured.
pub const DEFAULT_SIDE_EFFECT: &str = "Unknown";

/// Configuration errors. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid ADMISSION_RULES: {0}")]
    InvalidRules(#[source] serde_json::Error),

    #[error("invalid ADMISSION_TIMEOUT_SECONDS: {0:?}")]
    InvalidTimeout(String),
}

/// Fully parsed bootstrap configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct BootstrapConfig {
    /// Webhook, Service, and StatefulSet name
    pub name: String,
    /// Container image of the webhook server
    pub image: String,
    /// Environment variables injected into the webhook container, in order
    pub envs: Vec<(String, String)>,
    /// Register a MutatingWebhookConfiguration instead of a validating one
    pub mutating: bool,
    /// Admission rules for the single webhook entry
    pub rules: Vec<RuleWithOperations>,
    /// Declared side-effect class, passed through verbatim
    pub side_effect: String,
    /// Use `failurePolicy: Ignore` instead of the cluster default
    pub ignore_failure: bool,
    /// Service account for the webhook pod
    pub service_account: Option<String>,
    /// Namespace override; the client's namespace is used otherwise
    pub namespace: Option<String>,
    /// Deadline for the whole run
    pub timeout: Option<Duration>,
    /// Secret holding the shared root CA
    pub ca_secret_name: String,
}

impl BootstrapConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Every value is trimmed; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let name = required(ENV_NAME)?;
        let image = required(ENV_IMAGE)?;
        let rules = serde_json::from_str::<Vec<RuleWithOperations>>(&required(ENV_RULES)?)
            .map_err(ConfigError::InvalidRules)?;

        let timeout = match get(ENV_TIMEOUT_SECONDS) {
            None => None,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
        };

        Ok(Self {
            name,
            image,
            envs: get(ENV_ENVS)
                .map(|raw| parse_env_pairs(&raw))
                .unwrap_or_default(),
            mutating: flag(ENV_MUTATING, get(ENV_MUTATING)),
            rules,
            side_effect: get(ENV_SIDE_EFFECT).unwrap_or_else(|| DEFAULT_SIDE_EFFECT.to_string()),
            ignore_failure: flag(ENV_IGNORE_FAILURE, get(ENV_IGNORE_FAILURE)),
            service_account: get(ENV_SERVICE_ACCOUNT),
            namespace: get(ENV_NAMESPACE),
            timeout,
            ca_secret_name: DEFAULT_CA_SECRET_NAME.to_string(),
        })
    }
}

/// Parse `;`-separated `KEY=VALUE` pairs.
///
/// Entries that do not split into exactly two parts on `=`, or whose key is
/// empty after trimming, are dropped.
pub fn parse_env_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|entry| {
            let mut parts = entry.split('=');
            let (key, value) = (parts.next()?, parts.next()?);
            if parts.next().is_some() {
                return None;
            }
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Parse a boolean the way `strconv.ParseBool` does.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Optional boolean; unparseable values fall back to false.
fn flag(key: &str, value: Option<String>) -> bool {
    let Some(raw) = value else {
        return false;
    };
    parse_bool(&raw).unwrap_or_else(|| {
        warn!(key = key, value = %raw, "Unrecognized boolean, using false");
        false
    })
}
