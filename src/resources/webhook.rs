//! Admission webhook configuration generation.
//!
//! Both kinds carry exactly one webhook entry that points at the in-cluster
//! Service and trusts the bootstrapper CA.

use k8s_openapi::ByteString;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhook, MutatingWebhookConfiguration, ServiceReference, ValidatingWebhook,
    ValidatingWebhookConfiguration, WebhookClientConfig,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::config::BootstrapConfig;
use crate::resources::common::standard_labels;

/// Domain appended to the webhook name to form the entry name
pub const WEBHOOK_NAME_DOMAIN: &str = "k8s-autoops.github.io";

/// Failure policy applied when admission errors should be ignored
pub const FAILURE_POLICY_IGNORE: &str = "Ignore";

/// Admission review versions the webhook server speaks
const ADMISSION_REVIEW_VERSIONS: &[&str] = &["v1"];

/// Fully qualified name of the single webhook entry
pub fn webhook_entry_name(name: &str) -> String {
    format!("{}.{}", name, WEBHOOK_NAME_DOMAIN)
}

fn metadata(config: &BootstrapConfig) -> ObjectMeta {
    ObjectMeta {
        name: Some(config.name.clone()),
        labels: Some(standard_labels(&config.name)),
        ..Default::default()
    }
}

fn client_config(
    config: &BootstrapConfig,
    namespace: &str,
    ca_cert_pem: &str,
) -> WebhookClientConfig {
    WebhookClientConfig {
        ca_bundle: Some(ByteString(ca_cert_pem.as_bytes().to_vec())),
        service: Some(ServiceReference {
            namespace: namespace.to_string(),
            name: config.name.clone(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// `None` leaves the cluster default (`Fail`) in place
fn failure_policy(config: &BootstrapConfig) -> Option<String> {
    config
        .ignore_failure
        .then(|| FAILURE_POLICY_IGNORE.to_string())
}

fn review_versions() -> Vec<String> {
    ADMISSION_REVIEW_VERSIONS
        .iter()
        .map(|v| v.to_string())
        .collect()
}

/// Generate a MutatingWebhookConfiguration.
pub fn generate_mutating_webhook(
    config: &BootstrapConfig,
    namespace: &str,
    ca_cert_pem: &str,
) -> MutatingWebhookConfiguration {
    MutatingWebhookConfiguration {
        metadata: metadata(config),
        webhooks: Some(vec![MutatingWebhook {
            name: webhook_entry_name(&config.name),
            client_config: client_config(config, namespace, ca_cert_pem),
            rules: Some(config.rules.clone()),
            side_effects: config.side_effect.clone(),
            failure_policy: failure_policy(config),
            admission_review_versions: review_versions(),
            ..Default::default()
        }]),
    }
}

/// Generate a ValidatingWebhookConfiguration.
pub fn generate_validating_webhook(
    config: &BootstrapConfig,
    namespace: &str,
    ca_cert_pem: &str,
) -> ValidatingWebhookConfiguration {
    ValidatingWebhookConfiguration {
        metadata: metadata(config),
        webhooks: Some(vec![ValidatingWebhook {
            name: webhook_entry_name(&config.name),
            client_config: client_config(config, namespace, ca_cert_pem),
            rules: Some(config.rules.clone()),
            side_effects: config.side_effect.clone(),
            failure_policy: failure_policy(config),
            admission_review_versions: review_versions(),
            ..Default::default()
        }]),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::get_unwrap
)]
mod tests {
    use super::*;
    use k8s_openapi::api::admissionregistration::v1::RuleWithOperations;

    fn test_config(ignore_failure: bool) -> BootstrapConfig {
        BootstrapConfig {
            name: "pod-guard".to_string(),
            image: "registry.local/pod-guard:1.0".to_string(),
            envs: vec![],
            mutating: true,
            rules: vec![RuleWithOperations {
                api_groups: Some(vec![String::new()]),
                api_versions: Some(vec!["v1".to_string()]),
                resources: Some(vec!["pods".to_string()]),
                operations: Some(vec!["CREATE".to_string(), "UPDATE".to_string()]),
                ..Default::default()
            }],
            side_effect: "NoneOnDryRun".to_string(),
            ignore_failure,
            service_account: None,
            namespace: None,
            timeout: None,
            ca_secret_name: "admission-bootstrapper-ca".to_string(),
        }
    }

    #[test]
    fn test_webhook_entry_name() {
        assert_eq!(
            webhook_entry_name("pod-guard"),
            "pod-guard.k8s-autoops.github.io"
        );
    }

    #[test]
    fn test_generate_mutating_webhook() {
        let config = test_config(false);
        let cfg = generate_mutating_webhook(&config, "hooks", "CA-PEM");

        assert_eq!(cfg.metadata.name, Some("pod-guard".to_string()));
        assert_eq!(cfg.metadata.namespace, None);

        let webhooks = cfg.webhooks.unwrap();
        assert_eq!(webhooks.len(), 1);
        let hook = &webhooks[0];
        assert_eq!(hook.name, "pod-guard.k8s-autoops.github.io");
        assert_eq!(hook.rules, Some(config.rules.clone()));
        assert_eq!(hook.side_effects, "NoneOnDryRun");
        assert_eq!(hook.failure_policy, None);
        assert_eq!(hook.admission_review_versions, vec!["v1".to_string()]);

        let client = &hook.client_config;
        assert_eq!(client.ca_bundle, Some(ByteString(b"CA-PEM".to_vec())));
        let service = client.service.as_ref().unwrap();
        assert_eq!(service.namespace, "hooks");
        assert_eq!(service.name, "pod-guard");
        assert_eq!(service.path, None);
        assert_eq!(service.port, None);
    }

    #[test]
    fn test_generate_validating_webhook_ignore_failure() {
        let cfg = generate_validating_webhook(&test_config(true), "hooks", "CA-PEM");

        let webhooks = cfg.webhooks.unwrap();
        assert_eq!(webhooks.len(), 1);
        assert_eq!(webhooks[0].failure_policy, Some("Ignore".to_string()));
        assert_eq!(webhooks[0].name, "pod-guard.k8s-autoops.github.io");
    }

    #[test]
    fn test_webhook_serialization() {
        let cfg = generate_validating_webhook(&test_config(true), "hooks", "CA-PEM");

        let json = serde_json::to_value(&cfg).unwrap();
        let hook = &json["webhooks"][0];
        assert_eq!(hook["sideEffects"], "NoneOnDryRun");
        assert_eq!(hook["failurePolicy"], "Ignore");
        assert_eq!(hook["admissionReviewVersions"][0], "v1");
        assert_eq!(hook["rules"][0]["resources"][0], "pods");
        assert_eq!(hook["clientConfig"]["service"]["namespace"], "hooks");
    }
}
