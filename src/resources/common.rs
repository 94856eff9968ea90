//! Common resource generation utilities.
//!
//! Names, labels, and DNS forms shared by every generated object.

use std::collections::BTreeMap;

/// Pod label selecting the webhook pods
pub const SELECTOR_LABEL: &str = "k8s-app";

/// Value of `app.kubernetes.io/managed-by` on generated objects
pub const MANAGED_BY: &str = "admission-bootstrapper";

/// Suffix appended to the webhook name for its serving certificate Secret
pub const CERT_SECRET_SUFFIX: &str = "-cert";

/// Labels selecting the webhook pods.
///
/// Used verbatim as Service selector, StatefulSet selector, and pod template
/// labels so the three always agree.
pub fn selector_labels(name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(SELECTOR_LABEL.to_string(), name.to_string());
    labels
}

/// Labels marking an object as created by this tool
pub fn managed_labels() -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        MANAGED_BY.to_string(),
    );
    labels
}

/// Standard labels applied to the metadata of per-webhook objects
pub fn standard_labels(name: &str) -> BTreeMap<String, String> {
    let mut labels = managed_labels();
    labels.insert("app.kubernetes.io/name".to_string(), name.to_string());
    labels
}

/// Name of the Secret holding the webhook's serving certificate
pub fn cert_secret_name(name: &str) -> String {
    format!("{}{}", name, CERT_SECRET_SUFFIX)
}

/// Every DNS name the API server may use to reach the webhook Service.
pub fn service_dns_names(name: &str, namespace: &str) -> Vec<String> {
    vec![
        name.to_string(),
        format!("{}.{}", name, namespace),
        format!("{}.{}.svc", name, namespace),
        format!("{}.{}.svc.cluster", name, namespace),
        format!("{}.{}.svc.cluster.local", name, namespace),
    ]
}
