//! Service generation for the webhook.
//!
//! A single ClusterIP Service fronting the webhook pods on 443/TCP. The
//! webhook configuration's service reference points at it.

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::resources::common::{selector_labels, standard_labels};

/// HTTPS port exposed by the Service and the container
pub const HTTPS_PORT: i32 = 443;
/// Name of the HTTPS port
pub const HTTPS_PORT_NAME: &str = "https";

/// Generate the webhook Service.
pub fn generate_service(name: &str, namespace: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(standard_labels(name)),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            selector: Some(selector_labels(name)),
            ports: Some(vec![ServicePort {
                name: Some(HTTPS_PORT_NAME.to_string()),
                protocol: Some("TCP".to_string()),
                port: HTTPS_PORT,
                target_port: Some(IntOrString::Int(HTTPS_PORT)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
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

    #[test]
    fn test_generate_service() {
        let svc = generate_service("pod-guard", "hooks");

        assert_eq!(svc.metadata.name, Some("pod-guard".to_string()));
        assert_eq!(svc.metadata.namespace, Some("hooks".to_string()));

        let spec = svc.spec.unwrap();
        assert_eq!(spec.type_, Some("ClusterIP".to_string()));
        assert_eq!(spec.selector, Some(selector_labels("pod-guard")));

        let ports = spec.ports.unwrap();
        assert_eq!(ports.len(), 1);
        let port = ports.first().unwrap();
        assert_eq!(port.name, Some("https".to_string()));
        assert_eq!(port.protocol, Some("TCP".to_string()));
        assert_eq!(port.port, 443);
        assert_eq!(port.target_port, Some(IntOrString::Int(443)));
    }

    #[test]
    fn test_service_labels() {
        let svc = generate_service("pod-guard", "hooks");

        let labels = svc.metadata.labels.unwrap();
        assert_eq!(
            labels.get("app.kubernetes.io/managed-by"),
            Some(&"admission-bootstrapper".to_string())
        );
    }
}
