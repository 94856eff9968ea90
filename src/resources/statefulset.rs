//! StatefulSet generation for the webhook server.
//!
//! Runs the configured image with the serving certificate Secret mounted at
//! the paths the admission server reads its TLS material from:
//! - `vol-tls` volume backed by `<name>-cert`
//! - `tls.crt` and `tls.key` mounted individually via `subPath`

use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, PodSpec, PodTemplateSpec, SecretVolumeSource, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use crate::config::BootstrapConfig;
use crate::pki::{TLS_CERT_KEY, TLS_KEY_KEY};
use crate::resources::common::{cert_secret_name, selector_labels, standard_labels};
use crate::resources::services::{HTTPS_PORT, HTTPS_PORT_NAME};

/// Name of the volume carrying the serving certificate
pub const TLS_VOLUME_NAME: &str = "vol-tls";
/// Where the admission server expects its certificate
pub const ADMISSION_SERVER_CERT_FILE: &str = "/admission-server/tls.crt";
/// Where the admission server expects its private key
pub const ADMISSION_SERVER_KEY_FILE: &str = "/admission-server/tls.key";

/// Generate the webhook StatefulSet.
pub fn generate_statefulset(config: &BootstrapConfig, namespace: &str) -> StatefulSet {
    let name = &config.name;

    StatefulSet {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(standard_labels(name)),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(1),
            service_name: Some(name.clone()),
            selector: LabelSelector {
                match_labels: Some(selector_labels(name)),
                ..Default::default()
            },
            template: generate_pod_template(config),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Generate the pod template for the StatefulSet.
fn generate_pod_template(config: &BootstrapConfig) -> PodTemplateSpec {
    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(selector_labels(&config.name)),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            containers: vec![generate_webhook_container(config)],
            service_account_name: config.service_account.clone(),
            volumes: Some(vec![Volume {
                name: TLS_VOLUME_NAME.to_string(),
                secret: Some(SecretVolumeSource {
                    secret_name: Some(cert_secret_name(&config.name)),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }),
    }
}

/// Generate the admission server container.
fn generate_webhook_container(config: &BootstrapConfig) -> Container {
    Container {
        name: config.name.clone(),
        image: Some(config.image.clone()),
        image_pull_policy: Some("Always".to_string()),
        env: generate_env_vars(&config.envs),
        ports: Some(vec![ContainerPort {
            name: Some(HTTPS_PORT_NAME.to_string()),
            protocol: Some("TCP".to_string()),
            container_port: HTTPS_PORT,
            ..Default::default()
        }]),
        volume_mounts: Some(vec![
            VolumeMount {
                name: TLS_VOLUME_NAME.to_string(),
                sub_path: Some(TLS_CERT_KEY.to_string()),
                mount_path: ADMISSION_SERVER_CERT_FILE.to_string(),
                ..Default::default()
            },
            VolumeMount {
                name: TLS_VOLUME_NAME.to_string(),
                sub_path: Some(TLS_KEY_KEY.to_string()),
                mount_path: ADMISSION_SERVER_KEY_FILE.to_string(),
                ..Default::default()
            },
        ]),
        ..Default::default()
    }
}

/// Convert configured pairs to container env vars; `None` when empty.
fn generate_env_vars(envs: &[(String, String)]) -> Option<Vec<EnvVar>> {
    if envs.is_empty() {
        return None;
    }

    Some(
        envs.iter()
            .map(|(name, value)| EnvVar {
                name: name.clone(),
                value: Some(value.clone()),
                ..Default::default()
            })
            .collect(),
    )
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
    use crate::resources::services::generate_service;

    fn test_config(name: &str) -> BootstrapConfig {
        BootstrapConfig {
            name: name.to_string(),
            image: "registry.local/pod-guard:1.0".to_string(),
            envs: vec![
                ("LOG_LEVEL".to_string(), "debug".to_string()),
                ("MODE".to_string(), "strict".to_string()),
            ],
            mutating: false,
            rules: vec![],
            side_effect: "None".to_string(),
            ignore_failure: false,
            service_account: Some("guard-sa".to_string()),
            namespace: None,
            timeout: None,
            ca_secret_name: "admission-bootstrapper-ca".to_string(),
        }
    }

    #[test]
    fn test_generate_statefulset() {
        let sts = generate_statefulset(&test_config("pod-guard"), "hooks");

        assert_eq!(sts.metadata.name, Some("pod-guard".to_string()));
        assert_eq!(sts.metadata.namespace, Some("hooks".to_string()));

        let spec = sts.spec.unwrap();
        assert_eq!(spec.replicas, Some(1));
        assert_eq!(spec.service_name, Some("pod-guard".to_string()));
        assert_eq!(spec.selector.match_labels, Some(selector_labels("pod-guard")));
    }

    #[test]
    fn test_pod_labels_match_service_selector() {
        let sts = generate_statefulset(&test_config("pod-guard"), "hooks");
        let svc = generate_service("pod-guard", "hooks");

        let pod_labels = sts.spec.unwrap().template.metadata.unwrap().labels;
        assert_eq!(pod_labels, svc.spec.unwrap().selector);
    }

    #[test]
    fn test_container() {
        let sts = generate_statefulset(&test_config("pod-guard"), "hooks");
        let pod = sts.spec.unwrap().template.spec.unwrap();
        assert_eq!(pod.service_account_name, Some("guard-sa".to_string()));
        assert_eq!(pod.containers.len(), 1);

        let container = &pod.containers[0];
        assert_eq!(container.name, "pod-guard");
        assert_eq!(
            container.image,
            Some("registry.local/pod-guard:1.0".to_string())
        );
        assert_eq!(container.image_pull_policy, Some("Always".to_string()));

        let port = &container.ports.as_ref().unwrap()[0];
        assert_eq!(port.container_port, 443);
        assert_eq!(port.name, Some("https".to_string()));

        let env = container.env.as_ref().unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env[0].name, "LOG_LEVEL");
        assert_eq!(env[0].value, Some("debug".to_string()));
        assert_eq!(env[1].name, "MODE");
    }

    #[test]
    fn test_tls_volume_and_mounts() {
        let sts = generate_statefulset(&test_config("pod-guard"), "hooks");
        let pod = sts.spec.unwrap().template.spec.unwrap();

        let volumes = pod.volumes.unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].name, "vol-tls");
        assert_eq!(
            volumes[0].secret.as_ref().unwrap().secret_name,
            Some("pod-guard-cert".to_string())
        );

        let mounts = pod.containers[0].volume_mounts.clone().unwrap();
        assert_eq!(mounts.len(), 2);
        assert!(mounts.iter().all(|m| m.name == "vol-tls"));
        assert_eq!(mounts[0].sub_path, Some("tls.crt".to_string()));
        assert_eq!(mounts[0].mount_path, "/admission-server/tls.crt");
        assert_eq!(mounts[1].sub_path, Some("tls.key".to_string()));
        assert_eq!(mounts[1].mount_path, "/admission-server/tls.key");
    }

    #[test]
    fn test_optional_fields_omitted() {
        let mut config = test_config("pod-guard");
        config.envs.clear();
        config.service_account = None;

        let sts = generate_statefulset(&config, "hooks");
        let pod = sts.spec.unwrap().template.spec.unwrap();
        assert_eq!(pod.service_account_name, None);
        assert_eq!(pod.containers[0].env, None);
    }
}
