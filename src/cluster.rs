//! Cluster access.
//!
//! The reconcile steps only ever read an object by name and create it, so the
//! API server is reached through the narrow [`ObjectApi`] trait. It is
//! implemented for [`kube::Api`] in production and replaced by mocks or an
//! in-memory cluster in tests.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{Secret, Service};
use kube::api::PostParams;
use kube::{Api, Client};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(test)]
use mockall::automock;

/// Field manager recorded on every object this tool creates
pub const FIELD_MANAGER: &str = "admission-bootstrapper";

/// Get and create for a single resource type.
///
/// Errors are returned as the raw [`kube::Error`] so callers can branch on
/// the API status code (404, 409).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectApi<K>: Send + Sync
where
    K: Send + Sync + 'static,
{
    /// Fetch an object by name
    async fn get(&self, name: &str) -> kube::Result<K>;

    /// Create an object; the name is taken from its metadata
    async fn create(&self, object: &K) -> kube::Result<K>;
}

#[async_trait]
impl<K> ObjectApi<K> for Api<K>
where
    K: Clone + DeserializeOwned + Serialize + Debug + Send + Sync + 'static,
{
    async fn get(&self, name: &str) -> kube::Result<K> {
        Api::get(self, name).await
    }

    async fn create(&self, object: &K) -> kube::Result<K> {
        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        Api::create(self, &params, object).await
    }
}

/// The APIs one bootstrap run touches.
///
/// Secrets, Services, and StatefulSets are scoped to `namespace`; webhook
/// configurations are cluster-scoped.
#[derive(Clone)]
pub struct ClusterApis {
    pub namespace: String,
    pub secrets: Arc<dyn ObjectApi<Secret>>,
    pub services: Arc<dyn ObjectApi<Service>>,
    pub stateful_sets: Arc<dyn ObjectApi<StatefulSet>>,
    pub mutating_webhooks: Arc<dyn ObjectApi<MutatingWebhookConfiguration>>,
    pub validating_webhooks: Arc<dyn ObjectApi<ValidatingWebhookConfiguration>>,
}

impl ClusterApis {
    /// Build the APIs from a live client
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            secrets: Arc::new(Api::<Secret>::namespaced(client.clone(), namespace)),
            services: Arc::new(Api::<Service>::namespaced(client.clone(), namespace)),
            stateful_sets: Arc::new(Api::<StatefulSet>::namespaced(client.clone(), namespace)),
            mutating_webhooks: Arc::new(Api::<MutatingWebhookConfiguration>::all(client.clone())),
            validating_webhooks: Arc::new(Api::<ValidatingWebhookConfiguration>::all(client)),
        }
    }
}
