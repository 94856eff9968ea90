//! admission-bootstrapper library crate
//!
//! Brings a TLS-secured admission webhook and its registration into existence,
//! idempotently, every time it runs.

pub mod bootstrap;
pub mod cluster;
pub mod config;
pub mod error;
pub mod pki;
pub mod reconcile;
pub mod resources;

pub use bootstrap::{BootstrapReport, Registration, run_bootstrap};
pub use cluster::{ClusterApis, ObjectApi};
pub use config::{BootstrapConfig, ConfigError};
pub use error::{Error, Result};

use kube::Client;
use tracing::info;

/// Run the bootstrap against the cluster the default client configuration
/// points at (in-cluster service account or kubeconfig).
///
/// The namespace is taken from the configuration if set, otherwise from the
/// client.
pub async fn bootstrap(config: &BootstrapConfig) -> Result<BootstrapReport> {
    let client = Client::try_default().await?;
    let namespace = config
        .namespace
        .clone()
        .unwrap_or_else(|| client.default_namespace().to_string());
    info!(name = %config.name, namespace = %namespace, "Connected to Kubernetes cluster");

    let apis = ClusterApis::new(client, &namespace);
    run_with_deadline(&apis, config).await
}

/// [`run_bootstrap`] bounded by the configured timeout, if any.
///
/// Once the deadline elapses the run is abandoned and in-flight requests are
/// dropped.
pub async fn run_with_deadline(
    apis: &ClusterApis,
    config: &BootstrapConfig,
) -> Result<BootstrapReport> {
    match config.timeout {
        Some(limit) => tokio::time::timeout(limit, run_bootstrap(apis, config))
            .await
            .map_err(|_| Error::Timeout(limit))?,
        None => run_bootstrap(apis, config).await,
    }
}
