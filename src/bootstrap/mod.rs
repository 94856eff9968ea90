//! The bootstrap sequence.
//!
//! Runs every step strictly in order and stops at the first error:
//!
//! 1. Root CA Secret
//! 2. Serving certificate Secret, signed by the CA
//! 3. Service
//! 4. StatefulSet
//! 5. Mutating or validating webhook configuration
//!
//! Nothing created earlier in a failed run is cleaned up. Every step is a
//! get-or-create, so running the whole sequence again converges to the same
//! end state.

pub mod certificates;
pub mod registration;

use tracing::{debug, info};

use crate::cluster::ClusterApis;
use crate::config::BootstrapConfig;
use crate::error::Result;
use crate::pki::{KeyPairPem, SecretKeyPairStore};
use crate::reconcile::get_or_create;
use crate::resources::services::generate_service;
use crate::resources::statefulset::generate_statefulset;

pub use certificates::{ensure_ca, ensure_serving_cert};
pub use registration::{Registration, RegistrationKind, RegistrationState, ensure_registration};

/// What a completed run ended up with
#[derive(Clone, Debug)]
pub struct BootstrapReport {
    pub ca: KeyPairPem,
    pub serving_cert: KeyPairPem,
    pub service_created: bool,
    pub stateful_set_created: bool,
    pub registration: Registration,
}

/// Converge the cluster to the configured webhook.
pub async fn run_bootstrap(
    apis: &ClusterApis,
    config: &BootstrapConfig,
) -> Result<BootstrapReport> {
    let namespace = apis.namespace.as_str();
    let name = config.name.as_str();
    let store = SecretKeyPairStore::new(apis.secrets.clone(), namespace);

    let ca = ensure_ca(&store, &config.ca_secret_name).await?;
    debug!(cert = %ca.cert_pem, "CA certificate");

    let serving_cert = ensure_serving_cert(&store, &ca, name, namespace).await?;
    debug!(cert = %serving_cert.cert_pem, "Serving certificate");

    let service = get_or_create(
        apis.services.as_ref(),
        name,
        generate_service(name, namespace),
    )
    .await?;
    info!(name = %name, created = service.created(), "Service ensured");

    let stateful_set = get_or_create(
        apis.stateful_sets.as_ref(),
        name,
        generate_statefulset(config, namespace),
    )
    .await?;
    info!(name = %name, created = stateful_set.created(), "StatefulSet ensured");

    let registration = ensure_registration(apis, config, &ca.cert_pem).await?;

    Ok(BootstrapReport {
        ca,
        serving_cert,
        service_created: service.created(),
        stateful_set_created: stateful_set.created(),
        registration,
    })
}
