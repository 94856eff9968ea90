//! Webhook registration with the API server.
//!
//! Each registration kind has two states, `Absent` and `Present`, and a single
//! transition `Absent -> Present` by create. A present registration is never
//! compared against the desired one or modified.

use std::fmt;

use tracing::{debug, info};

use crate::cluster::{ClusterApis, ObjectApi};
use crate::config::BootstrapConfig;
use crate::error::Result;
use crate::reconcile::{create_or_adopt, fetch};
use crate::resources::webhook::{generate_mutating_webhook, generate_validating_webhook};

/// Which webhook configuration kind to register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationKind {
    Mutating,
    Validating,
}

impl RegistrationKind {
    pub fn from_flag(mutating: bool) -> Self {
        if mutating {
            RegistrationKind::Mutating
        } else {
            RegistrationKind::Validating
        }
    }
}

impl fmt::Display for RegistrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationKind::Mutating => write!(f, "MutatingWebhookConfiguration"),
            RegistrationKind::Validating => write!(f, "ValidatingWebhookConfiguration"),
        }
    }
}

/// Observed state of the registration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationState {
    Absent,
    Present,
}

/// What a run did to the registration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// This run created it
    Created,
    /// It existed already, or a concurrent run created it first
    AlreadyPresent,
}

/// Ensure the webhook configuration of the configured kind exists.
pub async fn ensure_registration(
    apis: &ClusterApis,
    config: &BootstrapConfig,
    ca_cert_pem: &str,
) -> Result<Registration> {
    let kind = RegistrationKind::from_flag(config.mutating);
    let namespace = apis.namespace.as_str();

    let outcome = match kind {
        RegistrationKind::Mutating => {
            converge(apis.mutating_webhooks.as_ref(), &config.name, || {
                generate_mutating_webhook(config, namespace, ca_cert_pem)
            })
            .await?
        }
        RegistrationKind::Validating => {
            converge(apis.validating_webhooks.as_ref(), &config.name, || {
                generate_validating_webhook(config, namespace, ca_cert_pem)
            })
            .await?
        }
    };

    info!(name = %config.name, kind = %kind, outcome = ?outcome, "Admission webhook ensured");
    Ok(outcome)
}

/// Observe the registration state by name.
pub async fn observe<K>(api: &dyn ObjectApi<K>, name: &str) -> Result<RegistrationState>
where
    K: Send + Sync + 'static,
{
    Ok(match fetch(api, name).await? {
        Some(_) => RegistrationState::Present,
        None => RegistrationState::Absent,
    })
}

async fn converge<K, F>(api: &dyn ObjectApi<K>, name: &str, desired: F) -> Result<Registration>
where
    K: Send + Sync + 'static,
    F: FnOnce() -> K,
{
    match observe(api, name).await? {
        RegistrationState::Present => {
            debug!(name = %name, "Registration present, skipping");
            Ok(Registration::AlreadyPresent)
        }
        RegistrationState::Absent => {
            let created = create_or_adopt(api, name, &desired()).await?;
            Ok(if created.created() {
                Registration::Created
            } else {
                Registration::AlreadyPresent
            })
        }
    }
}
