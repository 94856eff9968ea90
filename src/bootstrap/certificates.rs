//! CA bootstrapping and serving certificate issuance.

use tracing::info;

use crate::error::Result;
use crate::pki::{KeyPairPem, KeyPairStore};
use crate::resources::common::{cert_secret_name, service_dns_names};

/// Ensure the namespace-wide root CA exists and return it.
///
/// The first caller in a namespace creates it; every later caller, for any
/// webhook, gets the same material back.
pub async fn ensure_ca(store: &dyn KeyPairStore, ca_secret_name: &str) -> Result<KeyPairPem> {
    let ca = store.ensure(ca_secret_name, None, &[]).await?;
    info!(secret = %ca_secret_name, "Bootstrapper CA ensured");
    Ok(ca)
}

/// Ensure the serving certificate for webhook `name`, signed by `ca`.
///
/// The certificate covers every DNS form of the webhook Service. Issuing a
/// new one needs the CA private key; an existing one is reused as is.
pub async fn ensure_serving_cert(
    store: &dyn KeyPairStore,
    ca: &KeyPairPem,
    name: &str,
    namespace: &str,
) -> Result<KeyPairPem> {
    let secret_name = cert_secret_name(name);
    let dns_names = service_dns_names(name, namespace);
    let cert = store.ensure(&secret_name, Some(ca), &dns_names).await?;
    info!(secret = %secret_name, dns_names = ?dns_names, "Admission cert ensured");
    Ok(cert)
}
