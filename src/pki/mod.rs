//! Key pairs persisted as Kubernetes Secrets.
//!
//! [`KeyPairStore::ensure`] is the idempotency anchor of the bootstrap: a
//! Secret that already exists is returned as stored, and a new one is only
//! ever written with a single create of the complete object.

pub mod certs;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::{debug, info};

use crate::cluster::ObjectApi;
use crate::error::{Error, Result};
use crate::reconcile::{create_or_adopt, fetch};
use crate::resources::common::managed_labels;

/// Secret key holding the PEM certificate
pub const TLS_CERT_KEY: &str = "tls.crt";
/// Secret key holding the PEM private key
pub const TLS_KEY_KEY: &str = "tls.key";
/// Secret type for certificate/key pairs
pub const TLS_SECRET_TYPE: &str = "kubernetes.io/tls";

/// A PEM certificate and, when available, its private key.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPairPem {
    pub cert_pem: String,
    /// `None` when the stored Secret has lost its key
    pub key_pem: Option<String>,
}

impl fmt::Debug for KeyPairPem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPairPem")
            .field("cert_pem", &self.cert_pem)
            .field("key_pem", &self.key_pem.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl KeyPairPem {
    /// Read a key pair from a TLS Secret.
    pub fn from_secret(secret: &Secret) -> Result<Self> {
        let name = secret.metadata.name.as_deref().unwrap_or_default();
        let field = |key: &str| -> Result<Option<String>> {
            secret
                .data
                .as_ref()
                .and_then(|data| data.get(key))
                .map(|bytes| {
                    String::from_utf8(bytes.0.clone()).map_err(|e| {
                        Error::Store(format!("secret {} has non-UTF-8 {}: {}", name, key, e))
                    })
                })
                .transpose()
        };

        let cert_pem = field(TLS_CERT_KEY)?
            .ok_or_else(|| Error::Store(format!("secret {} is missing {}", name, TLS_CERT_KEY)))?;
        Ok(Self {
            cert_pem,
            key_pem: field(TLS_KEY_KEY)?,
        })
    }

    /// Build the immutable TLS Secret persisting this key pair.
    pub fn to_secret(&self, name: &str, namespace: &str) -> Secret {
        let mut data = BTreeMap::new();
        data.insert(
            TLS_CERT_KEY.to_string(),
            ByteString(self.cert_pem.as_bytes().to_vec()),
        );
        if let Some(key_pem) = &self.key_pem {
            data.insert(
                TLS_KEY_KEY.to_string(),
                ByteString(key_pem.as_bytes().to_vec()),
            );
        }

        Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(managed_labels()),
                ..Default::default()
            },
            data: Some(data),
            immutable: Some(true),
            type_: Some(TLS_SECRET_TYPE.to_string()),
            ..Default::default()
        }
    }
}

/// Persistent get-or-generate store for certificate/key pairs.
#[async_trait]
pub trait KeyPairStore: Send + Sync {
    /// Return the key pair stored under `secret_name`, generating and
    /// persisting one if absent.
    ///
    /// Without a `signer` the generated pair is a self-signed CA; with one it
    /// is a serving certificate for `dns_names` signed by the signer.
    async fn ensure(
        &self,
        secret_name: &str,
        signer: Option<&KeyPairPem>,
        dns_names: &[String],
    ) -> Result<KeyPairPem>;
}

/// [`KeyPairStore`] backed by TLS Secrets in one namespace.
#[derive(Clone)]
pub struct SecretKeyPairStore {
    secrets: Arc<dyn ObjectApi<Secret>>,
    namespace: String,
}

impl SecretKeyPairStore {
    pub fn new(secrets: Arc<dyn ObjectApi<Secret>>, namespace: impl Into<String>) -> Self {
        Self {
            secrets,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl KeyPairStore for SecretKeyPairStore {
    async fn ensure(
        &self,
        secret_name: &str,
        signer: Option<&KeyPairPem>,
        dns_names: &[String],
    ) -> Result<KeyPairPem> {
        if let Some(existing) = fetch(self.secrets.as_ref(), secret_name).await? {
            debug!(secret = %secret_name, "Reusing stored key pair");
            return KeyPairPem::from_secret(&existing);
        }

        let generated = match signer {
            None => certs::generate_ca(secret_name)?,
            Some(ca) => certs::issue_serving_cert(ca, dns_names)?,
        };
        let secret = generated.to_secret(secret_name, &self.namespace);
        let stored = create_or_adopt(self.secrets.as_ref(), secret_name, &secret).await?;
        if stored.created() {
            info!(secret = %secret_name, namespace = %self.namespace, "Stored new key pair");
        }
        KeyPairPem::from_secret(&stored.into_inner())
    }
}
