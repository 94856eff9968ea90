//! Certificate generation.
//!
//! Self-signed root CAs and CA-signed serving certificates, both returned as
//! PEM so they can be stored in Secrets unchanged.

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose,
};

use super::KeyPairPem;
use crate::error::{Error, Result};

/// Validity of the root CA (never rotated by this tool)
pub const CA_VALIDITY_YEARS: i64 = 20;

/// Validity of serving certificates
pub const CERT_VALIDITY_YEARS: i64 = 10;

/// Organization recorded in every certificate subject
const ORGANIZATION: &str = "admission-bootstrapper";

fn compute_validity(years: i64) -> (::time::OffsetDateTime, ::time::OffsetDateTime) {
    let now = ::time::OffsetDateTime::now_utc();
    let not_after = now + ::time::Duration::days(years * 365);
    (now, not_after)
}

fn distinguished_name(common_name: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, DnValue::Utf8String(common_name.to_string()));
    dn.push(DnType::OrganizationName, DnValue::Utf8String(ORGANIZATION.to_string()));
    dn
}

/// Generate a self-signed root CA.
pub fn generate_ca(common_name: &str) -> Result<KeyPairPem> {
    let mut params = CertificateParams::default();
    params.distinguished_name = distinguished_name(common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    let (not_before, not_after) = compute_validity(CA_VALIDITY_YEARS);
    params.not_before = not_before;
    params.not_after = not_after;

    let key_pair = KeyPair::generate()
        .map_err(|e| Error::Store(format!("failed to generate CA key: {}", e)))?;
    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| Error::Store(format!("failed to create CA cert: {}", e)))?;

    Ok(KeyPairPem {
        cert_pem: cert.pem(),
        key_pem: Some(key_pair.serialize_pem()),
    })
}

/// Issue a TLS serving certificate for `dns_names`, signed by `ca`.
///
/// Fails if the CA has no private key.
pub fn issue_serving_cert(ca: &KeyPairPem, dns_names: &[String]) -> Result<KeyPairPem> {
    let ca_key_pem = ca
        .key_pem
        .as_deref()
        .ok_or_else(|| Error::Store("CA private key is not available for signing".to_string()))?;
    let ca_key = KeyPair::from_pem(ca_key_pem)
        .map_err(|e| Error::Store(format!("failed to load CA key: {}", e)))?;
    let issuer = Issuer::from_ca_cert_pem(&ca.cert_pem, &ca_key)
        .map_err(|e| Error::Store(format!("failed to create issuer: {}", e)))?;

    let mut params = CertificateParams::new(dns_names.to_vec())
        .map_err(|e| Error::Store(format!("invalid DNS names {:?}: {}", dns_names, e)))?;
    params.distinguished_name =
        distinguished_name(dns_names.first().map(String::as_str).unwrap_or(ORGANIZATION));
    params.is_ca = IsCa::NoCa;
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    let (not_before, not_after) = compute_validity(CERT_VALIDITY_YEARS);
    params.not_before = not_before;
    params.not_after = not_after;

    let key_pair = KeyPair::generate()
        .map_err(|e| Error::Store(format!("failed to generate serving key: {}", e)))?;
    let cert = params
        .signed_by(&key_pair, &issuer)
        .map_err(|e| Error::Store(format!("failed to sign serving cert: {}", e)))?;

    Ok(KeyPairPem {
        cert_pem: cert.pem(),
        key_pem: Some(key_pair.serialize_pem()),
    })
}
