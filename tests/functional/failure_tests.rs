//! Failing runs: errors abort the sequence, leave earlier steps in place, and
//! a later run converges.

use std::time::Duration;

use admission_bootstrapper::pki::KeyPairPem;
use admission_bootstrapper::pki::certs::generate_ca;
use admission_bootstrapper::{Error, Registration, run_bootstrap, run_with_deadline};

use crate::FakeCluster;
use crate::common::{ConfigBuilder, validating_config};

const NAMESPACE: &str = "autoops";
const CA_SECRET: &str = "admission-bootstrapper-ca";

fn api_code(err: &Error) -> Option<u16> {
    match err {
        Error::Kube(kube::Error::Api(e)) => Some(e.code),
        _ => None,
    }
}

#[tokio::test]
async fn test_forbidden_statefulset_aborts_and_rerun_recovers() {
    let cluster = FakeCluster::new();
    let apis = cluster.apis(NAMESPACE);
    let config = validating_config("pod-guard");
    cluster.stateful_sets.fail_creates_with(Some(403));

    let err = run_bootstrap(&apis, &config).await.unwrap_err();

    assert_eq!(api_code(&err), Some(403));
    assert!(!err.is_retryable());
    // Earlier steps stay, later ones never ran
    assert_eq!(cluster.secrets.len(), 2);
    assert_eq!(cluster.services.len(), 1);
    assert_eq!(cluster.stateful_sets.len(), 0);
    assert_eq!(cluster.validating_webhooks.len(), 0);

    cluster.stateful_sets.fail_creates_with(None);
    let report = run_bootstrap(&apis, &config).await.unwrap();

    assert!(!report.service_created);
    assert!(report.stateful_set_created);
    assert_eq!(report.registration, Registration::Created);
    assert_eq!(cluster.secrets.creates(), 2);
}

#[tokio::test]
async fn test_secret_read_failure_stops_before_anything_is_created() {
    let cluster = FakeCluster::new();
    cluster.secrets.fail_gets_with(Some(500));

    let err = run_bootstrap(&cluster.apis(NAMESPACE), &validating_config("pod-guard"))
        .await
        .unwrap_err();

    assert_eq!(api_code(&err), Some(500));
    assert!(err.is_retryable());
    assert_eq!(cluster.total_creates(), 0);
}

#[tokio::test]
async fn test_registration_failure_is_reported() {
    let cluster = FakeCluster::new();
    cluster.validating_webhooks.fail_creates_with(Some(403));

    let err = run_bootstrap(&cluster.apis(NAMESPACE), &validating_config("pod-guard"))
        .await
        .unwrap_err();

    assert_eq!(api_code(&err), Some(403));
    assert_eq!(cluster.stateful_sets.len(), 1);
    assert_eq!(cluster.validating_webhooks.len(), 0);
}

#[tokio::test]
async fn test_ca_without_key_cannot_issue_new_certificates() {
    let cluster = FakeCluster::new();
    let ca = KeyPairPem {
        cert_pem: generate_ca(CA_SECRET).unwrap().cert_pem,
        key_pem: None,
    };
    cluster.secrets.insert(ca.to_secret(CA_SECRET, NAMESPACE));

    let err = run_bootstrap(&cluster.apis(NAMESPACE), &validating_config("pod-guard"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Store(_)));
    assert!(!err.is_retryable());
    assert_eq!(cluster.secrets.len(), 1);
    assert_eq!(cluster.services.len(), 0);
}

#[tokio::test]
async fn test_ca_without_key_still_serves_existing_certificates() {
    let cluster = FakeCluster::new();
    let apis = cluster.apis(NAMESPACE);
    let config = validating_config("pod-guard");

    let first = run_bootstrap(&apis, &config).await.unwrap();

    // Replace the CA with a copy that lost its key
    let stripped = KeyPairPem {
        cert_pem: first.ca.cert_pem.clone(),
        key_pem: None,
    };
    cluster.secrets.insert(stripped.to_secret(CA_SECRET, NAMESPACE));

    let second = run_bootstrap(&apis, &config).await.unwrap();

    assert_eq!(second.ca.cert_pem, first.ca.cert_pem);
    assert_eq!(second.ca.key_pem, None);
    assert_eq!(second.serving_cert, first.serving_cert);
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_api_server_hits_deadline() {
    let cluster = FakeCluster::new();
    cluster.secrets.stall_gets();
    let config = ConfigBuilder::new("pod-guard")
        .timeout(Duration::from_secs(30))
        .build();

    let err = run_with_deadline(&cluster.apis(NAMESPACE), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout(limit) if limit == Duration::from_secs(30)));
    assert!(err.is_retryable());
    assert_eq!(cluster.total_creates(), 0);
    assert_eq!(cluster.secrets.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_does_not_cut_short_a_responsive_run() {
    let cluster = FakeCluster::new();
    let config = ConfigBuilder::new("pod-guard")
        .timeout(Duration::from_secs(30))
        .build();

    let report = run_with_deadline(&cluster.apis(NAMESPACE), &config)
        .await
        .unwrap();

    assert_eq!(report.registration, Registration::Created);
    assert_eq!(cluster.validating_webhooks.len(), 1);
}
