//! Resource generation module.
//!
//! Builds the desired objects the bootstrap creates when they are absent.
//!
//! ## Resources Generated
//!
//! | Resource | Purpose |
//! |----------|---------|
//! | Service | ClusterIP endpoint the API server calls (443/TCP) |
//! | StatefulSet | Runs the admission server with its TLS Secret mounted |
//! | Mutating/ValidatingWebhookConfiguration | Registers the webhook with the API server |
//!
//! The CA and serving certificate Secrets are built by [`crate::pki`].

pub mod common;
pub mod services;
pub mod statefulset;
pub mod webhook;

pub use common::{cert_secret_name, selector_labels, service_dns_names, standard_labels};
