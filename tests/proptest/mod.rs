// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Property-based tests for admission-bootstrapper.
//!
//! Uses proptest to generate random inputs and verify invariants.

use proptest::prelude::*;

use admission_bootstrapper::config::{parse_bool, parse_env_pairs};
use admission_bootstrapper::resources::webhook::{WEBHOOK_NAME_DOMAIN, webhook_entry_name};
use admission_bootstrapper::resources::{cert_secret_name, service_dns_names};

/// Strategy for environment variable keys.
fn env_key() -> impl Strategy<Value = String> {
    "[A-Z_][A-Z0-9_]{0,15}"
}

/// Strategy for values that contain neither separator.
fn env_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ./:-]{0,20}"
}

/// Strategy for DNS-1123 labels.
fn dns_label() -> impl Strategy<Value = String> {
    "[a-z]([a-z0-9-]{0,20}[a-z0-9])?"
}

proptest! {
    /// Property: well-formed pairs survive parsing in order, trimmed.
    #[test]
    fn test_well_formed_pairs_round_trip(
        pairs in prop::collection::vec((env_key(), env_value()), 0..8)
    ) {
        let raw = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(";");

        let parsed = parse_env_pairs(&raw);
        let expected: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k, v.trim().to_string()))
            .collect();
        prop_assert_eq!(parsed, expected);
    }

    /// Property: parsing never yields an empty or untrimmed key, whatever the input.
    #[test]
    fn test_parsed_keys_are_clean(raw in ".{0,64}") {
        for (key, value) in parse_env_pairs(&raw) {
            prop_assert!(!key.is_empty());
            prop_assert_eq!(key.trim(), key.as_str());
            prop_assert_eq!(value.trim(), value.as_str());
            prop_assert!(!key.contains(';') && !key.contains('='));
            prop_assert!(!value.contains(';') && !value.contains('='));
        }
    }

    /// Property: entries without exactly one `=` are dropped.
    #[test]
    fn test_entries_without_separator_are_dropped(
        entries in prop::collection::vec("[a-z ]{0,10}", 0..6)
    ) {
        let raw = entries.join(";");
        prop_assert!(parse_env_pairs(&raw).is_empty());
    }

    /// Property: only the documented spellings parse as booleans.
    #[test]
    fn test_parse_bool_rejects_other_text(raw in "[a-zA-Z0-9]{0,6}") {
        let known = [
            "1", "t", "T", "TRUE", "true", "True", "0", "f", "F", "FALSE", "false", "False",
        ];
        prop_assert_eq!(parse_bool(&raw).is_some(), known.contains(&raw.as_str()));
    }

    /// Property: every DNS name is rooted at the service name and unique.
    #[test]
    fn test_service_dns_names(name in dns_label(), namespace in dns_label()) {
        let names = service_dns_names(&name, &namespace);
        prop_assert_eq!(names.len(), 5);
        prop_assert_eq!(&names[0], &name);
        let prefix = format!("{}.{}", name, namespace);
        for dns in &names[1..] {
            prop_assert!(dns.starts_with(&prefix));
        }
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), names.len());
    }

    /// Property: derived names are a pure function of the webhook name.
    #[test]
    fn test_derived_names(name in dns_label()) {
        prop_assert_eq!(cert_secret_name(&name), format!("{}-cert", name));
        let entry = webhook_entry_name(&name);
        prop_assert!(entry.starts_with(&name));
        prop_assert!(entry.ends_with(WEBHOOK_NAME_DOMAIN));
    }
}
