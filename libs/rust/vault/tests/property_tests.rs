//! Property-based tests for the Vault client types.
//!
//! Tests validate:
//! - Secret values never appear in Debug output
//! - Path normalization is idempotent and separator-clean
//! - Merging is last-write-wins

use gvs_vault_client::{AppRoleCredentials, SecretMapping, SecretPath, SessionToken};
use proptest::prelude::*;
use test_utils::{raw_secret_path_strategy, secret_map_strategy, secret_value_strategy};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Secret id and token are redacted in Debug output but still usable.
    #[test]
    fn prop_credentials_not_exposed_in_debug(
        role_id in "[a-z][a-z0-9-]{3,15}",
        secret in "[A-Za-z0-9]{12,64}",
    ) {
        let creds = AppRoleCredentials::new(role_id.clone(), secret.clone());
        let debug = format!("{creds:?}");
        prop_assert!(!debug.contains(&secret));
        prop_assert!(debug.contains(&role_id));

        let token = SessionToken::new(secret.clone());
        let token_debug = format!("{token:?}");
        prop_assert!(!token_debug.contains(&secret));
        prop_assert_eq!(token.expose(), secret.as_str());
    }

    /// Mapping Debug output lists keys, never values.
    #[test]
    fn prop_mapping_values_not_in_debug(value in "[A-Za-z0-9]{16,32}") {
        let mapping: SecretMapping = [("db_password", value.as_str())].into_iter().collect();
        let debug = format!("{mapping:?}");
        prop_assert!(debug.contains("db_password"));
        prop_assert!(!debug.contains(&value));
    }

    /// Normalized paths have no stray separators and normalize to themselves.
    #[test]
    fn prop_path_normalization(raw in raw_secret_path_strategy()) {
        let path = SecretPath::parse(&raw).unwrap();
        prop_assert!(!path.as_str().starts_with('/'));
        prop_assert!(!path.as_str().ends_with('/'));
        prop_assert!(!path.as_str().contains("//"));
        prop_assert_eq!(SecretPath::parse(path.as_str()).unwrap(), path.clone());
        prop_assert_eq!(path.as_str(), raw.trim_matches('/'));
    }

    /// kv2_data_path is idempotent and always has `data` as second segment.
    #[test]
    fn prop_kv2_data_path(raw in raw_secret_path_strategy()) {
        let path = SecretPath::parse(&raw).unwrap().kv2_data_path();
        prop_assert_eq!(path.as_str().split('/').nth(1), Some("data"));
        prop_assert_eq!(path.kv2_data_path(), path);
    }

    /// Every key of the later mapping ends up with the later value.
    #[test]
    fn prop_merge_last_write_wins(
        first in secret_map_strategy(8),
        second in secret_map_strategy(8),
    ) {
        let mut merged: SecretMapping = first.clone().into_iter().collect();
        merged.merge(second.clone().into_iter().collect());

        for (k, v) in &second {
            prop_assert_eq!(merged.get(k), Some(v.as_str()));
        }
        for (k, v) in first.iter().filter(|(k, _)| !second.contains_key(*k)) {
            prop_assert_eq!(merged.get(k), Some(v.as_str()));
        }
        let union: std::collections::BTreeSet<_> = first.keys().chain(second.keys()).collect();
        prop_assert_eq!(merged.len(), union.len());
    }

    /// Joining a secret name always uses a single separator.
    #[test]
    fn prop_join(base in raw_secret_path_strategy(), name in "[a-z][a-z0-9_-]{0,10}") {
        let joined = SecretPath::parse(&base).unwrap().join(&name).unwrap();
        let expected = format!("{}/{name}", base.trim_matches('/'));
        prop_assert_eq!(joined.as_str(), expected.as_str());
    }
}

#[test]
fn test_values_strategy_usable_as_mapping() {
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    let mut runner = TestRunner::default();
    let value = secret_value_strategy()
        .new_tree(&mut runner)
        .unwrap()
        .current();
    let mapping: SecretMapping = [("k", value.as_str())].into_iter().collect();
    assert_eq!(mapping.get("k"), Some(value.as_str()));
}
