//! Property-based tests for secret file rendering and exposure clamping.

use gvs::destruct::clamp_delay;
use gvs::output::{OutputFormat, render};
use gvs_vault_client::SecretMapping;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::time::Duration;
use test_utils::{delay_secs_strategy, secret_map_strategy};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// One `KEY=value` line per upper-cased key, the key sorting last winning.
    #[test]
    fn prop_env_one_line_per_folded_key(map in secret_map_strategy(16)) {
        let mapping: SecretMapping = map.clone().into_iter().collect();
        let out = render(&mapping, OutputFormat::Env).unwrap();

        let mut folded = BTreeMap::new();
        for (key, value) in &map {
            folded.insert(key.to_uppercase(), value.clone());
        }
        let expected: Vec<String> = folded.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let lines: Vec<String> = out.lines().map(String::from).collect();
        prop_assert_eq!(lines, expected);
    }

    /// YAML output reads back as the same map.
    #[test]
    fn prop_yaml_reads_back(map in secret_map_strategy(16)) {
        let mapping: SecretMapping = map.clone().into_iter().collect();
        let out = render(&mapping, OutputFormat::Yaml).unwrap();
        let back: BTreeMap<String, String> = serde_yaml_ng::from_str(&out).unwrap();
        prop_assert_eq!(back, map);
    }

    /// The effective delay never exceeds the maximum and never grows.
    #[test]
    fn prop_delay_clamped(requested in delay_secs_strategy(), max in 1u64..=600) {
        let effective = clamp_delay(Duration::from_secs(requested), Duration::from_secs(max));
        prop_assert!(effective <= Duration::from_secs(max));
        prop_assert!(effective <= Duration::from_secs(requested));
    }
}
