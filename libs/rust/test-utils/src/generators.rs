//! Proptest generators for secret data.

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Secret keys as applications use them: letters, digits, `_` and `-`.
pub fn secret_key_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_-]{0,31}"
}

/// Secret values without newlines (the line output format cannot carry them).
pub fn secret_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9!@#$%^&*()_+=:,./ -]{0,64}"
}

/// A flat secret map of up to `max` entries.
pub fn secret_map_strategy(max: usize) -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(secret_key_strategy(), secret_value_strategy(), 0..=max)
}

/// Store paths with 1 to 4 segments, possibly with stray separators.
pub fn raw_secret_path_strategy() -> impl Strategy<Value = String> {
    (
        prop::collection::vec("[a-z][a-z0-9_-]{0,10}", 1..=4),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(segments, leading, trailing)| {
            let mut path = segments.join("/");
            if leading {
                path.insert(0, '/');
            }
            if trailing {
                path.push('/');
            }
            path
        })
}

/// Requested exposure delays, including absurdly large ones.
pub fn delay_secs_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![0u64..=600, Just(99_999u64), any::<u32>().prop_map(u64::from)]
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_values_have_no_newline(value in secret_value_strategy()) {
            prop_assert!(!value.contains('\n'));
        }

        #[test]
        fn prop_raw_paths_not_empty(path in raw_secret_path_strategy()) {
            prop_assert!(!path.trim_matches('/').is_empty());
        }
    }
}
