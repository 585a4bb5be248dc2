//! Property-based test generators using proptest.

use proptest::prelude::*;
use serde_json::{Map, Value};
use tiddly_core::SYSTEM_PREFIXES;

/// Strategy for ordinary (non-system) tiddler titles.
///
/// Includes spaces, punctuation and non-ASCII so escaping gets exercised.
pub fn title_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][A-Za-z0-9 _.,'&%+/éü-]{0,40}")
        .expect("Invalid regex")
}

/// Strategy for titles under one of the system prefixes.
pub fn system_title_strategy() -> impl Strategy<Value = String> {
    (
        prop::sample::select(SYSTEM_PREFIXES),
        prop::string::string_regex("[a-z0-9/._-]{0,20}").expect("Invalid regex"),
    )
        .prop_map(|(prefix, rest)| format!("{prefix}{rest}"))
}

/// Strategy for caller-supplied metadata fields.
///
/// Never produces the keys the store owns or `text`.
pub fn metadata_strategy() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::vec(
        (
            prop::string::string_regex("[a-z][a-z0-9-]{0,10}").expect("Invalid regex"),
            field_value_strategy(),
        ),
        0..6,
    )
    .prop_map(|pairs| {
        pairs
            .into_iter()
            .filter(|(key, _)| !matches!(key.as_str(), "revision" | "bag" | "title" | "text"))
            .collect()
    })
}

/// Strategy for a single metadata value.
pub fn field_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<String>().prop_map(Value::String),
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::Bool),
        prop::collection::vec("[a-z]{1,8}", 0..4).prop_map(|tags| Value::from(tags)),
    ]
}

/// Strategy for tiddler body text.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("(?s).{0,200}").expect("Invalid regex")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiddly_core::is_system_title;

    proptest! {
        #[test]
        fn system_titles_are_system(title in system_title_strategy()) {
            prop_assert!(is_system_title(&title));
        }

        #[test]
        fn ordinary_titles_are_not_system(title in title_strategy()) {
            prop_assert!(!is_system_title(&title));
        }

        #[test]
        fn metadata_avoids_reserved_keys(meta in metadata_strategy()) {
            for key in ["revision", "bag", "title", "text"] {
                prop_assert!(!meta.contains_key(key));
            }
        }
    }
}
