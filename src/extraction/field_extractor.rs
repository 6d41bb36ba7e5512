//! # Field Extractor
//!
//! Marketplace exports name the same column differently (`PO#`, `po`,
//! `Customer PO Number`, ...). Lookups walk a fixed fallback chain and the
//! first rule producing a non-empty value wins:
//!
//! 1. exact key
//! 2. key with every `#` stripped
//! 3. `#` prefixed to the stripped key
//! 4. case-insensitive exact key
//! 5. case-insensitive match with `#` stripped on both sides
//! 6. case-insensitive substring match in either direction, first stored key
//!    in map iteration order
//!
//! Empty strings and nulls count as "not found" and the chain continues.
//! The functions are total: malformed input yields the [`NOT_FOUND`] sentinel.

use serde_json::{Map, Value};

use crate::constants::NOT_FOUND;

/// Rule that produced a match, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRule {
    Exact,
    HashStripped,
    HashPrefixed,
    CaseInsensitive,
    CaseInsensitiveHashStripped,
    Substring,
}

/// Value for `canonical_key`, or `"not found"`
pub fn get_value(attributes: Option<&Value>, canonical_key: &str) -> String {
    find_value(attributes, canonical_key).unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Value for `canonical_key` in an attribute map, or `"not found"`
pub fn get_value_in(attributes: &Map<String, Value>, canonical_key: &str) -> String {
    find_value_in(attributes, canonical_key).unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Like [`get_value`] but `None` instead of the sentinel
pub fn find_value(attributes: Option<&Value>, canonical_key: &str) -> Option<String> {
    match attributes {
        Some(Value::Object(map)) => find_value_in(map, canonical_key),
        _ => None,
    }
}

pub fn find_value_in(attributes: &Map<String, Value>, canonical_key: &str) -> Option<String> {
    find_match(attributes, canonical_key).map(|(_, value)| value)
}

/// Matching rule and rendered value, exposed for diagnostics and tests
pub fn find_match(attributes: &Map<String, Value>, canonical_key: &str) -> Option<(MatchRule, String)> {
    let stripped = strip_hashes(canonical_key);
    let lowered = canonical_key.to_lowercase();
    let lowered_stripped = stripped.to_lowercase();

    if let Some(value) = usable(attributes.get(canonical_key)) {
        return Some((MatchRule::Exact, value));
    }
    if let Some(value) = usable(attributes.get(stripped.as_str())) {
        return Some((MatchRule::HashStripped, value));
    }
    if let Some(value) = usable(attributes.get(format!("#{stripped}").as_str())) {
        return Some((MatchRule::HashPrefixed, value));
    }

    for rule in [
        MatchRule::CaseInsensitive,
        MatchRule::CaseInsensitiveHashStripped,
        MatchRule::Substring,
    ] {
        let hit = attributes
            .iter()
            .filter(|(key, _)| key_matches(rule, key, &lowered, &lowered_stripped))
            .find_map(|(_, value)| usable(Some(value)));
        if let Some(value) = hit {
            return Some((rule, value));
        }
    }

    None
}

fn key_matches(rule: MatchRule, key: &str, lowered: &str, lowered_stripped: &str) -> bool {
    match rule {
        MatchRule::CaseInsensitive => key.to_lowercase() == lowered,
        MatchRule::CaseInsensitiveHashStripped => {
            strip_hashes(key).to_lowercase() == lowered_stripped
        }
        MatchRule::Substring => {
            let key = key.to_lowercase();
            !key.is_empty()
                && !lowered.is_empty()
                && (key.contains(lowered) || lowered.contains(key.as_str()))
        }
        // Direct lookups are handled before the scan
        MatchRule::Exact | MatchRule::HashStripped | MatchRule::HashPrefixed => false,
    }
}

fn strip_hashes(key: &str) -> String {
    key.replace('#', "")
}

fn usable(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
