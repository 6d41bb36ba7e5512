//! # Field Extraction
//!
//! Fuzzy access to loosely-typed marketplace attribute maps.

pub mod field_extractor;

pub use field_extractor::{
    find_match, find_value, find_value_in, get_value, get_value_in, MatchRule,
};
