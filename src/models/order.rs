use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::attribute_keys;
use crate::extraction::{find_value_in, get_value_in};

/// Marketplace order as exported by the selling channel.
///
/// Attribute names vary between marketplaces, so every read goes through the
/// fuzzy field extractor rather than a fixed schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub marketplace_order_id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Order {
    pub fn new(id: i64, marketplace_order_id: impl Into<String>) -> Self {
        Self {
            id,
            marketplace_order_id: marketplace_order_id.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attribute value or the `not found` sentinel
    pub fn attribute(&self, canonical_key: &str) -> String {
        get_value_in(&self.attributes, canonical_key)
    }

    pub fn sku(&self) -> Option<String> {
        find_value_in(&self.attributes, attribute_keys::SKU)
    }

    pub fn marketplace(&self) -> Option<String> {
        find_value_in(&self.attributes, attribute_keys::MARKETPLACE)
    }
}
