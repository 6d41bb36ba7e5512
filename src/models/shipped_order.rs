use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::staged_shipment::StagedShipment;
use crate::constants::ShippingType;

/// Shipment decisions as the backend stores them in `ordersJsonb`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippedOrderPayload {
    #[serde(default)]
    pub shipping_type: Option<ShippingType>,
    #[serde(default, rename = "subSKUs")]
    pub sub_skus: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub marketplace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_artifacts: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup: Option<Value>,
    /// Keys written by other clients are carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShippedOrderPayload {
    pub fn from_staged(shipment: &StagedShipment) -> Self {
        let carrier_artifacts = if shipment.carrier_artifacts.is_empty() {
            None
        } else {
            serde_json::to_value(&shipment.carrier_artifacts).ok()
        };

        Self {
            shipping_type: shipment.shipping_type,
            sub_skus: shipment.sub_skus.clone(),
            marketplace: shipment.marketplace.clone(),
            carrier_artifacts,
            pickup: shipment.pickup_artifact.clone(),
            extra: Map::new(),
        }
    }

    /// Staged values laid over the payload the backend already holds. Keys
    /// other clients wrote, and artifacts not staged locally, stay as they are.
    pub fn merged_onto(previous: &ShippedOrderPayload, shipment: &StagedShipment) -> Self {
        let staged = Self::from_staged(shipment);
        let mut merged = previous.clone();

        merged.shipping_type = staged.shipping_type;
        merged.sub_skus = staged.sub_skus;
        if !staged.marketplace.is_empty() {
            merged.marketplace = staged.marketplace;
        }
        if staged.carrier_artifacts.is_some() {
            merged.carrier_artifacts = staged.carrier_artifacts;
        }
        if staged.pickup.is_some() {
            merged.pickup = staged.pickup;
        }
        merged
    }
}

/// Existing shipped-order record returned by the backend lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippedOrderRecord {
    pub id: i64,
    pub sku: String,
    #[serde(default, rename = "orderOnMarketPlace")]
    pub order_on_market_place: String,
    #[serde(default)]
    pub orders_jsonb: ShippedOrderPayload,
}

impl ShippedOrderRecord {
    pub fn shipping_type(&self) -> Option<ShippingType> {
        self.orders_jsonb.shipping_type
    }

    pub fn sub_skus(&self) -> &[String] {
        &self.orders_jsonb.sub_skus
    }
}

/// Body of the create shipped-order request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShippedOrder {
    pub sku: String,
    #[serde(rename = "orderOnMarketPlace")]
    pub order_on_market_place: String,
    pub orders_jsonb: ShippedOrderPayload,
}

impl CreateShippedOrder {
    pub fn from_staged(shipment: &StagedShipment) -> Self {
        Self {
            sku: shipment.sku.clone(),
            order_on_market_place: shipment.marketplace_order_id.clone(),
            orders_jsonb: ShippedOrderPayload::from_staged(shipment),
        }
    }
}
