//! # Staged Shipment
//!
//! Local working copy of the carrier and sub-SKU decisions for one order,
//! together with the partial-update patch every writer uses to change it.
//!
//! A patch only carries the fields its writer owns. Applying it leaves every
//! other field untouched, which is what lets the rate-quote, BOL and pickup
//! sub-flows complete in any order without overwriting each other.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::file_ref::FileRef;
use crate::constants::{Carrier, ShippingType};

/// Per-carrier artifacts captured during the booking stages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierArtifacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_quote_request: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_quote_response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bol_response: Option<Value>,
    /// Held in the ephemeral store only
    #[serde(skip)]
    pub bol_file_refs: Option<Vec<FileRef>>,
}

impl CarrierArtifacts {
    pub fn is_empty(&self) -> bool {
        self.rate_quote_request.is_none()
            && self.rate_quote_response.is_none()
            && self.bol_response.is_none()
            && self.bol_file_refs.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedShipment {
    pub order_id: i64,
    #[serde(default)]
    pub marketplace_order_id: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub marketplace: String,
    #[serde(default)]
    pub shipping_type: Option<ShippingType>,
    #[serde(default, rename = "subSKUs")]
    pub sub_skus: Vec<String>,
    #[serde(default)]
    pub carrier_artifacts: BTreeMap<Carrier, CarrierArtifacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_record_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_artifact: Option<Value>,
}

impl StagedShipment {
    pub fn new(order_id: i64) -> Self {
        Self {
            order_id,
            ..Default::default()
        }
    }

    /// Both sub-SKUs and a shipping type are required before any backend write
    pub fn is_ready_for_backend(&self) -> bool {
        !self.sku.trim().is_empty() && self.shipping_type.is_some() && !self.sub_skus.is_empty()
    }

    pub fn artifacts(&self, carrier: Carrier) -> Option<&CarrierArtifacts> {
        self.carrier_artifacts.get(&carrier)
    }

    /// All BOL attachments across carriers, in carrier order
    pub fn bol_files(&self) -> Vec<FileRef> {
        self.carrier_artifacts
            .values()
            .filter_map(|artifacts| artifacts.bol_file_refs.clone())
            .flatten()
            .collect()
    }

    /// Merge the durable (non-file) part of a patch into this record.
    ///
    /// Returns the previously stored backend id when the patch tries to
    /// replace it with a different one; the stored id is left as is.
    pub fn apply_durable(&mut self, patch: &StagedShipmentPatch) -> Option<i64> {
        if let Some(sku) = &patch.sku {
            self.sku = sku.clone();
        }
        if let Some(marketplace) = &patch.marketplace {
            self.marketplace = marketplace.clone();
        }
        if let Some(marketplace_order_id) = &patch.marketplace_order_id {
            self.marketplace_order_id = marketplace_order_id.clone();
        }
        if let Some(shipping_type) = patch.shipping_type {
            self.shipping_type = Some(shipping_type);
        }
        if let Some(sub_skus) = &patch.sub_skus {
            self.sub_skus = sub_skus.clone();
        }
        if let Some(pickup) = &patch.pickup_artifact {
            self.pickup_artifact = Some(pickup.clone());
        }

        for (carrier, artifacts_patch) in &patch.carrier_artifacts {
            if !artifacts_patch.has_durable_fields() {
                continue;
            }
            let artifacts = self.carrier_artifacts.entry(*carrier).or_default();
            if let Some(request) = &artifacts_patch.rate_quote_request {
                artifacts.rate_quote_request = Some(request.clone());
            }
            if let Some(response) = &artifacts_patch.rate_quote_response {
                artifacts.rate_quote_response = Some(response.clone());
            }
            if let Some(bol) = &artifacts_patch.bol_response {
                artifacts.bol_response = Some(bol.clone());
            }
        }

        match (self.backend_record_id, patch.backend_record_id) {
            (Some(existing), Some(incoming)) if existing != incoming => Some(existing),
            (_, Some(incoming)) => {
                self.backend_record_id = Some(incoming);
                None
            }
            _ => None,
        }
    }

    /// Overlay ephemeral artifacts onto the durable view
    pub fn attach_ephemeral(&mut self, ephemeral: &EphemeralArtifacts) {
        for (carrier, files) in &ephemeral.bol_file_refs {
            self.carrier_artifacts
                .entry(*carrier)
                .or_default()
                .bol_file_refs = Some(files.clone());
        }
    }
}

/// File-bearing artifacts that must never reach the durable medium
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EphemeralArtifacts {
    pub bol_file_refs: BTreeMap<Carrier, Vec<FileRef>>,
}

impl EphemeralArtifacts {
    pub fn is_empty(&self) -> bool {
        self.bol_file_refs.is_empty()
    }

    pub fn apply(&mut self, patch: &StagedShipmentPatch) {
        for (carrier, artifacts_patch) in &patch.carrier_artifacts {
            if let Some(files) = &artifacts_patch.bol_file_refs {
                self.bol_file_refs.insert(*carrier, files.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarrierArtifactsPatch {
    pub rate_quote_request: Option<Value>,
    pub rate_quote_response: Option<Value>,
    pub bol_response: Option<Value>,
    pub bol_file_refs: Option<Vec<FileRef>>,
}

impl CarrierArtifactsPatch {
    fn has_durable_fields(&self) -> bool {
        self.rate_quote_request.is_some()
            || self.rate_quote_response.is_some()
            || self.bol_response.is_some()
    }
}

/// Partial update for a staged shipment; `None` means "leave as is"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedShipmentPatch {
    pub sku: Option<String>,
    pub marketplace: Option<String>,
    pub marketplace_order_id: Option<String>,
    pub shipping_type: Option<ShippingType>,
    pub sub_skus: Option<Vec<String>>,
    pub carrier_artifacts: BTreeMap<Carrier, CarrierArtifactsPatch>,
    pub backend_record_id: Option<i64>,
    pub pickup_artifact: Option<Value>,
}

impl StagedShipmentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn marketplace(mut self, marketplace: impl Into<String>) -> Self {
        self.marketplace = Some(marketplace.into());
        self
    }

    pub fn marketplace_order_id(mut self, id: impl Into<String>) -> Self {
        self.marketplace_order_id = Some(id.into());
        self
    }

    pub fn shipping_type(mut self, shipping_type: ShippingType) -> Self {
        self.shipping_type = Some(shipping_type);
        self
    }

    pub fn sub_skus<I, S>(mut self, sub_skus: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_skus = Some(sub_skus.into_iter().map(Into::into).collect());
        self
    }

    pub fn backend_record_id(mut self, id: i64) -> Self {
        self.backend_record_id = Some(id);
        self
    }

    pub fn pickup_artifact(mut self, pickup: Value) -> Self {
        self.pickup_artifact = Some(pickup);
        self
    }

    pub fn rate_quote(mut self, carrier: Carrier, request: Value, response: Value) -> Self {
        let entry = self.carrier_artifacts.entry(carrier).or_default();
        entry.rate_quote_request = Some(request);
        entry.rate_quote_response = Some(response);
        self
    }

    pub fn bill_of_lading(
        mut self,
        carrier: Carrier,
        response: Value,
        files: Option<Vec<FileRef>>,
    ) -> Self {
        let entry = self.carrier_artifacts.entry(carrier).or_default();
        entry.bol_response = Some(response);
        entry.bol_file_refs = files;
        self
    }

    pub fn has_ephemeral_fields(&self) -> bool {
        self.carrier_artifacts
            .values()
            .any(|artifacts| artifacts.bol_file_refs.is_some())
    }

    pub fn has_durable_fields(&self) -> bool {
        self.sku.is_some()
            || self.marketplace.is_some()
            || self.marketplace_order_id.is_some()
            || self.shipping_type.is_some()
            || self.sub_skus.is_some()
            || self.backend_record_id.is_some()
            || self.pickup_artifact.is_some()
            || self
                .carrier_artifacts
                .values()
                .any(CarrierArtifactsPatch::has_durable_fields)
    }
}
