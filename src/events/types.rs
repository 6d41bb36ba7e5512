//! Carrier message kinds carried by the event bus.
//!
//! Messages are transient: they are never persisted and are delivered at
//! most once to whichever subscribers exist at publish time.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::constants::{events, Carrier};
use crate::models::{FileRef, StagedShipmentPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CarrierEventKind {
    RateQuote,
    Bol,
    Pickup,
}

impl CarrierEventKind {
    /// Event name used in logs
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::RateQuote => events::RATE_QUOTE_DATA,
            Self::Bol => events::BOL_DATA,
            Self::Pickup => events::PICKUP_DATA,
        }
    }
}

impl fmt::Display for CarrierEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateQuoteData {
    pub order_id: i64,
    pub carrier: Carrier,
    pub request: Value,
    pub response: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BolData {
    pub order_id: i64,
    pub carrier: Carrier,
    pub bol_response: Value,
    pub bol_file_refs: Vec<FileRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickupData {
    pub order_id: i64,
    pub carrier: Carrier,
    pub pickup_response: Value,
}

/// Any of the three carrier messages, as seen by a combined listener
#[derive(Debug, Clone, PartialEq)]
pub enum CarrierEvent {
    RateQuote(RateQuoteData),
    Bol(BolData),
    Pickup(PickupData),
}

impl CarrierEvent {
    pub fn order_id(&self) -> i64 {
        match self {
            Self::RateQuote(data) => data.order_id,
            Self::Bol(data) => data.order_id,
            Self::Pickup(data) => data.order_id,
        }
    }

    pub fn carrier(&self) -> Carrier {
        match self {
            Self::RateQuote(data) => data.carrier,
            Self::Bol(data) => data.carrier,
            Self::Pickup(data) => data.carrier,
        }
    }

    pub fn kind(&self) -> CarrierEventKind {
        match self {
            Self::RateQuote(_) => CarrierEventKind::RateQuote,
            Self::Bol(_) => CarrierEventKind::Bol,
            Self::Pickup(_) => CarrierEventKind::Pickup,
        }
    }

    /// Field-level patch owned by this message's sub-flow
    pub fn to_patch(&self) -> StagedShipmentPatch {
        match self {
            Self::RateQuote(data) => StagedShipmentPatch::new().rate_quote(
                data.carrier,
                data.request.clone(),
                data.response.clone(),
            ),
            Self::Bol(data) => {
                let files = if data.bol_file_refs.is_empty() {
                    None
                } else {
                    Some(data.bol_file_refs.clone())
                };
                StagedShipmentPatch::new().bill_of_lading(
                    data.carrier,
                    data.bol_response.clone(),
                    files,
                )
            }
            Self::Pickup(data) => {
                StagedShipmentPatch::new().pickup_artifact(data.pickup_response.clone())
            }
        }
    }
}

impl From<RateQuoteData> for CarrierEvent {
    fn from(data: RateQuoteData) -> Self {
        Self::RateQuote(data)
    }
}

impl From<BolData> for CarrierEvent {
    fn from(data: BolData) -> Self {
        Self::Bol(data)
    }
}

impl From<PickupData> for CarrierEvent {
    fn from(data: PickupData) -> Self {
        Self::Pickup(data)
    }
}
