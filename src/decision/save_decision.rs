//! Create / Update / Skip verdict for persisting a staged shipment.
//!
//! The verdict depends only on the current staged values and the backend
//! record (if any), so re-running it with unchanged inputs always gives the
//! same answer. Once the indicated write has been made and the backend id
//! written back to the cache, the next decision for the same values is
//! `Skip(AlreadyCurrent)`.

use serde::Serialize;
use std::fmt;

use crate::constants::ShippingType;
use crate::models::{ShippedOrderRecord, StagedShipment};

/// The fields a save decision looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionInput<'a> {
    pub sku: &'a str,
    pub shipping_type: Option<ShippingType>,
    pub sub_skus: &'a [String],
}

impl<'a> DecisionInput<'a> {
    pub fn new(sku: &'a str, shipping_type: Option<ShippingType>, sub_skus: &'a [String]) -> Self {
        Self {
            sku,
            shipping_type,
            sub_skus,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.sku.trim().is_empty() && self.shipping_type.is_some() && !self.sub_skus.is_empty()
    }
}

impl<'a> From<&'a StagedShipment> for DecisionInput<'a> {
    fn from(shipment: &'a StagedShipment) -> Self {
        Self::new(&shipment.sku, shipment.shipping_type, &shipment.sub_skus)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// sku, shipping type or sub-SKUs missing
    Incomplete,
    /// Backend record already holds these values
    AlreadyCurrent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete => write!(f, "incomplete"),
            Self::AlreadyCurrent => write!(f, "already current"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SaveDecision {
    Skip { reason: SkipReason },
    Create,
    Update { record_id: i64 },
}

impl SaveDecision {
    pub fn skip(reason: SkipReason) -> Self {
        Self::Skip { reason }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip { .. })
    }

    /// Whether acting on this decision makes a network call
    pub fn writes(&self) -> bool {
        !self.is_skip()
    }
}

impl fmt::Display for SaveDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip { reason } => write!(f, "skip ({reason})"),
            Self::Create => write!(f, "create"),
            Self::Update { record_id } => write!(f, "update #{record_id}"),
        }
    }
}

/// Decide how to persist `current` given the backend's `previous` record.
///
/// Incomplete input is never written, even when a record already exists.
pub fn decide(current: DecisionInput<'_>, previous: Option<&ShippedOrderRecord>) -> SaveDecision {
    if !current.is_complete() {
        return SaveDecision::skip(SkipReason::Incomplete);
    }

    match previous {
        None => SaveDecision::Create,
        Some(record) => {
            let shipping_type_matches = record.shipping_type() == current.shipping_type;
            let sub_skus_match = !record.sub_skus().is_empty()
                && same_multiset(record.sub_skus(), current.sub_skus);

            if shipping_type_matches && sub_skus_match {
                SaveDecision::skip(SkipReason::AlreadyCurrent)
            } else {
                SaveDecision::Update {
                    record_id: record.id,
                }
            }
        }
    }
}

/// Order-independent comparison that still counts duplicates
pub fn same_multiset(left: &[String], right: &[String]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut left: Vec<&str> = left.iter().map(String::as_str).collect();
    let mut right: Vec<&str> = right.iter().map(String::as_str).collect();
    left.sort_unstable();
    right.sort_unstable();
    left == right
}
