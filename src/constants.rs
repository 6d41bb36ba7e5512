//! # System Constants
//!
//! Core enums and constants shared by the staging cache, the decision engine,
//! the booking state machine and the job poller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value returned by the field extractor when no usable attribute exists
pub const NOT_FOUND: &str = "not found";

/// Canonical marketplace export column names
pub mod attribute_keys {
    pub const SKU: &str = "SKU";
    pub const MARKETPLACE: &str = "Marketplace";
    pub const ORDER_NUMBER: &str = "Order #";
    pub const PO_NUMBER: &str = "PO#";
    pub const QUANTITY: &str = "Quantity";
    pub const SHIP_TO_ZIP: &str = "Ship To Zip";
}

/// Names used when logging and publishing lifecycle events
pub mod events {
    pub const RATE_QUOTE_DATA: &str = "carrier.rate_quote_data";
    pub const BOL_DATA: &str = "carrier.bol_data";
    pub const PICKUP_DATA: &str = "carrier.pickup_data";

    pub const STAGE_ENTERED: &str = "booking.stage_entered";
    pub const BOOKING_FINALIZED: &str = "booking.finalized";

    pub const JOB_STATUS_OBSERVED: &str = "job.status_observed";
    pub const JOB_FINISHED: &str = "job.finished";
    pub const JOB_FOLLOW_UP_SUBMITTED: &str = "job.follow_up_submitted";
}

/// Defaults applied when configuration omits a value
pub mod defaults {
    pub const POLL_INTERVAL_MS: u64 = 2_000;
    /// 900 polls at two seconds is a thirty minute ceiling
    pub const POLL_MAX_ATTEMPTS: u32 = 900;
    pub const EVENT_BUFFER_SIZE: usize = 256;
    pub const BACKEND_TIMEOUT_MS: u64 = 30_000;
    pub const BACKEND_BASE_URL: &str = "http://localhost:3000";
}

/// Freight mode chosen for a staged shipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShippingType {
    #[serde(rename = "LTL", alias = "ltl")]
    Ltl,
    #[serde(rename = "Parcel", alias = "parcel")]
    Parcel,
}

impl ShippingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingType::Ltl => "LTL",
            ShippingType::Parcel => "Parcel",
        }
    }
}

impl fmt::Display for ShippingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShippingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ltl" => Ok(Self::Ltl),
            "parcel" => Ok(Self::Parcel),
            _ => Err(format!("Invalid shipping type: {s}")),
        }
    }
}

/// Freight carriers the booking workflow can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Xpo,
    Estes,
}

impl Carrier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::Xpo => "xpo",
            Carrier::Estes => "estes",
        }
    }

    pub fn all() -> [Carrier; 2] {
        [Carrier::Xpo, Carrier::Estes]
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Carrier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xpo" => Ok(Self::Xpo),
            "estes" => Ok(Self::Estes),
            _ => Err(format!("Invalid carrier: {s}")),
        }
    }
}
