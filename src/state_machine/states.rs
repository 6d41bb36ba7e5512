use serde::{Deserialize, Serialize};
use std::fmt;

/// Booking stages in display order
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BookingStage {
    /// Initial stage: request quotes and pick one
    #[default]
    RateQuote,
    /// Submit the bill of lading for the selected quote
    BillOfLading,
    /// Only entered when the pickup was not scheduled together with the BOL
    PickupRequest,
    /// Review and final submission
    ResponseSummary,
}

impl BookingStage {
    pub const ALL: [BookingStage; 4] = [
        Self::RateQuote,
        Self::BillOfLading,
        Self::PickupRequest,
        Self::ResponseSummary,
    ];

    /// Check if this is a terminal stage (no forward transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ResponseSummary)
    }

    pub fn is_initial(&self) -> bool {
        matches!(self, Self::RateQuote)
    }
}

impl fmt::Display for BookingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateQuote => write!(f, "rate_quote"),
            Self::BillOfLading => write!(f, "bill_of_lading"),
            Self::PickupRequest => write!(f, "pickup_request"),
            Self::ResponseSummary => write!(f, "response_summary"),
        }
    }
}

impl std::str::FromStr for BookingStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rate_quote" => Ok(Self::RateQuote),
            "bill_of_lading" => Ok(Self::BillOfLading),
            "pickup_request" => Ok(Self::PickupRequest),
            "response_summary" => Ok(Self::ResponseSummary),
            _ => Err(format!("Invalid booking stage: {s}")),
        }
    }
}
