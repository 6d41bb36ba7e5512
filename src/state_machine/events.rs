use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::constants::Carrier;

/// Quote chosen in the rate-quote stage, carried into bill of lading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedQuote {
    pub carrier: Carrier,
    pub quote: Value,
}

impl SelectedQuote {
    pub fn new(carrier: Carrier, quote: Value) -> Self {
        Self { carrier, quote }
    }
}

/// Events that can trigger booking stage transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BookingEvent {
    QuoteSelected(SelectedQuote),
    /// `schedule_pickup` means the pickup was booked together with the BOL
    BolSubmitted { schedule_pickup: bool, response: Value },
    PickupSubmitted { response: Value },
    Back,
    FinalSubmitted,
}

/// Payload-free event discriminant used as the transition table key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingEventKind {
    QuoteSelected,
    BolSubmitted,
    PickupSubmitted,
    Back,
    FinalSubmitted,
}

impl BookingEvent {
    pub fn kind(&self) -> BookingEventKind {
        match self {
            Self::QuoteSelected(_) => BookingEventKind::QuoteSelected,
            Self::BolSubmitted { .. } => BookingEventKind::BolSubmitted,
            Self::PickupSubmitted { .. } => BookingEventKind::PickupSubmitted,
            Self::Back => BookingEventKind::Back,
            Self::FinalSubmitted => BookingEventKind::FinalSubmitted,
        }
    }

    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn bol_submitted(schedule_pickup: bool, response: Value) -> Self {
        Self::BolSubmitted {
            schedule_pickup,
            response,
        }
    }

    pub fn pickup_submitted(response: Value) -> Self {
        Self::PickupSubmitted { response }
    }
}

impl BookingEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuoteSelected => "quote_selected",
            Self::BolSubmitted => "bol_submitted",
            Self::PickupSubmitted => "pickup_submitted",
            Self::Back => "back",
            Self::FinalSubmitted => "final_submitted",
        }
    }
}

impl fmt::Display for BookingEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
