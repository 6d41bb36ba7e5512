//! # Stage Context
//!
//! Data captured by earlier stages and handed to later ones. Each stage's
//! view is rendered from this context, so revisiting a stage after back
//! navigation shows exactly what was captured, with nothing recomputed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::{BookingEvent, SelectedQuote};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageContext {
    pub selected_quote: Option<SelectedQuote>,
    pub bol_response: Option<Value>,
    pub schedule_pickup: Option<bool>,
    pub pickup_response: Option<Value>,
}

impl StageContext {
    /// Record whatever the event carries; back navigation carries nothing
    /// and clears nothing
    pub fn record(&mut self, event: &BookingEvent) {
        match event {
            BookingEvent::QuoteSelected(quote) => self.selected_quote = Some(quote.clone()),
            BookingEvent::BolSubmitted {
                schedule_pickup,
                response,
            } => {
                self.schedule_pickup = Some(*schedule_pickup);
                self.bol_response = Some(response.clone());
            }
            BookingEvent::PickupSubmitted { response } => {
                self.pickup_response = Some(response.clone())
            }
            BookingEvent::Back | BookingEvent::FinalSubmitted => {}
        }
    }
}
