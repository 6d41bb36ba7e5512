//! # Carrier Event Bus
//!
//! Typed publish/subscribe channels that let the rate-quote, bill-of-lading
//! and pickup sub-flows report results without knowing who consumes them.
//! [`StagingEventListener`] is the standard consumer: it folds one order's
//! messages into the staging cache.

pub mod listener;
pub mod publisher;
pub mod types;

pub use listener::StagingEventListener;
pub use publisher::{CarrierEventBus, CarrierSubscription};
pub use types::{BolData, CarrierEvent, CarrierEventKind, PickupData, RateQuoteData};
