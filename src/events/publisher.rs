use tokio::sync::broadcast;
use tracing::debug;

use super::types::{BolData, CarrierEvent, CarrierEventKind, PickupData, RateQuoteData};
use crate::config::EventBusConfig;
use crate::constants::defaults;

/// Typed in-process publish/subscribe channel, one broadcast per message kind.
///
/// Publishing never fails: with no subscribers the message is dropped. There
/// is no acknowledgment or replay, and a subscriber that falls more than the
/// channel capacity behind loses the oldest messages.
#[derive(Debug, Clone)]
pub struct CarrierEventBus {
    rate_quotes: broadcast::Sender<RateQuoteData>,
    bols: broadcast::Sender<BolData>,
    pickups: broadcast::Sender<PickupData>,
}

/// Receivers for all three kinds, as held by a combined listener
#[derive(Debug)]
pub struct CarrierSubscription {
    pub rate_quotes: broadcast::Receiver<RateQuoteData>,
    pub bols: broadcast::Receiver<BolData>,
    pub pickups: broadcast::Receiver<PickupData>,
}

impl CarrierEventBus {
    /// Create a bus with the specified per-kind channel capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (rate_quotes, _) = broadcast::channel(capacity);
        let (bols, _) = broadcast::channel(capacity);
        let (pickups, _) = broadcast::channel(capacity);
        Self {
            rate_quotes,
            bols,
            pickups,
        }
    }

    pub fn from_config(config: &EventBusConfig) -> Self {
        Self::new(config.buffer_size)
    }

    /// Deliver to current subscribers; returns how many received it
    pub fn publish_rate_quote(&self, data: RateQuoteData) -> usize {
        let (order_id, carrier) = (data.order_id, data.carrier);
        let delivered = self.rate_quotes.send(data).unwrap_or(0);
        log_publish(CarrierEventKind::RateQuote.event_name(), order_id, carrier.as_str(), delivered);
        delivered
    }

    pub fn publish_bol(&self, data: BolData) -> usize {
        let (order_id, carrier) = (data.order_id, data.carrier);
        let delivered = self.bols.send(data).unwrap_or(0);
        log_publish(CarrierEventKind::Bol.event_name(), order_id, carrier.as_str(), delivered);
        delivered
    }

    pub fn publish_pickup(&self, data: PickupData) -> usize {
        let (order_id, carrier) = (data.order_id, data.carrier);
        let delivered = self.pickups.send(data).unwrap_or(0);
        log_publish(CarrierEventKind::Pickup.event_name(), order_id, carrier.as_str(), delivered);
        delivered
    }

    /// Route a combined event to its typed channel
    pub fn publish(&self, event: CarrierEvent) -> usize {
        match event {
            CarrierEvent::RateQuote(data) => self.publish_rate_quote(data),
            CarrierEvent::Bol(data) => self.publish_bol(data),
            CarrierEvent::Pickup(data) => self.publish_pickup(data),
        }
    }

    pub fn subscribe_rate_quotes(&self) -> broadcast::Receiver<RateQuoteData> {
        self.rate_quotes.subscribe()
    }

    pub fn subscribe_bols(&self) -> broadcast::Receiver<BolData> {
        self.bols.subscribe()
    }

    pub fn subscribe_pickups(&self) -> broadcast::Receiver<PickupData> {
        self.pickups.subscribe()
    }

    pub fn subscribe_all(&self) -> CarrierSubscription {
        CarrierSubscription {
            rate_quotes: self.subscribe_rate_quotes(),
            bols: self.subscribe_bols(),
            pickups: self.subscribe_pickups(),
        }
    }

    /// Get the number of active subscribers across all kinds
    pub fn subscriber_count(&self) -> usize {
        self.rate_quotes.receiver_count() + self.bols.receiver_count() + self.pickups.receiver_count()
    }
}

impl Default for CarrierEventBus {
    fn default() -> Self {
        Self::new(defaults::EVENT_BUFFER_SIZE)
    }
}

fn log_publish(event: &str, order_id: i64, carrier: &str, delivered: usize) {
    debug!(
        event = %event,
        order_id = order_id,
        carrier = %carrier,
        delivered = delivered,
        "📣 CARRIER_EVENT"
    );
}
