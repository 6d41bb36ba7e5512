//! Per-order bridge from the carrier event bus into the staging cache.

use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::publisher::{CarrierEventBus, CarrierSubscription};
use super::types::CarrierEvent;
use crate::cache::OrderStagingCache;
use crate::logging::log_error;

/// Applies carrier messages for one order as field-level upserts.
///
/// Subscribes on construction and unsubscribes when dropped or closed, so
/// its lifetime follows the owning workflow. Messages for other orders are
/// ignored.
#[derive(Debug)]
pub struct StagingEventListener {
    order_id: i64,
    handle: JoinHandle<()>,
    applied: watch::Receiver<u64>,
}

impl StagingEventListener {
    /// Must be called from within a tokio runtime
    pub fn spawn(order_id: i64, bus: &CarrierEventBus, cache: Arc<OrderStagingCache>) -> Self {
        let subscription = bus.subscribe_all();
        let (applied_tx, applied) = watch::channel(0u64);
        let handle = tokio::spawn(run(order_id, subscription, cache, applied_tx));

        debug!(order_id = order_id, "Staging event listener subscribed");
        Self {
            order_id,
            handle,
            applied,
        }
    }

    pub fn order_id(&self) -> i64 {
        self.order_id
    }

    /// Number of messages written into the cache so far
    pub fn applied_count(&self) -> u64 {
        *self.applied.borrow()
    }

    /// Wait until at least `count` messages have been applied.
    ///
    /// Returns false if the listener stopped first.
    pub async fn wait_for_applied(&self, count: u64) -> bool {
        let mut applied = self.applied.clone();
        let reached = applied.wait_for(|current| *current >= count).await.is_ok();
        reached
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Unsubscribe; messages published afterwards are not applied
    pub fn close(&self) {
        self.handle.abort();
    }
}

impl Drop for StagingEventListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    order_id: i64,
    mut subscription: CarrierSubscription,
    cache: Arc<OrderStagingCache>,
    applied: watch::Sender<u64>,
) {
    loop {
        let received = tokio::select! {
            message = subscription.rate_quotes.recv() => message.map(CarrierEvent::from),
            message = subscription.bols.recv() => message.map(CarrierEvent::from),
            message = subscription.pickups.recv() => message.map(CarrierEvent::from),
        };

        let event = match received {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(
                    order_id = order_id,
                    skipped = skipped,
                    "Staging listener fell behind, carrier messages dropped"
                );
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if event.order_id() != order_id {
            continue;
        }

        match cache.upsert(order_id, &event.to_patch()) {
            Ok(_) => {
                debug!(
                    order_id = order_id,
                    carrier = %event.carrier(),
                    event = %event.kind(),
                    "Carrier message staged"
                );
                applied.send_modify(|count| *count += 1);
            }
            Err(e) => log_error(
                "StagingEventListener",
                event.kind().event_name(),
                &e.to_string(),
                Some(&format!("order_id={order_id}")),
            ),
        }
    }
}
