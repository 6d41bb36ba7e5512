use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::errors::ActionResult;
use super::events::BookingEventKind;
use super::states::BookingStage;
use crate::cache::OrderStagingCache;
use crate::client::ShipmentBackend;
use crate::constants::events;

/// Trait for implementing state transition actions.
///
/// Actions run after guards pass and before the new stage is committed; a
/// failing action leaves the machine where it was.
#[async_trait]
pub trait StateAction: Send + Sync {
    /// Whether this action runs for the given transition
    fn applies_to(&self, from: BookingStage, event: BookingEventKind) -> bool;

    /// Execute the action
    async fn execute(&self, order_id: i64, from: BookingStage) -> ActionResult<()>;

    /// Get a description of this action for logging
    fn description(&self) -> &'static str;
}

/// Deletes the originating order and drops its staging record once the
/// final submission has gone through
pub struct TeardownAction {
    cache: Arc<OrderStagingCache>,
    backend: Arc<dyn ShipmentBackend>,
}

impl TeardownAction {
    pub fn new(cache: Arc<OrderStagingCache>, backend: Arc<dyn ShipmentBackend>) -> Self {
        Self { cache, backend }
    }
}

impl std::fmt::Debug for TeardownAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeardownAction").finish_non_exhaustive()
    }
}

#[async_trait]
impl StateAction for TeardownAction {
    fn applies_to(&self, _from: BookingStage, event: BookingEventKind) -> bool {
        event == BookingEventKind::FinalSubmitted
    }

    async fn execute(&self, order_id: i64, _from: BookingStage) -> ActionResult<()> {
        self.backend.delete_order(order_id).await?;
        self.cache.remove(order_id)?;

        info!(
            order_id = order_id,
            event = events::BOOKING_FINALIZED,
            "Booking torn down"
        );
        Ok(())
    }

    fn description(&self) -> &'static str {
        "teardown"
    }
}
