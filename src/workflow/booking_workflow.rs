use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::OrderStagingCache;
use crate::client::ShipmentBackend;
use crate::constants::Carrier;
use crate::decision::{SaveCoordinator, SaveOutcome};
use crate::error::{FreightError, FreightResult};
use crate::events::{BolData, CarrierEvent, CarrierEventBus, PickupData, RateQuoteData, StagingEventListener};
use crate::models::{FileRef, Order, StagedShipment};
use crate::state_machine::{
    BookingEvent, BookingStage, BookingStateMachine, SelectedQuote, StageContext, TeardownAction,
};

/// One order's trip through rate quote, bill of lading, pickup and summary.
///
/// Every carrier call happens before the matching transition, so a failed
/// call leaves both the cache and the current stage as they were. Nothing is
/// retried automatically.
pub struct BookingWorkflow {
    order_id: i64,
    cache: Arc<OrderStagingCache>,
    bus: CarrierEventBus,
    backend: Arc<dyn ShipmentBackend>,
    coordinator: SaveCoordinator,
    machine: BookingStateMachine,
    listener: Option<StagingEventListener>,
}

impl std::fmt::Debug for BookingWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingWorkflow")
            .field("order_id", &self.order_id)
            .field("machine", &self.machine)
            .field("listening", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

impl BookingWorkflow {
    /// Stage the order and subscribe to its carrier messages.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(
        order: &Order,
        cache: Arc<OrderStagingCache>,
        bus: CarrierEventBus,
        backend: Arc<dyn ShipmentBackend>,
    ) -> FreightResult<Self> {
        cache.stage_order(order)?;

        let listener = StagingEventListener::spawn(order.id, &bus, cache.clone());
        let coordinator = SaveCoordinator::new(cache.clone(), backend.clone());
        let machine = BookingStateMachine::new(order.id)
            .with_action(Arc::new(TeardownAction::new(cache.clone(), backend.clone())));

        info!(order_id = order.id, "Booking workflow opened");
        Ok(Self {
            order_id: order.id,
            cache,
            bus,
            backend,
            coordinator,
            machine,
            listener: Some(listener),
        })
    }

    pub fn order_id(&self) -> i64 {
        self.order_id
    }

    pub fn stage(&self) -> BookingStage {
        self.machine.current_stage()
    }

    pub fn context(&self) -> &StageContext {
        self.machine.context()
    }

    pub fn state_machine(&self) -> &BookingStateMachine {
        &self.machine
    }

    pub fn is_finished(&self) -> bool {
        self.machine.is_finished()
    }

    pub fn staged(&self) -> FreightResult<Option<StagedShipment>> {
        self.cache.get(self.order_id)
    }

    /// Ask one carrier for a quote; may be repeated for any carrier
    pub async fn request_rate_quote(&mut self, carrier: Carrier, request: Value) -> FreightResult<Value> {
        self.ensure_stage(BookingStage::RateQuote)?;

        let response = self.backend.create_rate_quote(carrier, &request).await?;
        self.stage_and_publish(CarrierEvent::from(RateQuoteData {
            order_id: self.order_id,
            carrier,
            request,
            response: response.clone(),
        }))?;
        Ok(response)
    }

    pub async fn select_quote(&mut self, carrier: Carrier, quote: Value) -> FreightResult<BookingStage> {
        let stage = self
            .machine
            .transition(BookingEvent::QuoteSelected(SelectedQuote::new(carrier, quote)))
            .await?;
        Ok(stage)
    }

    /// Book the BOL with the selected carrier. With `schedule_pickup` the
    /// pickup is booked as part of the BOL and the pickup stage is skipped.
    pub async fn submit_bill_of_lading(
        &mut self,
        request: Value,
        schedule_pickup: bool,
        attachments: Vec<FileRef>,
    ) -> FreightResult<BookingStage> {
        self.ensure_stage(BookingStage::BillOfLading)?;
        let carrier = self.selected_carrier()?;

        let response = self.backend.create_bill_of_lading(carrier, &request).await?;
        self.stage_and_publish(CarrierEvent::from(BolData {
            order_id: self.order_id,
            carrier,
            bol_response: response.clone(),
            bol_file_refs: attachments,
        }))?;

        let stage = self
            .machine
            .transition(BookingEvent::bol_submitted(schedule_pickup, response))
            .await?;
        Ok(stage)
    }

    pub async fn submit_pickup_request(&mut self, request: Value) -> FreightResult<BookingStage> {
        self.ensure_stage(BookingStage::PickupRequest)?;
        let carrier = self.selected_carrier()?;

        let response = self.backend.create_pickup_request(carrier, &request).await?;
        self.stage_and_publish(CarrierEvent::from(PickupData {
            order_id: self.order_id,
            carrier,
            pickup_response: response.clone(),
        }))?;

        let stage = self
            .machine
            .transition(BookingEvent::pickup_submitted(response))
            .await?;
        Ok(stage)
    }

    pub async fn back(&mut self) -> FreightResult<BookingStage> {
        Ok(self.machine.transition(BookingEvent::Back).await?)
    }

    /// Persist the staged shipment if it needs it
    pub async fn save(&self) -> FreightResult<SaveOutcome> {
        self.coordinator.save(self.order_id).await
    }

    /// Save on a detached task that outlives [`BookingWorkflow::close`]; the
    /// result still lands in the cache
    pub fn save_in_background(&self) -> JoinHandle<FreightResult<SaveOutcome>> {
        let coordinator = self.coordinator.clone();
        let order_id = self.order_id;
        tokio::spawn(async move { coordinator.save(order_id).await })
    }

    /// Submit the shipment with its BOL attachments, then delete the order
    /// and its staging record. Returns the backend record id.
    pub async fn final_submit(&mut self) -> FreightResult<i64> {
        self.ensure_stage(BookingStage::ResponseSummary)?;
        if self.machine.is_finished() {
            return Err(FreightError::StateTransitionError(format!(
                "Booking for order {} is already finished",
                self.order_id
            )));
        }

        let record_id = self.coordinator.submit_final(self.order_id).await?;
        self.machine.transition(BookingEvent::FinalSubmitted).await?;
        self.close();

        info!(order_id = self.order_id, record_id = record_id, "Booking completed");
        Ok(record_id)
    }

    /// Unsubscribe from the bus. Saves already running are not cancelled.
    pub fn close(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.close();
            debug!(order_id = self.order_id, "Booking workflow closed");
        }
    }

    fn ensure_stage(&self, expected: BookingStage) -> FreightResult<()> {
        let current = self.machine.current_stage();
        if current != expected {
            return Err(FreightError::StateTransitionError(format!(
                "Order {} is at {current}, not {expected}",
                self.order_id
            )));
        }
        Ok(())
    }

    fn selected_carrier(&self) -> FreightResult<Carrier> {
        self.machine
            .context()
            .selected_quote
            .as_ref()
            .map(|quote| quote.carrier)
            .ok_or_else(|| {
                FreightError::ValidationError("Select a rate quote first.".to_string())
            })
    }

    /// Stage the message, then publish it for other subscribers. The local
    /// listener may apply it a second time; the merge is idempotent.
    fn stage_and_publish(&self, event: CarrierEvent) -> FreightResult<()> {
        self.cache.upsert(self.order_id, &event.to_patch())?;
        let delivered = self.bus.publish(event);
        debug!(
            order_id = self.order_id,
            subscribers = delivered,
            "Carrier message staged and published"
        );
        Ok(())
    }
}

impl Drop for BookingWorkflow {
    fn drop(&mut self) {
        self.close();
    }
}
