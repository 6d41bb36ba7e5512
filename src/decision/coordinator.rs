//! Persistence orchestration around [`decide`].
//!
//! ```text
//! validate ─▶ lookup previous ─▶ reconcile cached id ─▶ decide ─▶ create/update ─▶ write id back
//! ```
//!
//! Validation failures never reach the network. Any backend failure leaves
//! the cache exactly as it was.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::save_decision::{decide, DecisionInput, SaveDecision, SkipReason};
use crate::cache::OrderStagingCache;
use crate::client::ShipmentBackend;
use crate::error::{FreightError, FreightResult};
use crate::logging::log_error;
use crate::models::{
    CreateShippedOrder, ShippedOrderPayload, ShippedOrderRecord, StagedShipment,
    StagedShipmentPatch,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    Skipped { reason: SkipReason, record_id: Option<i64> },
    Created { record_id: i64 },
    Updated { record_id: i64 },
}

impl SaveOutcome {
    pub fn record_id(&self) -> Option<i64> {
        match self {
            Self::Skipped { record_id, .. } => *record_id,
            Self::Created { record_id } | Self::Updated { record_id } => Some(*record_id),
        }
    }
}

/// Result of a bulk save: every order is attempted, failures are collected
#[derive(Debug, Default)]
pub struct BulkSaveReport {
    pub saved: Vec<(i64, SaveOutcome)>,
    pub failed: Vec<(i64, FreightError)>,
}

impl BulkSaveReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.saved.len() + self.failed.len()
    }
}

#[derive(Clone)]
pub struct SaveCoordinator {
    cache: Arc<OrderStagingCache>,
    backend: Arc<dyn ShipmentBackend>,
}

impl std::fmt::Debug for SaveCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveCoordinator")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl SaveCoordinator {
    pub fn new(cache: Arc<OrderStagingCache>, backend: Arc<dyn ShipmentBackend>) -> Self {
        Self { cache, backend }
    }

    /// Persist the staged shipment for `order_id` if it needs it
    pub async fn save(&self, order_id: i64) -> FreightResult<SaveOutcome> {
        let plan = self.plan(order_id).await?;

        let outcome = match plan.decision {
            SaveDecision::Skip { reason } => SaveOutcome::Skipped {
                reason,
                record_id: plan.previous.as_ref().map(|record| record.id),
            },
            SaveDecision::Create => {
                let created = self
                    .backend
                    .create_shipped_order(&CreateShippedOrder::from_staged(&plan.shipment))
                    .await?;
                SaveOutcome::Created {
                    record_id: created.id,
                }
            }
            SaveDecision::Update { record_id } => {
                self.backend
                    .update_shipped_order(record_id, &plan.payload(), &[])
                    .await?;
                SaveOutcome::Updated { record_id }
            }
        };

        if let Some(record_id) = outcome.record_id() {
            self.write_back(&plan.shipment, record_id)?;
        }
        Ok(outcome)
    }

    /// Final submission: create the record if there is none, then send one
    /// update carrying the full payload and every BOL attachment. Returns the
    /// backend record id.
    pub async fn submit_final(&self, order_id: i64) -> FreightResult<i64> {
        let plan = self.plan(order_id).await?;

        let record_id = match plan.decision {
            SaveDecision::Create => {
                self.backend
                    .create_shipped_order(&CreateShippedOrder::from_staged(&plan.shipment))
                    .await?
                    .id
            }
            SaveDecision::Update { record_id } => record_id,
            SaveDecision::Skip { reason } => plan
                .previous
                .as_ref()
                .map(|record| record.id)
                .ok_or_else(|| {
                    FreightError::ValidationError(format!(
                        "Order {order_id} cannot be submitted: {reason}"
                    ))
                })?,
        };
        self.write_back(&plan.shipment, record_id)?;

        let files = plan.shipment.bol_files();
        self.backend
            .update_shipped_order(record_id, &plan.payload(), &files)
            .await?;

        info!(
            order_id = order_id,
            record_id = record_id,
            attachments = files.len(),
            "Final shipment submitted"
        );
        Ok(record_id)
    }

    /// Save each order in turn; a failure is recorded and the rest continue.
    /// Nothing is retried automatically.
    pub async fn save_all(&self, order_ids: &[i64]) -> BulkSaveReport {
        let mut report = BulkSaveReport::default();
        for &order_id in order_ids {
            match self.save(order_id).await {
                Ok(outcome) => report.saved.push((order_id, outcome)),
                Err(e) => {
                    log_error(
                        "SaveCoordinator",
                        "save_all",
                        &e.to_string(),
                        Some(&format!("order_id={order_id}")),
                    );
                    report.failed.push((order_id, e));
                }
            }
        }

        info!(
            attempted = report.attempted(),
            failed = report.failed.len(),
            "Bulk save finished"
        );
        report
    }

    /// Everything up to the backend write: validate, look up, reconcile, decide
    async fn plan(&self, order_id: i64) -> FreightResult<SavePlan> {
        let shipment = self.load(order_id)?;
        validate(&shipment)?;

        let previous = self.lookup(&shipment).await?;
        let previous = reconcile(&shipment, previous)?;

        let decision = decide(DecisionInput::from(&shipment), previous.as_ref());
        info!(order_id = order_id, decision = %decision, "Save decision");

        Ok(SavePlan {
            shipment,
            previous,
            decision,
        })
    }

    fn load(&self, order_id: i64) -> FreightResult<StagedShipment> {
        self.cache.get(order_id)?.ok_or_else(|| {
            FreightError::NotFoundError(format!("No staged shipment for order {order_id}"))
        })
    }

    async fn lookup(&self, shipment: &StagedShipment) -> FreightResult<Option<ShippedOrderRecord>> {
        let order_number = Some(shipment.marketplace_order_id.as_str()).filter(|id| !id.is_empty());
        self.backend
            .find_shipped_order(&shipment.sku, order_number)
            .await
    }

    fn write_back(&self, shipment: &StagedShipment, record_id: i64) -> FreightResult<()> {
        if shipment.backend_record_id == Some(record_id) {
            return Ok(());
        }
        self.cache.upsert(
            shipment.order_id,
            &StagedShipmentPatch::new().backend_record_id(record_id),
        )?;
        Ok(())
    }
}

struct SavePlan {
    shipment: StagedShipment,
    previous: Option<ShippedOrderRecord>,
    decision: SaveDecision,
}

impl SavePlan {
    /// Update body; built on the stored payload when there is one so keys
    /// written by other clients survive
    fn payload(&self) -> ShippedOrderPayload {
        match &self.previous {
            Some(record) => ShippedOrderPayload::merged_onto(&record.orders_jsonb, &self.shipment),
            None => ShippedOrderPayload::from_staged(&self.shipment),
        }
    }
}

fn validate(shipment: &StagedShipment) -> FreightResult<()> {
    if shipment.sku.trim().is_empty() {
        return Err(FreightError::ValidationError("A SKU is required before saving.".to_string()));
    }
    if shipment.shipping_type.is_none() {
        return Err(FreightError::ValidationError(
            "Select a shipping type before saving.".to_string(),
        ));
    }
    if shipment.sub_skus.is_empty() {
        return Err(FreightError::ValidationError(
            "Enter at least one sub-SKU before saving.".to_string(),
        ));
    }
    Ok(())
}

/// Check the cached backend id against what the backend returned
fn reconcile(
    shipment: &StagedShipment,
    previous: Option<ShippedOrderRecord>,
) -> FreightResult<Option<ShippedOrderRecord>> {
    match (shipment.backend_record_id, previous) {
        (Some(cached), None) => {
            warn!(
                order_id = shipment.order_id,
                record_id = cached,
                "Cached backend record is missing"
            );
            Err(FreightError::NotFoundError(format!(
                "Shipped order {cached} for order {} no longer exists",
                shipment.order_id
            )))
        }
        (Some(cached), Some(record)) if record.id != cached => {
            warn!(
                order_id = shipment.order_id,
                cached_record_id = cached,
                backend_record_id = record.id,
                "Cached and backend record ids disagree"
            );
            Err(FreightError::ConflictError(format!(
                "Order {} is linked to record {cached} but the backend holds record {}",
                shipment.order_id, record.id
            )))
        }
        (_, previous) => Ok(previous),
    }
}
