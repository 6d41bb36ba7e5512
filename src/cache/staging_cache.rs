use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use super::store::{
    DurableStore, EphemeralStore, FileDurableStore, InMemoryDurableStore, MemoryEphemeralStore,
};
use crate::config::CacheConfig;
use crate::error::{FreightError, FreightResult};
use crate::logging::log_cache_operation;
use crate::models::{JobKind, JobStatus, Order, StagedShipment, StagedShipmentPatch};

const SHIPMENT_PREFIX: &str = "staged_shipment:";
const JOB_STATUS_PREFIX: &str = "job_status:";

/// Session-wide staging cache; construct once and share behind an `Arc`.
///
/// The backing stores are plain key-value maps with no locking of their own.
/// The cache adds one lock around every read-merge-write, so upserts from any
/// number of tasks are serialized here rather than left to the callers.
#[derive(Debug)]
pub struct OrderStagingCache {
    durable: Arc<dyn DurableStore>,
    ephemeral: Arc<dyn EphemeralStore>,
    /// Held across read-merge-write; field-disjoint writers from different
    /// tasks never drop each other's fields
    merge_lock: Mutex<()>,
}

impl OrderStagingCache {
    pub fn new(durable: Arc<dyn DurableStore>, ephemeral: Arc<dyn EphemeralStore>) -> Self {
        Self {
            durable,
            ephemeral,
            merge_lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryDurableStore::new()),
            Arc::new(MemoryEphemeralStore::new()),
        )
    }

    /// File-backed durable store when a path is configured, in-memory otherwise
    pub fn from_config(config: &CacheConfig) -> FreightResult<Self> {
        let durable: Arc<dyn DurableStore> = match &config.durable_path {
            Some(path) => Arc::new(FileDurableStore::open(path)?),
            None => Arc::new(InMemoryDurableStore::new()),
        };
        Ok(Self::new(durable, Arc::new(MemoryEphemeralStore::new())))
    }

    /// Joined view of the durable record and its ephemeral artifacts
    pub fn get(&self, order_id: i64) -> FreightResult<Option<StagedShipment>> {
        let durable = self.load_durable(order_id)?;
        let ephemeral = self.ephemeral.get(order_id);

        let shipment = match (durable, ephemeral) {
            (None, None) => None,
            (Some(mut shipment), Some(ephemeral)) => {
                shipment.attach_ephemeral(&ephemeral);
                Some(shipment)
            }
            (Some(shipment), None) => Some(shipment),
            (None, Some(ephemeral)) => {
                let mut shipment = StagedShipment::new(order_id);
                shipment.attach_ephemeral(&ephemeral);
                Some(shipment)
            }
        };

        Ok(shipment)
    }

    /// Merge `patch` into the record for `order_id`, creating it if absent.
    ///
    /// File artifacts go to the ephemeral store, everything else to the
    /// durable store. A patch that would replace an existing backend id with
    /// a different one is rejected with `ConflictError` and nothing is written.
    pub fn upsert(&self, order_id: i64, patch: &StagedShipmentPatch) -> FreightResult<StagedShipment> {
        let _guard = self.merge_lock.lock();

        let existing = self.load_durable(order_id)?;
        let created = existing.is_none();
        let mut shipment = existing.unwrap_or_else(|| StagedShipment::new(order_id));

        if let Some(kept) = shipment.apply_durable(patch) {
            let incoming = patch.backend_record_id.unwrap_or_default();
            warn!(
                order_id = order_id,
                existing_record_id = kept,
                incoming_record_id = incoming,
                "Refusing to replace backend record id on staged shipment"
            );
            return Err(FreightError::ConflictError(format!(
                "Order {order_id} is already linked to backend record {kept}, refusing {incoming}"
            )));
        }

        if created || patch.has_durable_fields() {
            self.durable
                .set(&shipment_key(order_id), serde_json::to_string(&shipment)?)?;
        }

        let mut ephemeral = self.ephemeral.get(order_id).unwrap_or_default();
        if patch.has_ephemeral_fields() {
            ephemeral.apply(patch);
            self.ephemeral.set(order_id, ephemeral.clone());
        }
        shipment.attach_ephemeral(&ephemeral);

        log_cache_operation(
            "upsert",
            order_id,
            if created { "created" } else { "merged" },
            None,
        );

        Ok(shipment)
    }

    /// Delete both the durable and the ephemeral entries
    pub fn remove(&self, order_id: i64) -> FreightResult<()> {
        let _guard = self.merge_lock.lock();
        self.durable.remove(&shipment_key(order_id))?;
        self.ephemeral.remove(order_id);
        log_cache_operation("remove", order_id, "removed", None);
        Ok(())
    }

    /// Create the record from marketplace attributes on first interaction.
    ///
    /// Fields already staged are never overwritten.
    pub fn stage_order(&self, order: &Order) -> FreightResult<StagedShipment> {
        let existing = self.get(order.id)?;
        let mut patch = StagedShipmentPatch::new();

        let current = existing.clone().unwrap_or_else(|| StagedShipment::new(order.id));
        if current.marketplace_order_id.is_empty() {
            patch.marketplace_order_id = Some(order.marketplace_order_id.clone());
        }
        if current.sku.is_empty() {
            patch.sku = order.sku();
        }
        if current.marketplace.is_empty() {
            patch.marketplace = order.marketplace();
        }

        match existing {
            Some(shipment) if !patch.has_durable_fields() => Ok(shipment),
            _ => {
                debug!(order_id = order.id, "Staging order from marketplace attributes");
                self.upsert(order.id, &patch)
            }
        }
    }

    /// Order ids with a durable staging record, for bulk selection
    pub fn staged_order_ids(&self) -> FreightResult<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .durable
            .keys_with_prefix(SHIPMENT_PREFIX)?
            .iter()
            .filter_map(|key| key.strip_prefix(SHIPMENT_PREFIX)?.parse().ok())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    pub fn record_job_status(&self, status: &JobStatus) -> FreightResult<()> {
        self.durable.set(
            &job_status_key(status.kind, &status.job_id),
            serde_json::to_string(status)?,
        )
    }

    pub fn job_status(&self, kind: JobKind, job_id: &str) -> FreightResult<Option<JobStatus>> {
        match self.durable.get(&job_status_key(kind, job_id))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn load_durable(&self, order_id: i64) -> FreightResult<Option<StagedShipment>> {
        match self.durable.get(&shipment_key(order_id))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

fn shipment_key(order_id: i64) -> String {
    format!("{SHIPMENT_PREFIX}{order_id}")
}

fn job_status_key(kind: JobKind, job_id: &str) -> String {
    format!("{JOB_STATUS_PREFIX}{kind}:{job_id}")
}
