//! # Data Models
//!
//! Marketplace orders (read-only input), the locally staged shipment and its
//! merge patch, backend shipped-order records and long-running job snapshots.

pub mod file_ref;
pub mod job;
pub mod order;
pub mod shipped_order;
pub mod staged_shipment;

pub use file_ref::FileRef;
pub use job::{JobKind, JobState, JobStatus, ScrapeConfig};
pub use order::Order;
pub use shipped_order::{CreateShippedOrder, ShippedOrderPayload, ShippedOrderRecord};
pub use staged_shipment::{
    CarrierArtifacts, CarrierArtifactsPatch, EphemeralArtifacts, StagedShipment,
    StagedShipmentPatch,
};
