//! # Order Staging Cache
//!
//! Keyed store of per-order shipment staging data, split across two injected
//! backends:
//!
//! ```text
//! OrderStagingCache
//!   ├── DurableStore    <- JSON text, survives reload (in-memory or file)
//!   └── EphemeralStore  <- file blobs, lost on reload
//! ```
//!
//! Every write is a field-level merge so independent sub-flows can report in
//! any order. Writes to the same field from different callers are
//! last-writer-wins and are not detected.

pub mod staging_cache;
pub mod store;

pub use staging_cache::OrderStagingCache;
pub use store::{
    DurableStore, EphemeralStore, FileDurableStore, InMemoryDurableStore, MemoryEphemeralStore,
};
