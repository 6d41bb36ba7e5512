#![allow(clippy::doc_markdown)] // Allow technical terms like LTL, BOL in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Freight Booking Core
//!
//! Staging core for booking marketplace orders with freight carriers:
//! rate quote → bill of lading → optional pickup request → final submission.
//!
//! ## Overview
//!
//! The forms around this workflow are simple. The parts that need care are:
//!
//! - a staging cache that merges partial updates from independent sub-flows
//!   without losing fields, and survives reload;
//! - an idempotent decision on whether a shipped-order record needs creating,
//!   updating or nothing at all;
//! - a booking state machine whose bill-of-lading transition can skip the
//!   pickup stage entirely;
//! - a poller that follows a long-running import job and chains exactly one
//!   scrape job after it.
//!
//! ## Module Organization
//!
//! - [`extraction`] - Fuzzy lookups over marketplace attribute maps
//! - [`cache`] - Durable + ephemeral staging cache
//! - [`events`] - Typed carrier event bus and the staging listener
//! - [`decision`] - Create/Update/Skip decisions and save orchestration
//! - [`state_machine`] - Booking stages, guards and the transition table
//! - [`poller`] - Import/scrape job polling with follow-up chaining
//! - [`client`] - Backend collaborator traits and the HTTP client
//! - [`workflow`] - Per-order booking driver
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use freight_core::cache::OrderStagingCache;
//! use freight_core::client::HttpBackendClient;
//! use freight_core::config::ConfigManager;
//! use freight_core::events::CarrierEventBus;
//! use freight_core::models::Order;
//! use freight_core::workflow::BookingWorkflow;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! freight_core::logging::init_structured_logging();
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//!
//! let cache = Arc::new(OrderStagingCache::from_config(&config.cache)?);
//! let backend = Arc::new(HttpBackendClient::new(config.backend.clone())?);
//! let bus = CarrierEventBus::from_config(&config.events);
//!
//! let order = Order::new(1001, "114-0000001").with_attribute("SKU#", "DESK-9");
//! let workflow = BookingWorkflow::open(&order, cache, bus, backend)?;
//! println!("Order {} is at {}", workflow.order_id(), workflow.stage());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod decision;
pub mod error;
pub mod events;
pub mod extraction;
pub mod logging;
pub mod models;
pub mod poller;
pub mod state_machine;
pub mod workflow;

pub use cache::OrderStagingCache;
pub use config::{ConfigManager, FreightConfig};
pub use constants::{Carrier, ShippingType};
pub use decision::{decide, SaveCoordinator, SaveDecision, SaveOutcome, SkipReason};
pub use error::{FreightError, FreightResult};
pub use events::{CarrierEvent, CarrierEventBus, StagingEventListener};
pub use extraction::get_value;
pub use poller::{AsyncJobPoller, PollerEvent};
pub use state_machine::{BookingEvent, BookingStage, BookingStateMachine};
pub use workflow::BookingWorkflow;
