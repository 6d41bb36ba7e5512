//! # Save Decisions
//!
//! [`decide`] is the pure Create/Update/Skip verdict; [`SaveCoordinator`]
//! wraps it with validation, backend lookup and id write-back.

pub mod coordinator;
pub mod save_decision;

pub use coordinator::{BulkSaveReport, SaveCoordinator, SaveOutcome};
pub use save_decision::{decide, same_multiset, DecisionInput, SaveDecision, SkipReason};
