//! # Booking Workflow
//!
//! Per-order driver tying the staging cache, the carrier event bus, the
//! backend and the booking state machine together.

pub mod booking_workflow;

pub use booking_workflow::BookingWorkflow;
