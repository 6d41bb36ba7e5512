//! # Booking State Machine
//!
//! Four-stage booking sequence with a data-carrying branch: submitting the
//! bill of lading with the pickup already scheduled skips the pickup stage
//! entirely. Transitions come from an explicit table of
//! `(stage, event, guard) -> target` entries, see [`transitions`].

pub mod actions;
pub mod booking_state_machine;
pub mod context;
pub mod errors;
pub mod events;
pub mod guards;
pub mod states;
pub mod transitions;

// Re-export main types for convenient access
pub use actions::{StateAction, TeardownAction};
pub use booking_state_machine::BookingStateMachine;
pub use context::StageContext;
pub use errors::{ActionError, GuardError, StateMachineError, StateMachineResult};
pub use events::{BookingEvent, BookingEventKind, SelectedQuote};
pub use guards::{Guard, GuardInput, StateGuard};
pub use states::BookingStage;
pub use transitions::{Target, Transition, TRANSITIONS};
