use thiserror::Error;

use super::events::BookingEventKind;
use super::states::BookingStage;
use crate::error::FreightError;

/// Error types for booking state machine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateMachineError {
    #[error("Guard condition failed: {reason}")]
    GuardFailed { reason: String },

    #[error("Invalid transition from {from} on {event}")]
    InvalidTransition {
        from: BookingStage,
        event: BookingEventKind,
    },

    #[error("Action {action} failed: {source}")]
    ActionFailed {
        action: &'static str,
        source: FreightError,
    },

    #[error("Booking for order {order_id} is already finished")]
    AlreadyFinished { order_id: i64 },
}

/// Specific error type for guard condition failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
    #[error("Condition not met: {guard}")]
    ConditionNotMet { guard: &'static str },

    #[error("No earlier stage to return to from {stage}")]
    NoHistory { stage: BookingStage },
}

/// Specific error type for action execution failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Collaborator call failed: {0}")]
    Collaborator(#[from] FreightError),
}

impl ActionError {
    pub fn into_inner(self) -> FreightError {
        match self {
            Self::Collaborator(source) => source,
        }
    }
}

impl From<GuardError> for StateMachineError {
    fn from(err: GuardError) -> Self {
        Self::GuardFailed {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for state machine operations
pub type StateMachineResult<T> = Result<T, StateMachineError>;
pub type GuardResult<T> = Result<T, GuardError>;
pub type ActionResult<T> = Result<T, ActionError>;

/// Collaborator failures keep their own category so the caller can show the
/// matching message
impl From<StateMachineError> for FreightError {
    fn from(err: StateMachineError) -> Self {
        match err {
            StateMachineError::ActionFailed { source, .. } => source,
            other => FreightError::StateTransitionError(other.to_string()),
        }
    }
}
