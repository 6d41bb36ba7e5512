//! Pure transition guards.
//!
//! Guards look only at the event and the machine's captured state; they make
//! no calls and have no side effects, so the transition table can be checked
//! without any collaborator.

use super::context::StageContext;
use super::errors::{GuardError, GuardResult};
use super::events::BookingEvent;
use super::states::BookingStage;

/// What a guard may inspect
#[derive(Debug, Clone, Copy)]
pub struct GuardInput<'a> {
    pub stage: BookingStage,
    pub event: &'a BookingEvent,
    pub context: &'a StageContext,
    pub history: &'a [BookingStage],
}

/// Trait for implementing state transition guards
pub trait StateGuard {
    /// Check if a transition is allowed
    fn check(&self, input: &GuardInput<'_>) -> GuardResult<()>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Guard {
    Always,
    /// BOL submitted with the pickup already scheduled
    PickupScheduled,
    /// BOL submitted without a pickup; a separate request is needed
    PickupNotScheduled,
    /// There is an earlier stage to go back to
    HasHistory,
}

impl StateGuard for Guard {
    fn check(&self, input: &GuardInput<'_>) -> GuardResult<()> {
        let passed = match self {
            Guard::Always => true,
            Guard::PickupScheduled => schedule_pickup(input.event) == Some(true),
            Guard::PickupNotScheduled => schedule_pickup(input.event) == Some(false),
            Guard::HasHistory => {
                if input.history.is_empty() {
                    return Err(GuardError::NoHistory { stage: input.stage });
                }
                true
            }
        };

        if passed {
            Ok(())
        } else {
            Err(GuardError::ConditionNotMet {
                guard: self.description(),
            })
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Guard::Always => "always",
            Guard::PickupScheduled => "pickup scheduled with bill of lading",
            Guard::PickupNotScheduled => "pickup still to be requested",
            Guard::HasHistory => "earlier stage exists",
        }
    }
}

fn schedule_pickup(event: &BookingEvent) -> Option<bool> {
    match event {
        BookingEvent::BolSubmitted {
            schedule_pickup, ..
        } => Some(*schedule_pickup),
        _ => None,
    }
}
