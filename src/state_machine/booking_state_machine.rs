use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use super::actions::StateAction;
use super::context::StageContext;
use super::errors::{StateMachineError, StateMachineResult};
use super::events::BookingEvent;
use super::guards::{GuardInput, StateGuard};
use super::states::BookingStage;
use super::transitions::{candidates, Target};
use crate::constants::events;
use crate::logging::log_workflow_transition;

/// Drives one order through the four booking stages.
///
/// Navigation history is a stack: forward transitions push the stage being
/// left and `Back` pops it. Captured context is never cleared, and the
/// completed-stage set only grows; it is informational and never gates a
/// transition.
pub struct BookingStateMachine {
    order_id: i64,
    stage: BookingStage,
    context: StageContext,
    history: Vec<BookingStage>,
    completed: BTreeSet<BookingStage>,
    finished: bool,
    actions: Vec<Arc<dyn StateAction>>,
}

impl std::fmt::Debug for BookingStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingStateMachine")
            .field("order_id", &self.order_id)
            .field("stage", &self.stage)
            .field("history", &self.history)
            .field("completed", &self.completed)
            .field("finished", &self.finished)
            .field(
                "actions",
                &self.actions.iter().map(|a| a.description()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl BookingStateMachine {
    pub fn new(order_id: i64) -> Self {
        Self {
            order_id,
            stage: BookingStage::default(),
            context: StageContext::default(),
            history: Vec::new(),
            completed: BTreeSet::new(),
            finished: false,
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Arc<dyn StateAction>) -> Self {
        self.actions.push(action);
        self
    }

    pub fn order_id(&self) -> i64 {
        self.order_id
    }

    pub fn current_stage(&self) -> BookingStage {
        self.stage
    }

    pub fn context(&self) -> &StageContext {
        &self.context
    }

    pub fn history(&self) -> &[BookingStage] {
        &self.history
    }

    pub fn completed_stages(&self) -> &BTreeSet<BookingStage> {
        &self.completed
    }

    pub fn is_completed(&self, stage: BookingStage) -> bool {
        self.completed.contains(&stage)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stage the event would lead to, without side effects
    pub fn resolve(&self, event: &BookingEvent) -> StateMachineResult<Target> {
        if self.finished {
            return Err(StateMachineError::AlreadyFinished {
                order_id: self.order_id,
            });
        }

        let input = GuardInput {
            stage: self.stage,
            event,
            context: &self.context,
            history: &self.history,
        };

        let mut last_failure = None;
        for transition in candidates(self.stage, event.kind()) {
            match transition.guard.check(&input) {
                Ok(()) => return Ok(transition.to),
                Err(e) => last_failure = Some(e),
            }
        }

        Err(match last_failure {
            Some(guard_error) => guard_error.into(),
            None => StateMachineError::InvalidTransition {
                from: self.stage,
                event: event.kind(),
            },
        })
    }

    pub fn can_fire(&self, event: &BookingEvent) -> bool {
        self.resolve(event).is_ok()
    }

    /// Attempt a transition. On any error the machine is left unmoved.
    pub async fn transition(&mut self, event: BookingEvent) -> StateMachineResult<BookingStage> {
        let target = self.resolve(&event)?;
        let from = self.stage;
        let kind = event.kind();

        for action in self.actions.iter().filter(|a| a.applies_to(from, kind)) {
            action
                .execute(self.order_id, from)
                .await
                .map_err(|e| StateMachineError::ActionFailed {
                    action: action.description(),
                    source: e.into_inner(),
                })?;
        }

        self.context.record(&event);
        match target {
            Target::Stage(next) => {
                self.history.push(from);
                self.completed.insert(from);
                self.stage = next;
            }
            Target::Previous => {
                // Guarded by HasHistory
                if let Some(previous) = self.history.pop() {
                    self.stage = previous;
                }
            }
            Target::Finish => {
                self.completed.insert(from);
                self.finished = true;
            }
        }

        log_workflow_transition(
            self.order_id,
            &from.to_string(),
            &self.stage.to_string(),
            kind.as_str(),
        );
        debug!(
            order_id = self.order_id,
            event = events::STAGE_ENTERED,
            stage = %self.stage,
            completed = self.completed.len(),
            "Booking stage entered"
        );

        Ok(self.stage)
    }
}
