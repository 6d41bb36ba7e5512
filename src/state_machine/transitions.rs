//! Enumerable transition table keyed by `(stage, event, guard)`.
//!
//! ```text
//! RateQuote ──quote_selected──▶ BillOfLading
//! BillOfLading ──bol_submitted [pickup not scheduled]──▶ PickupRequest
//! BillOfLading ──bol_submitted [pickup scheduled]──────▶ ResponseSummary
//! PickupRequest ──pickup_submitted──▶ ResponseSummary
//! BillOfLading | PickupRequest ──back [history]──▶ previous stage
//! ResponseSummary ──final_submitted──▶ finished (teardown)
//! ```

use super::events::BookingEventKind;
use super::guards::Guard;
use super::states::BookingStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Stage(BookingStage),
    /// Top of the navigation history
    Previous,
    /// Stay on the terminal stage and close the booking
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: BookingStage,
    pub event: BookingEventKind,
    pub guard: Guard,
    pub to: Target,
}

const fn edge(from: BookingStage, event: BookingEventKind, guard: Guard, to: Target) -> Transition {
    Transition {
        from,
        event,
        guard,
        to,
    }
}

pub const TRANSITIONS: &[Transition] = &[
    edge(
        BookingStage::RateQuote,
        BookingEventKind::QuoteSelected,
        Guard::Always,
        Target::Stage(BookingStage::BillOfLading),
    ),
    edge(
        BookingStage::BillOfLading,
        BookingEventKind::BolSubmitted,
        Guard::PickupNotScheduled,
        Target::Stage(BookingStage::PickupRequest),
    ),
    edge(
        BookingStage::BillOfLading,
        BookingEventKind::BolSubmitted,
        Guard::PickupScheduled,
        Target::Stage(BookingStage::ResponseSummary),
    ),
    edge(
        BookingStage::PickupRequest,
        BookingEventKind::PickupSubmitted,
        Guard::Always,
        Target::Stage(BookingStage::ResponseSummary),
    ),
    edge(
        BookingStage::BillOfLading,
        BookingEventKind::Back,
        Guard::HasHistory,
        Target::Previous,
    ),
    edge(
        BookingStage::PickupRequest,
        BookingEventKind::Back,
        Guard::HasHistory,
        Target::Previous,
    ),
    edge(
        BookingStage::ResponseSummary,
        BookingEventKind::FinalSubmitted,
        Guard::Always,
        Target::Finish,
    ),
];

/// Candidate transitions for a stage and event, in table order
pub fn candidates(
    from: BookingStage,
    event: BookingEventKind,
) -> impl Iterator<Item = &'static Transition> {
    TRANSITIONS
        .iter()
        .filter(move |transition| transition.from == from && transition.event == event)
}

/// Stages reachable by forward transitions from `from`
pub fn successors(from: BookingStage) -> Vec<BookingStage> {
    TRANSITIONS
        .iter()
        .filter(|transition| transition.from == from)
        .filter_map(|transition| match transition.to {
            Target::Stage(stage) => Some(stage),
            Target::Previous | Target::Finish => None,
        })
        .collect()
}
