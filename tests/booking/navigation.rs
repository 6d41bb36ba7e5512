use serde_json::json;
use std::sync::Arc;

use freight_core::constants::{Carrier, ShippingType};
use freight_core::error::FreightError;
use freight_core::events::CarrierEventBus;
use freight_core::state_machine::{BookingEvent, BookingStage, BookingStateMachine};
use freight_core::workflow::BookingWorkflow;

use crate::common::{self, MockShipmentBackend};

#[tokio::test]
async fn test_back_navigation_keeps_captured_context() {
    let order = common::order(31);
    let cache = common::ready_cache(&order, ShippingType::Ltl, &["A"]);
    let backend = Arc::new(MockShipmentBackend::new());
    let mut workflow = BookingWorkflow::open(&order, cache, CarrierEventBus::default(), backend.clone()).unwrap();

    workflow
        .select_quote(Carrier::Xpo, json!({"quoteId": "Q1"}))
        .await
        .unwrap();
    workflow
        .submit_bill_of_lading(json!({}), false, Vec::new())
        .await
        .unwrap();
    assert_eq!(workflow.stage(), BookingStage::PickupRequest);

    assert_eq!(workflow.back().await.unwrap(), BookingStage::BillOfLading);
    assert!(workflow.context().bol_response.is_some());
    assert_eq!(workflow.back().await.unwrap(), BookingStage::RateQuote);
    assert_eq!(
        workflow.context().selected_quote.as_ref().unwrap().quote,
        json!({"quoteId": "Q1"})
    );

    let err = workflow.back().await.unwrap_err();
    assert!(matches!(err, FreightError::StateTransitionError(_)));
    assert_eq!(workflow.stage(), BookingStage::RateQuote);

    // Choosing a different carrier on the way forward replaces the selection
    workflow
        .select_quote(Carrier::Estes, json!({"quoteId": "E7"}))
        .await
        .unwrap();
    workflow
        .submit_bill_of_lading(json!({}), true, Vec::new())
        .await
        .unwrap();
    assert_eq!(backend.calls("create_bill_of_lading"), 2);
    assert_eq!(
        workflow.context().selected_quote.as_ref().unwrap().carrier,
        Carrier::Estes
    );
    assert_eq!(workflow.stage(), BookingStage::ResponseSummary);
}

#[tokio::test]
async fn test_response_summary_has_no_way_back() {
    let mut machine = BookingStateMachine::new(32);
    machine
        .transition(BookingEvent::QuoteSelected(
            freight_core::state_machine::SelectedQuote::new(Carrier::Xpo, json!({})),
        ))
        .await
        .unwrap();
    machine
        .transition(BookingEvent::bol_submitted(true, json!({"pro": "P"})))
        .await
        .unwrap();
    assert_eq!(machine.current_stage(), BookingStage::ResponseSummary);

    assert!(!machine.can_fire(&BookingEvent::Back));
    tokio_test::assert_err!(machine.transition(BookingEvent::Back).await);
    assert!(machine.can_fire(&BookingEvent::FinalSubmitted));
}

#[tokio::test]
async fn test_completed_stages_only_grow() {
    let mut machine = BookingStateMachine::new(33);
    machine
        .transition(BookingEvent::QuoteSelected(
            freight_core::state_machine::SelectedQuote::new(Carrier::Estes, json!({})),
        ))
        .await
        .unwrap();
    machine
        .transition(BookingEvent::bol_submitted(false, json!({})))
        .await
        .unwrap();
    machine.transition(BookingEvent::Back).await.unwrap();
    machine.transition(BookingEvent::Back).await.unwrap();

    assert_eq!(machine.current_stage(), BookingStage::RateQuote);
    assert!(machine.is_completed(BookingStage::RateQuote));
    assert!(machine.is_completed(BookingStage::BillOfLading));
    assert!(machine.history().is_empty());
}
