use serde_json::json;
use std::sync::Arc;

use freight_core::constants::{Carrier, ShippingType};
use freight_core::decision::SaveOutcome;
use freight_core::error::FreightError;
use freight_core::events::CarrierEventBus;
use freight_core::models::FileRef;
use freight_core::state_machine::BookingStage;
use freight_core::workflow::BookingWorkflow;

use crate::common::{self, MockShipmentBackend};

fn open(order_id: i64, backend: &Arc<MockShipmentBackend>) -> (BookingWorkflow, Arc<freight_core::cache::OrderStagingCache>) {
    let order = common::order(order_id);
    let cache = common::ready_cache(&order, ShippingType::Ltl, &["TOP", "BASE"]);
    let workflow = BookingWorkflow::open(&order, cache.clone(), CarrierEventBus::new(16), backend.clone()).unwrap();
    (workflow, cache)
}

#[tokio::test]
async fn test_scheduled_pickup_booking_end_to_end() {
    let backend = Arc::new(MockShipmentBackend::starting_at(42));
    let (mut workflow, cache) = open(21, &backend);
    assert_eq!(workflow.stage(), BookingStage::RateQuote);

    let xpo = workflow
        .request_rate_quote(Carrier::Xpo, json!({"weight": 310}))
        .await
        .unwrap();
    workflow
        .request_rate_quote(Carrier::Estes, json!({"weight": 310}))
        .await
        .unwrap();

    let staged = workflow.staged().unwrap().unwrap();
    assert!(staged.artifacts(Carrier::Xpo).unwrap().rate_quote_response.is_some());
    assert!(staged.artifacts(Carrier::Estes).unwrap().rate_quote_response.is_some());

    assert_eq!(
        workflow.select_quote(Carrier::Xpo, xpo.clone()).await.unwrap(),
        BookingStage::BillOfLading
    );

    let stage = workflow
        .submit_bill_of_lading(
            json!({"pickupDate": "2026-10-20"}),
            true,
            vec![FileRef::pdf("bol-21.pdf", vec![0x25, 0x50])],
        )
        .await
        .unwrap();
    assert_eq!(stage, BookingStage::ResponseSummary);
    assert!(!workflow.state_machine().is_completed(BookingStage::PickupRequest));
    assert_eq!(
        workflow.state_machine().history(),
        &[BookingStage::RateQuote, BookingStage::BillOfLading]
    );
    assert_eq!(workflow.context().schedule_pickup, Some(true));
    assert_eq!(backend.calls("create_pickup_request"), 0);

    let staged = cache.get(21).unwrap().unwrap();
    assert!(staged.artifacts(Carrier::Xpo).unwrap().bol_response.is_some());
    assert_eq!(staged.bol_files()[0].name, "bol-21.pdf");

    let record_id = workflow.final_submit().await.unwrap();
    assert_eq!(record_id, 42);
    assert!(workflow.is_finished());
    assert!(cache.get(21).unwrap().is_none());
    assert_eq!(*backend.deleted_orders.lock(), vec![21]);

    let updates = backend.updates.lock().clone();
    assert_eq!(updates.last().unwrap().file_names, vec!["bol-21.pdf"]);
    assert_eq!(updates.last().unwrap().payload.sub_skus, vec!["TOP", "BASE"]);

    let err = workflow.final_submit().await.unwrap_err();
    assert!(matches!(err, FreightError::StateTransitionError(_)));
}

#[tokio::test]
async fn test_pickup_stage_when_not_scheduled() {
    let backend = Arc::new(MockShipmentBackend::new());
    let (mut workflow, cache) = open(22, &backend);

    workflow
        .select_quote(Carrier::Estes, json!({"quoteId": "E1"}))
        .await
        .unwrap();
    let stage = workflow
        .submit_bill_of_lading(json!({}), false, Vec::new())
        .await
        .unwrap();
    assert_eq!(stage, BookingStage::PickupRequest);

    let stage = workflow
        .submit_pickup_request(json!({"window": "AM"}))
        .await
        .unwrap();
    assert_eq!(stage, BookingStage::ResponseSummary);
    assert_eq!(
        cache.get(22).unwrap().unwrap().pickup_artifact,
        Some(json!({"carrier": "estes", "confirmation": "PU-1"}))
    );
    assert!(workflow.state_machine().is_completed(BookingStage::PickupRequest));
}

#[tokio::test]
async fn test_carrier_failure_leaves_stage_and_cache() {
    let backend = Arc::new(MockShipmentBackend::new());
    let (mut workflow, cache) = open(23, &backend);
    workflow
        .select_quote(Carrier::Xpo, json!({"quoteId": "Q1"}))
        .await
        .unwrap();
    let before = cache.get(23).unwrap();

    backend.fail_next(
        "create_bill_of_lading",
        FreightError::NetworkError("503 from carrier".to_string()),
    );
    let err = workflow
        .submit_bill_of_lading(json!({}), true, Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(err, FreightError::NetworkError(_)));
    assert_eq!(workflow.stage(), BookingStage::BillOfLading);
    assert_eq!(cache.get(23).unwrap(), before);

    // Manual retry
    let stage = workflow
        .submit_bill_of_lading(json!({}), true, Vec::new())
        .await
        .unwrap();
    assert_eq!(stage, BookingStage::ResponseSummary);
}

#[tokio::test]
async fn test_actions_out_of_stage_are_rejected() {
    let backend = Arc::new(MockShipmentBackend::new());
    let (mut workflow, _cache) = open(24, &backend);

    let err = workflow
        .submit_pickup_request(json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, FreightError::StateTransitionError(_)));

    let err = workflow.final_submit().await.unwrap_err();
    assert!(matches!(err, FreightError::StateTransitionError(_)));
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn test_teardown_failure_can_be_retried() {
    let backend = Arc::new(MockShipmentBackend::starting_at(70));
    let (mut workflow, cache) = open(25, &backend);
    workflow
        .select_quote(Carrier::Xpo, json!({"quoteId": "Q1"}))
        .await
        .unwrap();
    workflow
        .submit_bill_of_lading(json!({}), true, Vec::new())
        .await
        .unwrap();

    backend.fail_next(
        "delete_order",
        FreightError::NetworkError("connection refused".to_string()),
    );
    let err = workflow.final_submit().await.unwrap_err();
    assert!(matches!(err, FreightError::NetworkError(_)));
    assert_eq!(workflow.stage(), BookingStage::ResponseSummary);
    assert!(!workflow.is_finished());
    assert_eq!(cache.get(25).unwrap().unwrap().backend_record_id, Some(70));

    assert_eq!(workflow.final_submit().await.unwrap(), 70);
    assert!(cache.get(25).unwrap().is_none());
    assert_eq!(backend.calls("create_shipped_order"), 1);
}

#[tokio::test]
async fn test_background_save_outlives_close() {
    let backend = Arc::new(MockShipmentBackend::starting_at(42));
    let (mut workflow, cache) = open(26, &backend);

    let handle = workflow.save_in_background();
    workflow.close();
    drop(workflow);

    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(outcome, SaveOutcome::Created { record_id: 42 });
    assert_eq!(cache.get(26).unwrap().unwrap().backend_record_id, Some(42));
}

#[tokio::test]
async fn test_own_messages_are_staged_after_outside_traffic() {
    use freight_core::events::PickupData;

    let backend = Arc::new(MockShipmentBackend::new());
    let order = common::order(27);
    let cache = common::ready_cache(&order, ShippingType::Ltl, &["A"]);
    let bus = CarrierEventBus::new(16);
    let mut workflow = BookingWorkflow::open(&order, cache.clone(), bus.clone(), backend.clone()).unwrap();

    bus.publish_pickup(PickupData {
        order_id: 27,
        carrier: Carrier::Estes,
        pickup_response: json!({"confirmation": "elsewhere"}),
    });
    for _ in 0..100 {
        if cache.get(27).unwrap().unwrap().pickup_artifact.is_some() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    assert!(cache.get(27).unwrap().unwrap().pickup_artifact.is_some());

    workflow
        .request_rate_quote(Carrier::Xpo, json!({"weight": 40}))
        .await
        .unwrap();
    assert!(cache
        .get(27)
        .unwrap()
        .unwrap()
        .artifacts(Carrier::Xpo)
        .and_then(|artifacts| artifacts.rate_quote_response.clone())
        .is_some());

    workflow
        .select_quote(Carrier::Xpo, json!({"quoteId": "Q1"}))
        .await
        .unwrap();
    workflow
        .submit_bill_of_lading(json!({}), true, vec![FileRef::pdf("bol-27.pdf", vec![1])])
        .await
        .unwrap();
    assert_eq!(cache.get(27).unwrap().unwrap().bol_files()[0].name, "bol-27.pdf");
}
