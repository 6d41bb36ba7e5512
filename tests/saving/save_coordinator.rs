use std::sync::Arc;

use freight_core::cache::OrderStagingCache;
use freight_core::constants::ShippingType;
use freight_core::decision::{decide, DecisionInput, SaveCoordinator, SaveDecision, SaveOutcome, SkipReason};
use freight_core::error::FreightError;
use freight_core::models::{ShippedOrderPayload, ShippedOrderRecord, StagedShipmentPatch};

use crate::common::{self, MockShipmentBackend};

fn record(id: i64, sku: &str, order_number: &str, shipping_type: ShippingType, sub_skus: &[&str]) -> ShippedOrderRecord {
    ShippedOrderRecord {
        id,
        sku: sku.to_string(),
        order_on_market_place: order_number.to_string(),
        orders_jsonb: ShippedOrderPayload {
            shipping_type: Some(shipping_type),
            sub_skus: sub_skus.iter().map(|s| s.to_string()).collect(),
            marketplace: "Amazon".to_string(),
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn test_incomplete_shipment_makes_no_network_calls() {
    let order = common::order(1);
    let cache = Arc::new(OrderStagingCache::in_memory());
    cache.stage_order(&order).unwrap();
    let backend = Arc::new(MockShipmentBackend::new());
    let coordinator = SaveCoordinator::new(cache.clone(), backend.clone());

    let staged = cache.get(1).unwrap().unwrap();
    assert_eq!(
        decide(DecisionInput::from(&staged), None),
        SaveDecision::Skip {
            reason: SkipReason::Incomplete
        }
    );

    let err = coordinator.save(1).await.unwrap_err();
    assert_eq!(
        err,
        FreightError::ValidationError("Select a shipping type before saving.".to_string())
    );
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn test_create_then_repeat_save_is_skipped() {
    let order = common::order(2);
    let cache = common::ready_cache(&order, ShippingType::Parcel, &["A1"]);
    let backend = Arc::new(MockShipmentBackend::starting_at(42));
    let coordinator = SaveCoordinator::new(cache.clone(), backend.clone());

    let first = coordinator.save(2).await.unwrap();
    assert_eq!(first, SaveOutcome::Created { record_id: 42 });
    assert_eq!(cache.get(2).unwrap().unwrap().backend_record_id, Some(42));

    let stored = &backend.records()[0];
    assert_eq!(stored.sku, "SKU-2");
    assert_eq!(stored.order_on_market_place, order.marketplace_order_id);
    assert_eq!(stored.shipping_type(), Some(ShippingType::Parcel));

    let second = coordinator.save(2).await.unwrap();
    assert_eq!(
        second,
        SaveOutcome::Skipped {
            reason: SkipReason::AlreadyCurrent,
            record_id: Some(42)
        }
    );
    assert_eq!(backend.calls("create_shipped_order"), 1);
    assert_eq!(backend.calls("update_shipped_order"), 0);
}

#[tokio::test]
async fn test_changed_sub_skus_update_existing_record() {
    let order = common::order(3);
    let cache = common::ready_cache(&order, ShippingType::Ltl, &["A1", "A2"]);
    let backend = Arc::new(
        MockShipmentBackend::new().with_record(record(7, "sku-3", &order.marketplace_order_id, ShippingType::Ltl, &["A1"])),
    );
    let coordinator = SaveCoordinator::new(cache.clone(), backend.clone());

    let outcome = coordinator.save(3).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Updated { record_id: 7 });
    assert_eq!(cache.get(3).unwrap().unwrap().backend_record_id, Some(7));

    let updates = backend.updates.lock().clone();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].payload.sub_skus, vec!["A1", "A2"]);
    assert!(updates[0].file_names.is_empty());
    assert_eq!(backend.calls("create_shipped_order"), 0);
}

#[tokio::test]
async fn test_reordered_sub_skus_are_already_current() {
    let order = common::order(4);
    let cache = common::ready_cache(&order, ShippingType::Ltl, &["B", "A", "B"]);
    let backend = Arc::new(
        MockShipmentBackend::new().with_record(record(8, "SKU-4", &order.marketplace_order_id, ShippingType::Ltl, &["B", "B", "A"])),
    );
    let coordinator = SaveCoordinator::new(cache.clone(), backend.clone());

    let outcome = coordinator.save(4).await.unwrap();
    assert_eq!(
        outcome,
        SaveOutcome::Skipped {
            reason: SkipReason::AlreadyCurrent,
            record_id: Some(8)
        }
    );
    // The id is still linked locally so later saves can reconcile
    assert_eq!(cache.get(4).unwrap().unwrap().backend_record_id, Some(8));
}

#[tokio::test]
async fn test_network_failure_leaves_cache_untouched() {
    let order = common::order(5);
    let cache = common::ready_cache(&order, ShippingType::Parcel, &["A1"]);
    let backend = Arc::new(MockShipmentBackend::starting_at(90));
    let coordinator = SaveCoordinator::new(cache.clone(), backend.clone());
    let before = cache.get(5).unwrap();

    backend.fail_next(
        "create_shipped_order",
        FreightError::NetworkError("connection reset".to_string()),
    );
    let err = coordinator.save(5).await.unwrap_err();
    assert!(matches!(err, FreightError::NetworkError(_)));
    assert_eq!(cache.get(5).unwrap(), before);

    // A manual retry goes through
    let outcome = coordinator.save(5).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Created { record_id: 90 });
}

#[tokio::test]
async fn test_missing_backend_record_is_not_found() {
    let order = common::order(6);
    let cache = common::ready_cache(&order, ShippingType::Ltl, &["A1"]);
    let backend = Arc::new(MockShipmentBackend::starting_at(42));
    let coordinator = SaveCoordinator::new(cache.clone(), backend.clone());

    coordinator.save(6).await.unwrap();
    backend.remove_record(42);
    cache
        .upsert(6, &StagedShipmentPatch::new().sub_skus(["A1", "A9"]))
        .unwrap();

    let err = coordinator.save(6).await.unwrap_err();
    assert!(matches!(err, FreightError::NotFoundError(_)));
    assert_eq!(backend.calls("create_shipped_order"), 1);
    assert_eq!(cache.get(6).unwrap().unwrap().backend_record_id, Some(42));
}

#[tokio::test]
async fn test_diverging_record_ids_conflict() {
    let order = common::order(7);
    let cache = common::ready_cache(&order, ShippingType::Ltl, &["A1"]);
    cache
        .upsert(7, &StagedShipmentPatch::new().backend_record_id(42))
        .unwrap();
    let backend = Arc::new(
        MockShipmentBackend::new().with_record(record(50, "SKU-7", &order.marketplace_order_id, ShippingType::Ltl, &["A1"])),
    );
    let coordinator = SaveCoordinator::new(cache.clone(), backend.clone());

    let err = coordinator.save(7).await.unwrap_err();
    assert!(matches!(err, FreightError::ConflictError(_)));
    assert_eq!(backend.calls("update_shipped_order"), 0);
}

#[tokio::test]
async fn test_submit_final_sends_bol_attachments() {
    use freight_core::constants::Carrier;
    use freight_core::models::FileRef;
    use serde_json::json;

    let order = common::order(8);
    let cache = common::ready_cache(&order, ShippingType::Ltl, &["A1"]);
    cache
        .upsert(
            8,
            &StagedShipmentPatch::new().bill_of_lading(
                Carrier::Xpo,
                json!({"pro": "P-8"}),
                Some(vec![FileRef::pdf("bol-8.pdf", vec![1, 2])]),
            ),
        )
        .unwrap();
    let backend = Arc::new(MockShipmentBackend::starting_at(42));
    let coordinator = SaveCoordinator::new(cache.clone(), backend.clone());

    let record_id = coordinator.submit_final(8).await.unwrap();
    assert_eq!(record_id, 42);

    let updates = backend.updates.lock().clone();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].record_id, 42);
    assert_eq!(updates[0].file_names, vec!["bol-8.pdf"]);
    assert!(updates[0].payload.carrier_artifacts.is_some());
}

#[tokio::test]
async fn test_update_keeps_keys_written_by_other_clients() {
    let order = common::order(9);
    let cache = common::ready_cache(&order, ShippingType::Ltl, &["A1", "A2"]);
    let mut existing = record(11, "SKU-9", &order.marketplace_order_id, ShippingType::Ltl, &["A1"]);
    existing
        .orders_jsonb
        .extra
        .insert("trackingNumber".to_string(), serde_json::json!("T-1"));
    let backend = Arc::new(MockShipmentBackend::new().with_record(existing));
    let coordinator = SaveCoordinator::new(cache.clone(), backend.clone());

    let outcome = coordinator.save(9).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Updated { record_id: 11 });

    let updates = backend.updates.lock().clone();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].payload.sub_skus, vec!["A1", "A2"]);
    assert_eq!(updates[0].payload.extra["trackingNumber"], "T-1");
    assert_eq!(backend.records()[0].orders_jsonb.extra["trackingNumber"], "T-1");
}

#[tokio::test]
async fn test_submit_final_on_changed_record_sends_one_update() {
    use freight_core::constants::Carrier;
    use freight_core::models::FileRef;
    use serde_json::json;

    let order = common::order(10);
    let cache = common::ready_cache(&order, ShippingType::Ltl, &["A1", "A2"]);
    cache
        .upsert(
            10,
            &StagedShipmentPatch::new().bill_of_lading(
                Carrier::Xpo,
                json!({"pro": "P-10"}),
                Some(vec![FileRef::pdf("bol-10.pdf", vec![3])]),
            ),
        )
        .unwrap();
    let mut existing = record(12, "SKU-10", &order.marketplace_order_id, ShippingType::Ltl, &["A1"]);
    existing
        .orders_jsonb
        .extra
        .insert("trackingNumber".to_string(), json!("T-2"));
    let backend = Arc::new(MockShipmentBackend::new().with_record(existing));
    let coordinator = SaveCoordinator::new(cache.clone(), backend.clone());

    let record_id = coordinator.submit_final(10).await.unwrap();
    assert_eq!(record_id, 12);
    assert_eq!(cache.get(10).unwrap().unwrap().backend_record_id, Some(12));

    let updates = backend.updates.lock().clone();
    assert_eq!(updates.len(), 1);
    assert_eq!(backend.calls("update_shipped_order"), 1);
    assert_eq!(backend.calls("create_shipped_order"), 0);
    assert_eq!(updates[0].file_names, vec!["bol-10.pdf"]);
    assert_eq!(updates[0].payload.sub_skus, vec!["A1", "A2"]);
    assert_eq!(updates[0].payload.extra["trackingNumber"], "T-2");
}
