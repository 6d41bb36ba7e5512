use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use freight_core::cache::OrderStagingCache;
use freight_core::config::CacheConfig;
use freight_core::constants::{Carrier, ShippingType};
use freight_core::models::{FileRef, StagedShipmentPatch};

use crate::common;

#[test]
fn test_independent_sub_flows_merge_in_any_order() {
    let cache = OrderStagingCache::in_memory();
    let order = common::order(7);
    cache.stage_order(&order).unwrap();

    cache
        .upsert(
            7,
            &StagedShipmentPatch::new().pickup_artifact(json!({"confirmation": "PU-9"})),
        )
        .unwrap();
    cache
        .upsert(
            7,
            &StagedShipmentPatch::new().rate_quote(Carrier::Estes, json!({"zip": "97201"}), json!({"total": 310})),
        )
        .unwrap();
    cache
        .upsert(
            7,
            &StagedShipmentPatch::new().rate_quote(Carrier::Xpo, json!({"zip": "97201"}), json!({"total": 295})),
        )
        .unwrap();
    cache
        .upsert(7, &StagedShipmentPatch::new().sub_skus(["DESK-TOP", "DESK-LEGS"]))
        .unwrap();

    let shipment = cache.get(7).unwrap().unwrap();
    assert_eq!(shipment.sku, "SKU-7");
    assert_eq!(shipment.marketplace, "Amazon");
    assert_eq!(shipment.pickup_artifact, Some(json!({"confirmation": "PU-9"})));
    assert_eq!(shipment.sub_skus, vec!["DESK-TOP", "DESK-LEGS"]);
    assert_eq!(
        shipment.artifacts(Carrier::Estes).unwrap().rate_quote_response,
        Some(json!({"total": 310}))
    );
    assert_eq!(
        shipment.artifacts(Carrier::Xpo).unwrap().rate_quote_response,
        Some(json!({"total": 295}))
    );
}

#[test]
fn test_bol_response_merges_beside_existing_quote() {
    let cache = OrderStagingCache::in_memory();
    cache
        .upsert(
            8,
            &StagedShipmentPatch::new().rate_quote(Carrier::Xpo, json!({}), json!({"quoteId": "Q1"})),
        )
        .unwrap();
    cache
        .upsert(
            8,
            &StagedShipmentPatch::new().bill_of_lading(Carrier::Xpo, json!({"pro": "P-1"}), None),
        )
        .unwrap();

    let artifacts = cache.get(8).unwrap().unwrap().artifacts(Carrier::Xpo).cloned().unwrap();
    assert_eq!(artifacts.rate_quote_response, Some(json!({"quoteId": "Q1"})));
    assert_eq!(artifacts.bol_response, Some(json!({"pro": "P-1"})));
}

#[test]
fn test_reload_keeps_durable_fields_and_drops_files() {
    let dir = TempDir::new().unwrap();
    let config = CacheConfig {
        durable_path: Some(dir.path().join("staging.json")),
    };

    {
        let cache = OrderStagingCache::from_config(&config).unwrap();
        cache
            .upsert(
                9,
                &StagedShipmentPatch::new()
                    .sku("CHAIR-4")
                    .shipping_type(ShippingType::Parcel)
                    .bill_of_lading(
                        Carrier::Estes,
                        json!({"pro": "E-77"}),
                        Some(vec![FileRef::pdf("bol-9.pdf", vec![0x25, 0x50, 0x44, 0x46])]),
                    ),
            )
            .unwrap();
        assert_eq!(cache.get(9).unwrap().unwrap().bol_files().len(), 1);
    }

    let reloaded = OrderStagingCache::from_config(&config).unwrap();
    let shipment = reloaded.get(9).unwrap().unwrap();
    assert_eq!(shipment.sku, "CHAIR-4");
    assert_eq!(shipment.shipping_type, Some(ShippingType::Parcel));
    assert_eq!(
        shipment.artifacts(Carrier::Estes).unwrap().bol_response,
        Some(json!({"pro": "E-77"}))
    );
    assert!(shipment.bol_files().is_empty());
    assert_eq!(reloaded.staged_order_ids().unwrap(), vec![9]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_field_disjoint_writers_keep_every_field() {
    let cache = Arc::new(OrderStagingCache::in_memory());

    let patches = vec![
        StagedShipmentPatch::new().sku("TABLE-1"),
        StagedShipmentPatch::new().marketplace("Wayfair"),
        StagedShipmentPatch::new().shipping_type(ShippingType::Ltl),
        StagedShipmentPatch::new().sub_skus(["TOP", "BASE"]),
        StagedShipmentPatch::new().pickup_artifact(json!({"window": "AM"})),
        StagedShipmentPatch::new().rate_quote(Carrier::Xpo, json!({}), json!({"total": 1})),
        StagedShipmentPatch::new().rate_quote(Carrier::Estes, json!({}), json!({"total": 2})),
        StagedShipmentPatch::new().bill_of_lading(
            Carrier::Xpo,
            json!({"pro": "X"}),
            Some(vec![FileRef::pdf("x.pdf", vec![1])]),
        ),
    ];

    for _ in 0..20 {
        cache.remove(11).unwrap();
        let writers = patches.iter().cloned().map(|patch| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.upsert(11, &patch).map(|_| ()) })
        });
        for joined in futures::future::join_all(writers).await {
            joined.unwrap().unwrap();
        }

        let shipment = cache.get(11).unwrap().unwrap();
        assert_eq!(shipment.sku, "TABLE-1");
        assert_eq!(shipment.marketplace, "Wayfair");
        assert_eq!(shipment.shipping_type, Some(ShippingType::Ltl));
        assert_eq!(shipment.sub_skus, vec!["TOP", "BASE"]);
        assert_eq!(shipment.pickup_artifact, Some(json!({"window": "AM"})));

        let xpo = shipment.artifacts(Carrier::Xpo).unwrap();
        assert_eq!(xpo.rate_quote_response, Some(json!({"total": 1})));
        assert_eq!(xpo.bol_response, Some(json!({"pro": "X"})));
        assert_eq!(shipment.bol_files().len(), 1);
        assert_eq!(
            shipment.artifacts(Carrier::Estes).unwrap().rate_quote_response,
            Some(json!({"total": 2}))
        );
    }
}
