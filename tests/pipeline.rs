//! End-to-end flow without a database: commerce events are mapped to
//! balanced entry drafts, the drafts are rolled up per product, and the
//! resulting portfolio feeds the scoring and simulation engines.

use analyzer::aggregate;
use chrono::Utc;
use configuration::Config;
use core_types::{EntryDraft, ProductStatus};
use database::ProductEntryRow;
use events::EventEnvelope;
use ledger::{map_event, standard_chart};
use rust_decimal_macros::dec;
use scoring::{score, ScoringInputs, ToxicProduct};
use serde_json::json;
use simulation::{simulate, GlobalAllocations, Scenario, SimulationInput};
use uuid::Uuid;

fn envelope(event_type: &str, payload: serde_json::Value) -> EventEnvelope {
    EventEnvelope {
        event_id: Uuid::new_v4().to_string(),
        merchant_id: Uuid::new_v4(),
        stream_type: "orders".to_string(),
        event_type: event_type.to_string(),
        payload,
        recorded_at: Utc::now(),
    }
}

/// Resolves drafts against the standard chart the way the posting engine
/// does, keeping only the rows the product analyzer consumes.
fn to_product_rows(entries: &[EntryDraft]) -> Vec<ProductEntryRow> {
    let chart = standard_chart();
    entries
        .iter()
        .filter_map(|e| {
            let def = chart.iter().find(|d| d.code == e.account_code)?;
            Some(ProductEntryRow {
                category: def.category,
                direction: e.direction,
                amount: e.amount,
                variant_id: e.attribution.variant_id.clone(),
                sku: e.attribution.sku.clone(),
                title: e.attribution.title.clone(),
                quantity: e.attribution.quantity,
            })
        })
        .collect()
}

#[test]
fn events_flow_through_mapping_and_product_rollup() {
    let config = Config::default();

    // An order for 1000 of variant V1, followed by a 200 refund of it.
    let order = envelope(
        "order_created",
        json!({
            "order_id": "1001", "currency": "USD", "total": "1000.00",
            "line_items": [
                {"variant_id": "V1", "sku": "SKU-1", "title": "Lamp",
                 "quantity": 10, "unit_price": "100.00"}
            ]
        }),
    );
    let refund = envelope(
        "order_returned",
        json!({
            "order_id": "1001", "currency": "USD", "amount": "200.00",
            "line_items": [
                {"variant_id": "V1", "sku": "SKU-1", "title": "Lamp",
                 "quantity": 2, "amount": "200.00", "product_id": null}
            ]
        }),
    );

    let mut rows = Vec::new();
    for env in [&order, &refund] {
        let mapped = map_event(env).expect("mapping should succeed");
        rows.extend(to_product_rows(&mapped.entries));
    }

    let products = aggregate(&rows, &config.classification);
    assert_eq!(products.len(), 1);

    let p = &products[0];
    assert_eq!(p.variant_id, "V1");
    assert_eq!(p.units_sold, 10);
    assert_eq!(p.gross_sales, dec!(1000.00));
    assert_eq!(p.returns, dec!(200.00));
    assert_eq!(p.net_sales, dec!(800.00));
    assert_eq!(p.return_rate_pct, dec!(20));
    // 20% return rate is above the 15% toxicity threshold.
    assert_eq!(p.status, ProductStatus::Toxic);
}

#[test]
fn toxic_portfolio_produces_a_scored_diagnosis() {
    let config = Config::default();
    let merchant_id = Uuid::new_v4();
    let now = Utc::now();

    let inputs = ScoringInputs {
        revenue: dec!(1000),
        returns: dec!(200),
        toxic_products: vec![ToxicProduct {
            variant_id: "V1".to_string(),
            net_sales: dec!(800),
        }],
        ..Default::default()
    };

    let (diagnosis, issues) = score(merchant_id, &inputs, &config.scoring, now);

    // One toxic product (5 pts) plus a 20% return rate, 10 points over the
    // trigger (3 * 10 = 30 capped at 20).
    assert_eq!(diagnosis.score, 25);
    assert_eq!(diagnosis.factors.len(), 2);
    assert_eq!(issues.len(), 2);
}

#[test]
fn analyzer_output_feeds_the_simulator() {
    let config = Config::default();

    let order = envelope(
        "order_created",
        json!({
            "order_id": "2001", "currency": "USD", "total": "500.00",
            "line_items": [
                {"variant_id": "V2", "sku": "SKU-2", "title": "Chair",
                 "quantity": 5, "unit_price": "100.00"}
            ]
        }),
    );
    let mapped = map_event(&order).unwrap();
    let products = aggregate(&to_product_rows(&mapped.entries), &config.classification);

    let input = SimulationInput::from_analysis(
        &products,
        10,
        &GlobalAllocations {
            ad_spend: dec!(100),
            shipping: dec!(0),
            cogs: dec!(150),
        },
    );

    // A neutral scenario must reproduce the baseline exactly.
    let neutral = simulate(&input, &Scenario::neutral(), &config.elasticity).unwrap();
    assert_eq!(neutral.profit_delta, dec!(0));
    assert_eq!(neutral.old_net_profit, dec!(250));

    // Raising prices 10% shrinks volume by 8% but lifts profit here.
    let raised = simulate(
        &input,
        &Scenario {
            price_delta_pct: dec!(10),
            ..Scenario::neutral()
        },
        &config.elasticity,
    )
    .unwrap();
    assert!(raised.profit_delta > dec!(0));
    assert!(raised.new_orders < dec!(5));
}
