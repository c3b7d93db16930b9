//! Posting tests against a real database, exercising the storage-level
//! idempotency guarantee end to end.

use chrono::Utc;
use database::LedgerRepository;
use events::EventEnvelope;
use ledger::{LedgerPoster, PostOutcome};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

fn order_envelope(merchant_id: Uuid, event_id: &str) -> EventEnvelope {
    EventEnvelope {
        event_id: event_id.to_string(),
        merchant_id,
        stream_type: "orders".to_string(),
        event_type: "order_created".to_string(),
        payload: json!({
            "order_id": "1001", "currency": "USD", "total": "100.00",
            "line_items": [
                {"variant_id": "v1", "sku": "SKU-1", "title": "Mug",
                 "quantity": 2, "unit_price": "50.00"}
            ]
        }),
        recorded_at: Utc::now(),
    }
}

#[sqlx::test(migrations = "../database/migrations")]
async fn posting_the_same_event_twice_yields_one_transaction(pool: PgPool) {
    let repo = LedgerRepository::new(pool);
    let poster = LedgerPoster::new(repo.clone());

    let merchant_id = Uuid::new_v4();
    let envelope = order_envelope(merchant_id, "evt-100");

    let first = poster.post_event(&envelope).await.unwrap();
    let PostOutcome::Posted(posted) = first else {
        panic!("first post must create a transaction");
    };

    // The re-post is a no-op that hands back the original transaction.
    let second = poster.post_event(&envelope).await.unwrap();
    match second {
        PostOutcome::Duplicate(existing) => assert_eq!(existing.id, posted.id),
        PostOutcome::Posted(tx) => panic!("second post created transaction {}", tx.id),
    }

    let stored = repo
        .find_transaction_by_event(merchant_id, "evt-100")
        .await
        .unwrap()
        .expect("the posted transaction must be stored");
    assert_eq!(stored.id, posted.id);
    assert_eq!(stored.description, "Order 1001 created");
}

#[sqlx::test(migrations = "../database/migrations")]
async fn distinct_events_post_distinct_transactions(pool: PgPool) {
    let repo = LedgerRepository::new(pool);
    let poster = LedgerPoster::new(repo);

    let merchant_id = Uuid::new_v4();
    let first = poster
        .post_event(&order_envelope(merchant_id, "evt-1"))
        .await
        .unwrap();
    let second = poster
        .post_event(&order_envelope(merchant_id, "evt-2"))
        .await
        .unwrap();

    assert!(matches!(first, PostOutcome::Posted(_)));
    assert!(matches!(second, PostOutcome::Posted(_)));
    assert_ne!(first.transaction().id, second.transaction().id);
}
