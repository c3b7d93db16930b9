use crate::error::EventError;
use chrono::{DateTime, Utc};
use core_types::EntryAttribution;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;

/// The closed set of upstream event types the posting engine can map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    OrderCreated,
    OrderReturned,
    AdSpendRecorded,
    FeeCharged,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::OrderCreated => "order_created",
            EventType::OrderReturned => "order_returned",
            EventType::AdSpendRecorded => "ad_spend_recorded",
            EventType::FeeCharged => "fee_charged",
        }
    }
}

impl FromStr for EventType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order_created" => Ok(EventType::OrderCreated),
            "order_returned" => Ok(EventType::OrderReturned),
            "ad_spend_recorded" => Ok(EventType::AdSpendRecorded),
            "fee_charged" => Ok(EventType::FeeCharged),
            other => Err(EventError::UnknownEventType(other.to_string())),
        }
    }
}

/// Which expense account a platform fee lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    /// Storefront platform fees (account 740).
    Platform,
    /// Administrative charges such as app subscriptions (account 770).
    Admin,
    /// Payment processing and financing charges (account 780).
    Finance,
}

/// One sold line of an order. Revenue is credited per line so product
/// attribution survives at line-item granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub sku: Option<String>,
    pub title: Option<String>,
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl LineItem {
    /// The gross amount this line contributes to the order total.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn attribution(&self) -> EntryAttribution {
        EntryAttribution {
            product_id: self.product_id.clone(),
            variant_id: self.variant_id.clone(),
            sku: self.sku.clone(),
            title: self.title.clone(),
            quantity: Some(self.quantity),
        }
    }
}

/// One refunded line of a return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnLine {
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub sku: Option<String>,
    pub title: Option<String>,
    pub quantity: i64,
    pub amount: Decimal,
}

impl ReturnLine {
    pub fn attribution(&self) -> EntryAttribution {
        EntryAttribution {
            product_id: self.product_id.clone(),
            variant_id: self.variant_id.clone(),
            sku: self.sku.clone(),
            title: self.title.clone(),
            quantity: Some(self.quantity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedPayload {
    pub order_id: String,
    pub currency: String,
    pub total: Decimal,
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReturnedPayload {
    pub order_id: String,
    pub currency: String,
    /// The full refunded amount credited back against the receivable.
    pub amount: Decimal,
    /// Per-product breakdown of the refund. May be empty, in which case the
    /// whole return is unattributable and lands in the "unknown" bucket.
    #[serde(default)]
    pub line_items: Vec<ReturnLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdSpendPayload {
    pub currency: String,
    pub amount: Decimal,
    pub channel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeChargedPayload {
    pub currency: String,
    pub amount: Decimal,
    pub fee_kind: FeeKind,
}

/// A fully parsed, typed event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    OrderCreated(OrderCreatedPayload),
    OrderReturned(OrderReturnedPayload),
    AdSpendRecorded(AdSpendPayload),
    FeeCharged(FeeChargedPayload),
}

/// The immutable, append-only record of something that happened upstream.
///
/// `event_id` is the idempotency key for posting: the ledger will never post
/// the same envelope twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: String,
    pub merchant_id: Uuid,
    /// The upstream stream this event came from (e.g. "orders", "billing").
    pub stream_type: String,
    pub event_type: String,
    pub payload: JsonValue,
    pub recorded_at: DateTime<Utc>,
}

impl EventEnvelope {
    /// Parses the raw payload into its typed form based on `event_type`.
    ///
    /// Failure here is the caller's validation error: the envelope stays
    /// unposted and must be corrected or dead-lettered upstream.
    pub fn typed_payload(&self) -> Result<EventPayload, EventError> {
        let event_type = EventType::from_str(&self.event_type)?;
        let malformed = |e: serde_json::Error| EventError::MalformedPayload {
            event_type: self.event_type.clone(),
            reason: e.to_string(),
        };

        match event_type {
            EventType::OrderCreated => serde_json::from_value(self.payload.clone())
                .map(EventPayload::OrderCreated)
                .map_err(malformed),
            EventType::OrderReturned => serde_json::from_value(self.payload.clone())
                .map(EventPayload::OrderReturned)
                .map_err(malformed),
            EventType::AdSpendRecorded => serde_json::from_value(self.payload.clone())
                .map(EventPayload::AdSpendRecorded)
                .map_err(malformed),
            EventType::FeeCharged => serde_json::from_value(self.payload.clone())
                .map(EventPayload::FeeCharged)
                .map_err(malformed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn envelope(event_type: &str, payload: JsonValue) -> EventEnvelope {
        EventEnvelope {
            event_id: "evt-1".to_string(),
            merchant_id: Uuid::new_v4(),
            stream_type: "orders".to_string(),
            event_type: event_type.to_string(),
            payload,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn parses_order_created_payload() {
        let env = envelope(
            "order_created",
            json!({
                "order_id": "1001",
                "currency": "USD",
                "total": "150.00",
                "line_items": [
                    {"product_id": "p1", "variant_id": "v1", "sku": "SKU-1",
                     "title": "Mug", "quantity": 3, "unit_price": "50.00"}
                ]
            }),
        );

        let payload = env.typed_payload().unwrap();
        match payload {
            EventPayload::OrderCreated(p) => {
                assert_eq!(p.total, dec!(150.00));
                assert_eq!(p.line_items.len(), 1);
                assert_eq!(p.line_items[0].line_total(), dec!(150.00));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let env = envelope("order_archived", json!({}));
        let err = env.typed_payload().unwrap_err();
        assert!(matches!(err, EventError::UnknownEventType(t) if t == "order_archived"));
    }

    #[test]
    fn missing_amount_is_a_malformed_payload() {
        let env = envelope("ad_spend_recorded", json!({ "currency": "USD" }));
        let err = env.typed_payload().unwrap_err();
        assert!(matches!(err, EventError::MalformedPayload { .. }));
    }

    #[test]
    fn return_line_items_default_to_empty() {
        let env = envelope(
            "order_returned",
            json!({ "order_id": "1001", "currency": "USD", "amount": "20.00" }),
        );
        match env.typed_payload().unwrap() {
            EventPayload::OrderReturned(p) => assert!(p.line_items.is_empty()),
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
