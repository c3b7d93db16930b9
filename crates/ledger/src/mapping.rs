use crate::chart;
use crate::error::LedgerError;
use core_types::{EntryDirection, EntryDraft};
use events::{
    AdSpendPayload, EventEnvelope, EventPayload, FeeChargedPayload, FeeKind, OrderCreatedPayload,
    OrderReturnedPayload,
};
use rust_decimal::Decimal;

/// A fully mapped, balanced set of entry drafts for one event, ready for the
/// posting engine to resolve and commit.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedTransaction {
    pub description: String,
    pub entries: Vec<EntryDraft>,
}

/// Maps a typed event to a balanced set of entry drafts.
///
/// This is the pure half of the posting engine: no storage access, no side
/// effects. Malformed payloads come back as validation errors; a debit/credit
/// mismatch after mapping comes back as `ImbalancedPosting`.
pub fn map_event(envelope: &EventEnvelope) -> Result<MappedTransaction, LedgerError> {
    let mapped = match envelope.typed_payload()? {
        EventPayload::OrderCreated(payload) => map_order_created(&payload)?,
        EventPayload::OrderReturned(payload) => map_order_returned(&payload)?,
        EventPayload::AdSpendRecorded(payload) => map_ad_spend(&payload)?,
        EventPayload::FeeCharged(payload) => map_fee_charged(&payload)?,
    };

    check_balanced(&mapped.entries)?;
    Ok(mapped)
}

/// Verifies the balance invariant: sum of debits equals sum of credits.
pub fn check_balanced(entries: &[EntryDraft]) -> Result<(), LedgerError> {
    let mut debits = Decimal::ZERO;
    let mut credits = Decimal::ZERO;
    for entry in entries {
        match entry.direction {
            EntryDirection::Debit => debits += entry.amount,
            EntryDirection::Credit => credits += entry.amount,
        }
    }
    if debits != credits {
        return Err(LedgerError::ImbalancedPosting { debits, credits });
    }
    Ok(())
}

fn require_positive(context: &str, amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount {
            context: context.to_string(),
            amount,
        });
    }
    Ok(())
}

/// OrderCreated: DEBIT the receivable for the order total, CREDIT gross
/// revenue once per line item so product attribution survives at line-item
/// granularity.
fn map_order_created(payload: &OrderCreatedPayload) -> Result<MappedTransaction, LedgerError> {
    require_positive("order total", payload.total)?;

    let mut entries = vec![EntryDraft::new(
        chart::RECEIVABLE,
        EntryDirection::Debit,
        payload.total,
    )];

    let mut line_sum = Decimal::ZERO;
    for line in &payload.line_items {
        let line_total = line.line_total();
        require_positive("order line total", line_total)?;
        line_sum += line_total;
        entries.push(
            EntryDraft::new(chart::REVENUE, EntryDirection::Credit, line_total)
                .with_attribution(line.attribution()),
        );
    }

    // A total that disagrees with its line items is upstream data corruption,
    // not a mapping bug; surface it as a validation problem before the
    // balance check can mistake it for one.
    if line_sum != payload.total {
        return Err(LedgerError::InvalidAmount {
            context: format!(
                "order {} total disagrees with line items ({line_sum})",
                payload.order_id
            ),
            amount: payload.total,
        });
    }

    Ok(MappedTransaction {
        description: format!("Order {} created", payload.order_id),
        entries,
    })
}

/// OrderReturned: DEBIT the contra-revenue returns account for the refund,
/// CREDIT the receivable. Attribution is carried per refunded line when the
/// upstream platform provides one; otherwise the refund is posted whole and
/// lands in the analyzer's "unknown" bucket.
fn map_order_returned(payload: &OrderReturnedPayload) -> Result<MappedTransaction, LedgerError> {
    require_positive("refund amount", payload.amount)?;

    let mut entries = Vec::new();
    if payload.line_items.is_empty() {
        entries.push(EntryDraft::new(
            chart::RETURNS,
            EntryDirection::Debit,
            payload.amount,
        ));
    } else {
        let mut line_sum = Decimal::ZERO;
        for line in &payload.line_items {
            require_positive("refund line amount", line.amount)?;
            line_sum += line.amount;
            entries.push(
                EntryDraft::new(chart::RETURNS, EntryDirection::Debit, line.amount)
                    .with_attribution(line.attribution()),
            );
        }
        if line_sum != payload.amount {
            return Err(LedgerError::InvalidAmount {
                context: format!(
                    "refund for order {} disagrees with line items ({line_sum})",
                    payload.order_id
                ),
                amount: payload.amount,
            });
        }
    }

    entries.push(EntryDraft::new(
        chart::RECEIVABLE,
        EntryDirection::Credit,
        payload.amount,
    ));

    Ok(MappedTransaction {
        description: format!("Order {} refunded", payload.order_id),
        entries,
    })
}

/// AdSpendRecorded: DEBIT marketing expense, CREDIT cash.
fn map_ad_spend(payload: &AdSpendPayload) -> Result<MappedTransaction, LedgerError> {
    require_positive("ad spend", payload.amount)?;

    let description = match &payload.channel {
        Some(channel) => format!("Ad spend ({channel})"),
        None => "Ad spend".to_string(),
    };

    Ok(MappedTransaction {
        description,
        entries: vec![
            EntryDraft::new(chart::MARKETING, EntryDirection::Debit, payload.amount),
            EntryDraft::new(chart::CASH, EntryDirection::Credit, payload.amount),
        ],
    })
}

/// FeeCharged: DEBIT the expense account selected by the fee kind, CREDIT cash.
fn map_fee_charged(payload: &FeeChargedPayload) -> Result<MappedTransaction, LedgerError> {
    require_positive("fee", payload.amount)?;

    let (account, label) = match payload.fee_kind {
        FeeKind::Platform => (chart::PLATFORM_FEES, "platform"),
        FeeKind::Admin => (chart::ADMIN_FEES, "admin"),
        FeeKind::Finance => (chart::FINANCE_FEES, "finance"),
    };

    Ok(MappedTransaction {
        description: format!("Fee charged ({label})"),
        entries: vec![
            EntryDraft::new(account, EntryDirection::Debit, payload.amount),
            EntryDraft::new(chart::CASH, EntryDirection::Credit, payload.amount),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use uuid::Uuid;

    fn envelope(event_type: &str, payload: serde_json::Value) -> EventEnvelope {
        EventEnvelope {
            event_id: "evt-1".to_string(),
            merchant_id: Uuid::new_v4(),
            stream_type: "orders".to_string(),
            event_type: event_type.to_string(),
            payload,
            recorded_at: Utc::now(),
        }
    }

    fn order_created(total: &str, lines: serde_json::Value) -> EventEnvelope {
        envelope(
            "order_created",
            json!({ "order_id": "1001", "currency": "USD", "total": total, "line_items": lines }),
        )
    }

    #[test]
    fn order_created_balances_and_attributes_lines() {
        let env = order_created(
            "150.00",
            json!([
                {"variant_id": "v1", "sku": "SKU-1", "title": "Mug", "quantity": 2, "unit_price": "50.00"},
                {"variant_id": "v2", "sku": "SKU-2", "title": "Hat", "quantity": 1, "unit_price": "50.00"}
            ]),
        );

        let mapped = map_event(&env).unwrap();
        assert_eq!(mapped.entries.len(), 3);

        let debit = &mapped.entries[0];
        assert_eq!(debit.account_code, chart::RECEIVABLE);
        assert_eq!(debit.direction, EntryDirection::Debit);
        assert_eq!(debit.amount, dec!(150.00));

        let revenue_lines: Vec<_> = mapped
            .entries
            .iter()
            .filter(|e| e.account_code == chart::REVENUE)
            .collect();
        assert_eq!(revenue_lines.len(), 2);
        assert_eq!(revenue_lines[0].attribution.variant_id.as_deref(), Some("v1"));
        assert_eq!(revenue_lines[0].amount, dec!(100.00));
        assert_eq!(revenue_lines[1].attribution.quantity, Some(1));
    }

    #[test]
    fn order_total_mismatch_is_a_validation_error() {
        let env = order_created(
            "999.00",
            json!([{"variant_id": "v1", "quantity": 1, "unit_price": "50.00",
                    "sku": null, "title": null, "product_id": null}]),
        );
        let err = map_event(&env).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
    }

    #[test]
    fn order_returned_balances_with_line_attribution() {
        let env = envelope(
            "order_returned",
            json!({
                "order_id": "1001", "currency": "USD", "amount": "60.00",
                "line_items": [
                    {"variant_id": "v1", "quantity": 1, "amount": "60.00",
                     "sku": null, "title": null, "product_id": null}
                ]
            }),
        );

        let mapped = map_event(&env).unwrap();
        check_balanced(&mapped.entries).unwrap();
        assert_eq!(mapped.entries[0].account_code, chart::RETURNS);
        assert_eq!(mapped.entries[0].attribution.variant_id.as_deref(), Some("v1"));
        assert_eq!(mapped.entries.last().unwrap().account_code, chart::RECEIVABLE);
        assert_eq!(mapped.entries.last().unwrap().direction, EntryDirection::Credit);
    }

    #[test]
    fn order_returned_without_lines_is_unattributed() {
        let env = envelope(
            "order_returned",
            json!({ "order_id": "1001", "currency": "USD", "amount": "20.00" }),
        );
        let mapped = map_event(&env).unwrap();
        assert!(!mapped.entries[0].attribution.is_attributable());
    }

    #[test]
    fn ad_spend_debits_marketing_credits_cash() {
        let env = envelope(
            "ad_spend_recorded",
            json!({ "currency": "USD", "amount": "500.00", "channel": "meta" }),
        );
        let mapped = map_event(&env).unwrap();
        assert_eq!(mapped.entries[0].account_code, chart::MARKETING);
        assert_eq!(mapped.entries[1].account_code, chart::CASH);
        check_balanced(&mapped.entries).unwrap();
    }

    #[test]
    fn fee_kind_selects_expense_account() {
        for (kind, code) in [
            ("platform", chart::PLATFORM_FEES),
            ("admin", chart::ADMIN_FEES),
            ("finance", chart::FINANCE_FEES),
        ] {
            let env = envelope(
                "fee_charged",
                json!({ "currency": "USD", "amount": "25.00", "fee_kind": kind }),
            );
            let mapped = map_event(&env).unwrap();
            assert_eq!(mapped.entries[0].account_code, code);
            check_balanced(&mapped.entries).unwrap();
        }
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let env = envelope(
            "ad_spend_recorded",
            json!({ "currency": "USD", "amount": "-5.00", "channel": null }),
        );
        assert!(matches!(
            map_event(&env).unwrap_err(),
            LedgerError::InvalidAmount { .. }
        ));
    }

    #[test]
    fn imbalanced_drafts_are_detected() {
        let entries = vec![
            EntryDraft::new(chart::RECEIVABLE, EntryDirection::Debit, dec!(100)),
            EntryDraft::new(chart::REVENUE, EntryDirection::Credit, dec!(90)),
        ];
        let err = check_balanced(&entries).unwrap_err();
        match err {
            LedgerError::ImbalancedPosting { debits, credits } => {
                assert_eq!(debits, dec!(100));
                assert_eq!(credits, dec!(90));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
