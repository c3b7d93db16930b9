use crate::error::AnalyzerError;
use chrono::{DateTime, Utc};
use configuration::ClassificationThresholds;
use core_types::{AccountCategory, EntryDirection, ProductFinancials, ProductStatus};
use database::{LedgerRepository, ProductEntryRow};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// The hero/villain convenience view over an analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct TopAndBottom {
    /// The top products by net sales, descending.
    pub heroes: Vec<ProductFinancials>,
    /// Money-losing or high-return products, ascending by net sales so the
    /// worst offender comes first.
    pub villains: Vec<ProductFinancials>,
}

/// Classifies one product. First match wins: toxic beats warning beats healthy.
pub fn classify(
    net_sales: Decimal,
    return_rate_pct: Decimal,
    thresholds: &ClassificationThresholds,
) -> ProductStatus {
    if return_rate_pct > thresholds.toxic_return_rate_pct || net_sales < Decimal::ZERO {
        ProductStatus::Toxic
    } else if return_rate_pct > thresholds.warning_return_rate_pct {
        ProductStatus::Warning
    } else {
        ProductStatus::Healthy
    }
}

/// Groups ledger entry rows by variant and rolls them up into per-product
/// financials, sorted by net sales descending.
///
/// Rows lacking a `variant_id` are unattributable and silently dropped.
/// A variant with zero gross sales gets a return rate of 0, never a
/// division error.
pub fn aggregate(
    rows: &[ProductEntryRow],
    thresholds: &ClassificationThresholds,
) -> Vec<ProductFinancials> {
    struct Accumulator {
        sku: Option<String>,
        title: Option<String>,
        units_sold: i64,
        gross_sales: Decimal,
        returns: Decimal,
    }

    let mut groups: HashMap<String, Accumulator> = HashMap::new();

    for row in rows {
        let Some(variant_id) = row.variant_id.as_ref() else {
            continue;
        };

        let acc = groups.entry(variant_id.clone()).or_insert(Accumulator {
            sku: None,
            title: None,
            units_sold: 0,
            gross_sales: Decimal::ZERO,
            returns: Decimal::ZERO,
        });
        if acc.sku.is_none() {
            acc.sku = row.sku.clone();
        }
        if acc.title.is_none() {
            acc.title = row.title.clone();
        }

        // Each account grows on its natural side; entries on the opposite
        // side (corrections) subtract.
        match row.category {
            AccountCategory::RevenueGross => {
                match row.direction {
                    EntryDirection::Credit => acc.gross_sales += row.amount,
                    EntryDirection::Debit => acc.gross_sales -= row.amount,
                }
                if row.direction == EntryDirection::Credit {
                    acc.units_sold += row.quantity.unwrap_or(0);
                }
            }
            AccountCategory::RevenueContra => match row.direction {
                EntryDirection::Debit => acc.returns += row.amount,
                EntryDirection::Credit => acc.returns -= row.amount,
            },
            // The repository only feeds revenue-side rows; anything else
            // carries no product meaning here.
            _ => {}
        }
    }

    let mut products: Vec<ProductFinancials> = groups
        .into_iter()
        .map(|(variant_id, acc)| {
            let net_sales = acc.gross_sales - acc.returns;
            let return_rate_pct = if acc.gross_sales > Decimal::ZERO {
                (acc.returns / acc.gross_sales) * Decimal::from(100)
            } else {
                Decimal::ZERO
            };
            let status = classify(net_sales, return_rate_pct, thresholds);
            ProductFinancials {
                variant_id,
                sku: acc.sku,
                title: acc.title,
                units_sold: acc.units_sold,
                gross_sales: acc.gross_sales,
                returns: acc.returns,
                net_sales,
                return_rate_pct,
                status,
            }
        })
        .collect();

    products.sort_by(|a, b| b.net_sales.cmp(&a.net_sales));
    products
}

/// Splits an analysis (already sorted net-sales descending) into the
/// top-`limit` heroes and the bottom-`limit` villains.
pub fn top_and_bottom(
    products: &[ProductFinancials],
    limit: usize,
    thresholds: &ClassificationThresholds,
) -> TopAndBottom {
    let heroes = products.iter().take(limit).cloned().collect();

    let mut villains: Vec<ProductFinancials> = products
        .iter()
        .filter(|p| {
            p.net_sales < Decimal::ZERO || p.return_rate_pct > thresholds.toxic_return_rate_pct
        })
        .cloned()
        .collect();
    villains.sort_by(|a, b| a.net_sales.cmp(&b.net_sales));
    villains.truncate(limit);

    TopAndBottom { heroes, villains }
}

/// A stateless analyzer bound to the ledger repository.
#[derive(Debug, Clone)]
pub struct ProductAnalyzer {
    repo: LedgerRepository,
    thresholds: ClassificationThresholds,
}

impl ProductAnalyzer {
    pub fn new(repo: LedgerRepository, thresholds: ClassificationThresholds) -> Self {
        Self { repo, thresholds }
    }

    /// Scans revenue and returns entries in `[start, end)`, rolls them up per
    /// variant, refreshes the product stats cache, and returns the analysis.
    pub async fn analyze(
        &self,
        merchant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProductFinancials>, AnalyzerError> {
        let rows = self.repo.product_entry_rows(merchant_id, start, end).await?;
        let products = aggregate(&rows, &self.thresholds);
        debug!(
            %merchant_id,
            rows = rows.len(),
            products = products.len(),
            "product analysis complete"
        );

        self.repo
            .replace_product_stats(merchant_id, start, end, &products)
            .await?;
        Ok(products)
    }

    /// The hero/villain view over a fresh analysis.
    pub async fn top_and_bottom(
        &self,
        merchant_id: Uuid,
        limit: usize,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TopAndBottom, AnalyzerError> {
        let products = self.analyze(merchant_id, start, end).await?;
        Ok(top_and_bottom(&products, limit, &self.thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gross(variant: &str, amount: Decimal, quantity: i64) -> ProductEntryRow {
        ProductEntryRow {
            category: AccountCategory::RevenueGross,
            direction: EntryDirection::Credit,
            amount,
            variant_id: Some(variant.to_string()),
            sku: Some(format!("SKU-{variant}")),
            title: None,
            quantity: Some(quantity),
        }
    }

    fn refund(variant: &str, amount: Decimal) -> ProductEntryRow {
        ProductEntryRow {
            category: AccountCategory::RevenueContra,
            direction: EntryDirection::Debit,
            amount,
            variant_id: Some(variant.to_string()),
            sku: None,
            title: None,
            quantity: Some(1),
        }
    }

    fn thresholds() -> ClassificationThresholds {
        ClassificationThresholds::default()
    }

    #[test]
    fn rolls_up_gross_returns_and_net_per_variant() {
        let rows = vec![
            gross("v1", dec!(1000), 10),
            refund("v1", dec!(200)),
            gross("v2", dec!(500), 5),
        ];

        let products = aggregate(&rows, &thresholds());
        assert_eq!(products.len(), 2);

        // Sorted by net sales descending: v1 (800) before v2 (500).
        assert_eq!(products[0].variant_id, "v1");
        assert_eq!(products[0].gross_sales, dec!(1000));
        assert_eq!(products[0].returns, dec!(200));
        assert_eq!(products[0].net_sales, dec!(800));
        assert_eq!(products[0].return_rate_pct, dec!(20));
        assert_eq!(products[0].status, ProductStatus::Toxic);
        assert_eq!(products[0].units_sold, 10);

        assert_eq!(products[1].variant_id, "v2");
        assert_eq!(products[1].status, ProductStatus::Healthy);
    }

    #[test]
    fn unattributed_rows_are_dropped_not_errored() {
        let mut row = gross("v1", dec!(100), 1);
        row.variant_id = None;
        let products = aggregate(&[row], &thresholds());
        assert!(products.is_empty());
    }

    #[test]
    fn zero_gross_sales_yields_zero_return_rate() {
        // A variant that only ever appears on refunds.
        let products = aggregate(&[refund("v1", dec!(50))], &thresholds());
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].return_rate_pct, Decimal::ZERO);
        // Net sales are negative, so it is still toxic.
        assert_eq!(products[0].status, ProductStatus::Toxic);
    }

    #[test]
    fn classification_boundaries_are_exclusive() {
        let t = thresholds();
        // Exactly 8% is healthy; just over is warning.
        assert_eq!(classify(dec!(100), dec!(8), &t), ProductStatus::Healthy);
        assert_eq!(classify(dec!(100), dec!(8.01), &t), ProductStatus::Warning);
        // Exactly 15% is still warning; just over is toxic.
        assert_eq!(classify(dec!(100), dec!(15), &t), ProductStatus::Warning);
        assert_eq!(classify(dec!(100), dec!(15.01), &t), ProductStatus::Toxic);
        // Negative net sales are toxic at any return rate.
        assert_eq!(classify(dec!(-1), dec!(0), &t), ProductStatus::Toxic);
    }

    #[test]
    fn top_and_bottom_splits_heroes_and_villains() {
        let rows = vec![
            gross("hero", dec!(5000), 50),
            gross("mid", dec!(1000), 10),
            // 40% return rate, positive net: villain by rate.
            gross("leaky", dec!(500), 5),
            refund("leaky", dec!(200)),
            // Refund-only: negative net, worst villain.
            refund("sinkhole", dec!(300)),
        ];

        let products = aggregate(&rows, &thresholds());
        let view = top_and_bottom(&products, 2, &thresholds());

        assert_eq!(view.heroes.len(), 2);
        assert_eq!(view.heroes[0].variant_id, "hero");

        assert_eq!(view.villains.len(), 2);
        // Ascending net sales: the deepest loser first.
        assert_eq!(view.villains[0].variant_id, "sinkhole");
        assert_eq!(view.villains[1].variant_id, "leaky");
    }
}
