use core_types::ProductFinancials;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The variant id of the aggregated "rest of store" pseudo-product. It is
/// addressable as a scenario target like any real variant.
pub const REST_OF_STORE: &str = "rest_of_store";

/// The per-product baseline a scenario perturbs.
///
/// Built from analyzer output plus the product's share of the store's global
/// ad spend, shipping and COGS. `orders` is always at least 1 so that the
/// unit decomposition (`orders * unit_price == gross_sales`) holds exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductBaseline {
    pub variant_id: String,
    pub title: Option<String>,
    pub orders: Decimal,
    pub unit_price: Decimal,
    pub gross_sales: Decimal,
    /// Returns as a percentage of gross sales.
    pub return_rate_pct: Decimal,
    pub cogs: Decimal,
    pub ad_spend: Decimal,
    pub shipping: Decimal,
}

impl ProductBaseline {
    /// The baseline net profit this product contributes.
    pub fn net_profit(&self) -> Decimal {
        let returns = self.gross_sales * self.return_rate_pct / Decimal::from(100);
        (self.gross_sales - returns) - self.cogs - self.ad_spend - self.shipping
    }
}

/// Store-wide cost totals apportioned to each product by its share of
/// analyzed gross sales.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalAllocations {
    pub ad_spend: Decimal,
    pub shipping: Decimal,
    pub cogs: Decimal,
}

/// Whether a scenario perturbs the whole portfolio or a single product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationScope {
    Portfolio,
    Product,
}

/// A hypothetical change to evaluate. All deltas are percentages; positive
/// `return_rate_improvement_pct` means returns go down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub scope: SimulationScope,
    pub target_variant_id: Option<String>,
    pub price_delta_pct: Decimal,
    pub ad_delta_pct: Decimal,
    pub return_rate_improvement_pct: Decimal,
    pub cogs_delta_pct: Decimal,
    /// Product scope only: zero out the target's contribution entirely,
    /// modeling discontinuation.
    pub is_killed: bool,
}

impl Scenario {
    /// A do-nothing scenario over the whole portfolio. Useful as a baseline
    /// and as a starting point for builders.
    pub fn neutral() -> Self {
        Self {
            scope: SimulationScope::Portfolio,
            target_variant_id: None,
            price_delta_pct: Decimal::ZERO,
            ad_delta_pct: Decimal::ZERO,
            return_rate_improvement_pct: Decimal::ZERO,
            cogs_delta_pct: Decimal::ZERO,
            is_killed: false,
        }
    }
}

/// The snapshot a scenario runs against: the top products plus one
/// aggregated rest-of-store pseudo-product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    pub products: Vec<ProductBaseline>,
}

impl SimulationInput {
    /// Bundles analyzer output into simulation baselines.
    ///
    /// The first `top_n` products (already sorted by net sales) are modeled
    /// individually; everything after collapses into the rest-of-store
    /// bucket. Global ad spend, shipping and COGS are apportioned to each
    /// baseline by its share of total analyzed gross sales.
    pub fn from_analysis(
        products: &[ProductFinancials],
        top_n: usize,
        allocations: &GlobalAllocations,
    ) -> Self {
        let total_gross: Decimal = products.iter().map(|p| p.gross_sales).sum();

        let share = |gross: Decimal| -> Decimal {
            if total_gross > Decimal::ZERO {
                gross / total_gross
            } else {
                Decimal::ZERO
            }
        };

        let mut baselines: Vec<ProductBaseline> = products
            .iter()
            .take(top_n)
            .map(|p| {
                let orders = if p.units_sold > 0 {
                    Decimal::from(p.units_sold)
                } else {
                    Decimal::ONE
                };
                let s = share(p.gross_sales);
                ProductBaseline {
                    variant_id: p.variant_id.clone(),
                    title: p.title.clone(),
                    orders,
                    unit_price: p.gross_sales / orders,
                    gross_sales: p.gross_sales,
                    return_rate_pct: p.return_rate_pct,
                    cogs: allocations.cogs * s,
                    ad_spend: allocations.ad_spend * s,
                    shipping: allocations.shipping * s,
                }
            })
            .collect();

        let rest: Vec<&ProductFinancials> = products.iter().skip(top_n).collect();
        if !rest.is_empty() {
            let gross: Decimal = rest.iter().map(|p| p.gross_sales).sum();
            let returns: Decimal = rest.iter().map(|p| p.returns).sum();
            let units: i64 = rest.iter().map(|p| p.units_sold).sum();
            let orders = if units > 0 {
                Decimal::from(units)
            } else {
                Decimal::ONE
            };
            let return_rate_pct = if gross > Decimal::ZERO {
                (returns / gross) * Decimal::from(100)
            } else {
                Decimal::ZERO
            };
            let s = share(gross);
            baselines.push(ProductBaseline {
                variant_id: REST_OF_STORE.to_string(),
                title: Some("Rest of store".to_string()),
                orders,
                unit_price: gross / orders,
                gross_sales: gross,
                return_rate_pct,
                cogs: allocations.cogs * s,
                ad_spend: allocations.ad_spend * s,
                shipping: allocations.shipping * s,
            });
        }

        Self {
            products: baselines,
        }
    }

    /// Total baseline net profit across all products.
    pub fn old_net_profit(&self) -> Decimal {
        self.products.iter().map(|p| p.net_profit()).sum()
    }
}

/// Aggregate outcome of one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub old_net_profit: Decimal,
    pub new_net_profit: Decimal,
    pub profit_delta: Decimal,
    /// Gross sales minus returns under the scenario.
    pub new_revenue: Decimal,
    pub new_gross_sales: Decimal,
    pub new_orders: Decimal,
}
