use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// The root configuration structure for the entire application.
///
/// Every field is a fixed business constant observed in production, not a
/// derived value; they live here so operators can tune them without a
/// rebuild. Each section has a `Default` carrying the shipped constants, so
/// the engines run correctly with no `config.toml` present at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub classification: ClassificationThresholds,
    pub scoring: ScoringWeights,
    pub elasticity: ElasticityParams,
    pub benchmark: BenchmarkSettings,
}

/// Return-rate thresholds for the product profitability classifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassificationThresholds {
    /// Above this return rate (percent) a product is `toxic`.
    /// A product with negative net sales is toxic regardless of rate.
    pub toxic_return_rate_pct: Decimal,
    /// Above this return rate (percent) a product is `warning`.
    pub warning_return_rate_pct: Decimal,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            toxic_return_rate_pct: dec!(15),
            warning_return_rate_pct: dec!(8),
        }
    }
}

/// Weights and triggers for the five pain-score factors.
///
/// Factor points are capped individually and the summed score is clamped to
/// [0, 100] by the scoring engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// The trailing window, in days, a diagnosis looks back over.
    pub window_days: i64,

    /// Points per toxic-classified variant.
    pub toxic_points_per_product: u32,
    pub toxic_cap: u32,

    /// Refund bleed triggers above this store-wide return rate (percent).
    pub refund_rate_trigger_pct: Decimal,
    /// Points per whole percentage point of return rate above the trigger.
    pub refund_points_per_pct: u32,
    pub refund_cap: u32,
    /// Share of the refund volume treated as recoverable daily bleed.
    pub refund_bleed_loss_factor: Decimal,

    /// ROAS trap triggers when revenue/marketing exceeds this while the
    /// merchant's net gap is still negative.
    pub roas_trigger: Decimal,
    pub roas_points: u32,

    /// Cash-flow factor triggers when total expenses exceed this fraction of revenue.
    pub cashflow_expense_ratio: Decimal,
    pub cashflow_points: u32,

    /// Silent-fee factor triggers when fees exceed this fraction of revenue.
    pub silent_fee_ratio: Decimal,
    pub silent_fee_points: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            window_days: 30,
            toxic_points_per_product: 5,
            toxic_cap: 30,
            refund_rate_trigger_pct: dec!(10),
            refund_points_per_pct: 3,
            refund_cap: 20,
            refund_bleed_loss_factor: dec!(0.2),
            roas_trigger: dec!(3),
            roas_points: 25,
            cashflow_expense_ratio: dec!(0.8),
            cashflow_points: 15,
            silent_fee_ratio: dec!(0.15),
            silent_fee_points: 10,
        }
    }
}

/// Tunable coefficients for the what-if simulation model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElasticityParams {
    /// Assumed sensitivity of sales volume to a price change: a +10% price
    /// move scales volume by (1 - 10% * 0.8).
    pub price_elasticity: Decimal,
    /// Diminishing effectiveness of additional ad budget: a +10% ad move
    /// scales volume by (1 + 10% * 0.9).
    pub ad_decay: Decimal,
}

impl Default for ElasticityParams {
    fn default() -> Self {
        Self {
            price_elasticity: dec!(0.8),
            ad_decay: dec!(0.9),
        }
    }
}

/// Cohort boundaries and privacy rules for cross-merchant benchmarking.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    /// Upper bound (exclusive) of the "0-10k" cohort, in trailing-30-day revenue.
    pub small_cohort_max: Decimal,
    /// Upper bound (exclusive) of the "10k-50k" cohort.
    pub medium_cohort_max: Decimal,
    /// Upper bound (exclusive) of the "50k-200k" cohort; above is "200k+".
    pub large_cohort_max: Decimal,
    /// Minimum number of contributing merchants before a cohort's
    /// percentiles are published for a given day.
    pub privacy_floor: usize,
    /// The trailing window, in days, used to measure cohort revenue.
    pub trailing_window_days: i64,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            small_cohort_max: dec!(10000),
            medium_cohort_max: dec!(50000),
            large_cohort_max: dec!(200000),
            privacy_floor: 3,
            trailing_window_days: 30,
        }
    }
}
