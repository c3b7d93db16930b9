use crate::enums::{
    AccountCategory, AccountType, BenchmarkMetric, Cohort, EntryDirection, IssueType, PainLevel,
    ProductStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One account in a merchant's chart of accounts.
///
/// Exactly one account exists per `(merchant_id, code)`; accounts are created
/// lazily by the account registry and never deleted while referenced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub merchant_id: Uuid,
    /// Taxonomy code, e.g. "600" gross revenue, "610" returns.
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub category: AccountCategory,
}

/// Product attribution attached to an entry at posting time.
///
/// Revenue and return entries must carry at least a `variant_id` or they fall
/// into the analyzer's "unknown" bucket and are excluded from per-product
/// output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryAttribution {
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub sku: Option<String>,
    pub title: Option<String>,
    /// Units sold or returned, carried from the order line item.
    pub quantity: Option<i64>,
}

impl EntryAttribution {
    /// An empty attribution for entries with no product dimension (fees, ad spend).
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether this entry can be attributed to a specific variant downstream.
    pub fn is_attributable(&self) -> bool {
        self.variant_id.is_some()
    }
}

/// One side of a not-yet-persisted posting, produced by the event mapper.
///
/// Drafts reference accounts by taxonomy code; the posting engine resolves
/// codes to concrete account ids just before commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub account_code: String,
    pub direction: EntryDirection,
    /// Always non-negative; the direction carries the sign.
    pub amount: Decimal,
    pub attribution: EntryAttribution,
}

impl EntryDraft {
    pub fn new(account_code: &str, direction: EntryDirection, amount: Decimal) -> Self {
        Self {
            account_code: account_code.to_string(),
            direction,
            amount,
            attribution: EntryAttribution::none(),
        }
    }

    pub fn with_attribution(mut self, attribution: EntryAttribution) -> Self {
        self.attribution = attribution;
        self
    }
}

/// A committed ledger transaction header. The atomic unit of posting: all of
/// its entries were written, balanced, or none were.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub merchant_id: Uuid,
    /// The upstream event this transaction was posted from. Unique per merchant.
    pub event_id: String,
    pub created_at: DateTime<Utc>,
    pub description: String,
}

/// Per-variant profitability rollup over an analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFinancials {
    pub variant_id: String,
    pub sku: Option<String>,
    pub title: Option<String>,
    pub units_sold: i64,
    pub gross_sales: Decimal,
    pub returns: Decimal,
    pub net_sales: Decimal,
    /// Returns as a percentage of gross sales, 0 when gross sales are 0.
    pub return_rate_pct: Decimal,
    pub status: ProductStatus,
}

/// The composite risk diagnosis for one merchant, recomputed on demand and
/// cached as the latest snapshot. Never authoritative history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainDiagnosis {
    pub merchant_id: Uuid,
    /// Composite score, clamped to [0, 100].
    pub score: u32,
    pub level: PainLevel,
    /// Points contributed by each triggered factor, keyed by issue type.
    pub factors: Vec<(IssueType, u32)>,
    /// Estimated total daily monetary bleed across all triggered factors.
    pub opportunity_loss: Decimal,
    pub computed_at: DateTime<Utc>,
}

/// One row of the de-duplicated issue log, keyed by
/// `(merchant_id, issue_type, entity_id)`. Repeated diagnoses refresh the
/// loss estimate instead of appending duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub merchant_id: Uuid,
    pub issue_type: IssueType,
    /// The offending entity: a variant id for product issues, "merchant" for
    /// store-wide factors.
    pub entity_id: String,
    pub daily_loss: Decimal,
    pub detail: String,
}

/// One merchant-day summary row consumed by the benchmark engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMerchantStat {
    pub merchant_id: Uuid,
    pub stat_date: NaiveDate,
    pub revenue: Decimal,
    pub net_profit: Decimal,
    /// Net profit as a percentage of revenue, 0 when revenue is 0.
    pub margin_pct: Decimal,
    /// Revenue-size bucket measured on trailing-30-day revenue.
    pub cohort: Cohort,
    pub computed_at: DateTime<Utc>,
}

/// Population percentiles for one (date, cohort, metric) cell, computed only
/// when the cohort clears the privacy floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalBenchmark {
    pub stat_date: NaiveDate,
    pub cohort: Cohort,
    pub metric: BenchmarkMetric,
    pub sample_size: i64,
    pub p10: Decimal,
    pub p25: Decimal,
    pub p50: Decimal,
    pub p75: Decimal,
    pub p90: Decimal,
    pub computed_at: DateTime<Utc>,
}

/// A single merchant's position against its cohort's benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStanding {
    pub metric: BenchmarkMetric,
    pub value: Decimal,
    pub cohort: Cohort,
    /// Bucketed percentile rank: 95, 80, 60, 40, 20 or 5.
    pub percentile_rank: u32,
    pub benchmark_median: Decimal,
    pub benchmark_top10: Decimal,
}
