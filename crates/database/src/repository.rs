use crate::DbError;
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{
    Account, AccountCategory, AccountType, BenchmarkMetric, Cohort, DailyMerchantStat,
    EntryAttribution, EntryDirection, GlobalBenchmark, IssueRecord, PainDiagnosis,
    ProductFinancials, TransactionRecord,
};
use events::EventEnvelope;
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

/// The `LedgerRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic for
/// the ledger tables and the derived caches.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

/// An entry whose account code has been resolved to a concrete account id,
/// ready to be written as part of a transaction.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: Decimal,
    pub direction: EntryDirection,
    pub attribution: EntryAttribution,
}

/// The outcome of attempting to insert a transaction.
///
/// `DuplicateOf` is not an error: the unique `(merchant_id, event_id)` index
/// rejected a re-posting and the existing transaction is returned instead.
#[derive(Debug, Clone)]
pub enum TransactionInsert {
    Inserted,
    DuplicateOf(TransactionRecord),
}

/// Net ledger activity per account category over a window, with every value
/// oriented to its natural-positive sign (revenue credit-positive, contra
/// revenue and expenses debit-positive).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerAggregates {
    pub gross_revenue: Decimal,
    pub returns: Decimal,
    pub cogs: Decimal,
    pub marketing: Decimal,
    pub platform_fees: Decimal,
    pub admin_fees: Decimal,
    pub finance_fees: Decimal,
}

/// One revenue or contra-revenue entry row fed to the product analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductEntryRow {
    pub category: AccountCategory,
    pub direction: EntryDirection,
    pub amount: Decimal,
    pub variant_id: Option<String>,
    pub sku: Option<String>,
    pub title: Option<String>,
    pub quantity: Option<i64>,
}

impl LedgerRepository {
    /// Creates a new `LedgerRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==========================================================================
    // Chart of accounts
    // ==========================================================================

    /// Inserts one account if absent. Idempotent via the unique
    /// `(merchant_id, code)` constraint, so it is safe to call before every posting.
    pub async fn upsert_account(&self, account: &Account) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, merchant_id, code, name, account_type, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (merchant_id, code) DO NOTHING
            "#,
        )
        .bind(account.id)
        .bind(account.merchant_id)
        .bind(&account.code)
        .bind(&account.name)
        .bind(account.account_type.as_str())
        .bind(account.category.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetches a merchant's full chart of accounts.
    pub async fn accounts_for_merchant(&self, merchant_id: Uuid) -> Result<Vec<Account>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, merchant_id, code, name, account_type, category
            FROM accounts
            WHERE merchant_id = $1
            ORDER BY code ASC
            "#,
        )
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Account {
                    id: row.get("id"),
                    merchant_id: row.get("merchant_id"),
                    code: row.get("code"),
                    name: row.get("name"),
                    account_type: AccountType::from_str(row.get::<String, _>("account_type").as_str())?,
                    category: AccountCategory::from_str(row.get::<String, _>("category").as_str())?,
                })
            })
            .collect()
    }

    /// Lists every merchant that has a chart of accounts. Used by the
    /// benchmark batch job to fan out daily-stat computation.
    pub async fn merchant_ids(&self) -> Result<Vec<Uuid>, DbError> {
        let rows = sqlx::query("SELECT DISTINCT merchant_id FROM accounts ORDER BY merchant_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.get("merchant_id")).collect())
    }

    // ==========================================================================
    // Events & posting
    // ==========================================================================

    /// Archives a raw event envelope. Idempotent: re-inserting the same
    /// `(merchant_id, event_id)` is a no-op, events are append-only.
    pub async fn insert_event(&self, envelope: &EventEnvelope) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO events (event_id, merchant_id, stream_type, event_type, payload, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (merchant_id, event_id) DO NOTHING
            "#,
        )
        .bind(&envelope.event_id)
        .bind(envelope.merchant_id)
        .bind(&envelope.stream_type)
        .bind(&envelope.event_type)
        .bind(&envelope.payload)
        .bind(envelope.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Finds the transaction already posted for an event, if any.
    pub async fn find_transaction_by_event(
        &self,
        merchant_id: Uuid,
        event_id: &str,
    ) -> Result<Option<TransactionRecord>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, merchant_id, event_id, created_at, description
            FROM transactions
            WHERE merchant_id = $1 AND event_id = $2
            "#,
        )
        .bind(merchant_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| TransactionRecord {
            id: row.get("id"),
            merchant_id: row.get("merchant_id"),
            event_id: row.get("event_id"),
            created_at: row.get("created_at"),
            description: row.get("description"),
        }))
    }

    /// Writes one transaction and all of its entries atomically.
    ///
    /// The transaction header insert races on the unique
    /// `(merchant_id, event_id)` index: if another posting won, nothing is
    /// written and the existing transaction is fetched and returned as
    /// `DuplicateOf`. Entry writes happen inside the same SQL transaction as
    /// the header, so a failure on any entry rolls back the whole posting.
    pub async fn insert_transaction(
        &self,
        record: &TransactionRecord,
        entries: &[ResolvedEntry],
    ) -> Result<TransactionInsert, DbError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO transactions (id, merchant_id, event_id, created_at, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (merchant_id, event_id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(record.merchant_id)
        .bind(&record.event_id)
        .bind(record.created_at)
        .bind(&record.description)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            // Lost the race (or a straight re-post). Nothing was written.
            tx.rollback().await?;
            let existing = self
                .find_transaction_by_event(record.merchant_id, &record.event_id)
                .await?
                .ok_or(DbError::NotFound)?;
            return Ok(TransactionInsert::DuplicateOf(existing));
        }

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO entries (id, transaction_id, account_id, amount, direction,
                                     product_id, variant_id, sku, title, quantity)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(entry.id)
            .bind(record.id)
            .bind(entry.account_id)
            .bind(entry.amount)
            .bind(entry.direction.as_str())
            .bind(&entry.attribution.product_id)
            .bind(&entry.attribution.variant_id)
            .bind(&entry.attribution.sku)
            .bind(&entry.attribution.title)
            .bind(entry.attribution.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(TransactionInsert::Inserted)
    }

    // ==========================================================================
    // Aggregation reads
    // ==========================================================================

    /// Sums ledger activity per account category over the half-open window
    /// `[start, end)`, oriented to each category's natural-positive sign.
    /// Adjacent windows never double-count or drop a boundary transaction.
    pub async fn window_aggregates(
        &self,
        merchant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<LedgerAggregates, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT
                a.category,
                COALESCE(SUM(CASE WHEN e.direction = 'DEBIT' THEN e.amount ELSE -e.amount END), 0) AS debit_net
            FROM entries e
            JOIN transactions t ON e.transaction_id = t.id
            JOIN accounts a ON e.account_id = a.id
            WHERE t.merchant_id = $1 AND t.created_at >= $2 AND t.created_at < $3
            GROUP BY a.category
            "#,
        )
        .bind(merchant_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut aggregates = LedgerAggregates::default();
        for row in rows {
            let category = AccountCategory::from_str(row.get::<String, _>("category").as_str())?;
            let debit_net: Decimal = row.get("debit_net");
            match category {
                // Revenue accounts grow on the credit side.
                AccountCategory::RevenueGross => aggregates.gross_revenue = -debit_net,
                AccountCategory::RevenueContra => aggregates.returns = debit_net,
                AccountCategory::Cogs => aggregates.cogs = debit_net,
                AccountCategory::Marketing => aggregates.marketing = debit_net,
                AccountCategory::PlatformFees => aggregates.platform_fees = debit_net,
                AccountCategory::Admin => aggregates.admin_fees = debit_net,
                AccountCategory::Finance => aggregates.finance_fees = debit_net,
                // Cash and receivable movements are not profit aggregates.
                AccountCategory::Cash | AccountCategory::Receivable => {}
            }
        }
        Ok(aggregates)
    }

    /// Fetches every revenue (600) and returns (610) entry within the
    /// half-open window `[start, end)`, with its product attribution, for
    /// per-product aggregation.
    pub async fn product_entry_rows(
        &self,
        merchant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProductEntryRow>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT a.category, e.direction, e.amount, e.variant_id, e.sku, e.title, e.quantity
            FROM entries e
            JOIN transactions t ON e.transaction_id = t.id
            JOIN accounts a ON e.account_id = a.id
            WHERE t.merchant_id = $1
              AND t.created_at >= $2 AND t.created_at < $3
              AND a.category IN ('REVENUE_GROSS', 'REVENUE_CONTRA')
            ORDER BY t.created_at ASC
            "#,
        )
        .bind(merchant_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ProductEntryRow {
                    category: AccountCategory::from_str(row.get::<String, _>("category").as_str())?,
                    direction: EntryDirection::from_str(row.get::<String, _>("direction").as_str())?,
                    amount: row.get("amount"),
                    variant_id: row.get("variant_id"),
                    sku: row.get("sku"),
                    title: row.get("title"),
                    quantity: row.get("quantity"),
                })
            })
            .collect()
    }

    // ==========================================================================
    // Derived caches
    // ==========================================================================

    /// Replaces a merchant's product stats cache with a fresh analysis,
    /// atomically, stamping the window it was computed over.
    pub async fn replace_product_stats(
        &self,
        merchant_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        products: &[ProductFinancials],
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM product_stats_cache WHERE merchant_id = $1")
            .bind(merchant_id)
            .execute(&mut *tx)
            .await?;

        for product in products {
            sqlx::query(
                r#"
                INSERT INTO product_stats_cache
                    (merchant_id, variant_id, sku, title, units_sold, gross_sales, returns,
                     net_sales, return_rate_pct, status, window_start, window_end, computed_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
                "#,
            )
            .bind(merchant_id)
            .bind(&product.variant_id)
            .bind(&product.sku)
            .bind(&product.title)
            .bind(product.units_sold)
            .bind(product.gross_sales)
            .bind(product.returns)
            .bind(product.net_sales)
            .bind(product.return_rate_pct)
            .bind(product.status.as_str())
            .bind(window_start)
            .bind(window_end)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Upserts the latest pain diagnosis snapshot for a merchant.
    pub async fn upsert_pain_diagnosis(&self, diagnosis: &PainDiagnosis) -> Result<(), DbError> {
        let factors = serde_json::to_value(&diagnosis.factors)?;
        sqlx::query(
            r#"
            INSERT INTO pain_diagnosis_cache
                (merchant_id, score, level, factors, opportunity_loss, computed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (merchant_id) DO UPDATE SET
                score = EXCLUDED.score,
                level = EXCLUDED.level,
                factors = EXCLUDED.factors,
                opportunity_loss = EXCLUDED.opportunity_loss,
                computed_at = EXCLUDED.computed_at
            "#,
        )
        .bind(diagnosis.merchant_id)
        .bind(diagnosis.score as i32)
        .bind(diagnosis.level.as_str())
        .bind(factors)
        .bind(diagnosis.opportunity_loss)
        .bind(diagnosis.computed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Upserts one row of the de-duplicated issue log. A repeat diagnosis
    /// refreshes the loss estimate and `last_seen_at` rather than duplicating
    /// the row.
    pub async fn upsert_issue(&self, issue: &IssueRecord) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO ledger_issues (merchant_id, issue_type, entity_id, daily_loss, detail)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (merchant_id, issue_type, entity_id) DO UPDATE SET
                daily_loss = EXCLUDED.daily_loss,
                detail = EXCLUDED.detail,
                last_seen_at = NOW()
            "#,
        )
        .bind(issue.merchant_id)
        .bind(issue.issue_type.as_str())
        .bind(&issue.entity_id)
        .bind(issue.daily_loss)
        .bind(&issue.detail)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ==========================================================================
    // Benchmark tables
    // ==========================================================================

    /// Upserts one merchant-day summary row, keyed by `(merchant_id, stat_date)`.
    pub async fn upsert_daily_stat(&self, stat: &DailyMerchantStat) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO daily_merchant_stats
                (merchant_id, stat_date, revenue, net_profit, margin_pct, cohort, computed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (merchant_id, stat_date) DO UPDATE SET
                revenue = EXCLUDED.revenue,
                net_profit = EXCLUDED.net_profit,
                margin_pct = EXCLUDED.margin_pct,
                cohort = EXCLUDED.cohort,
                computed_at = EXCLUDED.computed_at
            "#,
        )
        .bind(stat.merchant_id)
        .bind(stat.stat_date)
        .bind(stat.revenue)
        .bind(stat.net_profit)
        .bind(stat.margin_pct)
        .bind(stat.cohort.as_str())
        .bind(stat.computed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetches every merchant's summary row for one day, across all cohorts.
    pub async fn daily_stats_for_date(
        &self,
        stat_date: NaiveDate,
    ) -> Result<Vec<DailyMerchantStat>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT merchant_id, stat_date, revenue, net_profit, margin_pct, cohort, computed_at
            FROM daily_merchant_stats
            WHERE stat_date = $1
            "#,
        )
        .bind(stat_date)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| Self::row_to_daily_stat(row)).collect()
    }

    /// Fetches a merchant's most recent daily summary row, if any.
    pub async fn latest_daily_stat(
        &self,
        merchant_id: Uuid,
    ) -> Result<Option<DailyMerchantStat>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT merchant_id, stat_date, revenue, net_profit, margin_pct, cohort, computed_at
            FROM daily_merchant_stats
            WHERE merchant_id = $1
            ORDER BY stat_date DESC
            LIMIT 1
            "#,
        )
        .bind(merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_daily_stat).transpose()
    }

    /// Upserts one population percentile row, keyed by `(stat_date, cohort, metric)`.
    pub async fn upsert_global_benchmark(&self, benchmark: &GlobalBenchmark) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO global_benchmarks
                (stat_date, cohort, metric, sample_size, p10, p25, p50, p75, p90, computed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (stat_date, cohort, metric) DO UPDATE SET
                sample_size = EXCLUDED.sample_size,
                p10 = EXCLUDED.p10,
                p25 = EXCLUDED.p25,
                p50 = EXCLUDED.p50,
                p75 = EXCLUDED.p75,
                p90 = EXCLUDED.p90,
                computed_at = EXCLUDED.computed_at
            "#,
        )
        .bind(benchmark.stat_date)
        .bind(benchmark.cohort.as_str())
        .bind(benchmark.metric.as_str())
        .bind(benchmark.sample_size)
        .bind(benchmark.p10)
        .bind(benchmark.p25)
        .bind(benchmark.p50)
        .bind(benchmark.p75)
        .bind(benchmark.p90)
        .bind(benchmark.computed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetches the most recent benchmark row for a cohort and metric.
    /// `None` is the normal "insufficient data" case, not an error.
    pub async fn latest_benchmark(
        &self,
        cohort: Cohort,
        metric: BenchmarkMetric,
    ) -> Result<Option<GlobalBenchmark>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT stat_date, cohort, metric, sample_size, p10, p25, p50, p75, p90, computed_at
            FROM global_benchmarks
            WHERE cohort = $1 AND metric = $2
            ORDER BY stat_date DESC
            LIMIT 1
            "#,
        )
        .bind(cohort.as_str())
        .bind(metric.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(GlobalBenchmark {
                stat_date: row.get("stat_date"),
                cohort: Cohort::from_str(row.get::<String, _>("cohort").as_str())?,
                metric: BenchmarkMetric::from_str(row.get::<String, _>("metric").as_str())?,
                sample_size: row.get("sample_size"),
                p10: row.get("p10"),
                p25: row.get("p25"),
                p50: row.get("p50"),
                p75: row.get("p75"),
                p90: row.get("p90"),
                computed_at: row.get("computed_at"),
            })
        })
        .transpose()
    }

    fn row_to_daily_stat(row: sqlx::postgres::PgRow) -> Result<DailyMerchantStat, DbError> {
        Ok(DailyMerchantStat {
            merchant_id: row.get("merchant_id"),
            stat_date: row.get("stat_date"),
            revenue: row.get("revenue"),
            net_profit: row.get("net_profit"),
            margin_pct: row.get("margin_pct"),
            cohort: Cohort::from_str(row.get::<String, _>("cohort").as_str())?,
            computed_at: row.get("computed_at"),
        })
    }
}
