use crate::error::BenchmarkError;
use crate::percentile::percentiles;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use configuration::BenchmarkSettings;
use core_types::{BenchmarkMetric, Cohort, DailyMerchantStat, GlobalBenchmark, UserStanding};
use database::LedgerRepository;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Assigns the revenue-size cohort for a trailing-window revenue figure.
pub fn cohort_for(trailing_revenue: Decimal, settings: &BenchmarkSettings) -> Cohort {
    if trailing_revenue < settings.small_cohort_max {
        Cohort::UpTo10k
    } else if trailing_revenue < settings.medium_cohort_max {
        Cohort::To50k
    } else if trailing_revenue < settings.large_cohort_max {
        Cohort::To200k
    } else {
        Cohort::Over200k
    }
}

/// Buckets a merchant's value into a percentile rank against its cohort.
pub fn rank_for(value: Decimal, benchmark: &GlobalBenchmark) -> u32 {
    if value >= benchmark.p90 {
        95
    } else if value >= benchmark.p75 {
        80
    } else if value >= benchmark.p50 {
        60
    } else if value >= benchmark.p25 {
        40
    } else if value >= benchmark.p10 {
        20
    } else {
        5
    }
}

/// Computes the benchmark rows for one day from its daily stats.
///
/// Pure: groups stats by cohort, skips cohorts under the privacy floor, and
/// produces one row per surviving (cohort, metric) pair.
pub fn compute_cohort_rows(
    stats: &[DailyMerchantStat],
    settings: &BenchmarkSettings,
    stat_date: NaiveDate,
    computed_at: DateTime<Utc>,
) -> Vec<GlobalBenchmark> {
    let mut by_cohort: HashMap<Cohort, Vec<&DailyMerchantStat>> = HashMap::new();
    for stat in stats {
        by_cohort.entry(stat.cohort).or_default().push(stat);
    }

    let mut rows = Vec::new();
    for (cohort, members) in by_cohort {
        if members.len() < settings.privacy_floor {
            debug!(
                cohort = cohort.as_str(),
                members = members.len(),
                "cohort below privacy floor, skipping"
            );
            continue;
        }

        for metric in BenchmarkMetric::all() {
            let values: Vec<Decimal> = members
                .iter()
                .map(|s| match metric {
                    BenchmarkMetric::Revenue => s.revenue,
                    BenchmarkMetric::NetProfit => s.net_profit,
                    BenchmarkMetric::Margin => s.margin_pct,
                })
                .collect();

            // The privacy floor already guarantees a non-empty list.
            let Some(p) = percentiles(&values) else {
                continue;
            };
            rows.push(GlobalBenchmark {
                stat_date,
                cohort,
                metric,
                sample_size: members.len() as i64,
                p10: p.p10,
                p25: p.p25,
                p50: p.p50,
                p75: p.p75,
                p90: p.p90,
                computed_at,
            });
        }
    }
    rows
}

/// The cross-merchant benchmark engine: daily per-merchant summaries and
/// anonymized cohort percentiles over them.
#[derive(Debug, Clone)]
pub struct BenchmarkEngine {
    repo: LedgerRepository,
    settings: BenchmarkSettings,
}

impl BenchmarkEngine {
    pub fn new(repo: LedgerRepository, settings: BenchmarkSettings) -> Self {
        Self { repo, settings }
    }

    /// The half-open UTC window `[midnight, next midnight)` for one stat
    /// date, so sub-second timestamps at the end of the day still land in it.
    fn day_bounds(
        stat_date: NaiveDate,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), BenchmarkError> {
        let start = stat_date
            .and_hms_opt(0, 0, 0)
            .ok_or(BenchmarkError::InvalidDate(stat_date))?
            .and_utc();
        let end = stat_date
            .succ_opt()
            .and_then(|next| next.and_hms_opt(0, 0, 0))
            .ok_or(BenchmarkError::InvalidDate(stat_date))?
            .and_utc();
        Ok((start, end))
    }

    /// Computes one merchant-day summary (revenue, profit, margin), assigns
    /// the trailing-revenue cohort, and upserts the row.
    pub async fn calculate_daily_stats(
        &self,
        merchant_id: Uuid,
        stat_date: NaiveDate,
    ) -> Result<DailyMerchantStat, BenchmarkError> {
        let (day_start, day_end) = Self::day_bounds(stat_date)?;

        let day = self.repo.window_aggregates(merchant_id, day_start, day_end).await?;
        let revenue = day.gross_revenue;
        let net_profit = revenue
            - day.returns
            - day.cogs
            - day.marketing
            - day.platform_fees
            - day.admin_fees
            - day.finance_fees;
        let margin_pct = if revenue > Decimal::ZERO {
            (net_profit / revenue) * Decimal::from(100)
        } else {
            Decimal::ZERO
        };

        // Cohort membership is measured on trailing-window revenue, not the
        // single day, so a quiet Tuesday does not demote a large store.
        let trailing_start = day_end - Duration::days(self.settings.trailing_window_days);
        let trailing = self
            .repo
            .window_aggregates(merchant_id, trailing_start, day_end)
            .await?;
        let cohort = cohort_for(trailing.gross_revenue, &self.settings);

        let stat = DailyMerchantStat {
            merchant_id,
            stat_date,
            revenue,
            net_profit,
            margin_pct,
            cohort,
            computed_at: Utc::now(),
        };
        self.repo.upsert_daily_stat(&stat).await?;
        debug!(%merchant_id, %stat_date, cohort = cohort.as_str(), "daily stat upserted");
        Ok(stat)
    }

    /// Recomputes the global benchmark rows for one day across all cohorts
    /// that clear the privacy floor. Returns the number of rows written.
    pub async fn update_global_benchmarks(
        &self,
        stat_date: NaiveDate,
    ) -> Result<usize, BenchmarkError> {
        let stats = self.repo.daily_stats_for_date(stat_date).await?;
        let rows = compute_cohort_rows(&stats, &self.settings, stat_date, Utc::now());

        for row in &rows {
            self.repo.upsert_global_benchmark(row).await?;
        }
        info!(
            %stat_date,
            merchants = stats.len(),
            rows = rows.len(),
            "global benchmarks updated"
        );
        Ok(rows.len())
    }

    /// Ranks a merchant against its cohort's most recent benchmark.
    ///
    /// `None` means insufficient data: either the merchant has no daily stat
    /// yet, or its cohort never cleared the privacy floor. Callers display
    /// "percentile unknown" rather than treating this as an error.
    pub async fn user_standing(
        &self,
        merchant_id: Uuid,
        metric: BenchmarkMetric,
    ) -> Result<Option<UserStanding>, BenchmarkError> {
        let Some(stat) = self.repo.latest_daily_stat(merchant_id).await? else {
            return Ok(None);
        };
        let Some(benchmark) = self.repo.latest_benchmark(stat.cohort, metric).await? else {
            return Ok(None);
        };

        let value = match metric {
            BenchmarkMetric::Revenue => stat.revenue,
            BenchmarkMetric::NetProfit => stat.net_profit,
            BenchmarkMetric::Margin => stat.margin_pct,
        };

        Ok(Some(UserStanding {
            metric,
            value,
            cohort: stat.cohort,
            percentile_rank: rank_for(value, &benchmark),
            benchmark_median: benchmark.p50,
            benchmark_top10: benchmark.p90,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settings() -> BenchmarkSettings {
        BenchmarkSettings::default()
    }

    fn stat(revenue: Decimal, cohort: Cohort) -> DailyMerchantStat {
        DailyMerchantStat {
            merchant_id: Uuid::new_v4(),
            stat_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            revenue,
            net_profit: revenue / dec!(2),
            margin_pct: dec!(50),
            cohort,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn day_window_runs_to_the_next_midnight_exclusive() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let (start, end) = BenchmarkEngine::day_bounds(date).unwrap();

        assert_eq!(start, date.and_hms_opt(0, 0, 0).unwrap().and_utc());
        assert_eq!(
            end,
            NaiveDate::from_ymd_opt(2024, 6, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
        );

        // A posting in the last second of the day sits inside [start, end).
        let late = date.and_hms_milli_opt(23, 59, 59, 437).unwrap().and_utc();
        assert!(late >= start && late < end);
    }

    #[test]
    fn cohort_boundaries_are_half_open() {
        let s = settings();
        assert_eq!(cohort_for(dec!(0), &s), Cohort::UpTo10k);
        assert_eq!(cohort_for(dec!(9999.99), &s), Cohort::UpTo10k);
        assert_eq!(cohort_for(dec!(10000), &s), Cohort::To50k);
        assert_eq!(cohort_for(dec!(49999), &s), Cohort::To50k);
        assert_eq!(cohort_for(dec!(50000), &s), Cohort::To200k);
        assert_eq!(cohort_for(dec!(200000), &s), Cohort::Over200k);
    }

    #[test]
    fn privacy_floor_suppresses_small_cohorts() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let now = Utc::now();

        // Two merchants: below the floor of three, no rows at all.
        let two = vec![
            stat(dec!(1000), Cohort::UpTo10k),
            stat(dec!(2000), Cohort::UpTo10k),
        ];
        assert!(compute_cohort_rows(&two, &settings(), date, now).is_empty());

        // Three merchants: one row per metric.
        let three = vec![
            stat(dec!(1000), Cohort::UpTo10k),
            stat(dec!(2000), Cohort::UpTo10k),
            stat(dec!(3000), Cohort::UpTo10k),
        ];
        let rows = compute_cohort_rows(&three, &settings(), date, now);
        assert_eq!(rows.len(), BenchmarkMetric::all().len());
        assert!(rows.iter().all(|r| r.sample_size == 3));
    }

    #[test]
    fn mixed_cohorts_are_grouped_independently() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let now = Utc::now();

        let mut stats = vec![
            stat(dec!(1000), Cohort::UpTo10k),
            stat(dec!(2000), Cohort::UpTo10k),
            stat(dec!(3000), Cohort::UpTo10k),
        ];
        // A lone large merchant never gets published.
        stats.push(stat(dec!(500000), Cohort::Over200k));

        let rows = compute_cohort_rows(&stats, &settings(), date, now);
        assert!(rows.iter().all(|r| r.cohort == Cohort::UpTo10k));

        let revenue_row = rows
            .iter()
            .find(|r| r.metric == BenchmarkMetric::Revenue)
            .unwrap();
        assert_eq!(revenue_row.p50, dec!(2000));
        assert_eq!(revenue_row.p90, dec!(3000));
    }

    #[test]
    fn rank_buckets_follow_the_percentile_ladder() {
        let benchmark = GlobalBenchmark {
            stat_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            cohort: Cohort::UpTo10k,
            metric: BenchmarkMetric::Revenue,
            sample_size: 10,
            p10: dec!(100),
            p25: dec!(250),
            p50: dec!(500),
            p75: dec!(750),
            p90: dec!(900),
            computed_at: Utc::now(),
        };

        assert_eq!(rank_for(dec!(1000), &benchmark), 95);
        assert_eq!(rank_for(dec!(900), &benchmark), 95);
        assert_eq!(rank_for(dec!(800), &benchmark), 80);
        assert_eq!(rank_for(dec!(600), &benchmark), 60);
        assert_eq!(rank_for(dec!(300), &benchmark), 40);
        assert_eq!(rank_for(dec!(150), &benchmark), 20);
        assert_eq!(rank_for(dec!(50), &benchmark), 5);
    }
}
