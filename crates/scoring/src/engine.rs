use crate::error::ScoringError;
use analyzer::ProductAnalyzer;
use chrono::{DateTime, Duration, Utc};
use configuration::{ClassificationThresholds, ScoringWeights};
use core_types::{IssueRecord, IssueType, PainDiagnosis, PainLevel, ProductStatus};
use database::LedgerRepository;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

/// One toxic-classified variant feeding the first scoring factor.
#[derive(Debug, Clone, PartialEq)]
pub struct ToxicProduct {
    pub variant_id: String,
    pub net_sales: Decimal,
}

/// Everything the pure scoring function needs: merchant-level balances over
/// the trailing window plus the analyzer's toxic products.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringInputs {
    pub revenue: Decimal,
    pub returns: Decimal,
    pub marketing: Decimal,
    /// Platform plus admin fees (accounts 740 and 770).
    pub fees: Decimal,
    pub toxic_products: Vec<ToxicProduct>,
}

/// Maps a clamped score to its severity band.
pub fn level_for(score: u32) -> PainLevel {
    if score > 80 {
        PainLevel::Critical
    } else if score > 60 {
        PainLevel::Painful
    } else if score > 30 {
        PainLevel::Unaware
    } else {
        PainLevel::Safe
    }
}

/// Scores the five pain factors and estimates daily opportunity loss.
///
/// Each factor is capped on its own, the total is clamped to [0, 100], and
/// every ratio guards its zero denominator. Returns the diagnosis plus one
/// issue record per triggered factor for the de-duplicated issue log.
pub fn score(
    merchant_id: Uuid,
    inputs: &ScoringInputs,
    weights: &ScoringWeights,
    computed_at: DateTime<Utc>,
) -> (PainDiagnosis, Vec<IssueRecord>) {
    let window = Decimal::from(weights.window_days.max(1));
    let mut factors: Vec<(IssueType, u32)> = Vec::new();
    let mut issues: Vec<IssueRecord> = Vec::new();
    let mut total_points: u32 = 0;
    let mut opportunity_loss = Decimal::ZERO;

    // --- Factor 1: toxic products ---
    let toxic_count = inputs.toxic_products.len() as u32;
    if toxic_count > 0 {
        let points = (weights.toxic_points_per_product * toxic_count).min(weights.toxic_cap);
        factors.push((IssueType::ToxicProduct, points));
        total_points += points;
        for product in &inputs.toxic_products {
            let daily_loss = product.net_sales.abs() / window;
            opportunity_loss += daily_loss;
            issues.push(IssueRecord {
                merchant_id,
                issue_type: IssueType::ToxicProduct,
                entity_id: product.variant_id.clone(),
                daily_loss,
                detail: format!(
                    "Variant {} is toxic with net sales {}",
                    product.variant_id, product.net_sales
                ),
            });
        }
    }

    // --- Factor 2: refund bleed ---
    let return_rate_pct = if inputs.revenue > Decimal::ZERO {
        (inputs.returns / inputs.revenue) * Decimal::from(100)
    } else {
        Decimal::ZERO
    };
    if return_rate_pct > weights.refund_rate_trigger_pct {
        let excess = (return_rate_pct - weights.refund_rate_trigger_pct).ceil();
        let excess_points = excess.to_u32().unwrap_or(u32::MAX);
        let points = weights
            .refund_points_per_pct
            .saturating_mul(excess_points)
            .min(weights.refund_cap);
        factors.push((IssueType::RefundBleed, points));
        total_points += points;

        let daily_loss = (inputs.returns / window) * weights.refund_bleed_loss_factor;
        opportunity_loss += daily_loss;
        issues.push(IssueRecord {
            merchant_id,
            issue_type: IssueType::RefundBleed,
            entity_id: "merchant".to_string(),
            daily_loss,
            detail: format!("Store-wide return rate at {return_rate_pct:.1}%"),
        });
    }

    // --- Factor 3: ROAS trap (ads look efficient, store still loses money) ---
    let roas = if inputs.marketing > Decimal::ZERO {
        inputs.revenue / inputs.marketing
    } else {
        Decimal::ZERO
    };
    let net_gap = inputs.revenue - inputs.returns - inputs.marketing - inputs.fees;
    if roas > weights.roas_trigger && net_gap < Decimal::ZERO {
        factors.push((IssueType::RoasTrap, weights.roas_points));
        total_points += weights.roas_points;

        let daily_loss = net_gap.abs() / window;
        opportunity_loss += daily_loss;
        issues.push(IssueRecord {
            merchant_id,
            issue_type: IssueType::RoasTrap,
            entity_id: "merchant".to_string(),
            daily_loss,
            detail: format!("ROAS {roas:.2} with a negative net gap of {net_gap}"),
        });
    }

    // --- Factor 4: cash-flow ratio ---
    let total_expense = inputs.marketing + inputs.fees;
    if total_expense > weights.cashflow_expense_ratio * inputs.revenue {
        factors.push((IssueType::CashFlow, weights.cashflow_points));
        total_points += weights.cashflow_points;
        issues.push(IssueRecord {
            merchant_id,
            issue_type: IssueType::CashFlow,
            entity_id: "merchant".to_string(),
            daily_loss: Decimal::ZERO,
            detail: format!(
                "Expenses {total_expense} exceed {}% of revenue {}",
                weights.cashflow_expense_ratio * Decimal::from(100),
                inputs.revenue
            ),
        });
    }

    // --- Factor 5: silent fees ---
    let fee_ceiling = weights.silent_fee_ratio * inputs.revenue;
    if inputs.fees > fee_ceiling {
        factors.push((IssueType::SilentFees, weights.silent_fee_points));
        total_points += weights.silent_fee_points;

        let daily_loss = (inputs.fees - fee_ceiling) / window;
        opportunity_loss += daily_loss;
        issues.push(IssueRecord {
            merchant_id,
            issue_type: IssueType::SilentFees,
            entity_id: "merchant".to_string(),
            daily_loss,
            detail: format!("Fees {} exceed the expected ceiling {fee_ceiling}", inputs.fees),
        });
    }

    let score = total_points.min(100);
    let diagnosis = PainDiagnosis {
        merchant_id,
        score,
        level: level_for(score),
        factors,
        opportunity_loss,
        computed_at,
    };
    (diagnosis, issues)
}

/// Recomputes and caches a merchant's diagnosis over the trailing window.
#[derive(Debug, Clone)]
pub struct PainScorer {
    repo: LedgerRepository,
    weights: ScoringWeights,
    thresholds: ClassificationThresholds,
}

impl PainScorer {
    pub fn new(
        repo: LedgerRepository,
        weights: ScoringWeights,
        thresholds: ClassificationThresholds,
    ) -> Self {
        Self {
            repo,
            weights,
            thresholds,
        }
    }

    /// Diagnoses one merchant: pulls trailing-window ledger aggregates and
    /// the product analysis, scores the factors, and upserts both the latest
    /// snapshot and the issue log. Safe to call repeatedly.
    pub async fn diagnose(&self, merchant_id: Uuid) -> Result<PainDiagnosis, ScoringError> {
        let end = Utc::now();
        let start = end - Duration::days(self.weights.window_days);

        let aggregates = self.repo.window_aggregates(merchant_id, start, end).await?;

        let analyzer = ProductAnalyzer::new(self.repo.clone(), self.thresholds.clone());
        let products = analyzer.analyze(merchant_id, start, end).await?;
        let toxic_products: Vec<ToxicProduct> = products
            .iter()
            .filter(|p| p.status == ProductStatus::Toxic)
            .map(|p| ToxicProduct {
                variant_id: p.variant_id.clone(),
                net_sales: p.net_sales,
            })
            .collect();

        let inputs = ScoringInputs {
            revenue: aggregates.gross_revenue,
            returns: aggregates.returns,
            marketing: aggregates.marketing,
            fees: aggregates.platform_fees + aggregates.admin_fees,
            toxic_products,
        };
        debug!(%merchant_id, ?inputs, "scoring inputs assembled");

        let (diagnosis, issues) = score(merchant_id, &inputs, &self.weights, end);

        self.repo.upsert_pain_diagnosis(&diagnosis).await?;
        for issue in &issues {
            self.repo.upsert_issue(issue).await?;
        }

        info!(
            %merchant_id,
            score = diagnosis.score,
            level = diagnosis.level.as_str(),
            issues = issues.len(),
            "diagnosis refreshed"
        );
        Ok(diagnosis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn weights() -> ScoringWeights {
        ScoringWeights::default()
    }

    fn diagnose(inputs: &ScoringInputs) -> (PainDiagnosis, Vec<IssueRecord>) {
        score(Uuid::new_v4(), inputs, &weights(), Utc::now())
    }

    fn factor_points(diagnosis: &PainDiagnosis, issue_type: IssueType) -> Option<u32> {
        diagnosis
            .factors
            .iter()
            .find(|(t, _)| *t == issue_type)
            .map(|(_, p)| *p)
    }

    #[test]
    fn empty_merchant_scores_zero_and_safe() {
        let (diagnosis, issues) = diagnose(&ScoringInputs::default());
        assert_eq!(diagnosis.score, 0);
        assert_eq!(diagnosis.level, PainLevel::Safe);
        assert_eq!(diagnosis.opportunity_loss, Decimal::ZERO);
        assert!(issues.is_empty());
    }

    #[test]
    fn worked_example_only_silent_fees_trigger() {
        // Revenue 100k, marketing 40k, fees 20k: ROAS is 2.5 which is below
        // the 3.0 trigger, expenses 60k stay under 0.8 * 100k, but fees
        // exceed the 15k ceiling.
        let inputs = ScoringInputs {
            revenue: dec!(100000),
            returns: Decimal::ZERO,
            marketing: dec!(40000),
            fees: dec!(20000),
            toxic_products: vec![],
        };
        let (diagnosis, issues) = diagnose(&inputs);

        assert_eq!(factor_points(&diagnosis, IssueType::RoasTrap), None);
        assert_eq!(factor_points(&diagnosis, IssueType::CashFlow), None);
        assert_eq!(factor_points(&diagnosis, IssueType::SilentFees), Some(10));
        assert_eq!(diagnosis.score, 10);
        assert_eq!(diagnosis.level, PainLevel::Safe);

        // Daily bleed: (20000 - 15000) / 30.
        assert_eq!(diagnosis.opportunity_loss, dec!(5000) / dec!(30));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::SilentFees);
    }

    #[test]
    fn toxic_product_points_are_monotonic_and_capped() {
        let mut inputs = ScoringInputs {
            revenue: dec!(10000),
            ..Default::default()
        };

        let mut previous = 0;
        for n in 1..=10 {
            inputs.toxic_products.push(ToxicProduct {
                variant_id: format!("v{n}"),
                net_sales: dec!(-100),
            });
            let (diagnosis, _) = diagnose(&inputs);
            let points = factor_points(&diagnosis, IssueType::ToxicProduct).unwrap();
            assert!(points >= previous, "adding a toxic product reduced points");
            assert!(points <= 30);
            assert!(diagnosis.score <= 100);
            previous = points;
        }
        // 10 products at 5 points each hits the 30-point cap.
        assert_eq!(previous, 30);
    }

    #[test]
    fn refund_bleed_scales_with_excess_rate() {
        // 15% return rate: ceil(15 - 10) = 5 excess points at 3 each.
        let inputs = ScoringInputs {
            revenue: dec!(1000),
            returns: dec!(150),
            ..Default::default()
        };
        let (diagnosis, issues) = diagnose(&inputs);
        assert_eq!(factor_points(&diagnosis, IssueType::RefundBleed), Some(15));

        // Daily bleed: (150 / 30) * 0.2 = 1.
        let bleed = issues
            .iter()
            .find(|i| i.issue_type == IssueType::RefundBleed)
            .unwrap();
        assert_eq!(bleed.daily_loss, dec!(1.0));
    }

    #[test]
    fn refund_bleed_is_capped_at_twenty() {
        let inputs = ScoringInputs {
            revenue: dec!(1000),
            returns: dec!(500),
            ..Default::default()
        };
        let (diagnosis, _) = diagnose(&inputs);
        assert_eq!(factor_points(&diagnosis, IssueType::RefundBleed), Some(20));
    }

    #[test]
    fn roas_trap_needs_high_roas_and_negative_gap() {
        // ROAS 5, net gap 100k - 50k - 20k - 40k = -10k: triggered.
        let inputs = ScoringInputs {
            revenue: dec!(100000),
            returns: dec!(50000),
            marketing: dec!(20000),
            fees: dec!(40000),
            toxic_products: vec![],
        };
        let (diagnosis, issues) = diagnose(&inputs);
        assert_eq!(factor_points(&diagnosis, IssueType::RoasTrap), Some(25));

        let trap = issues
            .iter()
            .find(|i| i.issue_type == IssueType::RoasTrap)
            .unwrap();
        assert_eq!(trap.daily_loss, dec!(10000) / dec!(30));

        // Same ledger but profitable: no trap.
        let profitable = ScoringInputs {
            returns: Decimal::ZERO,
            fees: Decimal::ZERO,
            ..inputs
        };
        let (diagnosis, _) = diagnose(&profitable);
        assert_eq!(factor_points(&diagnosis, IssueType::RoasTrap), None);
    }

    #[test]
    fn zero_denominators_never_poison_the_score() {
        // No revenue, no marketing: every ratio guards its denominator.
        let inputs = ScoringInputs {
            returns: dec!(500),
            fees: dec!(100),
            ..Default::default()
        };
        let (diagnosis, _) = diagnose(&inputs);
        // Fees > 0.15 * 0 triggers silent fees; nothing else fires.
        assert_eq!(factor_points(&diagnosis, IssueType::RefundBleed), None);
        assert_eq!(factor_points(&diagnosis, IssueType::RoasTrap), None);
        assert!(diagnosis.score <= 100);
    }

    #[test]
    fn levels_follow_the_score_bands() {
        assert_eq!(level_for(0), PainLevel::Safe);
        assert_eq!(level_for(30), PainLevel::Safe);
        assert_eq!(level_for(31), PainLevel::Unaware);
        assert_eq!(level_for(60), PainLevel::Unaware);
        assert_eq!(level_for(61), PainLevel::Painful);
        assert_eq!(level_for(80), PainLevel::Painful);
        assert_eq!(level_for(81), PainLevel::Critical);
        assert_eq!(level_for(100), PainLevel::Critical);
    }
}
