use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five fundamental account types of double-entry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "ASSET",
            AccountType::Liability => "LIABILITY",
            AccountType::Equity => "EQUITY",
            AccountType::Revenue => "REVENUE",
            AccountType::Expense => "EXPENSE",
        }
    }
}

impl FromStr for AccountType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASSET" => Ok(AccountType::Asset),
            "LIABILITY" => Ok(AccountType::Liability),
            "EQUITY" => Ok(AccountType::Equity),
            "REVENUE" => Ok(AccountType::Revenue),
            "EXPENSE" => Ok(AccountType::Expense),
            other => Err(CoreError::InvalidInput(
                "account_type".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// A closed classification tag assigned to every account at creation time.
///
/// Downstream engines switch on this enum instead of matching on account
/// code prefixes, so the set of categories an aggregation can encounter is
/// known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountCategory {
    Cash,
    Receivable,
    RevenueGross,
    RevenueContra,
    Cogs,
    Marketing,
    PlatformFees,
    Admin,
    Finance,
}

impl AccountCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountCategory::Cash => "CASH",
            AccountCategory::Receivable => "RECEIVABLE",
            AccountCategory::RevenueGross => "REVENUE_GROSS",
            AccountCategory::RevenueContra => "REVENUE_CONTRA",
            AccountCategory::Cogs => "COGS",
            AccountCategory::Marketing => "MARKETING",
            AccountCategory::PlatformFees => "PLATFORM_FEES",
            AccountCategory::Admin => "ADMIN",
            AccountCategory::Finance => "FINANCE",
        }
    }
}

impl FromStr for AccountCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(AccountCategory::Cash),
            "RECEIVABLE" => Ok(AccountCategory::Receivable),
            "REVENUE_GROSS" => Ok(AccountCategory::RevenueGross),
            "REVENUE_CONTRA" => Ok(AccountCategory::RevenueContra),
            "COGS" => Ok(AccountCategory::Cogs),
            "MARKETING" => Ok(AccountCategory::Marketing),
            "PLATFORM_FEES" => Ok(AccountCategory::PlatformFees),
            "ADMIN" => Ok(AccountCategory::Admin),
            "FINANCE" => Ok(AccountCategory::Finance),
            other => Err(CoreError::InvalidInput(
                "account_category".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// The side of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryDirection {
    Debit,
    Credit,
}

impl EntryDirection {
    /// Returns the opposite side of the entry.
    pub fn opposite(&self) -> Self {
        match self {
            EntryDirection::Debit => EntryDirection::Credit,
            EntryDirection::Credit => EntryDirection::Debit,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryDirection::Debit => "DEBIT",
            EntryDirection::Credit => "CREDIT",
        }
    }
}

impl FromStr for EntryDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBIT" => Ok(EntryDirection::Debit),
            "CREDIT" => Ok(EntryDirection::Credit),
            other => Err(CoreError::InvalidInput(
                "entry_direction".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// The health classification assigned to a product by the profitability analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    Healthy,
    Warning,
    Toxic,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Healthy => "healthy",
            ProductStatus::Warning => "warning",
            ProductStatus::Toxic => "toxic",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "healthy" => Ok(ProductStatus::Healthy),
            "warning" => Ok(ProductStatus::Warning),
            "toxic" => Ok(ProductStatus::Toxic),
            other => Err(CoreError::InvalidInput(
                "product_status".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// The overall severity band of a merchant's pain diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PainLevel {
    Safe,
    Unaware,
    Painful,
    Critical,
}

impl PainLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PainLevel::Safe => "safe",
            PainLevel::Unaware => "unaware",
            PainLevel::Painful => "painful",
            PainLevel::Critical => "critical",
        }
    }
}

impl FromStr for PainLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "safe" => Ok(PainLevel::Safe),
            "unaware" => Ok(PainLevel::Unaware),
            "painful" => Ok(PainLevel::Painful),
            "critical" => Ok(PainLevel::Critical),
            other => Err(CoreError::InvalidInput(
                "pain_level".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// The kind of risk factor a diagnosed issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueType {
    ToxicProduct,
    RefundBleed,
    RoasTrap,
    CashFlow,
    SilentFees,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::ToxicProduct => "toxic_product",
            IssueType::RefundBleed => "refund_bleed",
            IssueType::RoasTrap => "roas_trap",
            IssueType::CashFlow => "cash_flow",
            IssueType::SilentFees => "silent_fees",
        }
    }
}

impl FromStr for IssueType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toxic_product" => Ok(IssueType::ToxicProduct),
            "refund_bleed" => Ok(IssueType::RefundBleed),
            "roas_trap" => Ok(IssueType::RoasTrap),
            "cash_flow" => Ok(IssueType::CashFlow),
            "silent_fees" => Ok(IssueType::SilentFees),
            other => Err(CoreError::InvalidInput(
                "issue_type".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// A merchant revenue-size bucket used for fair percentile comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cohort {
    UpTo10k,
    To50k,
    To200k,
    Over200k,
}

impl Cohort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cohort::UpTo10k => "0-10k",
            Cohort::To50k => "10k-50k",
            Cohort::To200k => "50k-200k",
            Cohort::Over200k => "200k+",
        }
    }
}

impl FromStr for Cohort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0-10k" => Ok(Cohort::UpTo10k),
            "10k-50k" => Ok(Cohort::To50k),
            "50k-200k" => Ok(Cohort::To200k),
            "200k+" => Ok(Cohort::Over200k),
            other => Err(CoreError::InvalidInput(
                "cohort".to_string(),
                other.to_string(),
            )),
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric tracked by the cross-merchant benchmark tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BenchmarkMetric {
    Revenue,
    NetProfit,
    Margin,
}

impl BenchmarkMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            BenchmarkMetric::Revenue => "revenue",
            BenchmarkMetric::NetProfit => "net_profit",
            BenchmarkMetric::Margin => "margin",
        }
    }

    /// All metrics the benchmark batch job aggregates.
    pub fn all() -> [BenchmarkMetric; 3] {
        [
            BenchmarkMetric::Revenue,
            BenchmarkMetric::NetProfit,
            BenchmarkMetric::Margin,
        ]
    }
}

impl FromStr for BenchmarkMetric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revenue" => Ok(BenchmarkMetric::Revenue),
            "net_profit" => Ok(BenchmarkMetric::NetProfit),
            "margin" => Ok(BenchmarkMetric::Margin),
            other => Err(CoreError::InvalidInput(
                "benchmark_metric".to_string(),
                other.to_string(),
            )),
        }
    }
}

impl fmt::Display for BenchmarkMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
