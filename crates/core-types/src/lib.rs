pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{
    AccountCategory, AccountType, BenchmarkMetric, Cohort, EntryDirection, IssueType, PainLevel,
    ProductStatus,
};
pub use error::CoreError;
pub use structs::{
    Account, DailyMerchantStat, EntryAttribution, EntryDraft, GlobalBenchmark, IssueRecord,
    PainDiagnosis, ProductFinancials, TransactionRecord, UserStanding,
};
