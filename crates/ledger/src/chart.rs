use core_types::{AccountCategory, AccountType};

// Account taxonomy codes. The chart supports exactly the accounts needed for
// e-commerce profit analysis; this is not a general ledger.
pub const CASH: &str = "100";
pub const RECEIVABLE: &str = "120";
pub const REVENUE: &str = "600";
pub const RETURNS: &str = "610";
pub const COGS: &str = "621";
pub const PLATFORM_FEES: &str = "740";
pub const MARKETING: &str = "760";
pub const ADMIN_FEES: &str = "770";
pub const FINANCE_FEES: &str = "780";

/// The definition of one account in the standard chart.
#[derive(Debug, Clone, Copy)]
pub struct AccountDef {
    pub code: &'static str,
    pub name: &'static str,
    pub account_type: AccountType,
    pub category: AccountCategory,
}

/// The standard chart of accounts created for every merchant.
///
/// The `category` tag is fixed here, once, at definition time; no downstream
/// logic ever branches on code strings.
pub fn standard_chart() -> [AccountDef; 9] {
    [
        AccountDef {
            code: CASH,
            name: "Cash",
            account_type: AccountType::Asset,
            category: AccountCategory::Cash,
        },
        AccountDef {
            code: RECEIVABLE,
            name: "Accounts receivable",
            account_type: AccountType::Asset,
            category: AccountCategory::Receivable,
        },
        AccountDef {
            code: REVENUE,
            name: "Gross revenue",
            account_type: AccountType::Revenue,
            category: AccountCategory::RevenueGross,
        },
        AccountDef {
            code: RETURNS,
            name: "Returns & refunds",
            account_type: AccountType::Revenue,
            category: AccountCategory::RevenueContra,
        },
        AccountDef {
            code: COGS,
            name: "Cost of goods sold",
            account_type: AccountType::Expense,
            category: AccountCategory::Cogs,
        },
        AccountDef {
            code: PLATFORM_FEES,
            name: "Platform fees",
            account_type: AccountType::Expense,
            category: AccountCategory::PlatformFees,
        },
        AccountDef {
            code: MARKETING,
            name: "Marketing",
            account_type: AccountType::Expense,
            category: AccountCategory::Marketing,
        },
        AccountDef {
            code: ADMIN_FEES,
            name: "Admin fees",
            account_type: AccountType::Expense,
            category: AccountCategory::Admin,
        },
        AccountDef {
            code: FINANCE_FEES,
            name: "Finance fees",
            account_type: AccountType::Expense,
            category: AccountCategory::Finance,
        },
    ]
}
