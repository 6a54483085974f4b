//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerflow_shared::types::{AccountId, CompanyId, CurrencyCode, JournalEntryId};

use crate::coa::{AccountType, NormalBalance};

/// Account balance for reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Normal balance side.
    pub normal_balance: NormalBalance,
    /// Total debit amount.
    pub total_debit: Decimal,
    /// Total credit amount.
    pub total_credit: Decimal,
    /// Balance signed by the normal side: positive means a normal balance.
    pub balance: Decimal,
}

/// Trial balance line: the balance placed in a debit or credit column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    /// Account figures.
    #[serde(flatten)]
    pub account: AccountBalance,
    /// Debit column.
    pub debit: Decimal,
    /// Credit column.
    pub credit: Decimal,
}

/// Trial balance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Report type identifier.
    pub report_type: String,
    /// Company.
    pub company_id: CompanyId,
    /// As of date.
    pub as_of: NaiveDate,
    /// Currency code.
    pub currency: CurrencyCode,
    /// Account lines ordered by code.
    pub accounts: Vec<TrialBalanceLine>,
    /// Totals.
    pub totals: TrialBalanceTotals,
}

/// Trial balance totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

/// Report section (assets, liabilities, income, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section total.
    pub total: Decimal,
    /// Accounts in this section.
    pub accounts: Vec<AccountBalance>,
}

/// Balance sheet report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    /// Report type identifier.
    pub report_type: String,
    /// Company.
    pub company_id: CompanyId,
    /// As of date.
    pub as_of: NaiveDate,
    /// Currency code.
    pub currency: CurrencyCode,
    /// Assets section.
    pub assets: ReportSection,
    /// Liabilities section.
    pub liabilities: ReportSection,
    /// Equity section.
    pub equity: ReportSection,
    /// Income less expenses not yet closed to equity.
    pub current_earnings: Decimal,
    /// Total assets.
    pub total_assets: Decimal,
    /// Total liabilities.
    pub total_liabilities: Decimal,
    /// Equity section plus current earnings.
    pub total_equity: Decimal,
    /// Liabilities plus equity.
    pub liabilities_and_equity: Decimal,
    /// Whether assets equal liabilities plus equity.
    pub is_balanced: bool,
}

/// Income statement report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeStatementReport {
    /// Report type identifier.
    pub report_type: String,
    /// Company.
    pub company_id: CompanyId,
    /// Period start date.
    pub period_start: NaiveDate,
    /// Period end date.
    pub period_end: NaiveDate,
    /// Currency code.
    pub currency: CurrencyCode,
    /// Income section.
    pub income: ReportSection,
    /// Expense section.
    pub expenses: ReportSection,
    /// Income minus expenses.
    pub net_income: Decimal,
}

/// A posted line on one account, with its entry's header data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerLine {
    /// Owning entry.
    pub journal_entry_id: JournalEntryId,
    /// Journal number.
    pub journal_number: String,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Entry narration.
    pub narration: Option<String>,
    /// Line memo.
    pub memo: Option<String>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// Account ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLedgerEntry {
    /// Line data.
    #[serde(flatten)]
    pub line: LedgerLine,
    /// Balance before this line.
    pub previous_balance: Decimal,
    /// Balance after this line.
    pub running_balance: Decimal,
}

/// Account ledger report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLedgerReport {
    /// Report type identifier.
    pub report_type: String,
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// First date included; `None` means from the beginning.
    pub period_start: Option<NaiveDate>,
    /// Last date included.
    pub period_end: NaiveDate,
    /// Balance before `period_start`.
    pub opening_balance: Decimal,
    /// Lines in chronological order.
    pub entries: Vec<AccountLedgerEntry>,
    /// Balance after the last line.
    pub closing_balance: Decimal,
}
