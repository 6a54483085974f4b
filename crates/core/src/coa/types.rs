//! Chart of accounts domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use ledgerflow_shared::types::{AccountId, CompanyId, CurrencyCode};

use crate::ledger::entry::EntryType;

/// Top-level classification of a ledger account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned (cash, receivables, inventory).
    Asset,
    /// Obligations owed (payables, tax payable).
    Liability,
    /// Owner's interest (capital, retained earnings).
    Equity,
    /// Revenue and other income.
    Income,
    /// Costs and expenses.
    Expense,
}

impl AccountType {
    /// All account types in reporting order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Income,
        Self::Expense,
    ];

    /// Returns the string representation of the account type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses an account type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "income" | "revenue" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Conventional normal balance for the type.
    ///
    /// - Asset/Expense: debit-normal
    /// - Liability/Equity/Income: credit-normal
    #[must_use]
    pub fn default_normal_balance(&self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Income => NormalBalance::Credit,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side on which an account's balance naturally grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Debits increase the balance.
    Debit,
    /// Credits increase the balance.
    Credit,
}

impl NormalBalance {
    /// Returns the string representation of the normal balance.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    /// Parses a normal balance from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debit" => Some(Self::Debit),
            "credit" => Some(Self::Credit),
            _ => None,
        }
    }

    /// Returns true if a line on `side` increases an account with this normal balance.
    #[must_use]
    pub fn matches(self, side: EntryType) -> bool {
        matches!(
            (self, side),
            (Self::Debit, EntryType::Debit) | (Self::Credit, EntryType::Credit)
        )
    }

    /// Signed balance change for a line of `amount` on `side`.
    #[must_use]
    pub fn signed_delta(self, side: EntryType, amount: Decimal) -> Decimal {
        if self.matches(side) { amount } else { -amount }
    }

    /// Net balance change for aggregated debit and credit totals.
    #[must_use]
    pub fn net_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

impl fmt::Display for NormalBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A company owning a chart of accounts and a journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Company ID.
    pub id: CompanyId,
    /// Display name.
    pub name: String,
    /// Functional currency of the books.
    pub base_currency: CurrencyCode,
    /// Calendar month (1-12) in which the fiscal year starts.
    pub fiscal_year_start_month: u32,
}

/// Input for onboarding a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompany {
    /// Display name.
    pub name: String,
    /// Functional currency; the configured default when absent.
    #[serde(default)]
    pub base_currency: Option<CurrencyCode>,
    /// Fiscal year start month; the configured default when absent.
    #[serde(default)]
    pub fiscal_year_start_month: Option<u32>,
}

/// A ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Account code, unique per company.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Normal balance, fixed at creation.
    pub normal_balance: NormalBalance,
    /// Parent account, if any.
    pub parent_id: Option<AccountId>,
    /// Depth in the hierarchy (roots are 0).
    pub depth: i32,
    /// Materialized path of codes from the root, joined with `/`.
    pub path: String,
    /// Running balance, signed by the normal balance.
    pub balance: Decimal,
    /// Inactive accounts reject new postings.
    pub is_active: bool,
    /// One of the per-company suspense accounts.
    pub is_suspense: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Overrides the type's conventional normal balance (contra accounts).
    #[serde(default)]
    pub normal_balance: Option<NormalBalance>,
    /// Code of the parent account.
    #[serde(default)]
    pub parent_code: Option<String>,
    /// Marks the account as a suspense account.
    #[serde(default)]
    pub is_suspense: bool,
}

impl NewAccount {
    /// Creates input for a root account with the conventional normal balance.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            normal_balance: None,
            parent_code: None,
            is_suspense: false,
        }
    }

    /// Places the account under `parent_code`.
    #[must_use]
    pub fn under(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }
}

impl Account {
    /// Builds an account from creation input and its resolved parent.
    ///
    /// Depth and path are derived from the parent; the balance starts at zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is blank, or the parent belongs to another
    /// company or has a different account type.
    pub fn from_new(
        company_id: CompanyId,
        input: NewAccount,
        parent: Option<&Account>,
    ) -> Result<Self, super::CoaError> {
        use super::CoaError;

        let code = input.code.trim().to_string();
        if code.is_empty() || code.contains('/') {
            return Err(CoaError::InvalidCode(input.code));
        }
        if input.name.trim().is_empty() {
            return Err(CoaError::InvalidName(code));
        }

        let (parent_id, depth, path) = match parent {
            Some(parent) => {
                if parent.company_id != company_id {
                    return Err(CoaError::ParentNotFound(parent.code.clone()));
                }
                if parent.account_type != input.account_type {
                    return Err(CoaError::ParentTypeMismatch {
                        code,
                        account_type: input.account_type,
                        parent_type: parent.account_type,
                    });
                }
                (
                    Some(parent.id),
                    parent.depth + 1,
                    format!("{}/{code}", parent.path),
                )
            }
            None => (None, 0, code.clone()),
        };

        let now = Utc::now();
        Ok(Self {
            id: AccountId::new(),
            company_id,
            normal_balance: input
                .normal_balance
                .unwrap_or_else(|| input.account_type.default_normal_balance()),
            code,
            name: input.name.trim().to_string(),
            account_type: input.account_type,
            parent_id,
            depth,
            path,
            balance: Decimal::ZERO,
            is_active: true,
            is_suspense: input.is_suspense,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(AccountType::Asset, NormalBalance::Debit)]
    #[case(AccountType::Expense, NormalBalance::Debit)]
    #[case(AccountType::Liability, NormalBalance::Credit)]
    #[case(AccountType::Equity, NormalBalance::Credit)]
    #[case(AccountType::Income, NormalBalance::Credit)]
    fn test_default_normal_balance(#[case] account_type: AccountType, #[case] expected: NormalBalance) {
        assert_eq!(account_type.default_normal_balance(), expected);
    }

    #[test]
    fn test_account_type_parse() {
        assert_eq!(AccountType::parse("ASSET"), Some(AccountType::Asset));
        assert_eq!(AccountType::parse("revenue"), Some(AccountType::Income));
        assert_eq!(AccountType::parse("other"), None);
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(
            NormalBalance::Debit.signed_delta(EntryType::Debit, dec!(100)),
            dec!(100)
        );
        assert_eq!(
            NormalBalance::Debit.signed_delta(EntryType::Credit, dec!(100)),
            dec!(-100)
        );
        assert_eq!(
            NormalBalance::Credit.signed_delta(EntryType::Credit, dec!(40)),
            dec!(40)
        );
        assert_eq!(NormalBalance::Credit.net_change(dec!(10), dec!(25)), dec!(15));
    }

    #[test]
    fn test_from_new_root_and_child() {
        let company = CompanyId::new();
        let root =
            Account::from_new(company, NewAccount::new("1000", "Assets", AccountType::Asset), None)
                .unwrap();
        assert_eq!(root.depth, 0);
        assert_eq!(root.path, "1000");
        assert_eq!(root.normal_balance, NormalBalance::Debit);

        let child = Account::from_new(
            company,
            NewAccount::new("1100", "Receivables", AccountType::Asset).under("1000"),
            Some(&root),
        )
        .unwrap();
        assert_eq!(child.parent_id, Some(root.id));
        assert_eq!(child.depth, 1);
        assert_eq!(child.path, "1000/1100");
    }

    #[test]
    fn test_from_new_rejects_type_mismatch() {
        let company = CompanyId::new();
        let root =
            Account::from_new(company, NewAccount::new("1000", "Assets", AccountType::Asset), None)
                .unwrap();
        let err = Account::from_new(
            company,
            NewAccount::new("2100", "Payables", AccountType::Liability).under("1000"),
            Some(&root),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "PARENT_TYPE_MISMATCH");
    }

    #[test]
    fn test_from_new_contra_account_keeps_override() {
        let mut input = NewAccount::new("1590", "Accumulated Depreciation", AccountType::Asset);
        input.normal_balance = Some(NormalBalance::Credit);
        let account = Account::from_new(CompanyId::new(), input, None).unwrap();
        assert_eq!(account.normal_balance, NormalBalance::Credit);
    }

    #[test]
    fn test_from_new_rejects_blank_code() {
        let err = Account::from_new(
            CompanyId::new(),
            NewAccount::new("  ", "Nothing", AccountType::Asset),
            None,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ACCOUNT_CODE");
    }
}
