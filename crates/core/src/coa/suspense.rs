//! Per-company suspense accounts.
//!
//! Every company carries one suspense account per account type. The fallback
//! posting rules park unmatched events on these accounts until someone
//! reclassifies them.

use super::types::{AccountType, NewAccount};

/// Code prefix shared by all suspense accounts.
pub const SUSPENSE_CODE_PREFIX: &str = "9900";

/// Returns the suspense account code for an account type, e.g. `9900-ASSET`.
#[must_use]
pub fn suspense_code(account_type: AccountType) -> String {
    format!(
        "{SUSPENSE_CODE_PREFIX}-{}",
        account_type.as_str().to_ascii_uppercase()
    )
}

/// Creation input for the suspense account of `account_type`.
#[must_use]
pub fn suspense_account(account_type: AccountType) -> NewAccount {
    let name = match account_type {
        AccountType::Asset => "Suspense - Assets",
        AccountType::Liability => "Suspense - Liabilities",
        AccountType::Equity => "Suspense - Equity",
        AccountType::Income => "Suspense - Income",
        AccountType::Expense => "Suspense - Expenses",
    };
    NewAccount {
        is_suspense: true,
        ..NewAccount::new(suspense_code(account_type), name, account_type)
    }
}

/// Suspense accounts whose codes are absent from `existing_codes`.
pub fn missing_suspense_accounts<'a, I>(existing_codes: I) -> Vec<NewAccount>
where
    I: IntoIterator<Item = &'a str>,
{
    let existing: Vec<&str> = existing_codes.into_iter().collect();
    AccountType::ALL
        .into_iter()
        .filter(|t| !existing.contains(&suspense_code(*t).as_str()))
        .map(suspense_account)
        .collect()
}
