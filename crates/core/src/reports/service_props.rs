//! Property-based tests for report generation.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use ledgerflow_shared::types::{AccountId, CompanyId, CurrencyCode};

use super::service::ReportService;
use crate::coa::{Account, AccountType};
use crate::ledger::balance::PostedLine;

fn make_account(idx: usize, account_type: AccountType) -> Account {
    let now = Utc::now();
    Account {
        id: AccountId::new(),
        company_id: CompanyId::new(),
        code: format!("{}", 1000 + idx),
        name: format!("Account {idx}"),
        account_type,
        normal_balance: account_type.default_normal_balance(),
        parent_id: None,
        depth: 0,
        path: format!("{}", 1000 + idx),
        balance: Decimal::ZERO,
        is_active: true,
        is_suspense: false,
        created_at: now,
        updated_at: now,
    }
}

fn chart() -> Vec<Account> {
    AccountType::ALL
        .iter()
        .enumerate()
        .map(|(idx, t)| make_account(idx, *t))
        .collect()
}

/// Balanced two-line entries: (debit account, credit account, amount, day).
fn arb_entries() -> impl Strategy<Value = Vec<(usize, usize, Decimal, u32)>> {
    prop::collection::vec(
        (0usize..5, 0usize..5, (1i64..10_000_000).prop_map(|n| Decimal::new(n, 2)), 1u32..28),
        1..30,
    )
}

fn post(accounts: &[Account], entries: &[(usize, usize, Decimal, u32)]) -> Vec<PostedLine> {
    entries
        .iter()
        .flat_map(|(dr, cr, amount, day)| {
            let date = NaiveDate::from_ymd_opt(2024, 5, *day).unwrap();
            [
                PostedLine {
                    account_id: accounts[*dr].id,
                    entry_date: date,
                    debit: *amount,
                    credit: Decimal::ZERO,
                },
                PostedLine {
                    account_id: accounts[*cr].id,
                    entry_date: date,
                    debit: Decimal::ZERO,
                    credit: *amount,
                },
            ]
        })
        .collect()
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced postings always yield a balanced trial balance.
    #[test]
    fn prop_trial_balance_balances(entries in arb_entries()) {
        let accounts = chart();
        let lines = post(&accounts, &entries);
        let balances = ReportService::account_balances(&accounts, &lines, None, as_of());
        let report = ReportService::generate_trial_balance(
            CompanyId::new(),
            as_of(),
            CurrencyCode::default(),
            balances,
        );
        prop_assert!(report.totals.is_balanced);
    }

    /// Assets always equal liabilities plus equity plus current earnings.
    #[test]
    fn prop_balance_sheet_balances(entries in arb_entries()) {
        let accounts = chart();
        let lines = post(&accounts, &entries);
        let balances = ReportService::account_balances(&accounts, &lines, None, as_of());
        let report = ReportService::generate_balance_sheet(
            CompanyId::new(),
            as_of(),
            CurrencyCode::default(),
            balances,
        );
        prop_assert!(report.is_balanced);
    }

    /// Net income equals balance sheet current earnings over the same lines.
    #[test]
    fn prop_net_income_matches_current_earnings(entries in arb_entries()) {
        let accounts = chart();
        let lines = post(&accounts, &entries);
        let balances = ReportService::account_balances(&accounts, &lines, None, as_of());
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let income = ReportService::generate_income_statement(
            CompanyId::new(),
            start,
            as_of(),
            CurrencyCode::default(),
            balances.clone(),
        );
        let sheet = ReportService::generate_balance_sheet(
            CompanyId::new(),
            as_of(),
            CurrencyCode::default(),
            balances,
        );
        prop_assert_eq!(income.net_income, sheet.current_earnings);
    }
}
