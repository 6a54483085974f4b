//! Property-based tests for incremental balance maintenance.
//!
//! Posting lines one at a time, in any date order, must leave the same running
//! balances and period rows as rebuilding everything from the posted lines.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

use ledgerflow_shared::types::{AccountId, CompanyId, JournalEntryId, JournalLineId};

use super::balance::{BalanceMaintainer, PeriodBalance, PostedLine};
use super::entry::JournalLine;
use super::fiscal::FiscalCalendar;
use crate::coa::NormalBalance;

/// Strategy for a posted line: (account index, day offset, is_debit, amount).
fn line_strategy() -> impl Strategy<Value = (usize, u64, bool, Decimal)> {
    (
        0usize..3,
        0u64..730,
        any::<bool>(),
        (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2)),
    )
}

fn journal_line(account_id: AccountId, is_debit: bool, amount: Decimal) -> JournalLine {
    JournalLine {
        id: JournalLineId::new(),
        entry_id: JournalEntryId::new(),
        line_number: 1,
        account_id,
        account_code: account_id.to_string(),
        debit_amount: if is_debit { amount } else { Decimal::ZERO },
        credit_amount: if is_debit { Decimal::ZERO } else { amount },
        subledger: None,
        memo: None,
    }
}

/// Mimics a store: applies one line to an in-memory list of period rows.
fn post_incrementally(
    company: CompanyId,
    rows: &mut Vec<PeriodBalance>,
    balances: &mut HashMap<AccountId, Decimal>,
    normals: &HashMap<AccountId, NormalBalance>,
    calendar: &FiscalCalendar,
    line: &PostedLine,
) {
    let jl = journal_line(line.account_id, line.debit > Decimal::ZERO, line.debit.max(line.credit));
    for delta in BalanceMaintainer::account_deltas(std::slice::from_ref(&jl), normals).unwrap() {
        *balances.entry(delta.account_id).or_insert(Decimal::ZERO) += delta.signed;

        let key = calendar.period_key(line.entry_date);
        let mut account_rows: Vec<PeriodBalance> = rows
            .iter()
            .filter(|r| r.account_id == delta.account_id)
            .cloned()
            .collect();
        account_rows.sort_by_key(PeriodBalance::key);
        let prior = account_rows.iter().rev().find(|r| r.key() < key).cloned();
        let from_key: Vec<PeriodBalance> =
            account_rows.into_iter().filter(|r| r.key() >= key).collect();

        let written = BalanceMaintainer::apply_to_periods(
            company,
            delta.account_id,
            normals[&delta.account_id],
            key,
            delta.debit,
            delta.credit,
            prior.as_ref(),
            from_key,
        );
        for row in written {
            rows.retain(|r| !(r.account_id == row.account_id && r.key() == row.key()));
            rows.push(row);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_incremental_matches_rebuild(
        raw in prop::collection::vec(line_strategy(), 1..40),
    ) {
        let company = CompanyId::new();
        let calendar = FiscalCalendar::new(4).unwrap();
        let accounts = [AccountId::new(), AccountId::new(), AccountId::new()];
        let normals = HashMap::from([
            (accounts[0], NormalBalance::Debit),
            (accounts[1], NormalBalance::Credit),
            (accounts[2], NormalBalance::Credit),
        ]);
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        let lines: Vec<PostedLine> = raw
            .iter()
            .map(|(idx, offset, is_debit, amount)| PostedLine {
                account_id: accounts[*idx],
                entry_date: start + Days::new(*offset),
                debit: if *is_debit { *amount } else { Decimal::ZERO },
                credit: if *is_debit { Decimal::ZERO } else { *amount },
            })
            .collect();

        let mut rows = Vec::new();
        let mut balances = HashMap::new();
        for line in &lines {
            post_incrementally(company, &mut rows, &mut balances, &normals, &calendar, line);
        }

        let rebuilt = BalanceMaintainer::rebuild(company, &lines, &normals, &calendar);

        prop_assert_eq!(rebuilt.balances.len(), balances.len());
        for (account, balance) in &rebuilt.balances {
            prop_assert_eq!(balances[account], *balance);
        }

        prop_assert_eq!(rebuilt.periods.len(), rows.len());
        for expected in &rebuilt.periods {
            let actual = rows
                .iter()
                .find(|r| r.account_id == expected.account_id && r.key() == expected.key())
                .unwrap();
            prop_assert!(actual.same_figures(expected), "{:?} != {:?}", actual, expected);
        }
    }
}
