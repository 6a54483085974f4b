//! Account and period balance maintenance.
//!
//! Posting an entry changes balances in two places: the account's running
//! balance and the account's period rollup for the entry date. Both use the
//! same sign convention: a line on the account's normal side increases the
//! balance, a line on the other side decreases it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use ledgerflow_shared::types::{AccountId, CompanyId, PeriodBalanceId};

use super::entry::JournalLine;
use super::error::LedgerError;
use super::fiscal::{FiscalCalendar, PeriodKey};
use crate::coa::NormalBalance;

/// Aggregated effect of one entry on one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountDelta {
    /// The account.
    pub account_id: AccountId,
    /// Sum of debit amounts on the account.
    pub debit: Decimal,
    /// Sum of credit amounts on the account.
    pub credit: Decimal,
    /// Signed change to the running balance.
    pub signed: Decimal,
}

/// Period rollup of one account: (account, fiscal year, period).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBalance {
    /// Row ID.
    pub id: PeriodBalanceId,
    /// Owning company.
    pub company_id: CompanyId,
    /// The account.
    pub account_id: AccountId,
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Period number within the fiscal year, 1-12.
    pub period_month: u32,
    /// Closing balance of the account's previous row.
    pub opening: Decimal,
    /// Debits posted in the period.
    pub period_debit: Decimal,
    /// Credits posted in the period.
    pub period_credit: Decimal,
    /// `opening` plus the signed net movement of the period.
    pub closing: Decimal,
}

impl PeriodBalance {
    /// The row's period key.
    #[must_use]
    pub fn key(&self) -> PeriodKey {
        PeriodKey {
            fiscal_year: self.fiscal_year,
            period: self.period_month,
        }
    }

    /// Returns true if both rows hold the same figures for the same period.
    #[must_use]
    pub fn same_figures(&self, other: &Self) -> bool {
        self.account_id == other.account_id
            && self.key() == other.key()
            && self.opening == other.opening
            && self.period_debit == other.period_debit
            && self.period_credit == other.period_credit
            && self.closing == other.closing
    }
}

/// Running balance information for an account ledger line.
///
/// - `current_balance[N] = previous_balance[N] + change`
/// - `previous_balance[N] = current_balance[N-1]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Number of lines applied so far.
    pub sequence: i64,
    /// Balance before this line.
    pub previous_balance: Decimal,
    /// Balance after this line.
    pub current_balance: Decimal,
}

impl RunningBalance {
    /// Running balance after the first line, starting from `opening`.
    #[must_use]
    pub fn first_entry(opening: Decimal, balance_change: Decimal) -> Self {
        Self {
            sequence: 1,
            previous_balance: opening,
            current_balance: opening + balance_change,
        }
    }

    /// Running balance after the next line.
    #[must_use]
    pub fn next_entry(previous: &Self, balance_change: Decimal) -> Self {
        Self {
            sequence: previous.sequence + 1,
            previous_balance: previous.current_balance,
            current_balance: previous.current_balance + balance_change,
        }
    }
}

/// A posted line reduced to what balance rebuilding needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostedLine {
    /// The account.
    pub account_id: AccountId,
    /// Entry date of the owning entry.
    pub entry_date: NaiveDate,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// Balances recomputed from posted lines.
#[derive(Debug, Clone, Default)]
pub struct RebuiltBalances {
    /// Running balance per account with activity.
    pub balances: BTreeMap<AccountId, Decimal>,
    /// Period rows, ordered by account then period.
    pub periods: Vec<PeriodBalance>,
}

/// Stateless balance arithmetic used by the posting engine and reconciliation.
pub struct BalanceMaintainer;

impl BalanceMaintainer {
    /// Aggregates an entry's lines into one delta per account.
    ///
    /// Deltas come back sorted by account id, which is also the lock order.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if a line's account has no known normal balance.
    pub fn account_deltas(
        lines: &[JournalLine],
        normal_balances: &HashMap<AccountId, NormalBalance>,
    ) -> Result<Vec<AccountDelta>, LedgerError> {
        let mut grouped: BTreeMap<AccountId, AccountDelta> = BTreeMap::new();
        for line in lines {
            let normal = normal_balances
                .get(&line.account_id)
                .ok_or_else(|| LedgerError::AccountNotFound(line.account_code.clone()))?;
            let delta = grouped.entry(line.account_id).or_insert(AccountDelta {
                account_id: line.account_id,
                debit: Decimal::ZERO,
                credit: Decimal::ZERO,
                signed: Decimal::ZERO,
            });
            delta.debit += line.debit_amount;
            delta.credit += line.credit_amount;
            delta.signed += normal.signed_delta(line.entry_type(), line.amount());
        }
        Ok(grouped.into_values().collect())
    }

    /// Applies a movement to an account's period rows.
    ///
    /// `prior` is the account's latest row strictly before `key`; `from_key`
    /// holds the rows at or after `key` in ascending order. Returns every row
    /// that must be written: the target row (new or updated) and every later
    /// row, whose opening and closing shift by the same net amount.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn apply_to_periods(
        company_id: CompanyId,
        account_id: AccountId,
        normal: NormalBalance,
        key: PeriodKey,
        debit: Decimal,
        credit: Decimal,
        prior: Option<&PeriodBalance>,
        from_key: Vec<PeriodBalance>,
    ) -> Vec<PeriodBalance> {
        let net = normal.net_change(debit, credit);
        let mut rows = from_key.into_iter().peekable();
        let mut out = Vec::new();

        match rows.next_if(|row| row.key() == key) {
            Some(mut row) => {
                row.period_debit += debit;
                row.period_credit += credit;
                row.closing += net;
                out.push(row);
            }
            None => {
                let opening = prior.map_or(Decimal::ZERO, |p| p.closing);
                out.push(PeriodBalance {
                    id: PeriodBalanceId::new(),
                    company_id,
                    account_id,
                    fiscal_year: key.fiscal_year,
                    period_month: key.period,
                    opening,
                    period_debit: debit,
                    period_credit: credit,
                    closing: opening + net,
                });
            }
        }

        for mut later in rows {
            later.opening += net;
            later.closing += net;
            out.push(later);
        }
        out
    }

    /// Recomputes running balances and period rows from scratch.
    ///
    /// Lines whose account has no known normal balance are skipped.
    #[must_use]
    pub fn rebuild(
        company_id: CompanyId,
        lines: &[PostedLine],
        normal_balances: &HashMap<AccountId, NormalBalance>,
        calendar: &FiscalCalendar,
    ) -> RebuiltBalances {
        let mut movements: BTreeMap<(AccountId, PeriodKey), (Decimal, Decimal)> = BTreeMap::new();
        for line in lines {
            if !normal_balances.contains_key(&line.account_id) {
                continue;
            }
            let slot = movements
                .entry((line.account_id, calendar.period_key(line.entry_date)))
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            slot.0 += line.debit;
            slot.1 += line.credit;
        }

        let mut rebuilt = RebuiltBalances::default();
        for ((account_id, key), (debit, credit)) in movements {
            let normal = normal_balances[&account_id];
            let balance = rebuilt.balances.entry(account_id).or_insert(Decimal::ZERO);
            let opening = *balance;
            *balance += normal.net_change(debit, credit);
            rebuilt.periods.push(PeriodBalance {
                id: PeriodBalanceId::new(),
                company_id,
                account_id,
                fiscal_year: key.fiscal_year,
                period_month: key.period,
                opening,
                period_debit: debit,
                period_credit: credit,
                closing: *balance,
            });
        }
        rebuilt
    }
}
