//! Report generation service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use ledgerflow_shared::types::{AccountId, CompanyId, CurrencyCode};

use super::error::ReportError;
use super::types::{
    AccountBalance, AccountLedgerEntry, AccountLedgerReport, BalanceSheetReport,
    IncomeStatementReport, LedgerLine, ReportSection, TrialBalanceLine, TrialBalanceReport,
    TrialBalanceTotals,
};
use crate::coa::{Account, AccountType, NormalBalance};
use crate::ledger::balance::{PostedLine, RunningBalance};

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// Checks that a date range is not inverted.
    pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(())
    }

    /// Aggregates posted lines dated within `[from, to]` into account balances.
    ///
    /// Only accounts with activity in the range are returned, ordered by code.
    #[must_use]
    pub fn account_balances(
        accounts: &[Account],
        lines: &[PostedLine],
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Vec<AccountBalance> {
        let mut totals: HashMap<AccountId, (Decimal, Decimal)> = HashMap::new();
        for line in lines
            .iter()
            .filter(|l| l.entry_date <= to && from.is_none_or(|f| l.entry_date >= f))
        {
            let slot = totals
                .entry(line.account_id)
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            slot.0 += line.debit;
            slot.1 += line.credit;
        }

        let mut balances: Vec<AccountBalance> = accounts
            .iter()
            .filter_map(|account| {
                let (debit, credit) = totals.get(&account.id)?;
                Some(AccountBalance {
                    account_id: account.id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    account_type: account.account_type,
                    normal_balance: account.normal_balance,
                    total_debit: *debit,
                    total_credit: *credit,
                    balance: account.normal_balance.net_change(*debit, *credit),
                })
            })
            .collect();
        balances.sort_by(|a, b| a.code.cmp(&b.code));
        balances
    }

    /// Generates a trial balance report from account balances.
    ///
    /// A normal balance goes in the account's normal column; an abnormal
    /// (negative) balance goes in the other column.
    #[must_use]
    pub fn generate_trial_balance(
        company_id: CompanyId,
        as_of: NaiveDate,
        currency: CurrencyCode,
        accounts: Vec<AccountBalance>,
    ) -> TrialBalanceReport {
        let lines: Vec<TrialBalanceLine> = accounts
            .into_iter()
            .map(|account| {
                let amount = account.balance.abs();
                let on_normal_side = !account.balance.is_sign_negative();
                let debit_column = (account.normal_balance == NormalBalance::Debit) == on_normal_side;
                let (debit, credit) = if debit_column {
                    (amount, Decimal::ZERO)
                } else {
                    (Decimal::ZERO, amount)
                };
                TrialBalanceLine {
                    account,
                    debit,
                    credit,
                }
            })
            .collect();

        let total_debit: Decimal = lines.iter().map(|l| l.debit).sum();
        let total_credit: Decimal = lines.iter().map(|l| l.credit).sum();

        TrialBalanceReport {
            report_type: "trial_balance".to_string(),
            company_id,
            as_of,
            currency,
            accounts: lines,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                is_balanced: total_debit == total_credit,
            },
        }
    }

    /// Generates a balance sheet report from cumulative account balances.
    ///
    /// Income and expense balances are folded into equity as current earnings.
    #[must_use]
    pub fn generate_balance_sheet(
        company_id: CompanyId,
        as_of: NaiveDate,
        currency: CurrencyCode,
        accounts: Vec<AccountBalance>,
    ) -> BalanceSheetReport {
        let mut assets = ReportSection::default();
        let mut liabilities = ReportSection::default();
        let mut equity = ReportSection::default();
        let mut current_earnings = Decimal::ZERO;

        for account in accounts {
            match account.account_type {
                AccountType::Asset => Self::add_to_section(&mut assets, account),
                AccountType::Liability => Self::add_to_section(&mut liabilities, account),
                AccountType::Equity => Self::add_to_section(&mut equity, account),
                AccountType::Income => current_earnings += Self::type_signed(&account),
                AccountType::Expense => current_earnings -= Self::type_signed(&account),
            }
        }

        let total_assets = assets.total;
        let total_liabilities = liabilities.total;
        let total_equity = equity.total + current_earnings;
        let liabilities_and_equity = total_liabilities + total_equity;

        BalanceSheetReport {
            report_type: "balance_sheet".to_string(),
            company_id,
            as_of,
            currency,
            assets,
            liabilities,
            equity,
            current_earnings,
            total_assets,
            total_liabilities,
            total_equity,
            liabilities_and_equity,
            is_balanced: total_assets == liabilities_and_equity,
        }
    }

    /// Generates an income statement from balances over a date range.
    #[must_use]
    pub fn generate_income_statement(
        company_id: CompanyId,
        period_start: NaiveDate,
        period_end: NaiveDate,
        currency: CurrencyCode,
        accounts: Vec<AccountBalance>,
    ) -> IncomeStatementReport {
        let mut income = ReportSection::default();
        let mut expenses = ReportSection::default();

        for account in accounts {
            match account.account_type {
                AccountType::Income => Self::add_to_section(&mut income, account),
                AccountType::Expense => Self::add_to_section(&mut expenses, account),
                _ => {}
            }
        }

        let net_income = income.total - expenses.total;

        IncomeStatementReport {
            report_type: "income_statement".to_string(),
            company_id,
            period_start,
            period_end,
            currency,
            income,
            expenses,
            net_income,
        }
    }

    /// Generates an account ledger with running balances.
    ///
    /// `lines` must be in chronological order and dated up to `period_end`.
    /// Lines before `period_start` are folded into the opening balance.
    #[must_use]
    pub fn generate_account_ledger(
        account: &Account,
        lines: Vec<LedgerLine>,
        period_start: Option<NaiveDate>,
        period_end: NaiveDate,
    ) -> AccountLedgerReport {
        let normal = account.normal_balance;
        let (before, within): (Vec<LedgerLine>, Vec<LedgerLine>) = lines
            .into_iter()
            .filter(|l| l.entry_date <= period_end)
            .partition(|l| period_start.is_some_and(|start| l.entry_date < start));

        let opening_balance: Decimal = before
            .iter()
            .map(|l| normal.net_change(l.debit, l.credit))
            .sum();

        let mut running: Option<RunningBalance> = None;
        let mut entries = Vec::with_capacity(within.len());
        for line in within {
            let change = normal.net_change(line.debit, line.credit);
            let next = match &running {
                None => RunningBalance::first_entry(opening_balance, change),
                Some(prev) => RunningBalance::next_entry(prev, change),
            };
            entries.push(AccountLedgerEntry {
                line,
                previous_balance: next.previous_balance,
                running_balance: next.current_balance,
            });
            running = Some(next);
        }

        AccountLedgerReport {
            report_type: "account_ledger".to_string(),
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            period_start,
            period_end,
            opening_balance,
            closing_balance: running.map_or(opening_balance, |r| r.current_balance),
            entries,
        }
    }

    /// Balance signed by the account type's usual side, so contra accounts
    /// reduce their section.
    fn type_signed(account: &AccountBalance) -> Decimal {
        if account.normal_balance == account.account_type.default_normal_balance() {
            account.balance
        } else {
            -account.balance
        }
    }

    fn add_to_section(section: &mut ReportSection, account: AccountBalance) {
        section.total += Self::type_signed(&account);
        section.accounts.push(account);
    }
}
