//! Ledger service for journal entry validation and assembly.
//!
//! This module turns posting lines into journal lines and journal entries. It
//! has no storage dependencies: account lookups are supplied by the caller.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use ledgerflow_shared::types::{
    AccountId, CurrencyCode, JournalEntryId, JournalLineId, round_amount,
};

use super::entry::{EntryType, JournalEntry, JournalLine};
use super::error::LedgerError;
use super::types::{CreateEntryInput, EntryTotals, PostingLine};
use super::validation::validate_lines;
use crate::coa::{Account, NormalBalance};
use crate::workflow::types::JournalStatus;

/// Information about an account needed for validation.
#[derive(Debug, Clone)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// The account code.
    pub code: String,
    /// Whether the account is active.
    pub is_active: bool,
    /// The account's normal balance.
    pub normal_balance: NormalBalance,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            code: account.code.clone(),
            is_active: account.is_active,
            normal_balance: account.normal_balance,
        }
    }
}

/// Header fields assigned when an entry is persisted.
#[derive(Debug, Clone)]
pub struct EntryHeader {
    /// New entry id.
    pub id: JournalEntryId,
    /// Formatted journal number.
    pub journal_number: String,
    /// Fiscal year of the entry date.
    pub fiscal_year: i32,
    /// Company base currency, used when the input names none.
    pub base_currency: CurrencyCode,
}

/// Ledger service for journal entry validation and assembly.
pub struct LedgerService;

impl LedgerService {
    /// Validate posting lines and resolve their accounts.
    ///
    /// Steps:
    /// 1. Rounds every amount to the ledger scale (Banker's Rounding)
    /// 2. Validates amounts and the balance invariant
    /// 3. Resolves each account code and rejects inactive accounts
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if validation fails.
    pub fn build_lines<A>(
        entry_id: JournalEntryId,
        lines: &[PostingLine],
        tolerance: Decimal,
        mut account_lookup: A,
    ) -> Result<(Vec<JournalLine>, EntryTotals), LedgerError>
    where
        A: FnMut(&str) -> Option<AccountInfo>,
    {
        let rounded: Vec<PostingLine> = lines
            .iter()
            .map(|line| PostingLine {
                amount: round_amount(line.amount),
                ..line.clone()
            })
            .collect();

        let totals = validate_lines(&rounded, tolerance)?;

        let mut resolved = Vec::with_capacity(rounded.len());
        for (idx, line) in rounded.into_iter().enumerate() {
            let account = account_lookup(&line.account_code)
                .ok_or_else(|| LedgerError::AccountNotFound(line.account_code.clone()))?;
            if !account.is_active {
                return Err(LedgerError::AccountInactive(account.code));
            }

            let (debit_amount, credit_amount) = match line.entry_type {
                EntryType::Debit => (line.amount, Decimal::ZERO),
                EntryType::Credit => (Decimal::ZERO, line.amount),
            };

            resolved.push(JournalLine {
                id: JournalLineId::new(),
                entry_id,
                line_number: i32::try_from(idx + 1).unwrap_or(i32::MAX),
                account_id: account.id,
                account_code: account.code,
                debit_amount,
                credit_amount,
                subledger: line.subledger,
                memo: line.memo,
            });
        }

        Ok((resolved, totals))
    }

    /// Validates the idempotency key and exchange rate of an input.
    ///
    /// # Errors
    ///
    /// Returns `MissingSourceKey` or `InvalidExchangeRate`.
    pub fn validate_input(input: &CreateEntryInput) -> Result<(), LedgerError> {
        if input.source_type.trim().is_empty() || input.source_id.trim().is_empty() {
            return Err(LedgerError::MissingSourceKey);
        }
        if let Some(rate) = input.exchange_rate
            && rate <= Decimal::ZERO
        {
            return Err(LedgerError::InvalidExchangeRate);
        }
        Ok(())
    }

    /// Assemble a draft entry from validated lines.
    #[must_use]
    pub fn assemble_entry(
        input: &CreateEntryInput,
        header: EntryHeader,
        lines: Vec<JournalLine>,
        totals: EntryTotals,
        now: DateTime<Utc>,
    ) -> JournalEntry {
        JournalEntry {
            id: header.id,
            company_id: input.company_id,
            journal_number: header.journal_number,
            fiscal_year: header.fiscal_year,
            entry_date: input.entry_date,
            source_type: input.source_type.trim().to_string(),
            source_id: input.source_id.trim().to_string(),
            source_number: input.source_number.clone(),
            trigger_event: input.trigger_event.clone(),
            rule_id: input.rule_id,
            status: JournalStatus::Draft,
            total_debit: totals.debit,
            total_credit: totals.credit,
            currency: input.currency.clone().unwrap_or(header.base_currency),
            exchange_rate: input.exchange_rate.unwrap_or(Decimal::ONE),
            narration: input.narration.clone(),
            needs_reclassification: input.needs_reclassification,
            reversal_of: None,
            reversed_by: None,
            reversal_reason: None,
            cancellation_reason: None,
            posted_at: None,
            created_at: now,
            updated_at: now,
            lines,
        }
    }
}
