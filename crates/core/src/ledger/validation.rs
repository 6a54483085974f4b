//! Business rule validation for journal lines.

use rust_decimal::Decimal;

use super::entry::JournalLine;
use super::error::LedgerError;
use super::types::{EntryTotals, PostingLine};

/// Validates posting lines and returns their totals.
///
/// Checks, in order: at least one line, every amount strictly positive, and
/// `|debit - credit| < tolerance`.
///
/// # Errors
///
/// Returns the first rule the lines break.
pub fn validate_lines(lines: &[PostingLine], tolerance: Decimal) -> Result<EntryTotals, LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::NoLines);
    }

    for (idx, line) in lines.iter().enumerate() {
        if line.amount.is_zero() {
            return Err(LedgerError::ZeroAmount { line: idx + 1 });
        }
        if line.amount.is_sign_negative() {
            return Err(LedgerError::NegativeAmount { line: idx + 1 });
        }
    }

    let totals = EntryTotals::of(lines);
    if !totals.is_balanced_within(tolerance) {
        return Err(LedgerError::UnbalancedEntry {
            debit: totals.debit,
            credit: totals.credit,
        });
    }

    Ok(totals)
}

/// Validates stored journal lines: each carries exactly one positive side and
/// the entry balances within `tolerance`.
///
/// # Errors
///
/// Returns `InvalidEntryType` for a double- or zero-sided line, `NoLines` or
/// `UnbalancedEntry` otherwise.
pub fn validate_journal_lines(lines: &[JournalLine], tolerance: Decimal) -> Result<(), LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::NoLines);
    }

    let mut debit = Decimal::ZERO;
    let mut credit = Decimal::ZERO;
    for (idx, line) in lines.iter().enumerate() {
        if !line.is_single_sided() {
            return Err(LedgerError::InvalidEntryType { line: idx + 1 });
        }
        debit += line.debit_amount;
        credit += line.credit_amount;
    }

    if (debit - credit).abs() >= tolerance {
        return Err(LedgerError::UnbalancedEntry { debit, credit });
    }
    Ok(())
}
