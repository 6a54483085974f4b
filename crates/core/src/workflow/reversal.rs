//! Reversal service for posted journal entries.
//!
//! A reversal is a new posted entry whose lines mirror the original:
//! every debit becomes a credit of the same amount and vice versa.

use ledgerflow_shared::types::{JournalEntryId, JournalLineId};

use crate::ledger::entry::{JournalEntry, JournalLine};

/// Source type recorded on reversing entries.
pub const REVERSAL_SOURCE_TYPE: &str = "reversal";

/// Stateless service for creating reversing lines.
pub struct ReversalService;

impl ReversalService {
    /// Create reversing lines by swapping debits and credits.
    ///
    /// Accounts, amounts, subledger tags and memos are preserved; each
    /// line gets a fresh id under `reversal_id`.
    #[must_use]
    pub fn mirror_lines(original: &[JournalLine], reversal_id: JournalEntryId) -> Vec<JournalLine> {
        original
            .iter()
            .map(|line| JournalLine {
                id: JournalLineId::new(),
                entry_id: reversal_id,
                line_number: line.line_number,
                account_id: line.account_id,
                account_code: line.account_code.clone(),
                debit_amount: line.credit_amount,
                credit_amount: line.debit_amount,
                subledger: line.subledger.clone(),
                memo: line.memo.clone(),
            })
            .collect()
    }

    /// Narration for the reversing entry.
    #[must_use]
    pub fn narration(original: &JournalEntry, reason: &str) -> String {
        format!(
            "Reversal of {}. Reason: {}",
            original.journal_number,
            reason.trim()
        )
    }

    /// Returns true if `reversal` is the exact mirror of `original`.
    #[must_use]
    pub fn is_mirror(original: &[JournalLine], reversal: &[JournalLine]) -> bool {
        original.len() == reversal.len()
            && original.iter().zip(reversal).all(|(a, b)| {
                a.account_id == b.account_id
                    && a.debit_amount == b.credit_amount
                    && a.credit_amount == b.debit_amount
            })
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use ledgerflow_shared::types::AccountId;
    use rust_decimal_macros::dec;

    fn line(number: i32, debit: Decimal, credit: Decimal) -> JournalLine {
        JournalLine {
            id: JournalLineId::new(),
            entry_id: JournalEntryId::new(),
            line_number: number,
            account_id: AccountId::new(),
            account_code: format!("{}", 1000 + number),
            debit_amount: debit,
            credit_amount: credit,
            subledger: None,
            memo: Some("Office supplies".to_string()),
        }
    }

    fn balanced_lines() -> Vec<JournalLine> {
        vec![
            line(1, dec!(100), Decimal::ZERO),
            line(2, Decimal::ZERO, dec!(60)),
            line(3, Decimal::ZERO, dec!(40)),
        ]
    }

    #[test]
    fn test_mirror_swaps_sides() {
        let original = balanced_lines();
        let reversal_id = JournalEntryId::new();
        let mirrored = ReversalService::mirror_lines(&original, reversal_id);

        assert_eq!(mirrored.len(), 3);
        assert_eq!(mirrored[0].credit_amount, dec!(100));
        assert_eq!(mirrored[0].debit_amount, Decimal::ZERO);
        assert_eq!(mirrored[1].debit_amount, dec!(60));
        assert!(mirrored.iter().all(|l| l.entry_id == reversal_id));
        assert!(ReversalService::is_mirror(&original, &mirrored));
    }

    #[test]
    fn test_mirror_preserves_accounts_and_memo() {
        let original = balanced_lines();
        let mirrored = ReversalService::mirror_lines(&original, JournalEntryId::new());
        for (a, b) in original.iter().zip(&mirrored) {
            assert_eq!(a.account_id, b.account_id);
            assert_eq!(a.memo, b.memo);
            assert_ne!(a.id, b.id);
        }
    }

    #[test]
    fn test_is_mirror_detects_mismatch() {
        let original = balanced_lines();
        let mut mirrored = ReversalService::mirror_lines(&original, JournalEntryId::new());
        mirrored[1].debit_amount = dec!(61);
        assert!(!ReversalService::is_mirror(&original, &mirrored));
    }
}
