//! Property-based tests for journal line validation rules.

use proptest::prelude::*;
use rust_decimal::Decimal;
use ledgerflow_shared::types::{AccountId, JournalEntryId, JournalLineId};

use super::entry::{EntryType, JournalLine};
use super::error::LedgerError;
use super::types::PostingLine;
use super::validation::{validate_journal_lines, validate_lines};

const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    // 0.0001 to 1,000,000.0000
    (1i64..10_000_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// Strategy to generate a negative amount.
fn negative_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

/// Strategy to generate an entry type.
fn entry_type_strategy() -> impl Strategy<Value = EntryType> {
    prop_oneof![Just(EntryType::Debit), Just(EntryType::Credit)]
}

fn make_line(entry_type: EntryType, amount: Decimal) -> PostingLine {
    PostingLine {
        account_code: "1000".to_string(),
        entry_type,
        amount,
        subledger: None,
        memo: None,
    }
}

fn make_journal_line(debit: Decimal, credit: Decimal) -> JournalLine {
    JournalLine {
        id: JournalLineId::new(),
        entry_id: JournalEntryId::new(),
        line_number: 1,
        account_id: AccountId::new(),
        account_code: "1000".to_string(),
        debit_amount: debit,
        credit_amount: credit,
        subledger: None,
        memo: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Zero amount lines are rejected regardless of side.
    #[test]
    fn prop_zero_amount_rejected(
        entry_type in entry_type_strategy(),
        other_amount in positive_amount(),
    ) {
        let lines = vec![
            make_line(entry_type.opposite(), other_amount),
            make_line(entry_type, Decimal::ZERO),
        ];

        let result = validate_lines(&lines, TOLERANCE);
        prop_assert!(
            matches!(result, Err(LedgerError::ZeroAmount { line: 2 })),
            "Zero amount should be rejected, got: {:?}",
            result
        );
    }

    /// Negative amount lines are rejected.
    #[test]
    fn prop_negative_amount_rejected(
        entry_type in entry_type_strategy(),
        neg_amount in negative_amount(),
    ) {
        let lines = vec![make_line(entry_type, neg_amount)];
        let result = validate_lines(&lines, TOLERANCE);
        prop_assert!(
            matches!(result, Err(LedgerError::NegativeAmount { .. })),
            "Negative amount should be rejected, got: {:?}",
            result
        );
    }

    /// Any split of one amount into debits against a single credit validates,
    /// and the reported totals are exactly the two sides.
    #[test]
    fn prop_split_debits_balance(
        parts in prop::collection::vec(positive_amount(), 1..8),
    ) {
        let total: Decimal = parts.iter().copied().sum();
        let mut lines: Vec<PostingLine> = parts
            .iter()
            .map(|amount| make_line(EntryType::Debit, *amount))
            .collect();
        lines.push(make_line(EntryType::Credit, total));

        let totals = validate_lines(&lines, TOLERANCE).unwrap();
        prop_assert_eq!(totals.debit, total);
        prop_assert_eq!(totals.credit, total);
    }

    /// A difference at or above the tolerance is rejected.
    #[test]
    fn prop_imbalance_rejected(
        amount in positive_amount(),
        skew in positive_amount(),
    ) {
        let lines = vec![
            make_line(EntryType::Debit, amount + skew),
            make_line(EntryType::Credit, amount),
        ];
        let rejected = matches!(
            validate_lines(&lines, TOLERANCE),
            Err(LedgerError::UnbalancedEntry { .. })
        );
        prop_assert!(rejected);
    }

    /// Stored lines with both sides set are rejected.
    #[test]
    fn prop_double_sided_journal_line_rejected(
        debit in positive_amount(),
        credit in positive_amount(),
    ) {
        let lines = vec![make_journal_line(debit, credit)];
        let invalid = matches!(
            validate_journal_lines(&lines, TOLERANCE),
            Err(LedgerError::InvalidEntryType { line: 1 })
        );
        prop_assert!(invalid);
    }

    /// Mirrored single-sided stored lines validate.
    #[test]
    fn prop_single_sided_journal_lines_accepted(amount in positive_amount()) {
        let lines = vec![
            make_journal_line(amount, Decimal::ZERO),
            make_journal_line(Decimal::ZERO, amount),
        ];
        prop_assert!(validate_journal_lines(&lines, TOLERANCE).is_ok());
    }
}
