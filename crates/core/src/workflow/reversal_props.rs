//! Property-based tests for ReversalService.

use proptest::prelude::*;
use rust_decimal::Decimal;

use ledgerflow_shared::types::{AccountId, JournalEntryId, JournalLineId};

use crate::ledger::entry::JournalLine;
use crate::workflow::reversal::ReversalService;

/// Strategy for generating random positive Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|n| Decimal::new(n, 4))
}

fn make_line(number: i32, debit: Decimal, credit: Decimal) -> JournalLine {
    JournalLine {
        id: JournalLineId::new(),
        entry_id: JournalEntryId::new(),
        line_number: number,
        account_id: AccountId::new(),
        account_code: format!("{}", 1000 + number),
        debit_amount: debit,
        credit_amount: credit,
        subledger: None,
        memo: None,
    }
}

/// Strategy for balanced line sets: several debits against one credit.
fn arb_balanced_lines() -> impl Strategy<Value = Vec<JournalLine>> {
    prop::collection::vec(arb_amount(), 1..6).prop_map(|amounts| {
        let total: Decimal = amounts.iter().copied().sum();
        let mut lines: Vec<JournalLine> = amounts
            .iter()
            .zip(1..)
            .map(|(amount, number)| make_line(number, *amount, Decimal::ZERO))
            .collect();
        let last = i32::try_from(lines.len()).unwrap_or(i32::MAX) + 1;
        lines.push(make_line(last, Decimal::ZERO, total));
        lines
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Reversing lines are the exact mirror of the original.
    #[test]
    fn prop_reversal_is_mirror(lines in arb_balanced_lines()) {
        let reversed = ReversalService::mirror_lines(&lines, JournalEntryId::new());
        prop_assert!(ReversalService::is_mirror(&lines, &reversed));
    }

    /// Original plus reversal nets every account to zero.
    #[test]
    fn prop_reversal_nets_to_zero(lines in arb_balanced_lines()) {
        let reversed = ReversalService::mirror_lines(&lines, JournalEntryId::new());
        for (a, b) in lines.iter().zip(&reversed) {
            let net = a.signed_amount() + b.signed_amount();
            prop_assert_eq!(net, Decimal::ZERO);
        }
    }

    /// Mirroring twice yields the original amounts.
    #[test]
    fn prop_double_mirror_restores(lines in arb_balanced_lines()) {
        let once = ReversalService::mirror_lines(&lines, JournalEntryId::new());
        let twice = ReversalService::mirror_lines(&once, JournalEntryId::new());
        for (a, b) in lines.iter().zip(&twice) {
            prop_assert_eq!(a.debit_amount, b.debit_amount);
            prop_assert_eq!(a.credit_amount, b.credit_amount);
        }
    }
}
