use super::*;
use crate::coa::AccountType;
use crate::engine::{Disposition, MemoryLedgerStore};
use crate::ledger::EntryType;
use crate::posting::{Attributes, Condition, TemplateLine};
use crate::workflow::JournalStatus;
use rust_decimal_macros::dec;
use serde_json::json;

type Engine = PostingEngine<MemoryLedgerStore>;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn setup() -> (Engine, Company) {
    let engine = PostingEngine::new(MemoryLedgerStore::new(), EngineConfig::default());
    let company = engine
        .create_company(NewCompany {
            name: "Acme Traders".to_string(),
            base_currency: None,
            fiscal_year_start_month: None,
        })
        .await
        .unwrap();

    for (code, name, account_type) in [
        ("1100", "Trade Receivables", AccountType::Asset),
        ("1110", "Bank", AccountType::Asset),
        ("2210", "CGST Output", AccountType::Liability),
        ("2220", "SGST Output", AccountType::Liability),
        ("3100", "Capital", AccountType::Equity),
        ("4100", "Sales", AccountType::Income),
        ("5100", "Rent", AccountType::Expense),
    ] {
        engine
            .create_account(company.id, NewAccount::new(code, name, account_type))
            .await
            .unwrap();
    }
    (engine, company)
}

fn intra_state_rule() -> NewPostingRule {
    NewPostingRule {
        code: "INV-B2B-INTRA".to_string(),
        source_type: "invoice".to_string(),
        trigger_event: "on_finalize".to_string(),
        description: Some("Domestic B2B Intra-state".to_string()),
        condition: Condition::all_eq([("is_export", false), ("is_intra_state", true)]),
        template: vec![
            TemplateLine::debit(AccountRef::literal("1100"), "total_amount"),
            TemplateLine::credit(AccountRef::literal("4100"), "subtotal"),
            TemplateLine::credit(AccountRef::literal("2210"), "total_cgst").skip_if_zero(),
            TemplateLine::credit(AccountRef::literal("2220"), "total_sgst").skip_if_zero(),
        ],
        priority: 10,
        effective_from: date(2024, 4, 1),
        effective_to: None,
        is_fallback: false,
    }
}

fn fallback_rule() -> NewPostingRule {
    NewPostingRule {
        code: "INV-SUSPENSE".to_string(),
        source_type: "invoice".to_string(),
        trigger_event: "*".to_string(),
        description: Some("Unmatched invoice".to_string()),
        condition: Condition::always(),
        template: vec![
            TemplateLine::debit(AccountRef::literal("9900-ASSET"), "total_amount"),
            TemplateLine::credit(AccountRef::literal("9900-INCOME"), "total_amount"),
        ],
        priority: 1000,
        effective_from: date(2024, 4, 1),
        effective_to: None,
        is_fallback: true,
    }
}

fn invoice_event(
    company_id: CompanyId,
    source_id: &str,
    attributes: serde_json::Value,
) -> PostingEvent {
    PostingEvent {
        company_id,
        source_type: "invoice".to_string(),
        source_id: source_id.to_string(),
        source_number: Some(format!("INV/{source_id}")),
        trigger_event: "on_finalize".to_string(),
        attributes: Attributes::from_json(attributes).unwrap(),
        event_date: date(2024, 5, 15),
        narration: None,
        currency: None,
        exchange_rate: None,
    }
}

fn intra_state_invoice() -> serde_json::Value {
    json!({
        "is_export": false,
        "is_intra_state": true,
        "total_amount": 11800,
        "subtotal": 10000,
        "total_cgst": 900,
        "total_sgst": 900,
    })
}

fn manual_input(company_id: CompanyId, source_id: &str, amount: Decimal) -> CreateEntryInput {
    CreateEntryInput {
        company_id,
        source_type: "manual".to_string(),
        source_id: source_id.to_string(),
        source_number: None,
        trigger_event: None,
        entry_date: date(2024, 5, 10),
        narration: Some("Capital introduced".to_string()),
        currency: None,
        exchange_rate: None,
        lines: vec![
            PostingLine::debit("1110", amount),
            PostingLine::credit("3100", amount),
        ],
        auto_post: false,
        rule_id: None,
        needs_reclassification: false,
    }
}

async fn balance_of(engine: &Engine, company_id: CompanyId, code: &str) -> Decimal {
    engine.account_by_code(company_id, code).await.unwrap().balance
}

#[tokio::test]
async fn test_company_gets_suspense_accounts() {
    let (engine, company) = setup().await;
    let suspense: Vec<String> = engine
        .accounts(company.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.is_suspense)
        .map(|a| a.code)
        .collect();
    assert_eq!(suspense.len(), 5);
    assert!(suspense.contains(&"9900-EXPENSE".to_string()));

    let created = engine.ensure_suspense_accounts(company.id).await.unwrap();
    assert!(created.is_empty());
}

#[tokio::test]
async fn test_intra_state_invoice_posts_gst_split() {
    let (engine, company) = setup().await;
    engine.create_rule(company.id, intra_state_rule()).await.unwrap();

    let result = engine
        .process_event(invoice_event(company.id, "inv-1", intra_state_invoice()))
        .await
        .unwrap();

    assert!(result.created);
    assert_eq!(result.outcome, Some(UsageOutcome::Matched));
    assert_eq!(result.rule_code.as_deref(), Some("INV-B2B-INTRA"));

    let entry = result.entry;
    assert_eq!(entry.status, JournalStatus::Posted);
    assert_eq!(entry.journal_number, "JV/2024-25/00001");
    assert_eq!(entry.total_debit, dec!(11800));
    assert_eq!(entry.total_credit, dec!(11800));
    assert!(!entry.needs_reclassification);

    let lines: Vec<(&str, EntryType, Decimal)> = entry
        .lines
        .iter()
        .map(|l| (l.account_code.as_str(), l.entry_type(), l.amount()))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("1100", EntryType::Debit, dec!(11800)),
            ("4100", EntryType::Credit, dec!(10000)),
            ("2210", EntryType::Credit, dec!(900)),
            ("2220", EntryType::Credit, dec!(900)),
        ]
    );

    assert_eq!(balance_of(&engine, company.id, "1100").await, dec!(11800));
    assert_eq!(balance_of(&engine, company.id, "4100").await, dec!(10000));
    assert_eq!(balance_of(&engine, company.id, "2210").await, dec!(900));

    let logs = engine
        .usage_logs(company.id, &UsageLogFilter::default(), 10)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].outcome, UsageOutcome::Matched);
    assert_eq!(logs[0].journal_entry_id, Some(entry.id));
    assert!(logs[0].rule_snapshot.is_some());
}

#[tokio::test]
async fn test_same_event_twice_creates_one_entry() {
    let (engine, company) = setup().await;
    engine.create_rule(company.id, intra_state_rule()).await.unwrap();
    let event = invoice_event(company.id, "inv-1", intra_state_invoice());

    let first = engine.process_event(event.clone()).await.unwrap();
    let second = engine.process_event(event).await.unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.entry.id, second.entry.id);
    assert_eq!(engine.store().entry_count(company.id).await, 1);
    assert_eq!(balance_of(&engine, company.id, "1100").await, dec!(11800));
}

#[tokio::test]
async fn test_concurrent_duplicates_create_one_entry() {
    let (engine, company) = setup().await;
    engine.create_rule(company.id, intra_state_rule()).await.unwrap();
    let event = invoice_event(company.id, "inv-1", intra_state_invoice());

    let (a, b) = tokio::join!(
        engine.process_event(event.clone()),
        engine.process_event(event.clone())
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.entry.id, b.entry.id);
    assert!(a.created ^ b.created);
    assert_eq!(engine.store().entry_count(company.id).await, 1);
}

#[tokio::test]
async fn test_unmatched_event_uses_suspense_fallback() {
    let (engine, company) = setup().await;
    engine.create_rule(company.id, intra_state_rule()).await.unwrap();
    engine.create_rule(company.id, fallback_rule()).await.unwrap();

    let export = json!({"is_export": true, "is_intra_state": false, "total_amount": 5000});
    let result = engine
        .process_event(invoice_event(company.id, "inv-2", export))
        .await
        .unwrap();

    assert_eq!(result.outcome, Some(UsageOutcome::FallbackUsed));
    assert!(result.entry.needs_reclassification);
    assert_eq!(result.entry.status, JournalStatus::Posted);
    assert_eq!(balance_of(&engine, company.id, "9900-ASSET").await, dec!(5000));
    assert_eq!(balance_of(&engine, company.id, "9900-INCOME").await, dec!(5000));

    let gaps = engine
        .usage_logs(
            company.id,
            &UsageLogFilter {
                outcome: Some(UsageOutcome::NoRuleMatched),
                ..UsageLogFilter::default()
            },
            10,
        )
        .await
        .unwrap();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].journal_entry_id, Some(result.entry.id));

    let reclass = EntryFilter {
        needs_reclassification: Some(true),
        ..EntryFilter::default()
    };
    let flagged = engine.entries(company.id, &reclass).await.unwrap();
    assert_eq!(flagged.len(), 1);
    assert_eq!(engine.count_entries(company.id, &reclass).await.unwrap(), 1);
    assert_eq!(
        engine
            .count_entries(company.id, &EntryFilter::default())
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_fallback_posts_full_amount_when_attribute_keys_differ() {
    let (engine, company) = setup().await;
    engine.create_rule(company.id, intra_state_rule()).await.unwrap();
    engine.create_rule(company.id, fallback_rule()).await.unwrap();

    let result = engine
        .process_event(invoice_event(company.id, "inv-6", json!({"grand_total": 500})))
        .await
        .unwrap();

    assert_eq!(result.outcome, Some(UsageOutcome::FallbackUsed));
    assert!(result.entry.needs_reclassification);
    assert_eq!(result.entry.lines.len(), 2);
    assert_eq!(balance_of(&engine, company.id, "9900-ASSET").await, dec!(500));
    assert_eq!(balance_of(&engine, company.id, "9900-INCOME").await, dec!(500));
}

#[tokio::test]
async fn test_fallback_rule_must_post_to_suspense_accounts() {
    let (engine, company) = setup().await;
    let real_accounts = NewPostingRule {
        template: vec![
            TemplateLine::debit(AccountRef::literal("1100"), "total_amount"),
            TemplateLine::credit(AccountRef::literal("4100"), "total_amount"),
        ],
        ..fallback_rule()
    };
    let err = engine.create_rule(company.id, real_accounts).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Rule(RuleError::FallbackNotSuspense { ref code, line: 1 }) if code == "1100"
    ));
    assert_eq!(err.disposition(), Disposition::NeedsConfiguration);

    let placeholder = NewPostingRule {
        template: vec![
            TemplateLine::debit(AccountRef::literal("9900-ASSET"), "total_amount"),
            TemplateLine::credit(AccountRef::placeholder("income_account"), "total_amount"),
        ],
        ..fallback_rule()
    };
    let err = engine.create_rule(company.id, placeholder).await.unwrap_err();
    assert!(matches!(err, EngineError::Rule(RuleError::InvalidRule(_))));

    assert!(engine.list_rules(company.id, Some("invoice")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unmatched_event_without_fallback_is_rejected_and_logged() {
    let (engine, company) = setup().await;
    engine.create_rule(company.id, intra_state_rule()).await.unwrap();

    let export = json!({"is_export": true, "total_amount": 5000});
    let err = engine
        .process_event(invoice_event(company.id, "inv-3", export))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Rule(RuleError::NoRuleMatched { .. })));
    assert_eq!(err.disposition(), Disposition::NeedsConfiguration);
    assert_eq!(engine.store().entry_count(company.id).await, 0);

    let logs = engine
        .usage_logs(company.id, &UsageLogFilter::default(), 10)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].outcome, UsageOutcome::NoRuleMatched);
    assert!(logs[0].error_message.is_some());
}

#[tokio::test]
async fn test_expansion_failure_rolls_back_and_logs() {
    let (engine, company) = setup().await;
    engine.create_rule(company.id, intra_state_rule()).await.unwrap();

    let missing_subtotal = json!({
        "is_export": false,
        "is_intra_state": true,
        "total_amount": 11800,
    });
    let err = engine
        .process_event(invoice_event(company.id, "inv-4", missing_subtotal))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Rule(RuleError::MissingAmountField { .. })));
    assert_eq!(engine.store().entry_count(company.id).await, 0);
    assert_eq!(balance_of(&engine, company.id, "1100").await, Decimal::ZERO);

    let logs = engine
        .usage_logs(company.id, &UsageLogFilter::default(), 10)
        .await
        .unwrap();
    assert_eq!(logs[0].outcome, UsageOutcome::Failed);
    assert_eq!(logs[0].rule_code.as_deref(), Some("INV-B2B-INTRA"));
}

#[tokio::test]
async fn test_lower_priority_number_wins_regardless_of_creation_order() {
    let (engine, company) = setup().await;
    let generic = NewPostingRule {
        code: "INV-GENERIC".to_string(),
        condition: Condition::always(),
        template: vec![
            TemplateLine::debit(AccountRef::literal("1100"), "total_amount"),
            TemplateLine::credit(AccountRef::literal("4100"), "total_amount"),
        ],
        priority: 50,
        ..intra_state_rule()
    };
    engine.create_rule(company.id, generic).await.unwrap();
    engine.create_rule(company.id, intra_state_rule()).await.unwrap();

    let result = engine
        .process_event(invoice_event(company.id, "inv-5", intra_state_invoice()))
        .await
        .unwrap();
    assert_eq!(result.rule_code.as_deref(), Some("INV-B2B-INTRA"));
}

#[tokio::test]
async fn test_rule_versioning_closes_previous_window() {
    let (engine, company) = setup().await;
    let v1 = engine.create_rule(company.id, intra_state_rule()).await.unwrap();

    let v2 = engine
        .create_rule_version(
            company.id,
            "INV-B2B-INTRA",
            NewPostingRule {
                effective_from: date(2024, 7, 1),
                ..intra_state_rule()
            },
        )
        .await
        .unwrap();
    assert_eq!(v2.version, 2);

    let rules = engine.list_rules(company.id, Some("invoice")).await.unwrap();
    let closed = rules.iter().find(|r| r.id == v1.id).unwrap();
    assert_eq!(closed.effective_to, Some(date(2024, 6, 30)));

    let duplicate = engine.create_rule(company.id, intra_state_rule()).await;
    assert!(matches!(
        duplicate,
        Err(EngineError::Rule(RuleError::DuplicateRule { version: 2, .. }))
    ));
}

#[tokio::test]
async fn test_rule_with_unknown_literal_account_is_rejected() {
    let (engine, company) = setup().await;
    let mut rule = intra_state_rule();
    rule.template[1] = TemplateLine::credit(AccountRef::literal("4999"), "subtotal");

    let err = engine.create_rule(company.id, rule).await.unwrap_err();
    assert!(matches!(err, EngineError::Coa(CoaError::NotFound(_))));
}

#[tokio::test]
async fn test_manual_entry_lifecycle() {
    let (engine, company) = setup().await;

    let created = engine
        .create_from_lines(manual_input(company.id, "cap-1", dec!(500)))
        .await
        .unwrap();
    assert!(created.created);
    let entry = created.entry;
    assert_eq!(entry.status, JournalStatus::Draft);
    assert_eq!(balance_of(&engine, company.id, "1110").await, Decimal::ZERO);

    let submitted = engine.submit(company.id, entry.id).await.unwrap();
    assert_eq!(submitted.status, JournalStatus::PendingApproval);

    let edit = engine
        .update_lines(company.id, entry.id, vec![PostingLine::debit("1110", dec!(1))])
        .await;
    assert!(matches!(
        edit,
        Err(EngineError::Workflow(WorkflowError::InvalidTransition { .. }))
    ));

    let posted = engine.post(company.id, entry.id).await.unwrap();
    assert_eq!(posted.status, JournalStatus::Posted);
    assert!(posted.posted_at.is_some());
    assert_eq!(balance_of(&engine, company.id, "1110").await, dec!(500));
    assert_eq!(balance_of(&engine, company.id, "3100").await, dec!(500));

    let again = engine.post(company.id, entry.id).await;
    assert!(matches!(
        again,
        Err(EngineError::Workflow(WorkflowError::InvalidTransition { .. }))
    ));

    let edit = engine
        .update_lines(company.id, entry.id, vec![PostingLine::debit("1110", dec!(1))])
        .await;
    assert!(matches!(
        edit,
        Err(EngineError::Workflow(WorkflowError::ImmutableEntry { .. }))
    ));
}

#[tokio::test]
async fn test_update_lines_revalidates_draft() {
    let (engine, company) = setup().await;
    let entry = engine
        .create_from_lines(manual_input(company.id, "cap-2", dec!(500)))
        .await
        .unwrap()
        .entry;

    let unbalanced = engine
        .update_lines(
            company.id,
            entry.id,
            vec![
                PostingLine::debit("1110", dec!(700)),
                PostingLine::credit("3100", dec!(600)),
            ],
        )
        .await;
    assert!(matches!(
        unbalanced,
        Err(EngineError::Ledger(LedgerError::UnbalancedEntry { .. }))
    ));

    let updated = engine
        .update_lines(
            company.id,
            entry.id,
            vec![
                PostingLine::debit("1110", dec!(700)),
                PostingLine::credit("3100", dec!(700)),
            ],
        )
        .await
        .unwrap();
    assert_eq!(updated.total_debit, dec!(700));
    assert_eq!(engine.entry(company.id, entry.id).await.unwrap().lines.len(), 2);
}

#[tokio::test]
async fn test_cancelled_source_can_be_posted_again() {
    let (engine, company) = setup().await;
    let first = engine
        .create_from_lines(manual_input(company.id, "cap-3", dec!(100)))
        .await
        .unwrap()
        .entry;

    let missing_reason = engine.cancel(company.id, first.id, "  ".to_string()).await;
    assert!(matches!(
        missing_reason,
        Err(EngineError::Workflow(WorkflowError::ReasonRequired))
    ));

    let cancelled = engine
        .cancel(company.id, first.id, "Entered twice".to_string())
        .await
        .unwrap();
    assert_eq!(cancelled.status, JournalStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Entered twice"));

    let second = engine
        .create_from_lines(manual_input(company.id, "cap-3", dec!(100)))
        .await
        .unwrap();
    assert!(second.created);
    assert_ne!(second.entry.id, first.id);
    assert_eq!(second.entry.journal_number, "JV/2024-25/00002");
}

#[tokio::test]
async fn test_reverse_twice_fails_and_mirrors_lines() {
    let (engine, company) = setup().await;
    engine.create_rule(company.id, intra_state_rule()).await.unwrap();
    let original = engine
        .process_event(invoice_event(company.id, "inv-6", intra_state_invoice()))
        .await
        .unwrap()
        .entry;

    let missing_reason = engine
        .reverse(company.id, original.id, String::new(), None)
        .await;
    assert!(matches!(
        missing_reason,
        Err(EngineError::Workflow(WorkflowError::ReasonRequired))
    ));

    let result = engine
        .reverse(company.id, original.id, "Invoice voided".to_string(), None)
        .await
        .unwrap();
    assert_eq!(result.original.status, JournalStatus::Reversed);
    assert_eq!(result.original.reversed_by, Some(result.reversal.id));
    assert_eq!(result.reversal.reversal_of, Some(original.id));
    assert_eq!(result.reversal.status, JournalStatus::Posted);
    assert!(ReversalService::is_mirror(&original.lines, &result.reversal.lines));

    for code in ["1100", "4100", "2210", "2220"] {
        assert_eq!(balance_of(&engine, company.id, code).await, Decimal::ZERO);
    }

    let again = engine
        .reverse(company.id, original.id, "Again".to_string(), None)
        .await;
    assert!(matches!(
        again,
        Err(EngineError::Workflow(WorkflowError::AlreadyReversed { .. }))
    ));
}

#[tokio::test]
async fn test_reverse_requires_posted_entry() {
    let (engine, company) = setup().await;
    let draft = engine
        .create_from_lines(manual_input(company.id, "cap-4", dec!(100)))
        .await
        .unwrap()
        .entry;

    let result = engine
        .reverse(company.id, draft.id, "Wrong".to_string(), None)
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Workflow(WorkflowError::InvalidTransition { .. }))
    ));
}

#[tokio::test]
async fn test_inactive_account_rejects_posting() {
    let (engine, company) = setup().await;
    let rent = engine.account_by_code(company.id, "5100").await.unwrap();
    engine.deactivate_account(company.id, rent.id).await.unwrap();

    let mut input = manual_input(company.id, "rent-1", dec!(100));
    input.lines = vec![
        PostingLine::debit("5100", dec!(100)),
        PostingLine::credit("1110", dec!(100)),
    ];
    let err = engine.create_from_lines(input).await.unwrap_err();
    assert!(matches!(err, EngineError::Ledger(LedgerError::AccountInactive(_))));
    assert_eq!(err.disposition(), Disposition::NeedsConfiguration);
}

#[tokio::test]
async fn test_balances_match_recomputation_and_reconcile_repairs_drift() {
    let (engine, company) = setup().await;
    engine.create_rule(company.id, intra_state_rule()).await.unwrap();
    for month in [5, 8, 11] {
        let mut event = invoice_event(company.id, &format!("inv-r{month}"), intra_state_invoice());
        event.event_date = date(2024, month, 10);
        engine.process_event(event).await.unwrap();
    }
    let mut input = manual_input(company.id, "cap-r", dec!(2500));
    input.auto_post = true;
    engine.create_from_lines(input).await.unwrap();

    let clean = engine.reconcile(company.id).await.unwrap();
    assert!(clean.is_clean(), "unexpected drift: {:?}", clean.drifts);

    let receivables = engine.account_by_code(company.id, "1100").await.unwrap();
    assert_eq!(receivables.balance, dec!(35400));
    engine
        .store()
        .corrupt_balance(receivables.id, dec!(1))
        .await;

    let repaired = engine.reconcile(company.id).await.unwrap();
    assert_eq!(repaired.drifts.len(), 1);
    assert_eq!(repaired.drifts[0].stored, dec!(1));
    assert_eq!(repaired.drifts[0].recomputed, dec!(35400));
    assert_eq!(balance_of(&engine, company.id, "1100").await, dec!(35400));
}

#[tokio::test]
async fn test_backdated_post_shifts_later_periods() {
    let (engine, company) = setup().await;
    let mut may = manual_input(company.id, "cap-may", dec!(100));
    may.auto_post = true;
    engine.create_from_lines(may).await.unwrap();

    let mut july = manual_input(company.id, "cap-jul", dec!(50));
    july.entry_date = date(2024, 7, 3);
    july.auto_post = true;
    engine.create_from_lines(july).await.unwrap();

    let mut april = manual_input(company.id, "cap-apr", dec!(25));
    april.entry_date = date(2024, 4, 2);
    april.auto_post = true;
    engine.create_from_lines(april).await.unwrap();

    let bank = engine.account_by_code(company.id, "1110").await.unwrap();
    let mut rows: Vec<PeriodBalance> = engine
        .period_balances(company.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.account_id == bank.id)
        .collect();
    rows.sort_by_key(PeriodBalance::key);

    let figures: Vec<(u32, Decimal, Decimal)> =
        rows.iter().map(|r| (r.period_month, r.opening, r.closing)).collect();
    assert_eq!(
        figures,
        vec![
            (1, Decimal::ZERO, dec!(25)),
            (2, dec!(25), dec!(125)),
            (4, dec!(125), dec!(175)),
        ]
    );
    assert_eq!(bank.balance, dec!(175));
    assert!(engine.reconcile(company.id).await.unwrap().is_clean());
}

#[tokio::test]
async fn test_reports_reflect_posted_entries() {
    let (engine, company) = setup().await;
    engine.create_rule(company.id, intra_state_rule()).await.unwrap();
    engine
        .process_event(invoice_event(company.id, "inv-7", intra_state_invoice()))
        .await
        .unwrap();
    engine
        .create_from_lines(manual_input(company.id, "draft-only", dec!(999)))
        .await
        .unwrap();

    let as_of = date(2025, 3, 31);
    let trial = engine.trial_balance(company.id, as_of).await.unwrap();
    assert_eq!(trial.totals.total_debit, dec!(11800));
    assert_eq!(trial.totals.total_credit, dec!(11800));
    assert!(trial.totals.is_balanced);

    let sheet = engine.balance_sheet(company.id, as_of).await.unwrap();
    assert!(sheet.is_balanced);
    assert_eq!(sheet.current_earnings, dec!(10000));

    let income = engine
        .income_statement(company.id, date(2024, 4, 1), as_of)
        .await
        .unwrap();
    assert_eq!(income.net_income, dec!(10000));

    let bad_range = engine
        .income_statement(company.id, as_of, date(2024, 4, 1))
        .await;
    assert!(matches!(
        bad_range,
        Err(EngineError::Report(ReportError::InvalidDateRange { .. }))
    ));

    let receivables = engine.account_by_code(company.id, "1100").await.unwrap();
    let ledger = engine
        .account_ledger(company.id, receivables.id, None, as_of)
        .await
        .unwrap();
    assert_eq!(ledger.entries.len(), 1);
    assert_eq!(ledger.closing_balance, dec!(11800));
}
