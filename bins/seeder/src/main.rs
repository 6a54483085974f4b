//! Demo data seeder for Ledgerflow development and testing.
//!
//! Seeds a demo company with a small Indian GST chart of accounts, the
//! invoice and receipt posting rules, and suspense fallback rules. Everything
//! goes through the posting engine so the same validation applies as for API
//! calls. Running it twice is a no-op.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::NaiveDate;

use ledgerflow_core::coa::{AccountType, NewAccount, NewCompany};
use ledgerflow_core::engine::{EngineConfig, PostingEngine};
use ledgerflow_core::ledger::SubledgerKind;
use ledgerflow_core::posting::{AccountRef, Condition, NewPostingRule, TemplateLine};
use ledgerflow_db::{CompanyRepository, PgLedgerStore, connect_with};
use ledgerflow_shared::AppConfig;
use ledgerflow_shared::types::{CompanyId, CurrencyCode};

const DEMO_COMPANY: &str = "Demo Traders Pvt Ltd";

type Engine = PostingEngine<PgLedgerStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = connect_with(&config.database).await?;

    let existing = CompanyRepository::new(&db).list().await?;
    if existing.iter().any(|c| c.name == DEMO_COMPANY) {
        println!("  Demo company already exists, skipping...");
        return Ok(());
    }

    let engine_config = EngineConfig::from(&config.ledger);
    let store = PgLedgerStore::new(db, engine_config.transaction_timeout);
    let engine = PostingEngine::new(store, engine_config);

    println!("Seeding demo company...");
    let company = engine
        .create_company(NewCompany {
            name: DEMO_COMPANY.to_string(),
            base_currency: Some(CurrencyCode::default()),
            fiscal_year_start_month: Some(4),
        })
        .await?;
    println!("  Created company {} ({})", company.name, company.id);

    println!("Seeding chart of accounts...");
    seed_accounts(&engine, company.id).await?;

    println!("Seeding posting rules...");
    seed_rules(&engine, company.id).await?;

    println!("Seeding complete!");
    Ok(())
}

async fn seed_accounts(engine: &Engine, company_id: CompanyId) -> anyhow::Result<()> {
    let accounts = [
        NewAccount::new("1000", "Current Assets", AccountType::Asset),
        NewAccount::new("1100", "Trade Receivables", AccountType::Asset).under("1000"),
        NewAccount::new("1110", "Bank - Current Account", AccountType::Asset).under("1000"),
        NewAccount::new("1120", "Cash in Hand", AccountType::Asset).under("1000"),
        NewAccount::new("2000", "Current Liabilities", AccountType::Liability),
        NewAccount::new("2100", "Trade Payables", AccountType::Liability).under("2000"),
        NewAccount::new("2200", "GST Output", AccountType::Liability).under("2000"),
        NewAccount::new("2210", "CGST Output", AccountType::Liability).under("2200"),
        NewAccount::new("2220", "SGST Output", AccountType::Liability).under("2200"),
        NewAccount::new("2230", "IGST Output", AccountType::Liability).under("2200"),
        NewAccount::new("3100", "Share Capital", AccountType::Equity),
        NewAccount::new("4000", "Revenue", AccountType::Income),
        NewAccount::new("4100", "Domestic Sales", AccountType::Income).under("4000"),
        NewAccount::new("4200", "Export Sales", AccountType::Income).under("4000"),
        NewAccount::new("5100", "Rent", AccountType::Expense),
        NewAccount::new("5200", "Bank Charges", AccountType::Expense),
    ];

    for input in accounts {
        let account = engine.create_account(company_id, input).await?;
        println!("  {} {}", account.code, account.name);
    }
    Ok(())
}

fn fy_start() -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 4, 1).context("invalid fiscal year start")
}

fn rule(
    code: &str,
    source_type: &str,
    trigger_event: &str,
    description: &str,
    condition: Condition,
    template: Vec<TemplateLine>,
    priority: i32,
) -> anyhow::Result<NewPostingRule> {
    Ok(NewPostingRule {
        code: code.to_string(),
        source_type: source_type.to_string(),
        trigger_event: trigger_event.to_string(),
        description: Some(description.to_string()),
        condition,
        template,
        priority,
        effective_from: fy_start()?,
        effective_to: None,
        is_fallback: false,
    })
}

fn fallback(source_type: &str, debit: &str, credit: &str) -> anyhow::Result<NewPostingRule> {
    Ok(NewPostingRule {
        is_fallback: true,
        ..rule(
            &format!("{}-SUSPENSE", source_type.to_ascii_uppercase()),
            source_type,
            "*",
            &format!("Unmatched {source_type}"),
            Condition::always(),
            vec![
                TemplateLine::debit(AccountRef::literal(debit), "total_amount"),
                TemplateLine::credit(AccountRef::literal(credit), "total_amount"),
            ],
            1000,
        )?
    })
}

async fn seed_rules(engine: &Engine, company_id: CompanyId) -> anyhow::Result<()> {
    let receivable =
        TemplateLine::debit(AccountRef::literal("1100"), "total_amount")
            .with_subledger(SubledgerKind::Customer, "customer_id");

    let rules = [
        rule(
            "INV-B2B-INTRA",
            "invoice",
            "on_finalize",
            "Domestic B2B Intra-state",
            Condition::all_eq([("is_export", false), ("is_intra_state", true)]),
            vec![
                receivable.clone(),
                TemplateLine::credit(AccountRef::literal("4100"), "subtotal"),
                TemplateLine::credit(AccountRef::literal("2210"), "total_cgst").skip_if_zero(),
                TemplateLine::credit(AccountRef::literal("2220"), "total_sgst").skip_if_zero(),
            ],
            10,
        )?,
        rule(
            "INV-B2B-INTER",
            "invoice",
            "on_finalize",
            "Domestic B2B Inter-state",
            Condition::all_eq([("is_export", false), ("is_intra_state", false)]),
            vec![
                receivable.clone(),
                TemplateLine::credit(AccountRef::literal("4100"), "subtotal"),
                TemplateLine::credit(AccountRef::literal("2230"), "total_igst").skip_if_zero(),
            ],
            10,
        )?,
        rule(
            "INV-EXPORT",
            "invoice",
            "on_finalize",
            "Export invoice under LUT",
            Condition::eq("is_export", true),
            vec![
                receivable,
                TemplateLine::credit(AccountRef::literal("4200"), "total_amount"),
            ],
            20,
        )?,
        rule(
            "RCPT-BANK",
            "payment_receipt",
            "on_receive",
            "Customer receipt into a bank or cash account",
            Condition::always(),
            vec![
                TemplateLine::debit(AccountRef::placeholder("deposit_account"), "amount"),
                TemplateLine::credit(AccountRef::literal("1100"), "amount")
                    .with_subledger(SubledgerKind::Customer, "customer_id"),
            ],
            10,
        )?,
        fallback("invoice", "9900-ASSET", "9900-INCOME")?,
        fallback("payment_receipt", "9900-ASSET", "9900-LIABILITY")?,
    ];

    for input in rules {
        let created = engine.create_rule(company_id, input).await?;
        println!("  {} v{} ({})", created.code, created.version, created.source_type);
    }
    Ok(())
}
