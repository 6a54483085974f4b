//! Posting engine: the transactional orchestration of the ledger.
//!
//! Every public operation opens one storage transaction, runs the pure
//! services of the other modules against it and commits. Matching,
//! expansion, validation, journal numbering and balance updates of one
//! event therefore commit together or not at all.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument, warn};

use ledgerflow_shared::types::{AccountId, CompanyId, JournalEntryId, PostingRuleId};

use super::config::EngineConfig;
use super::error::EngineError;
use super::store::{EntryFilter, LedgerStore, LedgerTx, StoreError};
use super::types::{BalanceDrift, CreateResult, EventResult, ReconciliationReport, ReversalResult};
use crate::audit::{RuleUsageLog, UsageLogFilter, UsageOutcome};
use crate::coa::{
    Account, ChartOfAccounts, CoaError, Company, NewAccount, NewCompany, NormalBalance,
    suspense_code,
};
use crate::ledger::validation::validate_journal_lines;
use crate::ledger::{
    AccountInfo, BalanceMaintainer, CreateEntryInput, EntryHeader, EntryTotals, FiscalCalendar,
    JournalEntry, JournalLine, LedgerError, LedgerService, PeriodBalance, PostedLine, PostingLine,
    format_journal_number,
};
use crate::posting::{
    AccountRef, NewPostingRule, PostingEvent, PostingRule, RuleError, RuleMatcher,
    TemplateExpander, supersede,
};
use crate::reports::{
    AccountLedgerReport, BalanceSheetReport, IncomeStatementReport, ReportError, ReportService,
    TrialBalanceReport,
};
use crate::workflow::{REVERSAL_SOURCE_TYPE, ReversalService, WorkflowError, WorkflowService};

/// The ledger's transactional front door.
#[derive(Debug, Clone)]
pub struct PostingEngine<S> {
    store: S,
    config: EngineConfig,
}

impl<S: LedgerStore> PostingEngine<S> {
    /// Creates an engine over a store.
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, EngineError>>,
    {
        match tokio::time::timeout(self.config.transaction_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(self.config.transaction_timeout.as_secs())),
        }
    }

    // ------------------------------------------------------------------
    // Companies and chart of accounts
    // ------------------------------------------------------------------

    /// Onboards a company and creates its suspense accounts.
    #[instrument(skip_all, fields(name = %input.name))]
    pub async fn create_company(&self, input: NewCompany) -> Result<Company, EngineError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(CoaError::InvalidName(input.name.clone()).into());
        }
        let start_month = input
            .fiscal_year_start_month
            .unwrap_or(self.config.default_fiscal_year_start_month);
        FiscalCalendar::new(start_month)?;

        let company = Company {
            id: CompanyId::new(),
            name: name.to_string(),
            base_currency: input.base_currency.unwrap_or_default(),
            fiscal_year_start_month: start_month,
        };

        let mut tx = self.store.begin().await?;
        tx.insert_company(&company).await?;
        let mut chart = ChartOfAccounts::new(company.id);
        for id in chart.ensure_suspense_accounts()? {
            tx.insert_account(chart.get(id)?).await?;
        }
        tx.commit().await?;

        info!(company_id = %company.id, "company created");
        Ok(company)
    }

    /// Loads a company.
    pub async fn company(&self, company_id: CompanyId) -> Result<Company, EngineError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.company(company_id).await?)
    }

    async fn load_chart(
        tx: &mut S::Tx,
        company_id: CompanyId,
    ) -> Result<ChartOfAccounts, EngineError> {
        tx.company(company_id).await?;
        let accounts = tx.accounts(company_id).await?;
        Ok(ChartOfAccounts::from_accounts(company_id, accounts)?)
    }

    /// Creates an account in a company's chart.
    #[instrument(skip_all, fields(company_id = %company_id, code = %input.code))]
    pub async fn create_account(
        &self,
        company_id: CompanyId,
        input: NewAccount,
    ) -> Result<Account, EngineError> {
        let mut tx = self.store.begin().await?;
        let mut chart = Self::load_chart(&mut tx, company_id).await?;
        let account = chart.create_account(input)?.clone();
        tx.insert_account(&account).await?;
        tx.commit().await?;

        info!(account_id = %account.id, "account created");
        Ok(account)
    }

    /// Creates whichever of the five suspense accounts are missing.
    ///
    /// Returns the accounts created.
    #[instrument(skip_all, fields(company_id = %company_id))]
    pub async fn ensure_suspense_accounts(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<Account>, EngineError> {
        let mut tx = self.store.begin().await?;
        let mut chart = Self::load_chart(&mut tx, company_id).await?;
        let mut created = Vec::new();
        for id in chart.ensure_suspense_accounts()? {
            let account = chart.get(id)?.clone();
            tx.insert_account(&account).await?;
            created.push(account);
        }
        tx.commit().await?;

        if !created.is_empty() {
            info!(count = created.len(), "suspense accounts created");
        }
        Ok(created)
    }

    /// All accounts of a company, parents before children.
    pub async fn accounts(&self, company_id: CompanyId) -> Result<Vec<Account>, EngineError> {
        let mut tx = self.store.begin().await?;
        let chart = Self::load_chart(&mut tx, company_id).await?;
        Ok(chart.iter().cloned().collect())
    }

    /// Loads an account by id.
    pub async fn account(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
    ) -> Result<Account, EngineError> {
        let mut tx = self.store.begin().await?;
        let chart = Self::load_chart(&mut tx, company_id).await?;
        Ok(chart.get(account_id)?.clone())
    }

    /// Loads an account by code.
    pub async fn account_by_code(
        &self,
        company_id: CompanyId,
        code: &str,
    ) -> Result<Account, EngineError> {
        let mut tx = self.store.begin().await?;
        let chart = Self::load_chart(&mut tx, company_id).await?;
        Ok(chart.get_by_code(code)?.clone())
    }

    /// Direct children of an account.
    pub async fn children(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
    ) -> Result<Vec<Account>, EngineError> {
        let mut tx = self.store.begin().await?;
        let chart = Self::load_chart(&mut tx, company_id).await?;
        Ok(chart.children(account_id)?.into_iter().cloned().collect())
    }

    /// All accounts below an account.
    pub async fn descendants(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
    ) -> Result<Vec<Account>, EngineError> {
        let mut tx = self.store.begin().await?;
        let chart = Self::load_chart(&mut tx, company_id).await?;
        Ok(chart.descendants(account_id)?.into_iter().cloned().collect())
    }

    /// Changes an account's display name.
    #[instrument(skip_all, fields(company_id = %company_id, account_id = %account_id))]
    pub async fn rename_account(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
        name: &str,
    ) -> Result<Account, EngineError> {
        let mut tx = self.store.begin().await?;
        let mut chart = Self::load_chart(&mut tx, company_id).await?;
        let account = chart.rename_account(account_id, name)?.clone();
        tx.update_account(&account).await?;
        tx.commit().await?;
        Ok(account)
    }

    /// Deactivates an account; it stays in reports but takes no new postings.
    #[instrument(skip_all, fields(company_id = %company_id, account_id = %account_id))]
    pub async fn deactivate_account(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
    ) -> Result<Account, EngineError> {
        let mut tx = self.store.begin().await?;
        let mut chart = Self::load_chart(&mut tx, company_id).await?;
        let account = chart.deactivate_account(account_id)?.clone();
        tx.update_account(&account).await?;
        tx.commit().await?;

        info!(code = %account.code, "account deactivated");
        Ok(account)
    }

    // ------------------------------------------------------------------
    // Posting rules
    // ------------------------------------------------------------------

    fn check_literal_accounts(
        chart: &ChartOfAccounts,
        input: &NewPostingRule,
    ) -> Result<(), EngineError> {
        for (idx, line) in input.template.iter().enumerate() {
            if let AccountRef::Literal(code) = &line.account {
                let account = chart.get_by_code(code)?;
                if input.is_fallback
                    && !(account.is_suspense && account.code == suspense_code(account.account_type))
                {
                    return Err(RuleError::FallbackNotSuspense {
                        code: account.code.clone(),
                        line: idx + 1,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Creates version 1 of a rule.
    #[instrument(skip_all, fields(company_id = %company_id, rule_code = %input.code))]
    pub async fn create_rule(
        &self,
        company_id: CompanyId,
        input: NewPostingRule,
    ) -> Result<PostingRule, EngineError> {
        input.validate()?;

        let mut tx = self.store.begin().await?;
        let chart = Self::load_chart(&mut tx, company_id).await?;
        Self::check_literal_accounts(&chart, &input)?;

        let code = input.code.trim();
        if let Some(latest) = tx
            .rules(company_id, None)
            .await?
            .into_iter()
            .filter(|r| r.code == code)
            .max_by_key(|r| r.version)
        {
            return Err(RuleError::DuplicateRule {
                code: latest.code,
                version: latest.version,
            }
            .into());
        }

        let rule = PostingRule::from_new(company_id, input, 1, Utc::now());
        tx.insert_rule(&rule).await?;
        tx.commit().await?;

        info!(rule_id = %rule.id, "posting rule created");
        Ok(rule)
    }

    /// Creates the next version of a rule and closes the previous version's
    /// window the day before the new one starts.
    #[instrument(skip_all, fields(company_id = %company_id, rule_code = %code))]
    pub async fn create_rule_version(
        &self,
        company_id: CompanyId,
        code: &str,
        mut input: NewPostingRule,
    ) -> Result<PostingRule, EngineError> {
        input.code = code.trim().to_string();
        input.validate()?;

        let mut tx = self.store.begin().await?;
        let chart = Self::load_chart(&mut tx, company_id).await?;
        Self::check_literal_accounts(&chart, &input)?;

        let mut previous = tx
            .rules(company_id, None)
            .await?
            .into_iter()
            .filter(|r| r.code == input.code)
            .max_by_key(|r| r.version)
            .ok_or_else(|| RuleError::RuleNotFound(input.code.clone()))?;

        let version = supersede(&mut previous, &input)?;
        tx.update_rule(&previous).await?;

        let rule = PostingRule::from_new(company_id, input, version, Utc::now());
        tx.insert_rule(&rule).await?;
        tx.commit().await?;

        info!(version, effective_from = %rule.effective_from, "posting rule versioned");
        Ok(rule)
    }

    /// Deactivates one rule version.
    #[instrument(skip_all, fields(company_id = %company_id, rule_id = %rule_id))]
    pub async fn deactivate_rule(
        &self,
        company_id: CompanyId,
        rule_id: PostingRuleId,
    ) -> Result<PostingRule, EngineError> {
        let mut tx = self.store.begin().await?;
        let mut rule = tx
            .rules(company_id, None)
            .await?
            .into_iter()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| RuleError::RuleNotFound(rule_id.to_string()))?;
        rule.is_active = false;
        tx.update_rule(&rule).await?;
        tx.commit().await?;

        info!(rule_code = %rule.code, version = rule.version, "posting rule deactivated");
        Ok(rule)
    }

    /// Rule versions of a company, optionally for one source type.
    pub async fn list_rules(
        &self,
        company_id: CompanyId,
        source_type: Option<&str>,
    ) -> Result<Vec<PostingRule>, EngineError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.rules(company_id, source_type).await?)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Turns a business event into a posted journal entry.
    ///
    /// Runs match, expansion, entry creation, posting and usage logging in
    /// one transaction. An event whose source document already has a live
    /// entry returns that entry unchanged. When no rule matches, the source
    /// type's fallback rule parks the amounts on suspense accounts and flags
    /// the entry for reclassification. Failures are logged in a separate
    /// transaction so the audit record survives the rollback.
    #[instrument(
        skip_all,
        fields(
            company_id = %event.company_id,
            source_type = %event.source_type,
            source_id = %event.source_id,
        )
    )]
    pub async fn process_event(&self, event: PostingEvent) -> Result<EventResult, EngineError> {
        if event.source_type.trim().is_empty() || event.source_id.trim().is_empty() {
            return Err(LedgerError::MissingSourceKey.into());
        }

        let mut applied: Option<PostingRule> = None;
        let result = self
            .bounded(self.try_process_event(&event, &mut applied))
            .await;

        match result {
            Ok(result) => Ok(result),
            Err(EngineError::Store(StoreError::DuplicateSource { .. })) => {
                debug!("lost idempotency race, returning existing entry");
                let entry = self
                    .live_entry(event.company_id, &event.source_type, &event.source_id)
                    .await?;
                Ok(EventResult::existing(entry))
            }
            Err(err) => {
                self.record_failure(&event, applied.as_ref(), &err).await;
                Err(err)
            }
        }
    }

    async fn try_process_event(
        &self,
        event: &PostingEvent,
        applied: &mut Option<PostingRule>,
    ) -> Result<EventResult, EngineError> {
        let mut tx = self.store.begin().await?;

        if let Some(existing) = tx
            .entry_by_source(event.company_id, &event.source_type, &event.source_id)
            .await?
        {
            debug!(journal_number = %existing.journal_number, "event already posted");
            return Ok(EventResult::existing(existing));
        }

        let company = tx.company(event.company_id).await?;
        let rules = tx.rules(company.id, Some(&event.source_type)).await?;

        let (rule, outcome) = match RuleMatcher::find_applicable_rule(&rules, event) {
            Ok(rule) => (rule.clone(), UsageOutcome::Matched),
            Err(err @ RuleError::NoRuleMatched { .. }) => {
                match RuleMatcher::find_fallback_rule(&rules, &event.source_type, event.event_date) {
                    Some(fallback) => {
                        warn!(
                            trigger_event = %event.trigger_event,
                            rule_code = %fallback.code,
                            "no posting rule matched, using suspense fallback"
                        );
                        (fallback.clone(), UsageOutcome::FallbackUsed)
                    }
                    None => return Err(err.into()),
                }
            }
            Err(err) => return Err(err.into()),
        };
        *applied = Some(rule.clone());

        let fallback = outcome == UsageOutcome::FallbackUsed;
        let lines = if fallback {
            TemplateExpander::expand_fallback(
                &rule.template,
                &event.attributes,
                &self.config.fallback_amount_fields,
                self.config.balance_tolerance,
            )?
        } else {
            TemplateExpander::expand(
                &rule.template,
                &event.attributes,
                self.config.balance_tolerance,
            )?
        };

        let input = CreateEntryInput {
            company_id: company.id,
            source_type: event.source_type.clone(),
            source_id: event.source_id.clone(),
            source_number: event.source_number.clone(),
            trigger_event: Some(event.trigger_event.clone()),
            entry_date: event.event_date,
            narration: event.narration.clone().or_else(|| rule.description.clone()),
            currency: event.currency.clone(),
            exchange_rate: event.exchange_rate,
            lines,
            auto_post: true,
            rule_id: Some(rule.id),
            needs_reclassification: fallback,
        };
        let entry = self.create_in_tx(&mut tx, &company, &input).await?;

        if fallback {
            let gap = RuleUsageLog::for_event(event, UsageOutcome::NoRuleMatched)
                .with_entry(entry.id);
            tx.insert_usage_log(&gap).await?;
        }
        let log = RuleUsageLog::for_event(event, outcome)
            .with_rule(&rule)
            .with_entry(entry.id);
        tx.insert_usage_log(&log).await?;
        tx.commit().await?;

        info!(
            journal_number = %entry.journal_number,
            rule_code = %rule.code,
            rule_version = rule.version,
            outcome = %outcome,
            "event posted"
        );
        Ok(EventResult {
            entry,
            created: true,
            outcome: Some(outcome),
            rule_code: Some(rule.code),
            rule_version: Some(rule.version),
        })
    }

    async fn record_failure(
        &self,
        event: &PostingEvent,
        rule: Option<&PostingRule>,
        error: &EngineError,
    ) {
        let outcome = match error {
            EngineError::Rule(RuleError::NoRuleMatched { .. }) => UsageOutcome::NoRuleMatched,
            _ => UsageOutcome::Failed,
        };
        warn!(error = %error, outcome = %outcome, "event processing failed");

        let mut log = RuleUsageLog::for_event(event, outcome).with_error(error.to_string());
        if let Some(rule) = rule {
            log = log.with_rule(rule);
        }

        let written = async {
            let mut tx = self.store.begin().await?;
            tx.insert_usage_log(&log).await?;
            tx.commit().await
        };
        if let Err(err) = written.await {
            warn!(error = %err, "could not record usage log for failed event");
        }
    }

    async fn live_entry(
        &self,
        company_id: CompanyId,
        source_type: &str,
        source_id: &str,
    ) -> Result<JournalEntry, EngineError> {
        let mut tx = self.store.begin().await?;
        tx.entry_by_source(company_id, source_type, source_id)
            .await?
            .ok_or_else(|| {
                StoreError::not_found("journal entry", format!("{source_type}/{source_id}")).into()
            })
    }

    // ------------------------------------------------------------------
    // Journal entries
    // ------------------------------------------------------------------

    /// Creates an entry from explicit lines, posting it when `auto_post` is set.
    ///
    /// Idempotent on (company, source type, source id) among live entries.
    #[instrument(
        skip_all,
        fields(
            company_id = %input.company_id,
            source_type = %input.source_type,
            source_id = %input.source_id,
        )
    )]
    pub async fn create_from_lines(
        &self,
        input: CreateEntryInput,
    ) -> Result<CreateResult, EngineError> {
        LedgerService::validate_input(&input)?;

        let result = self
            .bounded(async {
                let mut tx = self.store.begin().await?;
                if let Some(existing) = tx
                    .entry_by_source(input.company_id, &input.source_type, &input.source_id)
                    .await?
                {
                    return Ok(CreateResult {
                        entry: existing,
                        created: false,
                    });
                }
                let company = tx.company(input.company_id).await?;
                let entry = self.create_in_tx(&mut tx, &company, &input).await?;
                tx.commit().await?;
                Ok::<_, EngineError>(CreateResult {
                    entry,
                    created: true,
                })
            })
            .await;

        match result {
            Err(EngineError::Store(StoreError::DuplicateSource { .. })) => {
                let entry = self
                    .live_entry(input.company_id, &input.source_type, &input.source_id)
                    .await?;
                Ok(CreateResult {
                    entry,
                    created: false,
                })
            }
            Ok(created) => {
                if created.created {
                    info!(
                        journal_number = %created.entry.journal_number,
                        status = %created.entry.status,
                        "journal entry created"
                    );
                }
                Ok(created)
            }
            Err(err) => Err(err),
        }
    }

    async fn allocate_header(
        &self,
        tx: &mut S::Tx,
        company: &Company,
        id: JournalEntryId,
        entry_date: NaiveDate,
    ) -> Result<EntryHeader, EngineError> {
        let calendar = FiscalCalendar::new(company.fiscal_year_start_month)?;
        let fiscal_year = calendar.fiscal_year(entry_date);
        let sequence = tx.next_journal_sequence(company.id, fiscal_year).await?;
        Ok(EntryHeader {
            id,
            journal_number: format_journal_number(
                &self.config.journal_number_prefix,
                &calendar.label(fiscal_year),
                sequence,
            ),
            fiscal_year,
            base_currency: company.base_currency.clone(),
        })
    }

    async fn build_lines(
        &self,
        tx: &mut S::Tx,
        company_id: CompanyId,
        entry_id: JournalEntryId,
        lines: &[PostingLine],
    ) -> Result<(Vec<JournalLine>, EntryTotals), EngineError> {
        let accounts = tx.accounts(company_id).await?;
        let by_code: HashMap<&str, &Account> =
            accounts.iter().map(|a| (a.code.as_str(), a)).collect();
        Ok(LedgerService::build_lines(
            entry_id,
            lines,
            self.config.balance_tolerance,
            |code| by_code.get(code.trim()).map(|a| AccountInfo::from(*a)),
        )?)
    }

    async fn create_in_tx(
        &self,
        tx: &mut S::Tx,
        company: &Company,
        input: &CreateEntryInput,
    ) -> Result<JournalEntry, EngineError> {
        LedgerService::validate_input(input)?;

        let entry_id = JournalEntryId::new();
        let (lines, totals) = self.build_lines(tx, company.id, entry_id, &input.lines).await?;
        let header = self.allocate_header(tx, company, entry_id, input.entry_date).await?;

        let mut entry = LedgerService::assemble_entry(input, header, lines, totals, Utc::now());
        tx.insert_entry(&entry).await?;

        if input.auto_post {
            self.post_in_tx(tx, company, &mut entry).await?;
        }
        Ok(entry)
    }

    /// Moves an entry to `posted` and applies its lines to the running and
    /// period balances, all inside `tx`.
    async fn post_in_tx(
        &self,
        tx: &mut S::Tx,
        company: &Company,
        entry: &mut JournalEntry,
    ) -> Result<(), EngineError> {
        let new_status = WorkflowService::post(entry.status)?.new_status();
        let posted_at = Utc::now();
        validate_journal_lines(&entry.lines, self.config.balance_tolerance)?;

        let mut ids: Vec<AccountId> = entry.lines.iter().map(|l| l.account_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let locked = tx.lock_accounts(company.id, &ids).await?;

        // Reversals must be able to unwind postings on since-deactivated accounts.
        if entry.reversal_of.is_none()
            && let Some(inactive) = locked.iter().find(|a| !a.is_active)
        {
            return Err(LedgerError::AccountInactive(inactive.code.clone()).into());
        }

        let normals: HashMap<AccountId, NormalBalance> =
            locked.iter().map(|a| (a.id, a.normal_balance)).collect();
        let deltas = BalanceMaintainer::account_deltas(&entry.lines, &normals)?;
        let key =
            FiscalCalendar::new(company.fiscal_year_start_month)?.period_key(entry.entry_date);

        for delta in &deltas {
            let normal = normals
                .get(&delta.account_id)
                .copied()
                .ok_or_else(|| StoreError::not_found("account", delta.account_id))?;
            tx.apply_delta(delta.account_id, delta.signed).await?;

            let prior = tx.period_balance_before(delta.account_id, key).await?;
            let from_key = tx.period_balances_from(delta.account_id, key).await?;
            let rows = BalanceMaintainer::apply_to_periods(
                company.id,
                delta.account_id,
                normal,
                key,
                delta.debit,
                delta.credit,
                prior.as_ref(),
                from_key,
            );
            tx.save_period_balances(&rows).await?;
        }

        entry.status = new_status;
        entry.posted_at = Some(posted_at);
        entry.updated_at = posted_at;
        tx.update_entry(entry).await?;
        Ok(())
    }

    /// Moves a draft entry to `pending_approval`.
    #[instrument(skip_all, fields(company_id = %company_id, entry_id = %entry_id))]
    pub async fn submit(
        &self,
        company_id: CompanyId,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, EngineError> {
        let mut tx = self.store.begin().await?;
        let mut entry = tx.entry(company_id, entry_id).await?;
        let action = WorkflowService::submit(entry.status)?;
        entry.status = action.new_status();
        entry.updated_at = Utc::now();
        tx.update_entry(&entry).await?;
        tx.commit().await?;

        info!(journal_number = %entry.journal_number, "journal entry submitted");
        Ok(entry)
    }

    /// Posts a draft or pending entry and updates balances.
    #[instrument(skip_all, fields(company_id = %company_id, entry_id = %entry_id))]
    pub async fn post(
        &self,
        company_id: CompanyId,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, EngineError> {
        let entry = self
            .bounded(async {
                let mut tx = self.store.begin().await?;
                let company = tx.company(company_id).await?;
                let mut entry = tx.entry(company_id, entry_id).await?;
                self.post_in_tx(&mut tx, &company, &mut entry).await?;
                tx.commit().await?;
                Ok::<_, EngineError>(entry)
            })
            .await?;

        info!(journal_number = %entry.journal_number, "journal entry posted");
        Ok(entry)
    }

    /// Cancels a draft or pending entry. The source document may then be
    /// posted again.
    #[instrument(skip_all, fields(company_id = %company_id, entry_id = %entry_id))]
    pub async fn cancel(
        &self,
        company_id: CompanyId,
        entry_id: JournalEntryId,
        reason: String,
    ) -> Result<JournalEntry, EngineError> {
        let mut tx = self.store.begin().await?;
        let mut entry = tx.entry(company_id, entry_id).await?;
        entry.status = WorkflowService::cancel(entry.status, reason.clone())?.new_status();
        entry.cancellation_reason = Some(reason.trim().to_string());
        entry.updated_at = Utc::now();
        tx.update_entry(&entry).await?;
        tx.commit().await?;

        info!(journal_number = %entry.journal_number, "journal entry cancelled");
        Ok(entry)
    }

    /// Reverses a posted entry with a posted mirror entry.
    ///
    /// The reversal is dated `reversal_date`, or the original's date when
    /// absent.
    #[instrument(skip_all, fields(company_id = %company_id, entry_id = %entry_id))]
    pub async fn reverse(
        &self,
        company_id: CompanyId,
        entry_id: JournalEntryId,
        reason: String,
        reversal_date: Option<NaiveDate>,
    ) -> Result<ReversalResult, EngineError> {
        let result = self
            .bounded(async {
                let mut tx = self.store.begin().await?;
                let company = tx.company(company_id).await?;
                let mut original = tx.entry(company_id, entry_id).await?;

                let new_status = WorkflowService::reverse(
                    original.id,
                    original.status,
                    original.reversed_by,
                    reason.clone(),
                )?
                .new_status();
                let reason = reason.trim().to_string();
                let reversed_at = Utc::now();

                let input = CreateEntryInput {
                    company_id,
                    source_type: REVERSAL_SOURCE_TYPE.to_string(),
                    source_id: original.id.to_string(),
                    source_number: Some(original.journal_number.clone()),
                    trigger_event: None,
                    entry_date: reversal_date.unwrap_or(original.entry_date),
                    narration: Some(ReversalService::narration(&original, &reason)),
                    currency: Some(original.currency.clone()),
                    exchange_rate: Some(original.exchange_rate),
                    lines: Vec::new(),
                    auto_post: true,
                    rule_id: None,
                    needs_reclassification: false,
                };
                let reversal_id = JournalEntryId::new();
                let header = self
                    .allocate_header(&mut tx, &company, reversal_id, input.entry_date)
                    .await?;
                let lines = ReversalService::mirror_lines(&original.lines, reversal_id);
                let totals = EntryTotals {
                    debit: original.total_credit,
                    credit: original.total_debit,
                };

                let mut reversal =
                    LedgerService::assemble_entry(&input, header, lines, totals, reversed_at);
                reversal.reversal_of = Some(original.id);
                reversal.reversal_reason = Some(reason.clone());
                tx.insert_entry(&reversal).await?;
                self.post_in_tx(&mut tx, &company, &mut reversal).await?;

                original.status = new_status;
                original.reversed_by = Some(reversal.id);
                original.reversal_reason = Some(reason);
                original.updated_at = reversed_at;
                tx.update_entry(&original).await?;
                tx.commit().await?;

                Ok::<_, EngineError>(ReversalResult { original, reversal })
            })
            .await;

        match result {
            // A concurrent reversal won the idempotency index.
            Err(EngineError::Store(StoreError::DuplicateSource { .. })) => {
                let existing = self
                    .live_entry(company_id, REVERSAL_SOURCE_TYPE, &entry_id.to_string())
                    .await?;
                Err(WorkflowError::AlreadyReversed {
                    entry_id,
                    reversed_by: Some(existing.id),
                }
                .into())
            }
            Ok(result) => {
                info!(
                    journal_number = %result.original.journal_number,
                    reversal_number = %result.reversal.journal_number,
                    "journal entry reversed"
                );
                Ok(result)
            }
            Err(err) => Err(err),
        }
    }

    /// Replaces the lines of a draft entry.
    #[instrument(skip_all, fields(company_id = %company_id, entry_id = %entry_id))]
    pub async fn update_lines(
        &self,
        company_id: CompanyId,
        entry_id: JournalEntryId,
        lines: Vec<PostingLine>,
    ) -> Result<JournalEntry, EngineError> {
        let mut tx = self.store.begin().await?;
        let mut entry = tx.entry(company_id, entry_id).await?;
        WorkflowService::ensure_editable(entry.status)?;

        let (lines, totals) = self.build_lines(&mut tx, company_id, entry.id, &lines).await?;
        entry.lines = lines;
        entry.total_debit = totals.debit;
        entry.total_credit = totals.credit;
        entry.updated_at = Utc::now();
        tx.update_entry(&entry).await?;
        tx.replace_lines(entry.id, &entry.lines).await?;
        tx.commit().await?;

        debug!(lines = entry.lines.len(), "journal lines replaced");
        Ok(entry)
    }

    /// Loads an entry with its lines.
    pub async fn entry(
        &self,
        company_id: CompanyId,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, EngineError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.entry(company_id, entry_id).await?)
    }

    /// Lists entries matching a filter.
    pub async fn entries(
        &self,
        company_id: CompanyId,
        filter: &EntryFilter,
    ) -> Result<Vec<JournalEntry>, EngineError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.entries(company_id, filter).await?)
    }

    /// Counts entries matching a filter, ignoring its paging.
    pub async fn count_entries(
        &self,
        company_id: CompanyId,
        filter: &EntryFilter,
    ) -> Result<u64, EngineError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.count_entries(company_id, filter).await?)
    }

    /// Lists usage log records, newest first.
    pub async fn usage_logs(
        &self,
        company_id: CompanyId,
        filter: &UsageLogFilter,
        limit: u64,
    ) -> Result<Vec<RuleUsageLog>, EngineError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.usage_logs(company_id, filter, limit).await?)
    }

    // ------------------------------------------------------------------
    // Balances and reports
    // ------------------------------------------------------------------

    /// Recomputes every running balance and period row from posted lines,
    /// reports what drifted and overwrites the stored figures.
    #[instrument(skip_all, fields(company_id = %company_id))]
    pub async fn reconcile(
        &self,
        company_id: CompanyId,
    ) -> Result<ReconciliationReport, EngineError> {
        let mut tx = self.store.begin().await?;
        let company = tx.company(company_id).await?;
        let calendar = FiscalCalendar::new(company.fiscal_year_start_month)?;

        let mut ids: Vec<AccountId> = tx
            .accounts(company_id)
            .await?
            .iter()
            .map(|a| a.id)
            .collect();
        ids.sort_unstable();
        let accounts = tx.lock_accounts(company_id, &ids).await?;

        let normals: HashMap<AccountId, NormalBalance> =
            accounts.iter().map(|a| (a.id, a.normal_balance)).collect();
        let codes: HashMap<AccountId, &str> =
            accounts.iter().map(|a| (a.id, a.code.as_str())).collect();
        let code_of =
            |id: AccountId| codes.get(&id).map_or_else(String::new, |c| (*c).to_string());
        let lines = tx.posted_lines(company_id, None).await?;
        let mut rebuilt = BalanceMaintainer::rebuild(company_id, &lines, &normals, &calendar);

        let mut drifts = Vec::new();
        for account in &accounts {
            let recomputed = rebuilt
                .balances
                .get(&account.id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            if account.balance != recomputed {
                drifts.push(BalanceDrift {
                    account_id: account.id,
                    account_code: account.code.clone(),
                    period: None,
                    stored: account.balance,
                    recomputed,
                });
                tx.set_account_balance(account.id, recomputed).await?;
            }
        }

        let mut stored: BTreeMap<_, PeriodBalance> = tx
            .period_balances(company_id)
            .await?
            .into_iter()
            .map(|row| ((row.account_id, row.key()), row))
            .collect();
        let mut period_drift = false;
        for row in &mut rebuilt.periods {
            match stored.remove(&(row.account_id, row.key())) {
                Some(existing) => {
                    row.id = existing.id;
                    if !existing.same_figures(row) {
                        period_drift = true;
                        drifts.push(BalanceDrift {
                            account_id: row.account_id,
                            account_code: code_of(row.account_id),
                            period: Some(row.key()),
                            stored: existing.closing,
                            recomputed: row.closing,
                        });
                    }
                }
                None => {
                    period_drift = true;
                    drifts.push(BalanceDrift {
                        account_id: row.account_id,
                        account_code: code_of(row.account_id),
                        period: Some(row.key()),
                        stored: Decimal::ZERO,
                        recomputed: row.closing,
                    });
                }
            }
        }
        for (_, orphan) in stored {
            period_drift = true;
            drifts.push(BalanceDrift {
                account_id: orphan.account_id,
                account_code: code_of(orphan.account_id),
                period: Some(orphan.key()),
                stored: orphan.closing,
                recomputed: Decimal::ZERO,
            });
        }
        if period_drift {
            tx.replace_period_balances(company_id, &rebuilt.periods).await?;
        }
        tx.commit().await?;

        if drifts.is_empty() {
            info!(accounts = accounts.len(), "balances reconciled, no drift");
        } else {
            warn!(accounts = accounts.len(), drifts = drifts.len(), "balance drift repaired");
        }
        Ok(ReconciliationReport {
            company_id,
            accounts_checked: accounts.len(),
            periods_checked: rebuilt.periods.len(),
            drifts,
        })
    }

    /// Every period row of a company.
    pub async fn period_balances(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<PeriodBalance>, EngineError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.period_balances(company_id).await?)
    }

    async fn report_inputs(
        &self,
        company_id: CompanyId,
        to: NaiveDate,
    ) -> Result<(Company, Vec<Account>, Vec<PostedLine>), EngineError> {
        let mut tx = self.store.begin().await?;
        let company = tx.company(company_id).await?;
        let accounts = tx.accounts(company_id).await?;
        let lines = tx.posted_lines(company_id, Some(to)).await?;
        Ok((company, accounts, lines))
    }

    /// Trial balance as of a date.
    pub async fn trial_balance(
        &self,
        company_id: CompanyId,
        as_of: NaiveDate,
    ) -> Result<TrialBalanceReport, EngineError> {
        let (company, accounts, lines) = self.report_inputs(company_id, as_of).await?;
        let balances = ReportService::account_balances(&accounts, &lines, None, as_of);
        Ok(ReportService::generate_trial_balance(
            company.id,
            as_of,
            company.base_currency,
            balances,
        ))
    }

    /// Balance sheet as of a date.
    pub async fn balance_sheet(
        &self,
        company_id: CompanyId,
        as_of: NaiveDate,
    ) -> Result<BalanceSheetReport, EngineError> {
        let (company, accounts, lines) = self.report_inputs(company_id, as_of).await?;
        let balances = ReportService::account_balances(&accounts, &lines, None, as_of);
        Ok(ReportService::generate_balance_sheet(
            company.id,
            as_of,
            company.base_currency,
            balances,
        ))
    }

    /// Income statement for a date range.
    pub async fn income_statement(
        &self,
        company_id: CompanyId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<IncomeStatementReport, EngineError> {
        ReportService::validate_range(start, end)?;
        let (company, accounts, lines) = self.report_inputs(company_id, end).await?;
        let balances = ReportService::account_balances(&accounts, &lines, Some(start), end);
        Ok(ReportService::generate_income_statement(
            company.id,
            start,
            end,
            company.base_currency,
            balances,
        ))
    }

    /// Chronological posted lines of one account with running balances.
    pub async fn account_ledger(
        &self,
        company_id: CompanyId,
        account_id: AccountId,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<AccountLedgerReport, EngineError> {
        if let Some(start) = from {
            ReportService::validate_range(start, to)?;
        }
        let mut tx = self.store.begin().await?;
        let account = tx
            .accounts(company_id)
            .await?
            .into_iter()
            .find(|a| a.id == account_id)
            .ok_or_else(|| ReportError::AccountNotFound(account_id))?;
        let lines = tx.ledger_lines(account_id, to).await?;
        Ok(ReportService::generate_account_ledger(&account, lines, from, to))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
