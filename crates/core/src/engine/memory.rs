//! In-memory ledger store for tests and local runs.
//!
//! A transaction holds the store's async mutex for its whole lifetime and
//! works on a copy of the state; `commit` swaps the copy in. Transactions
//! therefore run one at a time, and a dropped transaction leaves no trace.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use ledgerflow_shared::types::{AccountId, CompanyId, JournalEntryId};

use super::store::{ACCOUNT_ENTITY, EntryFilter, LedgerStore, LedgerTx, StoreError};
use crate::audit::{RuleUsageLog, UsageLogFilter};
use crate::coa::{Account, Company};
use crate::ledger::{JournalEntry, JournalLine, PeriodBalance, PeriodKey, PostedLine};
use crate::posting::PostingRule;
use crate::reports::LedgerLine;
use crate::workflow::JournalStatus;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    companies: HashMap<CompanyId, Company>,
    accounts: HashMap<AccountId, Account>,
    rules: Vec<PostingRule>,
    entries: HashMap<JournalEntryId, JournalEntry>,
    sequences: HashMap<(CompanyId, i32), i64>,
    periods: BTreeMap<(AccountId, PeriodKey), PeriodBalance>,
    usage_logs: Vec<RuleUsageLog>,
}

/// In-memory [`LedgerStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a stored account balance without touching period rows.
    ///
    /// Lets tests simulate drift for reconciliation.
    pub async fn corrupt_balance(&self, account_id: AccountId, balance: Decimal) {
        if let Some(account) = self.state.lock().await.accounts.get_mut(&account_id) {
            account.balance = balance;
        }
    }

    /// Number of entries stored for a company, in any status.
    pub async fn entry_count(&self, company_id: CompanyId) -> usize {
        self.state
            .lock()
            .await
            .entries
            .values()
            .filter(|e| e.company_id == company_id)
            .count()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx { guard, working })
    }
}

/// Transaction over a [`MemoryLedgerStore`].
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl MemoryTx {
    fn account_mut(&mut self, id: AccountId) -> Result<&mut Account, StoreError> {
        self.working
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("account", id))
    }

    fn is_live_duplicate(&self, entry: &JournalEntry) -> bool {
        self.working.entries.values().any(|e| {
            e.id != entry.id
                && e.company_id == entry.company_id
                && e.status != JournalStatus::Cancelled
                && e.source_type == entry.source_type
                && e.source_id == entry.source_id
        })
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn company(&mut self, id: CompanyId) -> Result<Company, StoreError> {
        self.working
            .companies
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("company", id))
    }

    async fn insert_company(&mut self, company: &Company) -> Result<(), StoreError> {
        if self.working.companies.contains_key(&company.id) {
            return Err(StoreError::Duplicate {
                entity: "company",
                key: company.id.to_string(),
            });
        }
        self.working.companies.insert(company.id, company.clone());
        Ok(())
    }

    async fn accounts(&mut self, company_id: CompanyId) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self
            .working
            .accounts
            .values()
            .filter(|a| a.company_id == company_id)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.code.cmp(&b.code)));
        Ok(accounts)
    }

    async fn insert_account(&mut self, account: &Account) -> Result<(), StoreError> {
        let taken = self
            .working
            .accounts
            .values()
            .any(|a| a.company_id == account.company_id && a.code == account.code);
        if taken {
            return Err(StoreError::Duplicate {
                entity: ACCOUNT_ENTITY,
                key: account.code.clone(),
            });
        }
        self.working.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update_account(&mut self, account: &Account) -> Result<(), StoreError> {
        let stored = self.account_mut(account.id)?;
        stored.name.clone_from(&account.name);
        stored.is_active = account.is_active;
        stored.updated_at = account.updated_at;
        Ok(())
    }

    async fn lock_accounts(
        &mut self,
        company_id: CompanyId,
        ids: &[AccountId],
    ) -> Result<Vec<Account>, StoreError> {
        ids.iter()
            .map(|id| {
                self.working
                    .accounts
                    .get(id)
                    .filter(|a| a.company_id == company_id)
                    .cloned()
                    .ok_or_else(|| StoreError::not_found("account", id))
            })
            .collect()
    }

    async fn apply_delta(
        &mut self,
        account_id: AccountId,
        delta: Decimal,
    ) -> Result<Decimal, StoreError> {
        let account = self.account_mut(account_id)?;
        account.balance += delta;
        Ok(account.balance)
    }

    async fn set_account_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
    ) -> Result<(), StoreError> {
        self.account_mut(account_id)?.balance = balance;
        Ok(())
    }

    async fn rules(
        &mut self,
        company_id: CompanyId,
        source_type: Option<&str>,
    ) -> Result<Vec<PostingRule>, StoreError> {
        let mut rules: Vec<PostingRule> = self
            .working
            .rules
            .iter()
            .filter(|r| r.company_id == company_id)
            .filter(|r| source_type.is_none_or(|s| r.source_type == s))
            .cloned()
            .collect();
        rules.sort_by(|a, b| a.code.cmp(&b.code).then(a.version.cmp(&b.version)));
        Ok(rules)
    }

    async fn insert_rule(&mut self, rule: &PostingRule) -> Result<(), StoreError> {
        let taken = self.working.rules.iter().any(|r| {
            r.company_id == rule.company_id && r.code == rule.code && r.version == rule.version
        });
        if taken {
            return Err(StoreError::Duplicate {
                entity: "posting rule",
                key: format!("{} v{}", rule.code, rule.version),
            });
        }
        self.working.rules.push(rule.clone());
        Ok(())
    }

    async fn update_rule(&mut self, rule: &PostingRule) -> Result<(), StoreError> {
        let stored = self
            .working
            .rules
            .iter_mut()
            .find(|r| r.id == rule.id)
            .ok_or_else(|| StoreError::not_found("posting rule", rule.id))?;
        stored.effective_to = rule.effective_to;
        stored.is_active = rule.is_active;
        Ok(())
    }

    async fn entry(
        &mut self,
        company_id: CompanyId,
        id: JournalEntryId,
    ) -> Result<JournalEntry, StoreError> {
        self.working
            .entries
            .get(&id)
            .filter(|e| e.company_id == company_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("journal entry", id))
    }

    async fn entry_by_source(
        &mut self,
        company_id: CompanyId,
        source_type: &str,
        source_id: &str,
    ) -> Result<Option<JournalEntry>, StoreError> {
        Ok(self
            .working
            .entries
            .values()
            .find(|e| {
                e.company_id == company_id
                    && e.status != JournalStatus::Cancelled
                    && e.source_type == source_type
                    && e.source_id == source_id
            })
            .cloned())
    }

    async fn entries(
        &mut self,
        company_id: CompanyId,
        filter: &EntryFilter,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let mut entries: Vec<JournalEntry> = self
            .working
            .entries
            .values()
            .filter(|e| e.company_id == company_id && filter.accepts(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.entry_date
                .cmp(&a.entry_date)
                .then_with(|| b.journal_number.cmp(&a.journal_number))
        });

        let offset = usize::try_from(filter.offset).unwrap_or(usize::MAX);
        let limit = match filter.limit {
            0 => usize::MAX,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };
        Ok(entries.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_entries(
        &mut self,
        company_id: CompanyId,
        filter: &EntryFilter,
    ) -> Result<u64, StoreError> {
        let count = self
            .working
            .entries
            .values()
            .filter(|e| e.company_id == company_id && filter.accepts(e))
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn next_journal_sequence(
        &mut self,
        company_id: CompanyId,
        fiscal_year: i32,
    ) -> Result<i64, StoreError> {
        let counter = self
            .working
            .sequences
            .entry((company_id, fiscal_year))
            .or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn insert_entry(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        if entry.status != JournalStatus::Cancelled && self.is_live_duplicate(entry) {
            return Err(StoreError::DuplicateSource {
                source_type: entry.source_type.clone(),
                source_id: entry.source_id.clone(),
            });
        }
        self.working.entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn update_entry(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        let stored = self
            .working
            .entries
            .get_mut(&entry.id)
            .ok_or_else(|| StoreError::not_found("journal entry", entry.id))?;
        let lines = std::mem::take(&mut stored.lines);
        *stored = JournalEntry {
            lines,
            ..entry.clone()
        };
        Ok(())
    }

    async fn replace_lines(
        &mut self,
        entry_id: JournalEntryId,
        lines: &[JournalLine],
    ) -> Result<(), StoreError> {
        let stored = self
            .working
            .entries
            .get_mut(&entry_id)
            .ok_or_else(|| StoreError::not_found("journal entry", entry_id))?;
        stored.lines = lines.to_vec();
        Ok(())
    }

    async fn period_balance_before(
        &mut self,
        account_id: AccountId,
        key: PeriodKey,
    ) -> Result<Option<PeriodBalance>, StoreError> {
        let floor = PeriodKey {
            fiscal_year: i32::MIN,
            period: 0,
        };
        Ok(self
            .working
            .periods
            .range((account_id, floor)..(account_id, key))
            .next_back()
            .map(|(_, row)| row.clone()))
    }

    async fn period_balances_from(
        &mut self,
        account_id: AccountId,
        key: PeriodKey,
    ) -> Result<Vec<PeriodBalance>, StoreError> {
        let ceiling = PeriodKey {
            fiscal_year: i32::MAX,
            period: u32::MAX,
        };
        Ok(self
            .working
            .periods
            .range((account_id, key)..=(account_id, ceiling))
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn save_period_balances(&mut self, rows: &[PeriodBalance]) -> Result<(), StoreError> {
        for row in rows {
            self.working
                .periods
                .insert((row.account_id, row.key()), row.clone());
        }
        Ok(())
    }

    async fn period_balances(
        &mut self,
        company_id: CompanyId,
    ) -> Result<Vec<PeriodBalance>, StoreError> {
        Ok(self
            .working
            .periods
            .values()
            .filter(|row| row.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn replace_period_balances(
        &mut self,
        company_id: CompanyId,
        rows: &[PeriodBalance],
    ) -> Result<(), StoreError> {
        self.working
            .periods
            .retain(|_, row| row.company_id != company_id);
        self.save_period_balances(rows).await
    }

    async fn posted_lines(
        &mut self,
        company_id: CompanyId,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PostedLine>, StoreError> {
        Ok(self
            .working
            .entries
            .values()
            .filter(|e| e.company_id == company_id && e.affects_balances())
            .filter(|e| to.is_none_or(|d| e.entry_date <= d))
            .flat_map(|e| {
                e.lines.iter().map(|line| PostedLine {
                    account_id: line.account_id,
                    entry_date: e.entry_date,
                    debit: line.debit_amount,
                    credit: line.credit_amount,
                })
            })
            .collect())
    }

    async fn ledger_lines(
        &mut self,
        account_id: AccountId,
        to: NaiveDate,
    ) -> Result<Vec<LedgerLine>, StoreError> {
        let mut rows: Vec<(&JournalEntry, &JournalLine)> = self
            .working
            .entries
            .values()
            .filter(|e| e.affects_balances() && e.entry_date <= to)
            .flat_map(|e| {
                e.lines
                    .iter()
                    .filter(|l| l.account_id == account_id)
                    .map(move |l| (e, l))
            })
            .collect();
        rows.sort_by(|(ea, la), (eb, lb)| {
            ea.entry_date
                .cmp(&eb.entry_date)
                .then_with(|| ea.posted_at.cmp(&eb.posted_at))
                .then_with(|| ea.journal_number.cmp(&eb.journal_number))
                .then_with(|| la.line_number.cmp(&lb.line_number))
        });

        Ok(rows
            .into_iter()
            .map(|(entry, line)| LedgerLine {
                journal_entry_id: entry.id,
                journal_number: entry.journal_number.clone(),
                entry_date: entry.entry_date,
                narration: entry.narration.clone(),
                memo: line.memo.clone(),
                debit: line.debit_amount,
                credit: line.credit_amount,
            })
            .collect())
    }

    async fn insert_usage_log(&mut self, log: &RuleUsageLog) -> Result<(), StoreError> {
        self.working.usage_logs.push(log.clone());
        Ok(())
    }

    async fn usage_logs(
        &mut self,
        company_id: CompanyId,
        filter: &UsageLogFilter,
        limit: u64,
    ) -> Result<Vec<RuleUsageLog>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .working
            .usage_logs
            .iter()
            .rev()
            .filter(|log| log.company_id == company_id && filter.accepts(log))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        *self.guard = self.working;
        Ok(())
    }
}
