//! PostgreSQL implementation of the ledger storage seam.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::debug;

use ledgerflow_core::audit::{RuleUsageLog, UsageLogFilter};
use ledgerflow_core::coa::{Account, Company};
use ledgerflow_core::engine::{EntryFilter, LedgerStore, LedgerTx, StoreError};
use ledgerflow_core::ledger::{JournalEntry, JournalLine, PeriodBalance, PeriodKey, PostedLine};
use ledgerflow_core::posting::PostingRule;
use ledgerflow_core::reports::LedgerLine;
use ledgerflow_shared::types::{AccountId, CompanyId, JournalEntryId};

use crate::error::store_error;
use crate::repositories::{
    AccountRepository, CompanyRepository, JournalRepository, PeriodBalanceRepository,
    RuleRepository, UsageLogRepository,
};

/// Ledger store backed by PostgreSQL.
///
/// Every transaction sets `statement_timeout` and `lock_timeout` locally, so
/// a stuck statement or lock wait surfaces as a retryable `Timeout`.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
    timeout: Duration,
}

impl PgLedgerStore {
    /// Creates a store over a connection pool.
    pub const fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    /// The underlying connection pool.
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Tx = PgLedgerTx;

    async fn begin(&self) -> Result<PgLedgerTx, StoreError> {
        let txn = self.db.begin().await.map_err(store_error)?;
        let millis = self.timeout.as_millis();
        txn.execute_unprepared(&format!(
            "SET LOCAL statement_timeout = {millis}; SET LOCAL lock_timeout = {millis}"
        ))
        .await
        .map_err(store_error)?;
        debug!(timeout_ms = %millis, "ledger transaction started");
        Ok(PgLedgerTx { txn })
    }
}

/// An open PostgreSQL ledger transaction.
///
/// Dropping it without committing rolls the transaction back.
pub struct PgLedgerTx {
    txn: DatabaseTransaction,
}

impl std::fmt::Debug for PgLedgerTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgLedgerTx").finish_non_exhaustive()
    }
}

impl PgLedgerTx {
    fn accounts_repo(&self) -> AccountRepository<'_, DatabaseTransaction> {
        AccountRepository::new(&self.txn)
    }

    fn journal(&self) -> JournalRepository<'_, DatabaseTransaction> {
        JournalRepository::new(&self.txn)
    }

    fn periods(&self) -> PeriodBalanceRepository<'_, DatabaseTransaction> {
        PeriodBalanceRepository::new(&self.txn)
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn company(&mut self, id: CompanyId) -> Result<Company, StoreError> {
        CompanyRepository::new(&self.txn).find(id).await
    }

    async fn insert_company(&mut self, company: &Company) -> Result<(), StoreError> {
        CompanyRepository::new(&self.txn).insert(company).await
    }

    async fn accounts(&mut self, company_id: CompanyId) -> Result<Vec<Account>, StoreError> {
        self.accounts_repo().list(company_id).await
    }

    async fn insert_account(&mut self, account: &Account) -> Result<(), StoreError> {
        self.accounts_repo().insert(account).await
    }

    async fn update_account(&mut self, account: &Account) -> Result<(), StoreError> {
        self.accounts_repo().update_metadata(account).await
    }

    async fn lock_accounts(
        &mut self,
        company_id: CompanyId,
        ids: &[AccountId],
    ) -> Result<Vec<Account>, StoreError> {
        self.accounts_repo().lock(company_id, ids).await
    }

    async fn apply_delta(
        &mut self,
        account_id: AccountId,
        delta: Decimal,
    ) -> Result<Decimal, StoreError> {
        self.accounts_repo().apply_delta(account_id, delta).await
    }

    async fn set_account_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
    ) -> Result<(), StoreError> {
        self.accounts_repo().set_balance(account_id, balance).await
    }

    async fn rules(
        &mut self,
        company_id: CompanyId,
        source_type: Option<&str>,
    ) -> Result<Vec<PostingRule>, StoreError> {
        RuleRepository::new(&self.txn)
            .list(company_id, source_type)
            .await
    }

    async fn insert_rule(&mut self, rule: &PostingRule) -> Result<(), StoreError> {
        RuleRepository::new(&self.txn).insert(rule).await
    }

    async fn update_rule(&mut self, rule: &PostingRule) -> Result<(), StoreError> {
        RuleRepository::new(&self.txn).update_window(rule).await
    }

    async fn entry(
        &mut self,
        company_id: CompanyId,
        id: JournalEntryId,
    ) -> Result<JournalEntry, StoreError> {
        self.journal().find_for_update(company_id, id).await
    }

    async fn entry_by_source(
        &mut self,
        company_id: CompanyId,
        source_type: &str,
        source_id: &str,
    ) -> Result<Option<JournalEntry>, StoreError> {
        self.journal()
            .find_by_source(company_id, source_type, source_id)
            .await
    }

    async fn entries(
        &mut self,
        company_id: CompanyId,
        filter: &EntryFilter,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        self.journal().list(company_id, filter).await
    }

    async fn count_entries(
        &mut self,
        company_id: CompanyId,
        filter: &EntryFilter,
    ) -> Result<u64, StoreError> {
        self.journal().count(company_id, filter).await
    }

    async fn next_journal_sequence(
        &mut self,
        company_id: CompanyId,
        fiscal_year: i32,
    ) -> Result<i64, StoreError> {
        self.journal().next_sequence(company_id, fiscal_year).await
    }

    async fn insert_entry(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        self.journal().insert(entry).await
    }

    async fn update_entry(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        self.journal().update_header(entry).await
    }

    async fn replace_lines(
        &mut self,
        entry_id: JournalEntryId,
        lines: &[JournalLine],
    ) -> Result<(), StoreError> {
        self.journal().replace_lines(entry_id, lines).await
    }

    async fn period_balance_before(
        &mut self,
        account_id: AccountId,
        key: PeriodKey,
    ) -> Result<Option<PeriodBalance>, StoreError> {
        self.periods().latest_before(account_id, key).await
    }

    async fn period_balances_from(
        &mut self,
        account_id: AccountId,
        key: PeriodKey,
    ) -> Result<Vec<PeriodBalance>, StoreError> {
        self.periods().from_period(account_id, key).await
    }

    async fn save_period_balances(&mut self, rows: &[PeriodBalance]) -> Result<(), StoreError> {
        self.periods().upsert(rows).await
    }

    async fn period_balances(
        &mut self,
        company_id: CompanyId,
    ) -> Result<Vec<PeriodBalance>, StoreError> {
        self.periods().list(company_id).await
    }

    async fn replace_period_balances(
        &mut self,
        company_id: CompanyId,
        rows: &[PeriodBalance],
    ) -> Result<(), StoreError> {
        self.periods().replace_all(company_id, rows).await
    }

    async fn posted_lines(
        &mut self,
        company_id: CompanyId,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PostedLine>, StoreError> {
        self.journal().posted_lines(company_id, to).await
    }

    async fn ledger_lines(
        &mut self,
        account_id: AccountId,
        to: NaiveDate,
    ) -> Result<Vec<LedgerLine>, StoreError> {
        self.journal().ledger_lines(account_id, to).await
    }

    async fn insert_usage_log(&mut self, log: &RuleUsageLog) -> Result<(), StoreError> {
        UsageLogRepository::new(&self.txn).insert(log).await
    }

    async fn usage_logs(
        &mut self,
        company_id: CompanyId,
        filter: &UsageLogFilter,
        limit: u64,
    ) -> Result<Vec<RuleUsageLog>, StoreError> {
        UsageLogRepository::new(&self.txn)
            .list(company_id, filter, limit)
            .await
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(store_error)
    }
}
