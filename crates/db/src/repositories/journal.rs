//! Journal repository: entries, lines, numbering and posted-line projections.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, Statement,
};
use uuid::Uuid;

use ledgerflow_core::engine::{EntryFilter, StoreError};
use ledgerflow_core::ledger::{JournalEntry, JournalLine, PostedLine, SubledgerRef};
use ledgerflow_core::reports::LedgerLine;
use ledgerflow_shared::types::{
    AccountId, CompanyId, CurrencyCode, JournalEntryId, JournalLineId, PostingRuleId,
};

use crate::entities::{journal_entries, journal_lines, sea_orm_active_enums::JournalStatus};
use crate::error::{corrupt, store_error, unique_violation};

/// Partial unique index holding the idempotency key.
const SOURCE_INDEX: &str = "uq_journal_entries_source";
/// Partial unique index allowing one reversal per entry.
const REVERSAL_INDEX: &str = "uq_journal_entries_reversal_of";

const NEXT_SEQUENCE_SQL: &str = r"
INSERT INTO journal_sequences (company_id, fiscal_year, last_value)
VALUES ($1, $2, 1)
ON CONFLICT (company_id, fiscal_year)
DO UPDATE SET last_value = journal_sequences.last_value + 1
RETURNING last_value
";

/// Statuses whose lines count towards balances.
const BALANCE_STATUSES: [JournalStatus; 2] = [JournalStatus::Posted, JournalStatus::Reversed];

#[derive(Debug, FromQueryResult)]
struct PostedRow {
    account_id: Uuid,
    entry_date: NaiveDate,
    debit_amount: Decimal,
    credit_amount: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct LedgerRow {
    entry_id: Uuid,
    journal_number: String,
    entry_date: NaiveDate,
    narration: Option<String>,
    memo: Option<String>,
    debit_amount: Decimal,
    credit_amount: Decimal,
}

/// Journal repository.
#[derive(Debug, Clone, Copy)]
pub struct JournalRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> JournalRepository<'a, C> {
    /// Creates a new journal repository.
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Loads an entry with its lines, taking a row lock on the header.
    pub async fn find_for_update(
        &self,
        company_id: CompanyId,
        id: JournalEntryId,
    ) -> Result<JournalEntry, StoreError> {
        let header = journal_entries::Entity::find_by_id(id.into_inner())
            .filter(journal_entries::Column::CompanyId.eq(company_id.into_inner()))
            .lock_exclusive()
            .one(self.conn)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::not_found("journal entry", id))?;
        let lines = self.lines_of(&[header.id]).await?.remove(&header.id);
        to_domain(header, lines.unwrap_or_default())
    }

    /// Finds the live (non-cancelled) entry for an idempotency key.
    pub async fn find_by_source(
        &self,
        company_id: CompanyId,
        source_type: &str,
        source_id: &str,
    ) -> Result<Option<JournalEntry>, StoreError> {
        let Some(header) = journal_entries::Entity::find()
            .filter(journal_entries::Column::CompanyId.eq(company_id.into_inner()))
            .filter(journal_entries::Column::SourceType.eq(source_type))
            .filter(journal_entries::Column::SourceId.eq(source_id))
            .filter(journal_entries::Column::Status.ne(JournalStatus::Cancelled))
            .one(self.conn)
            .await
            .map_err(store_error)?
        else {
            return Ok(None);
        };
        let lines = self.lines_of(&[header.id]).await?.remove(&header.id);
        to_domain(header, lines.unwrap_or_default()).map(Some)
    }

    /// Lists entries matching a filter, newest entry date first.
    pub async fn list(
        &self,
        company_id: CompanyId,
        filter: &EntryFilter,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let mut query = filtered(company_id, filter)
            .order_by_desc(journal_entries::Column::EntryDate)
            .order_by_desc(journal_entries::Column::JournalNumber)
            .offset(filter.offset);
        if filter.limit > 0 {
            query = query.limit(filter.limit);
        }

        let headers = query.all(self.conn).await.map_err(store_error)?;
        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let mut lines = self.lines_of(&ids).await?;
        headers
            .into_iter()
            .map(|header| {
                let own = lines.remove(&header.id).unwrap_or_default();
                to_domain(header, own)
            })
            .collect()
    }

    /// Counts entries matching a filter, ignoring its limit and offset.
    pub async fn count(
        &self,
        company_id: CompanyId,
        filter: &EntryFilter,
    ) -> Result<u64, StoreError> {
        filtered(company_id, filter)
            .count(self.conn)
            .await
            .map_err(store_error)
    }

    /// Increments and returns the journal counter of (company, fiscal year).
    pub async fn next_sequence(
        &self,
        company_id: CompanyId,
        fiscal_year: i32,
    ) -> Result<i64, StoreError> {
        let stmt = Statement::from_sql_and_values(
            self.conn.get_database_backend(),
            NEXT_SEQUENCE_SQL,
            [company_id.into_inner().into(), fiscal_year.into()],
        );
        let row = self
            .conn
            .query_one(stmt)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::Backend("journal sequence returned no row".to_string()))?;
        row.try_get::<i64>("", "last_value").map_err(store_error)
    }

    /// Inserts an entry with its lines.
    ///
    /// A clash on the idempotency index (or on the one-reversal index) is
    /// reported as `DuplicateSource`.
    pub async fn insert(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        to_active(entry)
            .insert(self.conn)
            .await
            .map_err(|e| duplicate_source(e, entry))?;
        self.insert_lines(&entry.lines).await
    }

    /// Writes the header of an entry.
    pub async fn update_header(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        to_active(entry)
            .update(self.conn)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => StoreError::not_found("journal entry", entry.id),
                other => duplicate_source(other, entry),
            })?;
        Ok(())
    }

    /// Replaces all lines of an entry.
    pub async fn replace_lines(
        &self,
        entry_id: JournalEntryId,
        lines: &[JournalLine],
    ) -> Result<(), StoreError> {
        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::EntryId.eq(entry_id.into_inner()))
            .exec(self.conn)
            .await
            .map_err(store_error)?;
        self.insert_lines(lines).await
    }

    /// Lines of posted and reversed entries dated up to `to`.
    pub async fn posted_lines(
        &self,
        company_id: CompanyId,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PostedLine>, StoreError> {
        let mut query = journal_lines::Entity::find()
            .select_only()
            .column(journal_lines::Column::AccountId)
            .column(journal_entries::Column::EntryDate)
            .column(journal_lines::Column::DebitAmount)
            .column(journal_lines::Column::CreditAmount)
            .inner_join(journal_entries::Entity)
            .filter(journal_entries::Column::CompanyId.eq(company_id.into_inner()))
            .filter(journal_entries::Column::Status.is_in(BALANCE_STATUSES));
        if let Some(to) = to {
            query = query.filter(journal_entries::Column::EntryDate.lte(to));
        }

        let rows = query
            .into_model::<PostedRow>()
            .all(self.conn)
            .await
            .map_err(store_error)?;
        Ok(rows
            .into_iter()
            .map(|row| PostedLine {
                account_id: AccountId::from_uuid(row.account_id),
                entry_date: row.entry_date,
                debit: row.debit_amount,
                credit: row.credit_amount,
            })
            .collect())
    }

    /// Posted lines of one account dated up to `to`, in posting order.
    pub async fn ledger_lines(
        &self,
        account_id: AccountId,
        to: NaiveDate,
    ) -> Result<Vec<LedgerLine>, StoreError> {
        let rows = journal_lines::Entity::find()
            .select_only()
            .column_as(journal_entries::Column::Id, "entry_id")
            .column(journal_entries::Column::JournalNumber)
            .column(journal_entries::Column::EntryDate)
            .column(journal_entries::Column::Narration)
            .column(journal_lines::Column::Memo)
            .column(journal_lines::Column::DebitAmount)
            .column(journal_lines::Column::CreditAmount)
            .inner_join(journal_entries::Entity)
            .filter(journal_lines::Column::AccountId.eq(account_id.into_inner()))
            .filter(journal_entries::Column::Status.is_in(BALANCE_STATUSES))
            .filter(journal_entries::Column::EntryDate.lte(to))
            .order_by_asc(journal_entries::Column::EntryDate)
            .order_by_asc(journal_entries::Column::PostedAt)
            .order_by_asc(journal_entries::Column::JournalNumber)
            .order_by_asc(journal_lines::Column::LineNumber)
            .into_model::<LedgerRow>()
            .all(self.conn)
            .await
            .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .map(|row| LedgerLine {
                journal_entry_id: JournalEntryId::from_uuid(row.entry_id),
                journal_number: row.journal_number,
                entry_date: row.entry_date,
                narration: row.narration,
                memo: row.memo,
                debit: row.debit_amount,
                credit: row.credit_amount,
            })
            .collect())
    }

    async fn insert_lines(&self, lines: &[JournalLine]) -> Result<(), StoreError> {
        if lines.is_empty() {
            return Ok(());
        }
        journal_lines::Entity::insert_many(lines.iter().map(line_to_active))
            .exec(self.conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    /// Loads lines of the given entries, grouped by entry, in line order.
    async fn lines_of(
        &self,
        entry_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<journal_lines::Model>>, StoreError> {
        let mut grouped: HashMap<Uuid, Vec<journal_lines::Model>> = HashMap::new();
        if entry_ids.is_empty() {
            return Ok(grouped);
        }
        let rows = journal_lines::Entity::find()
            .filter(journal_lines::Column::EntryId.is_in(entry_ids.iter().copied()))
            .order_by_asc(journal_lines::Column::EntryId)
            .order_by_asc(journal_lines::Column::LineNumber)
            .all(self.conn)
            .await
            .map_err(store_error)?;
        for row in rows {
            grouped.entry(row.entry_id).or_default().push(row);
        }
        Ok(grouped)
    }
}

fn filtered(company_id: CompanyId, filter: &EntryFilter) -> Select<journal_entries::Entity> {
    let mut query = journal_entries::Entity::find()
        .filter(journal_entries::Column::CompanyId.eq(company_id.into_inner()));
    if let Some(status) = filter.status {
        query = query.filter(journal_entries::Column::Status.eq(JournalStatus::from(status)));
    }
    if let Some(source_type) = &filter.source_type {
        query = query.filter(journal_entries::Column::SourceType.eq(source_type.as_str()));
    }
    if let Some(flag) = filter.needs_reclassification {
        query = query.filter(journal_entries::Column::NeedsReclassification.eq(flag));
    }
    if let Some(from) = filter.from {
        query = query.filter(journal_entries::Column::EntryDate.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(journal_entries::Column::EntryDate.lte(to));
    }
    query
}

fn duplicate_source(err: DbErr, entry: &JournalEntry) -> StoreError {
    match unique_violation(&err) {
        Some(message) if message.contains(SOURCE_INDEX) || message.contains(REVERSAL_INDEX) => {
            StoreError::DuplicateSource {
                source_type: entry.source_type.clone(),
                source_id: entry.source_id.clone(),
            }
        }
        Some(message) => StoreError::Duplicate {
            entity: "journal entry",
            key: message,
        },
        None => store_error(err),
    }
}

fn to_active(entry: &JournalEntry) -> journal_entries::ActiveModel {
    journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        company_id: Set(entry.company_id.into_inner()),
        journal_number: Set(entry.journal_number.clone()),
        fiscal_year: Set(entry.fiscal_year),
        entry_date: Set(entry.entry_date),
        source_type: Set(entry.source_type.clone()),
        source_id: Set(entry.source_id.clone()),
        source_number: Set(entry.source_number.clone()),
        trigger_event: Set(entry.trigger_event.clone()),
        rule_id: Set(entry.rule_id.map(PostingRuleId::into_inner)),
        status: Set(entry.status.into()),
        total_debit: Set(entry.total_debit),
        total_credit: Set(entry.total_credit),
        currency: Set(entry.currency.to_string()),
        exchange_rate: Set(entry.exchange_rate),
        narration: Set(entry.narration.clone()),
        needs_reclassification: Set(entry.needs_reclassification),
        reversal_of: Set(entry.reversal_of.map(JournalEntryId::into_inner)),
        reversed_by: Set(entry.reversed_by.map(JournalEntryId::into_inner)),
        reversal_reason: Set(entry.reversal_reason.clone()),
        cancellation_reason: Set(entry.cancellation_reason.clone()),
        posted_at: Set(entry.posted_at.map(Into::into)),
        created_at: Set(entry.created_at.into()),
        updated_at: Set(entry.updated_at.into()),
    }
}

fn line_to_active(line: &JournalLine) -> journal_lines::ActiveModel {
    journal_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        entry_id: Set(line.entry_id.into_inner()),
        line_number: Set(line.line_number),
        account_id: Set(line.account_id.into_inner()),
        account_code: Set(line.account_code.clone()),
        debit_amount: Set(line.debit_amount),
        credit_amount: Set(line.credit_amount),
        subledger_kind: Set(line.subledger.as_ref().map(|s| s.kind.into())),
        subledger_id: Set(line.subledger.as_ref().map(|s| s.id.clone())),
        memo: Set(line.memo.clone()),
    }
}

fn to_domain(
    header: journal_entries::Model,
    lines: Vec<journal_lines::Model>,
) -> Result<JournalEntry, StoreError> {
    Ok(JournalEntry {
        id: JournalEntryId::from_uuid(header.id),
        company_id: CompanyId::from_uuid(header.company_id),
        journal_number: header.journal_number,
        fiscal_year: header.fiscal_year,
        entry_date: header.entry_date,
        source_type: header.source_type,
        source_id: header.source_id,
        source_number: header.source_number,
        trigger_event: header.trigger_event,
        rule_id: header.rule_id.map(PostingRuleId::from_uuid),
        status: header.status.into(),
        total_debit: header.total_debit,
        total_credit: header.total_credit,
        currency: CurrencyCode::parse(header.currency.trim())
            .map_err(|e| corrupt("currency", e))?,
        exchange_rate: header.exchange_rate,
        narration: header.narration,
        needs_reclassification: header.needs_reclassification,
        reversal_of: header.reversal_of.map(JournalEntryId::from_uuid),
        reversed_by: header.reversed_by.map(JournalEntryId::from_uuid),
        reversal_reason: header.reversal_reason,
        cancellation_reason: header.cancellation_reason,
        posted_at: header.posted_at.map(|at| at.to_utc()),
        created_at: header.created_at.to_utc(),
        updated_at: header.updated_at.to_utc(),
        lines: lines.into_iter().map(line_to_domain).collect(),
    })
}

fn line_to_domain(model: journal_lines::Model) -> JournalLine {
    let subledger = match (model.subledger_kind, model.subledger_id) {
        (Some(kind), Some(id)) => Some(SubledgerRef {
            kind: kind.into(),
            id,
        }),
        _ => None,
    };
    JournalLine {
        id: JournalLineId::from_uuid(model.id),
        entry_id: JournalEntryId::from_uuid(model.entry_id),
        line_number: model.line_number,
        account_id: AccountId::from_uuid(model.account_id),
        account_code: model.account_code,
        debit_amount: model.debit_amount,
        credit_amount: model.credit_amount,
        subledger,
        memo: model.memo,
    }
}
