//! Period balance repository.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};

use ledgerflow_core::engine::StoreError;
use ledgerflow_core::ledger::{PeriodBalance, PeriodKey};
use ledgerflow_shared::types::{AccountId, CompanyId, PeriodBalanceId};

use crate::entities::period_balances;
use crate::error::{corrupt, store_error};

/// Period balance repository.
#[derive(Debug, Clone, Copy)]
pub struct PeriodBalanceRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> PeriodBalanceRepository<'a, C> {
    /// Creates a new period balance repository.
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// The account's latest row strictly before `key`.
    pub async fn latest_before(
        &self,
        account_id: AccountId,
        key: PeriodKey,
    ) -> Result<Option<PeriodBalance>, StoreError> {
        let month = month_column(key.period)?;
        let earlier = Condition::any()
            .add(period_balances::Column::FiscalYear.lt(key.fiscal_year))
            .add(
                Condition::all()
                    .add(period_balances::Column::FiscalYear.eq(key.fiscal_year))
                    .add(period_balances::Column::PeriodMonth.lt(month)),
            );
        period_balances::Entity::find()
            .filter(period_balances::Column::AccountId.eq(account_id.into_inner()))
            .filter(earlier)
            .order_by_desc(period_balances::Column::FiscalYear)
            .order_by_desc(period_balances::Column::PeriodMonth)
            .limit(1)
            .one(self.conn)
            .await
            .map_err(store_error)?
            .map(to_domain)
            .transpose()
    }

    /// The account's rows at or after `key`, ascending.
    pub async fn from_period(
        &self,
        account_id: AccountId,
        key: PeriodKey,
    ) -> Result<Vec<PeriodBalance>, StoreError> {
        let month = month_column(key.period)?;
        let later = Condition::any()
            .add(period_balances::Column::FiscalYear.gt(key.fiscal_year))
            .add(
                Condition::all()
                    .add(period_balances::Column::FiscalYear.eq(key.fiscal_year))
                    .add(period_balances::Column::PeriodMonth.gte(month)),
            );
        period_balances::Entity::find()
            .filter(period_balances::Column::AccountId.eq(account_id.into_inner()))
            .filter(later)
            .order_by_asc(period_balances::Column::FiscalYear)
            .order_by_asc(period_balances::Column::PeriodMonth)
            .all(self.conn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    /// Every row of a company.
    pub async fn list(&self, company_id: CompanyId) -> Result<Vec<PeriodBalance>, StoreError> {
        period_balances::Entity::find()
            .filter(period_balances::Column::CompanyId.eq(company_id.into_inner()))
            .order_by_asc(period_balances::Column::AccountId)
            .order_by_asc(period_balances::Column::FiscalYear)
            .order_by_asc(period_balances::Column::PeriodMonth)
            .all(self.conn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    /// Inserts rows, updating the figures of any (account, year, period) that exists.
    pub async fn upsert(&self, rows: &[PeriodBalance]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let models = rows.iter().map(to_active).collect::<Result<Vec<_>, _>>()?;
        period_balances::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    period_balances::Column::AccountId,
                    period_balances::Column::FiscalYear,
                    period_balances::Column::PeriodMonth,
                ])
                .update_columns([
                    period_balances::Column::Opening,
                    period_balances::Column::PeriodDebit,
                    period_balances::Column::PeriodCredit,
                    period_balances::Column::Closing,
                ])
                .to_owned(),
            )
            .exec(self.conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    /// Deletes every row of a company and writes `rows` instead.
    pub async fn replace_all(
        &self,
        company_id: CompanyId,
        rows: &[PeriodBalance],
    ) -> Result<(), StoreError> {
        period_balances::Entity::delete_many()
            .filter(period_balances::Column::CompanyId.eq(company_id.into_inner()))
            .exec(self.conn)
            .await
            .map_err(store_error)?;
        self.upsert(rows).await
    }
}

fn month_column(period: u32) -> Result<i32, StoreError> {
    i32::try_from(period).map_err(|e| corrupt("period month", e))
}

fn to_active(row: &PeriodBalance) -> Result<period_balances::ActiveModel, StoreError> {
    Ok(period_balances::ActiveModel {
        id: Set(row.id.into_inner()),
        company_id: Set(row.company_id.into_inner()),
        account_id: Set(row.account_id.into_inner()),
        fiscal_year: Set(row.fiscal_year),
        period_month: Set(month_column(row.period_month)?),
        opening: Set(row.opening),
        period_debit: Set(row.period_debit),
        period_credit: Set(row.period_credit),
        closing: Set(row.closing),
    })
}

fn to_domain(model: period_balances::Model) -> Result<PeriodBalance, StoreError> {
    Ok(PeriodBalance {
        id: PeriodBalanceId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        account_id: AccountId::from_uuid(model.account_id),
        fiscal_year: model.fiscal_year,
        period_month: u32::try_from(model.period_month)
            .map_err(|e| corrupt("period month", e))?,
        opening: model.opening,
        period_debit: model.period_debit,
        period_credit: model.period_credit,
        closing: model.closing,
    })
}
