//! Account repository for chart of accounts database operations.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use ledgerflow_core::coa::Account;
use ledgerflow_core::engine::{ACCOUNT_ENTITY, StoreError};
use ledgerflow_shared::types::{AccountId, CompanyId};

use crate::entities::accounts;
use crate::error::{store_error, unique_violation};

/// Unique constraint on `(company_id, code)`.
const CODE_CONSTRAINT: &str = "uq_accounts_code";

/// Account repository.
#[derive(Debug, Clone, Copy)]
pub struct AccountRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> AccountRepository<'a, C> {
    /// Creates a new account repository.
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Lists a company's accounts, parents before children.
    pub async fn list(&self, company_id: CompanyId) -> Result<Vec<Account>, StoreError> {
        let rows = accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .order_by_asc(accounts::Column::Depth)
            .order_by_asc(accounts::Column::Code)
            .all(self.conn)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(to_domain).collect())
    }

    /// Inserts an account.
    ///
    /// Fails with `Duplicate` for [`ACCOUNT_ENTITY`] if the code is already
    /// used in the company, which the engine reports as a duplicate code.
    pub async fn insert(&self, account: &Account) -> Result<(), StoreError> {
        let model = accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            company_id: Set(account.company_id.into_inner()),
            code: Set(account.code.clone()),
            name: Set(account.name.clone()),
            account_type: Set(account.account_type.into()),
            normal_balance: Set(account.normal_balance.into()),
            parent_id: Set(account.parent_id.map(AccountId::into_inner)),
            depth: Set(account.depth),
            path: Set(account.path.clone()),
            balance: Set(account.balance),
            is_active: Set(account.is_active),
            is_suspense: Set(account.is_suspense),
            created_at: Set(account.created_at.into()),
            updated_at: Set(account.updated_at.into()),
        };
        model
            .insert(self.conn)
            .await
            .map_err(|e| duplicate_code(e, &account.code))?;
        Ok(())
    }

    /// Writes the display metadata of an account.
    pub async fn update_metadata(&self, account: &Account) -> Result<(), StoreError> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Name, Expr::value(account.name.clone()))
            .col_expr(accounts::Column::IsActive, Expr::value(account.is_active))
            .col_expr(
                accounts::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(
                    account.updated_at,
                )),
            )
            .filter(accounts::Column::Id.eq(account.id.into_inner()))
            .exec(self.conn)
            .await
            .map_err(store_error)?;
        if result.rows_affected == 0 {
            return Err(StoreError::not_found("account", account.id));
        }
        Ok(())
    }

    /// Locks accounts with `SELECT ... FOR UPDATE` in ascending id order.
    ///
    /// Fails with `NotFound` if any id is missing or belongs to another company.
    pub async fn lock(
        &self,
        company_id: CompanyId,
        ids: &[AccountId],
    ) -> Result<Vec<Account>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .filter(accounts::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
            .order_by_asc(accounts::Column::Id)
            .lock_exclusive()
            .all(self.conn)
            .await
            .map_err(store_error)?;

        let locked: Vec<Account> = rows.into_iter().map(to_domain).collect();
        ids.iter()
            .map(|id| {
                locked
                    .iter()
                    .find(|a| a.id == *id)
                    .cloned()
                    .ok_or_else(|| StoreError::not_found("account", id))
            })
            .collect()
    }

    /// Adds `delta` to the running balance and returns the new balance.
    pub async fn apply_delta(
        &self,
        account_id: AccountId,
        delta: Decimal,
    ) -> Result<Decimal, StoreError> {
        let rows = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(delta),
            )
            .col_expr(
                accounts::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(accounts::Column::Id.eq(account_id.into_inner()))
            .exec_with_returning(self.conn)
            .await
            .map_err(store_error)?;
        rows.into_iter()
            .next()
            .map(|row| row.balance)
            .ok_or_else(|| StoreError::not_found("account", account_id))
    }

    /// Overwrites the running balance.
    pub async fn set_balance(
        &self,
        account_id: AccountId,
        balance: Decimal,
    ) -> Result<(), StoreError> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(balance))
            .col_expr(
                accounts::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(accounts::Column::Id.eq(account_id.into_inner()))
            .exec(self.conn)
            .await
            .map_err(store_error)?;
        if result.rows_affected == 0 {
            return Err(StoreError::not_found("account", account_id));
        }
        Ok(())
    }
}

fn duplicate_code(err: DbErr, code: &str) -> StoreError {
    match unique_violation(&err) {
        Some(message) => unique_to_store(message, code),
        None => store_error(err),
    }
}

fn unique_to_store(message: String, code: &str) -> StoreError {
    if message.contains(CODE_CONSTRAINT) {
        StoreError::Duplicate {
            entity: ACCOUNT_ENTITY,
            key: code.to_string(),
        }
    } else {
        StoreError::Duplicate {
            entity: "account row",
            key: message,
        }
    }
}

fn to_domain(model: accounts::Model) -> Account {
    Account {
        id: AccountId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        code: model.code,
        name: model.name,
        account_type: model.account_type.into(),
        normal_balance: model.normal_balance.into(),
        parent_id: model.parent_id.map(AccountId::from_uuid),
        depth: model.depth,
        path: model.path,
        balance: model.balance,
        is_active: model.is_active,
        is_suspense: model.is_suspense,
        created_at: model.created_at.to_utc(),
        updated_at: model.updated_at.to_utc(),
    }
}
