//! Company repository.

use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, NotSet, QueryOrder, Set};

use ledgerflow_core::coa::Company;
use ledgerflow_core::engine::StoreError;
use ledgerflow_shared::types::{CompanyId, CurrencyCode};

use crate::entities::companies;
use crate::error::{corrupt, store_error, unique_violation};

/// Company repository.
#[derive(Debug, Clone, Copy)]
pub struct CompanyRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> CompanyRepository<'a, C> {
    /// Creates a new company repository.
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Finds a company by ID.
    pub async fn find(&self, id: CompanyId) -> Result<Company, StoreError> {
        companies::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::not_found("company", id))
            .and_then(to_domain)
    }

    /// Lists all companies by name.
    pub async fn list(&self) -> Result<Vec<Company>, StoreError> {
        companies::Entity::find()
            .order_by_asc(companies::Column::Name)
            .all(self.conn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    /// Inserts a company.
    pub async fn insert(&self, company: &Company) -> Result<(), StoreError> {
        let model = companies::ActiveModel {
            id: Set(company.id.into_inner()),
            name: Set(company.name.clone()),
            base_currency: Set(company.base_currency.to_string()),
            fiscal_year_start_month: Set(i32::try_from(company.fiscal_year_start_month)
                .map_err(|e| corrupt("fiscal year start month", e))?),
            created_at: NotSet,
        };
        model.insert(self.conn).await.map_err(|e| {
            if unique_violation(&e).is_some() {
                StoreError::Duplicate {
                    entity: "company",
                    key: company.id.to_string(),
                }
            } else {
                store_error(e)
            }
        })?;
        Ok(())
    }
}

fn to_domain(model: companies::Model) -> Result<Company, StoreError> {
    Ok(Company {
        id: CompanyId::from_uuid(model.id),
        name: model.name,
        base_currency: CurrencyCode::parse(model.base_currency.trim())
            .map_err(|e| corrupt("currency", e))?,
        fiscal_year_start_month: u32::try_from(model.fiscal_year_start_month)
            .map_err(|e| corrupt("fiscal year start month", e))?,
    })
}
