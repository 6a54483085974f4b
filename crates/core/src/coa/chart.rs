//! In-memory chart of accounts for one company.
//!
//! Accounts live in a flat arena indexed by id and by code, with a parent
//! index for hierarchy views. Depth and path are computed once at creation.

use chrono::Utc;
use std::collections::HashMap;

use ledgerflow_shared::types::{AccountId, CompanyId};

use super::error::CoaError;
use super::suspense::missing_suspense_accounts;
use super::types::{Account, NewAccount};

/// A company's chart of accounts.
#[derive(Debug, Clone)]
pub struct ChartOfAccounts {
    company_id: CompanyId,
    accounts: Vec<Account>,
    by_id: HashMap<AccountId, usize>,
    by_code: HashMap<String, usize>,
    children: HashMap<AccountId, Vec<usize>>,
}

impl ChartOfAccounts {
    /// Creates an empty chart for a company.
    #[must_use]
    pub fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            accounts: Vec::new(),
            by_id: HashMap::new(),
            by_code: HashMap::new(),
            children: HashMap::new(),
        }
    }

    /// Rebuilds a chart from stored accounts.
    ///
    /// Accounts must be ordered so that parents precede children (ordering by
    /// depth is enough).
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate codes or dangling parents.
    pub fn from_accounts(
        company_id: CompanyId,
        accounts: impl IntoIterator<Item = Account>,
    ) -> Result<Self, CoaError> {
        let mut chart = Self::new(company_id);
        for account in accounts {
            if let Some(parent_id) = account.parent_id
                && !chart.by_id.contains_key(&parent_id)
            {
                return Err(CoaError::ParentNotFound(parent_id.to_string()));
            }
            chart.insert(account)?;
        }
        Ok(chart)
    }

    /// The owning company.
    #[must_use]
    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Number of accounts in the chart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the chart has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Iterates accounts in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if the code is taken and `ParentNotFound` if the
    /// parent code is unknown.
    pub fn create_account(&mut self, input: NewAccount) -> Result<&Account, CoaError> {
        if self.by_code.contains_key(input.code.trim()) {
            return Err(CoaError::DuplicateCode(input.code.trim().to_string()));
        }

        let parent = match input.parent_code.as_deref() {
            Some(code) => Some(
                self.find_by_code(code)
                    .ok_or_else(|| CoaError::ParentNotFound(code.to_string()))?,
            ),
            None => None,
        };

        let account = Account::from_new(self.company_id, input, parent)?;
        let idx = self.insert(account)?;
        Ok(&self.accounts[idx])
    }

    /// Creates any of the five suspense accounts that are missing.
    ///
    /// Returns the ids of the accounts created.
    ///
    /// # Errors
    ///
    /// Returns an error if a suspense code is taken by a non-suspense account
    /// of a different shape (cannot happen for codes created here).
    pub fn ensure_suspense_accounts(&mut self) -> Result<Vec<AccountId>, CoaError> {
        let missing = missing_suspense_accounts(self.by_code.keys().map(String::as_str));
        let mut created = Vec::with_capacity(missing.len());
        for input in missing {
            created.push(self.create_account(input)?.id);
        }
        Ok(created)
    }

    /// Looks up an account by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is unknown.
    pub fn get(&self, id: AccountId) -> Result<&Account, CoaError> {
        self.by_id
            .get(&id)
            .map(|&idx| &self.accounts[idx])
            .ok_or_else(|| CoaError::NotFound(id.to_string()))
    }

    /// Looks up an account by code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the code is unknown.
    pub fn get_by_code(&self, code: &str) -> Result<&Account, CoaError> {
        self.find_by_code(code)
            .ok_or_else(|| CoaError::NotFound(code.to_string()))
    }

    /// Looks up an account by code, returning `None` if absent.
    #[must_use]
    pub fn find_by_code(&self, code: &str) -> Option<&Account> {
        self.by_code.get(code.trim()).map(|&idx| &self.accounts[idx])
    }

    /// Changes an account's display name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is unknown, `InvalidName` if blank.
    pub fn rename_account(&mut self, id: AccountId, name: &str) -> Result<&Account, CoaError> {
        let account = self.get_mut(id)?;
        if name.trim().is_empty() {
            return Err(CoaError::InvalidName(account.code.clone()));
        }
        account.name = name.trim().to_string();
        account.updated_at = Utc::now();
        Ok(&*account)
    }

    /// Deactivates an account. Accounts are never deleted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is unknown and `SuspenseAccountRequired`
    /// for suspense accounts.
    pub fn deactivate_account(&mut self, id: AccountId) -> Result<&Account, CoaError> {
        let account = self.get_mut(id)?;
        if account.is_suspense {
            return Err(CoaError::SuspenseAccountRequired(account.code.clone()));
        }
        account.is_active = false;
        account.updated_at = Utc::now();
        Ok(&*account)
    }

    /// Direct children of an account, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is unknown.
    pub fn children(&self, id: AccountId) -> Result<Vec<&Account>, CoaError> {
        self.get(id)?;
        Ok(self
            .children
            .get(&id)
            .map(|idxs| idxs.iter().map(|&i| &self.accounts[i]).collect())
            .unwrap_or_default())
    }

    /// All descendants of an account, depth-first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is unknown.
    pub fn descendants(&self, id: AccountId) -> Result<Vec<&Account>, CoaError> {
        self.get(id)?;
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self
            .children
            .get(&id)
            .map(|c| c.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(idx) = stack.pop() {
            let account = &self.accounts[idx];
            out.push(account);
            if let Some(c) = self.children.get(&account.id) {
                stack.extend(c.iter().rev().copied());
            }
        }
        Ok(out)
    }

    fn get_mut(&mut self, id: AccountId) -> Result<&mut Account, CoaError> {
        let idx = *self
            .by_id
            .get(&id)
            .ok_or_else(|| CoaError::NotFound(id.to_string()))?;
        Ok(&mut self.accounts[idx])
    }

    fn insert(&mut self, account: Account) -> Result<usize, CoaError> {
        if self.by_code.contains_key(&account.code) {
            return Err(CoaError::DuplicateCode(account.code));
        }
        let idx = self.accounts.len();
        self.by_id.insert(account.id, idx);
        self.by_code.insert(account.code.clone(), idx);
        if let Some(parent_id) = account.parent_id {
            self.children.entry(parent_id).or_default().push(idx);
        }
        self.accounts.push(account);
        Ok(idx)
    }
}
