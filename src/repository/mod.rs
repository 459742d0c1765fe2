//! Repository layer for persistence
//!
//! Each store is an async trait so services can run against PostgreSQL in
//! production and against [`memory::MemoryStore`] in tests.

pub mod accounts;
pub mod items;
pub mod loans;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        account::{Account, AccountChanges, NewAccount},
        item::{Item, NewItem, UpdateItem},
        loan::{BorrowOutcome, LoanDetails, ReturnOutcome},
    },
};

/// Credential store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch an account, `NotFound` when absent
    async fn get_by_id(&self, id: Uuid) -> AppResult<Account>;

    /// Case-insensitive lookup by email
    async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>>;

    /// Whether another account already uses `email`
    async fn email_exists(&self, email: &str, exclude_id: Option<Uuid>) -> AppResult<bool>;

    async fn admin_exists(&self) -> AppResult<bool>;

    /// Insert an account. Email and single-admin uniqueness are enforced
    /// atomically and reported as `Conflict`.
    async fn insert(&self, account: &NewAccount) -> AppResult<Account>;

    /// Apply the present fields of `changes`, `NotFound` when absent
    async fn update(&self, id: Uuid, changes: &AccountChanges) -> AppResult<Account>;

    /// Approve the account only while it is still pending. `None` when the
    /// account is missing or was already approved.
    async fn approve_pending(&self, id: Uuid) -> AppResult<Option<Account>>;

    /// Remove an account and return it, `NotFound` when absent
    async fn delete(&self, id: Uuid) -> AppResult<Account>;
}

/// Catalog store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Item>>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Item>;

    async fn insert(&self, item: &NewItem) -> AppResult<Item>;

    async fn update(&self, id: Uuid, changes: &UpdateItem) -> AppResult<Item>;

    async fn delete(&self, id: Uuid) -> AppResult<Item>;
}

/// Loan record store. Borrow and return touch the item and the ledger as
/// one unit: either both writes land or neither does.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn borrow(&self, account_id: Uuid, item_id: Uuid) -> AppResult<BorrowOutcome>;

    async fn return_item(&self, account_id: Uuid, item_id: Uuid) -> AppResult<ReturnOutcome>;

    /// Every loan, most recent first
    async fn list_all(&self) -> AppResult<Vec<LoanDetails>>;

    /// Loans of one account, most recent first
    async fn list_for_account(&self, account_id: Uuid) -> AppResult<Vec<LoanDetails>>;
}

/// Handles to every store
#[derive(Clone)]
pub struct Repository {
    pub accounts: Arc<dyn AccountStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub loans: Arc<dyn LoanStore>,
}

impl Repository {
    /// Create a PostgreSQL-backed repository with the given pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            accounts: Arc::new(accounts::PgAccountStore::new(pool.clone())),
            catalog: Arc::new(items::PgCatalogStore::new(pool.clone())),
            loans: Arc::new(loans::PgLoanStore::new(pool)),
        }
    }

    /// Create a repository over a fresh in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            accounts: store.clone(),
            catalog: store.clone(),
            loans: store,
        }
    }
}
