//! In-memory implementation of every store
//!
//! A single mutex guards all three collections, so borrow and return are
//! atomic with respect to each other. Used by the test suites and handy for
//! running the API without a database.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AccountStore, CatalogStore, LoanStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        account::{Account, AccountChanges, AccountStatus, NewAccount, Role},
        item::{Item, NewItem, UpdateItem},
        loan::{BorrowOutcome, LoanAccount, LoanDetails, LoanItem, LoanRecord, ReturnOutcome},
    },
};

#[derive(Default)]
struct State {
    accounts: Vec<Account>,
    items: Vec<Item>,
    loans: Vec<LoanRecord>,
}

/// Emails compare like `LOWER(email)` in PostgreSQL
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn account_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Account {} not found", id))
}

fn item_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

impl State {
    fn email_taken(&self, email: &str, exclude_id: Option<Uuid>) -> bool {
        self.accounts
            .iter()
            .any(|a| same_email(&a.email, email) && Some(a.id) != exclude_id)
    }

    fn details(&self, loan: &LoanRecord) -> LoanDetails {
        let account = self
            .accounts
            .iter()
            .find(|a| a.id == loan.account_id)
            .map(|a| LoanAccount {
                id: a.id,
                name: a.name.clone(),
                email: a.email.clone(),
            });
        let item = self.items.iter().find(|i| i.id == loan.item_id).map(|i| LoanItem {
            id: i.id,
            title: i.title.clone(),
            author: i.author.clone(),
        });

        LoanDetails {
            id: loan.id,
            account_id: loan.account_id,
            item_id: loan.item_id,
            account,
            item,
            borrowed_at: loan.borrowed_at,
            returned_at: loan.returned_at,
        }
    }

    /// Matching loans, newest first. Ties keep reverse insertion order.
    fn details_where(&self, filter: impl Fn(&LoanRecord) -> bool) -> Vec<LoanDetails> {
        let mut details: Vec<LoanDetails> = self
            .loans
            .iter()
            .rev()
            .filter(|loan| filter(loan))
            .map(|loan| self.details(loan))
            .collect();
        details.sort_by(|a, b| b.borrowed_at.cmp(&a.borrowed_at));
        details
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Account> {
        let state = self.state.lock().await;
        state
            .accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| account_not_found(id))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .iter()
            .find(|a| same_email(&a.email, email))
            .cloned())
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        Ok(self.state.lock().await.email_taken(email, exclude_id))
    }

    async fn admin_exists(&self) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state.accounts.iter().any(|a| a.role == Role::Admin))
    }

    async fn insert(&self, account: &NewAccount) -> AppResult<Account> {
        let mut state = self.state.lock().await;

        if state.email_taken(&account.email, None) {
            return Err(AppError::Conflict("Email is already in use".to_string()));
        }
        if account.role == Role::Admin && state.accounts.iter().any(|a| a.role == Role::Admin) {
            return Err(AppError::Conflict("Admin already exists".to_string()));
        }

        let now = Utc::now();
        let created = Account {
            id: Uuid::new_v4(),
            name: account.name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            password: account.password_hash.clone(),
            role: account.role,
            status: account.status,
            created_at: now,
            updated_at: now,
        };
        state.accounts.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &AccountChanges) -> AppResult<Account> {
        let mut state = self.state.lock().await;

        if let Some(ref email) = changes.email {
            if state.email_taken(email, Some(id)) {
                return Err(AppError::Conflict("Email is already in use".to_string()));
            }
        }

        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| account_not_found(id))?;

        if let Some(ref name) = changes.name {
            account.name = name.clone();
        }
        if let Some(ref email) = changes.email {
            account.email = email.clone();
        }
        if let Some(ref phone) = changes.phone {
            account.phone = phone.clone();
        }
        if let Some(ref hash) = changes.password_hash {
            account.password = hash.clone();
        }
        account.updated_at = Utc::now();

        Ok(account.clone())
    }

    async fn approve_pending(&self, id: Uuid) -> AppResult<Option<Account>> {
        let mut state = self.state.lock().await;
        let Some(account) = state
            .accounts
            .iter_mut()
            .find(|a| a.id == id && a.status == AccountStatus::Pending)
        else {
            return Ok(None);
        };

        account.status = AccountStatus::Approved;
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<Account> {
        let mut state = self.state.lock().await;
        let position = state
            .accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| account_not_found(id))?;

        Ok(state.accounts.remove(position))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Item>> {
        Ok(self.state.lock().await.items.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Item> {
        let state = self.state.lock().await;
        state
            .items
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| item_not_found(id))
    }

    async fn insert(&self, item: &NewItem) -> AppResult<Item> {
        let now = Utc::now();
        let created = Item {
            id: Uuid::new_v4(),
            title: item.title.clone(),
            author: item.author.clone(),
            genre: item.genre.clone(),
            published_date: item.published_date,
            available_copies: item.available_copies,
            created_at: now,
            updated_at: now,
        };

        self.state.lock().await.items.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &UpdateItem) -> AppResult<Item> {
        let mut state = self.state.lock().await;
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| item_not_found(id))?;

        item.apply(changes);
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<Item> {
        let mut state = self.state.lock().await;
        let position = state
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| item_not_found(id))?;

        Ok(state.items.remove(position))
    }
}

#[async_trait]
impl LoanStore for MemoryStore {
    async fn borrow(&self, account_id: Uuid, item_id: Uuid) -> AppResult<BorrowOutcome> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        let Some(available) = state
            .items
            .iter()
            .find(|i| i.id == item_id)
            .map(|i| i.available_copies)
        else {
            return Ok(BorrowOutcome::ItemNotFound);
        };

        if available <= 0 {
            return Ok(BorrowOutcome::NoCopiesAvailable);
        }

        if state
            .loans
            .iter()
            .any(|l| l.account_id == account_id && l.item_id == item_id && l.is_open())
        {
            return Ok(BorrowOutcome::AlreadyBorrowed);
        }

        let loan = LoanRecord {
            id: Uuid::new_v4(),
            account_id,
            item_id,
            borrowed_at: now,
            returned_at: None,
        };
        state.loans.push(loan.clone());

        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| item_not_found(item_id))?;
        item.available_copies -= 1;
        item.updated_at = now;

        Ok(BorrowOutcome::Borrowed {
            loan,
            item: item.clone(),
        })
    }

    async fn return_item(&self, account_id: Uuid, item_id: Uuid) -> AppResult<ReturnOutcome> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        let Some(available) = state
            .items
            .iter()
            .find(|i| i.id == item_id)
            .map(|i| i.available_copies)
        else {
            return Ok(ReturnOutcome::ItemNotFound);
        };

        let restored = available
            .checked_add(1)
            .ok_or_else(|| AppError::BadRequest("Copy count of the book is out of range".to_string()))?;

        let Some(loan) = state
            .loans
            .iter_mut()
            .find(|l| l.account_id == account_id && l.item_id == item_id && l.is_open())
        else {
            return Ok(ReturnOutcome::NotBorrowed);
        };
        loan.returned_at = Some(now);
        let loan = loan.clone();

        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| item_not_found(item_id))?;
        item.available_copies = restored;
        item.updated_at = now;

        Ok(ReturnOutcome::Returned {
            loan,
            item: item.clone(),
        })
    }

    async fn list_all(&self) -> AppResult<Vec<LoanDetails>> {
        Ok(self.state.lock().await.details_where(|_| true))
    }

    async fn list_for_account(&self, account_id: Uuid) -> AppResult<Vec<LoanDetails>> {
        Ok(self
            .state
            .lock()
            .await
            .details_where(|loan| loan.account_id == account_id))
    }
}
