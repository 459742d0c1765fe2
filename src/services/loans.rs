//! Loan ledger service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        item::Item,
        loan::{BorrowOutcome, LoanDetails, LoanRecord, ReturnOutcome},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow one copy of an item
    pub async fn borrow(&self, account_id: Uuid, item_id: Uuid) -> AppResult<(LoanRecord, Item)> {
        match self.repository.loans.borrow(account_id, item_id).await? {
            BorrowOutcome::Borrowed { loan, item } => {
                tracing::info!(
                    "Account {} borrowed item {} ({} copies left)",
                    account_id,
                    item_id,
                    item.available_copies
                );
                Ok((loan, item))
            }
            BorrowOutcome::ItemNotFound => Err(AppError::NotFound("Book not found".to_string())),
            BorrowOutcome::NoCopiesAvailable => Err(AppError::BadRequest(
                "No available copies of the book".to_string(),
            )),
            BorrowOutcome::AlreadyBorrowed => Err(AppError::Conflict(
                "You have already borrowed this book".to_string(),
            )),
        }
    }

    /// Close the caller's open loan of an item
    pub async fn return_item(&self, account_id: Uuid, item_id: Uuid) -> AppResult<(LoanRecord, Item)> {
        match self.repository.loans.return_item(account_id, item_id).await? {
            ReturnOutcome::Returned { loan, item } => {
                tracing::info!("Account {} returned item {}", account_id, item_id);
                Ok((loan, item))
            }
            ReturnOutcome::ItemNotFound => Err(AppError::NotFound("Book not found".to_string())),
            ReturnOutcome::NotBorrowed => Err(AppError::BadRequest(
                "You have not borrowed this book".to_string(),
            )),
        }
    }

    /// Every loan, most recent first
    pub async fn list_all(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_all().await
    }

    /// The caller's loans, most recent first. Empty when there are none.
    pub async fn list_for_account(&self, account_id: Uuid) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_for_account(account_id).await
    }
}
