//! Loan ledger records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::item::Item;

/// One borrow-to-return cycle. `returned_at` stays `None` while open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub item_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl LoanRecord {
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// Borrower fields shown in loan listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoanAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Item fields shown in loan listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoanItem {
    pub id: Uuid,
    pub title: String,
    pub author: String,
}

/// Loan enriched with borrower and item. Either side is `None` once the
/// referenced record has been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetails {
    pub id: Uuid,
    pub account_id: Uuid,
    pub item_id: Uuid,
    pub account: Option<LoanAccount>,
    pub item: Option<LoanItem>,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

/// Flat row produced by the listing join
#[derive(Debug, Clone, FromRow)]
pub struct LoanDetailsRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub item_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub account_name: Option<String>,
    pub account_email: Option<String>,
    pub item_title: Option<String>,
    pub item_author: Option<String>,
}

impl From<LoanDetailsRow> for LoanDetails {
    fn from(row: LoanDetailsRow) -> Self {
        let account = match (row.account_name, row.account_email) {
            (Some(name), Some(email)) => Some(LoanAccount {
                id: row.account_id,
                name,
                email,
            }),
            _ => None,
        };
        let item = match (row.item_title, row.item_author) {
            (Some(title), Some(author)) => Some(LoanItem {
                id: row.item_id,
                title,
                author,
            }),
            _ => None,
        };

        LoanDetails {
            id: row.id,
            account_id: row.account_id,
            item_id: row.item_id,
            account,
            item,
            borrowed_at: row.borrowed_at,
            returned_at: row.returned_at,
        }
    }
}

/// Result of a borrow attempt as seen by the store
#[derive(Debug, Clone, PartialEq)]
pub enum BorrowOutcome {
    Borrowed { loan: LoanRecord, item: Item },
    ItemNotFound,
    NoCopiesAvailable,
    AlreadyBorrowed,
}

/// Result of a return attempt as seen by the store
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnOutcome {
    Returned { loan: LoanRecord, item: Item },
    ItemNotFound,
    NotBorrowed,
}
