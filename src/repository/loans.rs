//! Loans repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::LoanStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        item::Item,
        loan::{BorrowOutcome, LoanDetails, LoanDetailsRow, LoanRecord, ReturnOutcome},
    },
};

const DETAILS_SELECT: &str = r#"
    SELECT l.id, l.account_id, l.item_id, l.borrowed_at, l.returned_at,
           a.name AS account_name, a.email AS account_email,
           i.title AS item_title, i.author AS item_author
    FROM loans l
    LEFT JOIN accounts a ON a.id = l.account_id
    LEFT JOIN items i ON i.id = l.item_id
"#;

#[derive(Clone)]
pub struct PgLoanStore {
    pool: Pool<Postgres>,
}

impl PgLoanStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStore for PgLoanStore {
    async fn borrow(&self, account_id: Uuid, item_id: Uuid) -> AppResult<BorrowOutcome> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // The row lock serializes concurrent borrowers of the same item
        let Some(item) = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(BorrowOutcome::ItemNotFound);
        };

        if item.available_copies <= 0 {
            return Ok(BorrowOutcome::NoCopiesAvailable);
        }

        let already_borrowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans
                WHERE account_id = $1 AND item_id = $2 AND returned_at IS NULL
            )
            "#,
        )
        .bind(account_id)
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_borrowed {
            return Ok(BorrowOutcome::AlreadyBorrowed);
        }

        let loan = sqlx::query_as::<_, LoanRecord>(
            r#"
            INSERT INTO loans (id, account_id, item_id, borrowed_at, returned_at)
            VALUES ($1, $2, $3, $4, NULL)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(item_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET available_copies = available_copies - 1, updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(BorrowOutcome::Borrowed { loan, item })
    }

    async fn return_item(&self, account_id: Uuid, item_id: Uuid) -> AppResult<ReturnOutcome> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let available: Option<i32> =
            sqlx::query_scalar("SELECT available_copies FROM items WHERE id = $1 FOR UPDATE")
                .bind(item_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(available) = available else {
            return Ok(ReturnOutcome::ItemNotFound);
        };

        if available.checked_add(1).is_none() {
            return Err(AppError::BadRequest(
                "Copy count of the book is out of range".to_string(),
            ));
        }

        let Some(loan) = sqlx::query_as::<_, LoanRecord>(
            r#"
            UPDATE loans SET returned_at = $3
            WHERE account_id = $1 AND item_id = $2 AND returned_at IS NULL
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(item_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(ReturnOutcome::NotBorrowed);
        };

        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET available_copies = available_copies + 1, updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ReturnOutcome::Returned { loan, item })
    }

    async fn list_all(&self) -> AppResult<Vec<LoanDetails>> {
        let query = format!("{} ORDER BY l.borrowed_at DESC", DETAILS_SELECT);
        let rows = sqlx::query_as::<_, LoanDetailsRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(LoanDetails::from).collect())
    }

    async fn list_for_account(&self, account_id: Uuid) -> AppResult<Vec<LoanDetails>> {
        let query = format!(
            "{} WHERE l.account_id = $1 ORDER BY l.borrowed_at DESC",
            DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, LoanDetailsRow>(&query)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(LoanDetails::from).collect())
    }
}
