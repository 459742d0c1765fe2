//! Accounts repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::AccountStore;
use crate::{
    error::{AppError, AppResult},
    models::account::{Account, AccountChanges, AccountStatus, NewAccount, Role},
};

#[derive(Clone)]
pub struct PgAccountStore {
    pool: Pool<Postgres>,
}

impl PgAccountStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Account {} not found", id))
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Account> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM accounts
                WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id != $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn admin_exists(&self) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE role = $1)")
            .bind(Role::Admin)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn insert(&self, account: &NewAccount) -> AppResult<Account> {
        let now = Utc::now();

        // accounts_email_key and accounts_single_admin back the service-level checks
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, name, email, phone, password, role, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.password_hash)
        .bind(account.role)
        .bind(account.status)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match account.role {
            Role::Admin => AppError::unique_violation(e, "Admin already exists or email is already in use"),
            _ => AppError::unique_violation(e, "Email is already in use"),
        })
    }

    async fn update(&self, id: Uuid, changes: &AccountChanges) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                password = COALESCE($5, password),
                updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(&changes.password_hash)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::unique_violation(e, "Email is already in use"))?
        .ok_or_else(|| not_found(id))
    }

    async fn approve_pending(&self, id: Uuid) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts SET status = $2, updated_at = $4
            WHERE id = $1 AND status = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(AccountStatus::Approved)
        .bind(AccountStatus::Pending)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn delete(&self, id: Uuid) -> AppResult<Account> {
        // Loans keep referencing the id; there is no cascade
        sqlx::query_as::<_, Account>("DELETE FROM accounts WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }
}
