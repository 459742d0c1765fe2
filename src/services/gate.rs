//! Role-based authorization gate

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::account::AccountContext,
    repository::AccountStore,
};

use super::tokens::TokenService;

/// Admits bearer tokens. Role checks happen on the admitted
/// [`AccountContext`] with `require_any`.
#[derive(Clone)]
pub struct AuthGate {
    tokens: TokenService,
    accounts: Arc<dyn AccountStore>,
    recheck_account_status: bool,
}

impl AuthGate {
    pub fn new(tokens: TokenService, accounts: Arc<dyn AccountStore>, recheck_account_status: bool) -> Self {
        Self {
            tokens,
            accounts,
            recheck_account_status,
        }
    }

    /// Verify a token and, when configured, that its account still exists
    /// and is approved
    pub async fn admit(&self, token: &str) -> AppResult<AccountContext> {
        let context = self.tokens.verify(token)?;

        if self.recheck_account_status {
            let account = match self.accounts.get_by_id(context.account_id).await {
                Ok(account) => account,
                Err(AppError::NotFound(_)) => {
                    return Err(AppError::Authentication("Account no longer exists".to_string()));
                }
                Err(e) => return Err(e),
            };
            if !account.is_approved() {
                return Err(AppError::Authorization("Account not approved".to_string()));
            }
        }

        Ok(context)
    }
}
