//! Business logic services

pub mod accounts;
pub mod catalog;
pub mod gate;
pub mod loans;
pub mod password;
pub mod tokens;

use chrono::Duration;

use crate::{config::AuthConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub accounts: accounts::AccountsService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub gate: gate::AuthGate,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: &AuthConfig) -> AppResult<Self> {
        let hasher = password::PasswordHasher::new(auth_config.hash_memory_kib, auth_config.hash_iterations)?;
        let tokens = tokens::TokenService::new(
            &auth_config.jwt_secret,
            Duration::hours(auth_config.jwt_expiration_hours),
        );

        Ok(Self {
            accounts: accounts::AccountsService::new(
                repository.clone(),
                hasher,
                tokens.clone(),
                auth_config.admin_secret_key.clone(),
            ),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            gate: gate::AuthGate::new(tokens, repository.accounts, auth_config.recheck_account_status),
        })
    }
}
