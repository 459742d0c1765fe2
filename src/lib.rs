//! Lendwell lending service
//!
//! A REST JSON API for a small lending library: role-based accounts with
//! an approval gate, a catalog of items with finite copies, and a ledger of
//! borrow and return transactions.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
