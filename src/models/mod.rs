//! Data models for Lendwell

pub mod account;
pub mod item;
pub mod loan;

// Re-export commonly used types
pub use account::{Account, AccountContext, AccountStatus, Role};
pub use item::Item;
pub use loan::{LoanDetails, LoanRecord};
