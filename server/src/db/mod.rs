//! Persistence for drinks.

#![allow(clippy::missing_errors_doc)]

pub mod models;
mod sqlite;

pub use models::*;
pub use sqlite::DrinkStore;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("A drink titled '{0}' already exists")]
    DuplicateTitle(String),

    #[error("Stored recipe is not valid JSON: {0}")]
    CorruptRecipe(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Map an insert/update failure, recognising UNIQUE violations on title.
    fn from_write(err: sqlx::Error, title: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::DuplicateTitle(title.to_string())
            }
            _ => Self::Database(err),
        }
    }
}
