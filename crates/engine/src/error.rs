//! The module contains the error the engine can throw.
//!
//! The two variants every caller meets are [`KeyNotFound`] (a referenced row
//! does not exist) and [`Database`] (anything sea-orm bubbles up). The
//! remaining variants are validation and permission failures; the server maps
//! each one onto a fixed HTTP status.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" must not be empty!")]
    MissingField(String),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::MissingField(a), Self::MissingField(b)) => a == b,
            (Self::InvalidStatus(a), Self::InvalidStatus(b)) => a == b,
            (Self::InvalidPhone(a), Self::InvalidPhone(b)) => a == b,
            (Self::InvalidTarget(a), Self::InvalidTarget(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
