//! The module contains the errors the engine can throw.
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found")]
    KeyNotFound(String),
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("gateway error: {0}")]
    Gateway(String),
    #[error("integration error: {0}")]
    Integration(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidTransaction(a), Self::InvalidTransaction(b)) => a == b,
            (Self::Configuration(a), Self::Configuration(b)) => a == b,
            (Self::Gateway(a), Self::Gateway(b)) => a == b,
            (Self::Integration(a), Self::Integration(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
