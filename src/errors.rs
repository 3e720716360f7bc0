//! Unified error types for the credit ledger.
//!
//! Every fallible operation in the crate returns [`Result`], so callers can
//! propagate with `?` and the bot layer can render one error type.

use thiserror::Error;

/// All errors surfaced by the ledger, its storage and the bot layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A borrow would cost more credit than the account currently holds.
    #[error("Insufficient credit: available {available}, required {required}")]
    InsufficientCredit {
        /// Credit currently available on the account
        available: i64,
        /// Credit the operation asked for
        required: i64,
    },

    /// A referenced account, borrow or transaction does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Malformed input such as a bad filter, page or non-positive amount.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the input
        message: String,
    },

    /// The account row changed underneath an update (version mismatch).
    #[error("Concurrent modification of account {account_id}")]
    ConcurrencyConflict {
        /// Account whose version check failed
        account_id: i64,
    },

    /// Bad or unreadable configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Storage failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Integer conversion failure
    #[error("Integer conversion error: {0}")]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// Discord framework failure
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl Error {
    /// Shorthand for an [`Error::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for an [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
