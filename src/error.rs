use std::fmt;

use thiserror::Error;

/// Ledger request being performed when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SubmitTransaction,
    FetchChain,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SubmitTransaction => f.write_str("creating transaction"),
            Operation::FetchChain => f.write_str("fetching chain"),
        }
    }
}

/// Errors returned by a [`crate::client::LedgerClient`].
///
/// The `Display` output is what end users see; transport details live in
/// the fields and are only logged.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    /// The node produced no response at all.
    #[error("Failed to fetch")]
    Network { detail: String },

    /// The node answered with a non-success status.
    #[error("Error {operation}: {status_text}")]
    Remote {
        operation: Operation,
        status: u16,
        status_text: String,
    },

    /// The node answered 2xx with a body we could not decode.
    #[error("Error {operation}: malformed response")]
    Decode { operation: Operation, detail: String },

    #[error("invalid node endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Local input problems, detected before anything is sent.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingField,
    #[error("Amount must be a valid positive number")]
    InvalidAmount,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}
