//! Tiering error taxonomy
//!
//! Cold-tier absence is not an error: accessors model it as an explicit
//! empty result. `ColdError` covers everything else and propagates.
//! `TieringError::NotEnabled` is the structural misconfiguration that
//! fails a batch wholesale before any per-identity work.

use thiserror::Error;

/// Failures of the cold-tier accessor other than "not present".
#[derive(Debug, Error)]
pub enum ColdError {
    /// I/O failure while reaching the cold store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cold store backend failure
    #[error("cold store failure: {0}")]
    Backend(String),
}

/// Errors raised by tier reconciliation.
#[derive(Debug, Error)]
pub enum TieringError {
    /// Tiered storage is not configured for this grid
    #[error("tiered storage is not enabled for this grid")]
    NotEnabled,

    /// The type was never introduced to the schema oracle
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// The lookup identity does not match the type's identity strategy
    #[error("identity {id} does not match the identity strategy of type {type_name}")]
    IdentityStrategyMismatch {
        /// Logical type name
        type_name: String,
        /// Display form of the offending identity
        id: String,
    },

    /// A cold-tier row does not match the schema arity
    #[error("cold row arity mismatch for {type_name}: schema declares {expected}, row carries {actual}")]
    RowArityMismatch {
        /// Logical type name
        type_name: String,
        /// Fixed-property count declared by the schema
        expected: usize,
        /// Column count of the row
        actual: usize,
    },

    /// A record or row is missing its id value
    #[error(transparent)]
    Schema(#[from] gridstore_core::Error),

    /// Cold-tier failure other than not-found
    #[error(transparent)]
    Cold(#[from] ColdError),
}
