//! Error types for the core schema and identity layer
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations. The codec and tiering crates define their own error
//! enums and convert from these where needed.

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by schema and identity operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The type was never introduced to the schema registry
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// A record's fixed-field arity does not match its schema
    #[error("fixed-field arity mismatch for {type_name}: schema declares {expected}, record has {actual}")]
    ArityMismatch {
        /// Logical type name
        type_name: String,
        /// Fixed-property count declared by the schema
        expected: usize,
        /// Fixed-field count carried by the record
        actual: usize,
    },

    /// The record has no value at the schema's id position
    #[error("record of type {type_name} has no value at id position {position}")]
    MissingId {
        /// Logical type name
        type_name: String,
        /// Fixed-field position declared as the id property
        position: usize,
    },

    /// An index mask was published for a type that is not registered
    #[error("cannot publish index mask for unknown type: {0}")]
    MaskForUnknownType(String),

    /// An index mask's fixed vector does not match the schema arity
    #[error("index mask arity mismatch for {type_name}: schema declares {expected}, mask has {actual}")]
    MaskArityMismatch {
        /// Logical type name
        type_name: String,
        /// Fixed-property count declared by the schema
        expected: usize,
        /// Mask entry count
        actual: usize,
    },
}
