//! Codec error taxonomy
//!
//! Schema violations and positional failures are fatal for the current
//! operation and never retried: the same bytes will fail identically.

use gridstore_core::StorageKind;
use thiserror::Error;

/// Errors raised while encoding or decoding the tiered wire format.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The payload ended before the expected data
    #[error("unexpected end of payload")]
    Truncated,

    /// A string token is not valid UTF-8
    #[error("invalid utf-8 in string token")]
    InvalidString,

    /// A character token is not a unicode scalar
    #[error("invalid character scalar {0:#x}")]
    InvalidChar(u32),

    /// Unknown tag byte in the generic value encoding
    #[error("unknown value tag {0:#04x}")]
    InvalidValueTag(u8),

    /// A value does not match the property's declared storage kind
    #[error("value of kind {actual} does not match declared storage kind {expected:?}")]
    KindMismatch {
        /// Declared storage kind of the property
        expected: StorageKind,
        /// Variant name of the offending value
        actual: &'static str,
    },

    /// The type was never introduced to the tiered codec
    #[error("type {0} was never introduced to the tiered codec")]
    UnknownType(String),

    /// Payload arity disagrees with the schema
    #[error("fixed-field count mismatch for {type_name}: schema declares {expected}, payload carries {actual}")]
    FieldCountMismatch {
        /// Logical type name
        type_name: String,
        /// Fixed-property count declared by the schema
        expected: usize,
        /// Count found in the payload (or record, on encode)
        actual: usize,
    },

    /// The payload was written by a newer format than this reader supports
    #[error("unsupported format version {version}, max supported is {max_supported}")]
    UnsupportedVersion {
        /// Version token found in the payload
        version: u16,
        /// Newest version this reader understands
        max_supported: u16,
    },

    /// A single field failed mid-array; carries the failing position and
    /// the underlying cause
    #[error("failed to process field #{position}")]
    Position {
        /// Zero-based fixed-field position that failed
        position: usize,
        /// Underlying cause
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Wrap an error with the fixed-field position it occurred at.
    pub(crate) fn at_position(self, position: usize) -> CodecError {
        CodecError::Position {
            position,
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_wraps_cause() {
        let err = CodecError::Truncated.at_position(3);
        match &err {
            CodecError::Position { position, source } => {
                assert_eq!(*position, 3);
                assert_eq!(**source, CodecError::Truncated);
            }
            _ => panic!("expected Position"),
        }
        assert!(err.to_string().contains("#3"));
    }

    #[test]
    fn test_kind_mismatch_display() {
        let err = CodecError::KindMismatch {
            expected: StorageKind::I64,
            actual: "Str",
        };
        let msg = err.to_string();
        assert!(msg.contains("I64"));
        assert!(msg.contains("Str"));
    }
}
