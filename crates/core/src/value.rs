//! Field value types for gridstore records
//!
//! This module defines:
//! - Value: closed enum of storable field values
//! - StorageKind: per-property declared storage kind
//!
//! The set of variants is fixed; kinds without a compact wire form are
//! declared as `StorageKind::Object` and travel through the generic
//! self-describing encoding.
//!
//! ## Equality
//!
//! Different variants are never equal. Float equality follows IEEE-754:
//! `NaN != NaN`, `-0.0 == 0.0`. Logical absence of a field is represented
//! as `Option<Value>` by the owning record, independent of kind.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A storable field value.
///
/// One variant per compact serializer of the wire format, plus the two
/// binary-blob forms. Values of properties declared `StorageKind::Object`
/// may still be any of these variants; the declaration only controls the
/// wire path (compact vs generic).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// 16-bit signed integer
    I16(i16),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 32-bit IEEE-754 float
    F32(f32),
    /// 64-bit IEEE-754 float
    F64(f64),
    /// Boolean
    Bool(bool),
    /// Unicode scalar
    Char(char),
    /// UTF-8 string
    Str(String),
    /// Opaque binary blob
    Blob(Vec<u8>),
    /// Opaque binary blob, already compressed by the caller
    CompressedBlob(Vec<u8>),
}

// Manual PartialEq for IEEE-754 float semantics.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::CompressedBlob(a), Value::CompressedBlob(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Get the variant name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::I16(_) => "I16",
            Value::I32(_) => "I32",
            Value::I64(_) => "I64",
            Value::F32(_) => "F32",
            Value::F64(_) => "F64",
            Value::Bool(_) => "Bool",
            Value::Char(_) => "Char",
            Value::Str(_) => "Str",
            Value::Blob(_) => "Blob",
            Value::CompressedBlob(_) => "CompressedBlob",
        }
    }

    /// Get the storage kind matching this value's variant
    pub fn kind(&self) -> StorageKind {
        match self {
            Value::I16(_) => StorageKind::I16,
            Value::I32(_) => StorageKind::I32,
            Value::I64(_) => StorageKind::I64,
            Value::F32(_) => StorageKind::F32,
            Value::F64(_) => StorageKind::F64,
            Value::Bool(_) => StorageKind::Bool,
            Value::Char(_) => StorageKind::Char,
            Value::Str(_) => StorageKind::Str,
            Value::Blob(_) => StorageKind::Blob,
            Value::CompressedBlob(_) => StorageKind::CompressedBlob,
        }
    }

    /// Borrow the string payload, if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Canonical token form, used when deriving uids from caller ids.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{}", v),
            Value::Blob(b) | Value::CompressedBlob(b) => {
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

/// Declared storage kind of a fixed or dynamic property.
///
/// One variant per compact serializer, plus `Object` for properties with
/// no registered compact form (those values travel through the generic
/// encoding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit IEEE-754 float
    F32,
    /// 64-bit IEEE-754 float
    F64,
    /// Boolean
    Bool,
    /// Unicode scalar
    Char,
    /// UTF-8 string
    Str,
    /// Opaque binary blob
    Blob,
    /// Pre-compressed binary blob
    CompressedBlob,
    /// No registered compact form; generic encoding is used
    Object,
}
