//! Record identity
//!
//! A record is addressed either by a caller-supplied id (one of its fixed
//! fields, combined with the type name) or by a system-generated unique
//! identifier. `Uid` is the canonical system-wide identifier; `RecordId`
//! is the lookup key callers hand to the tier resolver.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// System-wide unique record identifier.
///
/// Minted randomly for system-generated identities, or derived from the
/// type name and the caller's id value for caller-supplied identities.
/// Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uid(String);

impl Uid {
    /// Mint a fresh system-generated uid
    pub fn generate() -> Self {
        Uid(Uuid::new_v4().to_string())
    }

    /// Derive a uid from a type name and a caller-supplied id value.
    ///
    /// The derivation is deterministic: the same type and id always yield
    /// the same uid, so both tiers agree on the identity of a record.
    pub fn from_type_and_id(type_name: &str, id: &Value) -> Self {
        Uid(format!("{}:{}", type_name, id))
    }

    /// Borrow the uid as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Uid {
    fn from(s: String) -> Self {
        Uid(s)
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Uid(s.to_string())
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lookup identity handed to the tier resolver.
///
/// Types with system-generated identities are addressed by `Uid`; types
/// with caller-supplied ids are addressed by the raw id value.
///
/// ## Map-key semantics
///
/// `RecordId` implements `Eq` and `Hash` so batch results can be keyed by
/// identity. Floats are compared and hashed by their bit pattern here
/// (total equality), unlike `Value`'s IEEE comparison used for field
/// equality — a `NaN` id still addresses one map slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RecordId {
    /// System-generated unique identifier
    Uid(Uid),
    /// Caller-supplied id value
    Value(Value),
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RecordId::Uid(a), RecordId::Uid(b)) => a == b,
            (RecordId::Value(a), RecordId::Value(b)) => id_value_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            RecordId::Uid(uid) => {
                0u8.hash(state);
                uid.hash(state);
            }
            RecordId::Value(value) => {
                1u8.hash(state);
                hash_id_value(value, state);
            }
        }
    }
}

impl From<Uid> for RecordId {
    fn from(uid: Uid) -> Self {
        RecordId::Uid(uid)
    }
}

impl From<Value> for RecordId {
    fn from(value: Value) -> Self {
        RecordId::Value(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Uid(uid) => write!(f, "{}", uid),
            RecordId::Value(value) => write!(f, "{}", value),
        }
    }
}

// Bit-pattern equality for floats so RecordId can implement Eq.
fn id_value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::F32(x), Value::F32(y)) => x.to_bits() == y.to_bits(),
        (Value::F64(x), Value::F64(y)) => x.to_bits() == y.to_bits(),
        _ => a == b,
    }
}

fn hash_id_value<H: Hasher>(value: &Value, state: &mut H) {
    value.type_name().hash(state);
    match value {
        Value::I16(v) => v.hash(state),
        Value::I32(v) => v.hash(state),
        Value::I64(v) => v.hash(state),
        Value::F32(v) => v.to_bits().hash(state),
        Value::F64(v) => v.to_bits().hash(state),
        Value::Bool(v) => v.hash(state),
        Value::Char(v) => v.hash(state),
        Value::Str(v) => v.hash(state),
        Value::Blob(v) => v.hash(state),
        Value::CompressedBlob(v) => v.hash(state),
    }
}
