//! The unit of storage
//!
//! A `Record` is the flat, schema-aligned representation a grid cache
//! hands to the codec and the tier resolver. The codec never owns record
//! lifetime; it is a pure transform over this type.

use crate::identity::Uid;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Expiration sentinel meaning "never expires"
pub const EXPIRATION_NEVER: i64 = i64::MAX;

/// Embedded replication bookkeeping.
///
/// Present only when the record originated from a replication-tracked
/// mutation. The codec guarantees round-trip fidelity of these fields;
/// their meaning belongs to the replication mediator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceMarkers {
    /// Replication generation the mutation belongs to
    pub generation_id: i64,
    /// Sequence number within the generation
    pub sequence_id: i64,
    /// Tombstone marker: identity/metadata only, no field payload
    pub phantom: bool,
    /// The mutation covered multiple uids
    pub multi_uid: bool,
}

impl SequenceMarkers {
    /// Markers for a live (non-phantom, single-uid) tracked mutation
    pub fn new(generation_id: i64, sequence_id: i64) -> Self {
        SequenceMarkers {
            generation_id,
            sequence_id,
            phantom: false,
            multi_uid: false,
        }
    }
}

/// A flat record: ordered fixed fields aligned with the schema, plus
/// optional dynamic fields keyed by name.
///
/// Invariants:
/// - `fixed.len()` equals the schema's fixed-property count for `type_name`
/// - a field may be logically absent (`None`) at any position
/// - `version` starts at 1 and is never decremented
/// - `uid` is immutable once assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// System-wide unique identifier
    pub uid: Uid,
    /// Logical schema name
    pub type_name: String,
    /// Compact type discriminator assigned by the owning cache
    pub type_code: u8,
    /// Per-tier copy counter, bumped each time the tiered copy is rewritten
    pub store_version: u16,
    /// Insertion stamp assigned by the owning cache
    pub created_at: i64,
    /// Not eligible for persistence beyond the current process
    pub transient: bool,
    /// Insertion ordinal used by the owning cache; 0 when unset
    pub order: i32,
    /// Record version, starts at 1
    pub version: u32,
    /// Absolute expiration timestamp, or [`EXPIRATION_NEVER`]
    pub expiration: i64,
    /// Fixed fields, positionally aligned with the schema
    pub fixed: Vec<Option<Value>>,
    /// Dynamic fields not declared in the fixed schema
    pub dynamic: Option<HashMap<String, Value>>,
    /// Replication bookkeeping, when the mutation is tracked
    pub markers: Option<SequenceMarkers>,
}

impl Record {
    /// Create a record with default metadata (version 1, never expires).
    pub fn new(uid: Uid, type_name: impl Into<String>, fixed: Vec<Option<Value>>) -> Self {
        Record {
            uid,
            type_name: type_name.into(),
            type_code: 0,
            store_version: 0,
            created_at: 0,
            transient: false,
            order: 0,
            version: 1,
            expiration: EXPIRATION_NEVER,
            fixed,
            dynamic: None,
            markers: None,
        }
    }

    /// True when the phantom marker is set: the record is a tombstone and
    /// carries no field payload on the wire.
    pub fn is_phantom(&self) -> bool {
        self.markers.map(|m| m.phantom).unwrap_or(false)
    }

    /// Borrow the fixed-field value at `position`, if present.
    pub fn fixed_value(&self, position: usize) -> Option<&Value> {
        self.fixed.get(position).and_then(|slot| slot.as_ref())
    }
}
