//! Schema oracle: type descriptors and index participation
//!
//! The codec and the tier resolver share exactly one abstraction: the
//! schema oracle. It answers, per type, the fixed-property layout, the
//! identity strategy, and which fields participate in at least one
//! secondary index.
//!
//! ## Mask publication
//!
//! An [`IndexMask`] and its `version` are published together inside one
//! `Arc`, swapped atomically under the registry's lock. A reader can
//! never observe a mask and a version number from two different update
//! generations, and the codec holds no lock during encode/decode.

use crate::error::{Error, Result};
use crate::identity::Uid;
use crate::record::Record;
use crate::value::{StorageKind, Value};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// How a type's records are identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStrategy {
    /// The grid mints a unique identifier on insert
    SystemGenerated,
    /// The caller supplies an id value in one of the fixed fields
    CallerSupplied,
}

/// One declared fixed property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// Declared storage kind, selecting the wire path for values
    pub kind: StorageKind,
}

impl PropertyDef {
    /// Create a property definition
    pub fn new(name: impl Into<String>, kind: StorageKind) -> Self {
        PropertyDef {
            name: name.into(),
            kind,
        }
    }
}

/// Immutable descriptor of one logical type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSchema {
    /// Logical type name
    pub type_name: String,
    /// Declared fixed properties, in positional order
    pub properties: Vec<PropertyDef>,
    /// Fixed-field position of the id property
    pub id_position: usize,
    /// Identity strategy for this type
    pub identity: IdentityStrategy,
}

impl TypeSchema {
    /// Create a schema descriptor
    pub fn new(
        type_name: impl Into<String>,
        properties: Vec<PropertyDef>,
        id_position: usize,
        identity: IdentityStrategy,
    ) -> Self {
        TypeSchema {
            type_name: type_name.into(),
            properties,
            id_position,
            identity,
        }
    }

    /// Number of declared fixed properties
    pub fn fixed_count(&self) -> usize {
        self.properties.len()
    }

    /// Declared storage kind at `position`, if within the schema
    pub fn kind_at(&self, position: usize) -> Option<StorageKind> {
        self.properties.get(position).map(|p| p.kind)
    }

    /// Resolve the unique identifier for a record of this type.
    ///
    /// System-generated identities are the record's own uid. For
    /// caller-supplied identities the uid is derived from the type name
    /// and the id field, which must be present.
    pub fn resolve_uid(&self, record: &Record) -> Result<Uid> {
        match self.identity {
            IdentityStrategy::SystemGenerated => Ok(record.uid.clone()),
            IdentityStrategy::CallerSupplied => {
                let id = record.fixed_value(self.id_position).ok_or_else(|| {
                    Error::MissingId {
                        type_name: self.type_name.clone(),
                        position: self.id_position,
                    }
                })?;
                Ok(Uid::from_type_and_id(&self.type_name, id))
            }
        }
    }

    /// Derive the uid for a caller-supplied id value of this type.
    pub fn uid_for_id(&self, id: &Value) -> Uid {
        Uid::from_type_and_id(&self.type_name, id)
    }
}

/// Which fields of a type are read by at least one secondary index.
///
/// `version` increases monotonically whenever the index definition for
/// the type changes; the codec stamps it into every payload so a reader
/// can detect index-definition drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMask {
    /// One entry per fixed-field position
    pub fixed: Vec<bool>,
    /// Index-participating dynamic-field keys
    pub dynamic: HashSet<String>,
    /// Index format version this mask belongs to
    pub version: u16,
}

impl IndexMask {
    /// Whether the fixed position participates in an index.
    ///
    /// Positions beyond the mask (schema grew after publication) are
    /// treated as non-participating.
    pub fn fixed_at(&self, position: usize) -> bool {
        self.fixed.get(position).copied().unwrap_or(false)
    }
}

/// Read side of the schema oracle.
///
/// Implementations must be safe for unlimited concurrent reads and must
/// guarantee read-after-write visibility of mask updates across threads.
pub trait SchemaOracle: Send + Sync {
    /// Schema descriptor for the type, if introduced
    fn type_schema(&self, type_name: &str) -> Option<Arc<TypeSchema>>;

    /// Current index participation mask for the type, if one was published
    fn index_mask(&self, type_name: &str) -> Option<Arc<IndexMask>>;
}

struct TypeBinding {
    schema: Arc<TypeSchema>,
    mask: Option<Arc<IndexMask>>,
}

/// Concrete schema oracle backed by a type table.
///
/// Introducing a type or publishing a new mask swaps an `Arc` under the
/// write lock; readers clone the `Arc` and proceed lock-free.
pub struct SchemaRegistry {
    types: RwLock<FxHashMap<String, TypeBinding>>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        SchemaRegistry {
            types: RwLock::new(FxHashMap::default()),
        }
    }

    /// Introduce a type. No index mask is published yet; payloads written
    /// before the first mask carry index format version 0.
    pub fn introduce_type(&self, schema: TypeSchema) {
        let mut types = self.types.write();
        types.insert(
            schema.type_name.clone(),
            TypeBinding {
                schema: Arc::new(schema),
                mask: None,
            },
        );
    }

    /// Publish a new index participation mask for `type_name`.
    ///
    /// The first published mask carries version 0; each later publication
    /// bumps the version. Returns the published version.
    pub fn publish_mask(
        &self,
        type_name: &str,
        fixed: Vec<bool>,
        dynamic: HashSet<String>,
    ) -> Result<u16> {
        let mut types = self.types.write();
        let binding = types
            .get_mut(type_name)
            .ok_or_else(|| Error::MaskForUnknownType(type_name.to_string()))?;
        if fixed.len() != binding.schema.fixed_count() {
            return Err(Error::MaskArityMismatch {
                type_name: type_name.to_string(),
                expected: binding.schema.fixed_count(),
                actual: fixed.len(),
            });
        }
        let version = match &binding.mask {
            Some(mask) => mask.version.wrapping_add(1),
            None => 0,
        };
        binding.mask = Some(Arc::new(IndexMask {
            fixed,
            dynamic,
            version,
        }));
        Ok(version)
    }

    /// Whether the type was introduced
    pub fn knows_type(&self, type_name: &str) -> bool {
        self.types.read().contains_key(type_name)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaOracle for SchemaRegistry {
    fn type_schema(&self, type_name: &str) -> Option<Arc<TypeSchema>> {
        self.types.read().get(type_name).map(|b| b.schema.clone())
    }

    fn index_mask(&self, type_name: &str) -> Option<Arc<IndexMask>> {
        self.types.read().get(type_name).and_then(|b| b.mask.clone())
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types = self.types.read();
        f.debug_struct("SchemaRegistry")
            .field("type_count", &types.len())
            .finish()
    }
}
