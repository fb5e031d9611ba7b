//! Gridstore - tiered-storage codec and reconciliation for an in-memory data grid
//!
//! Gridstore converts in-memory records into a compact, versioned binary
//! representation usable by two persistence tiers - a cache-resident
//! "hot" tier and a disk-resident "cold" tier - and determines, for any
//! record identity, which tier(s) currently hold a copy and whether those
//! copies agree.
//!
//! # Quick Start
//!
//! ```
//! use gridstore::{
//!     EntryCodec, DecodeMode, IdentityStrategy, PropertyDef, Record,
//!     SchemaRegistry, StorageKind, TypeSchema, Uid, Value,
//! };
//! use std::sync::Arc;
//!
//! let registry = Arc::new(SchemaRegistry::new());
//! registry.introduce_type(TypeSchema::new(
//!     "Trade",
//!     vec![
//!         PropertyDef::new("id", StorageKind::I64),
//!         PropertyDef::new("symbol", StorageKind::Str),
//!     ],
//!     0,
//!     IdentityStrategy::CallerSupplied,
//! ));
//!
//! let codec = EntryCodec::new(registry);
//! let record = Record::new(
//!     Uid::from("Trade:1"),
//!     "Trade",
//!     vec![Some(Value::I64(1)), Some(Value::Str("ACME".into()))],
//! );
//!
//! let bytes = codec.encode_persistent(&record, true)?;
//! let decoded = codec.decode_persistent(&bytes, DecodeMode::Full)?;
//! assert_eq!(decoded.record, record);
//! # Ok::<(), gridstore::CodecError>(())
//! ```
//!
//! # Architecture
//!
//! The codec ([`EntryCodec`]) and the resolver ([`TierResolver`]) do not
//! call each other; they share only the schema-oracle abstraction
//! ([`SchemaOracle`]). Writes flow record → codec → tier storage; reads
//! converge hot accessor + cold accessor → resolver → classification.

// Re-export the public API from the member crates
pub use gridstore_codec::{
    ByteReader, ByteWriter, CodecError, DecodeMode, DecodedEntry, DecodedScope, EntryCodec,
    FormatVersion,
};
pub use gridstore_core::{
    Error, IdentityStrategy, IndexMask, PropertyDef, Record, RecordId, SchemaOracle,
    SchemaRegistry, SequenceMarkers, StorageKind, TypeSchema, Uid, Value, EXPIRATION_NEVER,
};
pub use gridstore_tiering::{
    row_to_record, tiers_for_match, ColdContext, ColdError, ColdStore, EntryTieredMetaData,
    HotStore, MatchTier, TieredState, TierResolver, TieringError,
};
