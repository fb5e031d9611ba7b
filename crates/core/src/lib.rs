//! Core types for the gridstore tiered-storage layer
//!
//! This crate defines the foundational types shared by the codec and the
//! tier resolver:
//! - Value / StorageKind: closed set of storable field values
//! - Uid / RecordId: record identity (system-generated or caller-supplied)
//! - Record / SequenceMarkers: the unit of storage
//! - TypeSchema / IndexMask / SchemaOracle: the schema oracle seam
//! - SchemaRegistry: concrete oracle with atomic mask publication
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod identity;
pub mod limits;
pub mod record;
pub mod schema;
pub mod value;

pub use error::{Error, Result};
pub use identity::{RecordId, Uid};
pub use record::{Record, SequenceMarkers, EXPIRATION_NEVER};
pub use schema::{
    IdentityStrategy, IndexMask, PropertyDef, SchemaOracle, SchemaRegistry, TypeSchema,
};
pub use value::{StorageKind, Value};
