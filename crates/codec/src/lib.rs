//! Tiered wire format for gridstore records
//!
//! This crate implements the binary record codec:
//! - `ByteWriter` / `ByteReader`: little-endian byte I/O
//! - compact per-kind value serializers with a generic fallback
//! - `EntryCodec`: the entry layout in its two wire profiles
//!   ("persistent" and "off-heap"), with index-only partial payloads and
//!   version-gated backward compatibility
//!
//! The codec is stateless: each call operates on its own buffer and the
//! only shared state it reads is the schema oracle's index mask, which is
//! published atomically per type.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bytes;
pub mod entry;
pub mod error;
pub mod layout;
pub mod serializer;

pub use bytes::{ByteReader, ByteWriter};
pub use entry::{DecodeMode, DecodedEntry, DecodedScope, EntryCodec};
pub use error::CodecError;
pub use layout::FormatVersion;
