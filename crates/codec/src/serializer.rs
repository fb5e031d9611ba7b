//! Compact per-kind value serializers
//!
//! Properties whose declared kind has a compact form are written without
//! any per-value type information: the schema tells the reader how to
//! parse. Everything else (and every dynamic-field value) travels through
//! the generic self-describing encoding, a tag byte followed by the same
//! payload forms.
//!
//! The string serializer writes a flag byte, then either the compact text
//! token (at most [`MAX_COMPACT_STRING_CHARS`] characters, the ceiling of
//! the underlying text-transport primitive) or the generic fallback.

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::CodecError;
use gridstore_core::limits::MAX_COMPACT_STRING_CHARS;
use gridstore_core::{StorageKind, Value};

/// Tag bytes of the generic value encoding
const TAG_I16: u8 = 0x01;
const TAG_I32: u8 = 0x02;
const TAG_I64: u8 = 0x03;
const TAG_F32: u8 = 0x04;
const TAG_F64: u8 = 0x05;
const TAG_BOOL: u8 = 0x06;
const TAG_CHAR: u8 = 0x07;
const TAG_STR: u8 = 0x08;
const TAG_BLOB: u8 = 0x09;
const TAG_COMPRESSED_BLOB: u8 = 0x0A;

/// Whether `kind` has a registered compact serializer.
///
/// `Object` has none; the codec falls back to the generic encoding.
pub fn has_compact_form(kind: StorageKind) -> bool {
    !matches!(kind, StorageKind::Object)
}

/// Write `value` through the compact serializer for `kind`.
///
/// The value's variant must match the declared kind; a mismatch is a
/// contract violation reported as [`CodecError::KindMismatch`].
pub fn write_compact(kind: StorageKind, value: &Value, w: &mut ByteWriter) -> Result<(), CodecError> {
    match (kind, value) {
        (StorageKind::I16, Value::I16(v)) => w.write_i16(*v),
        (StorageKind::I32, Value::I32(v)) => w.write_i32(*v),
        (StorageKind::I64, Value::I64(v)) => w.write_i64(*v),
        (StorageKind::F32, Value::F32(v)) => w.write_f32(*v),
        (StorageKind::F64, Value::F64(v)) => w.write_f64(*v),
        (StorageKind::Bool, Value::Bool(v)) => w.write_bool(*v),
        (StorageKind::Char, Value::Char(v)) => w.write_char(*v),
        (StorageKind::Str, Value::Str(v)) => write_string(v, w),
        (StorageKind::Blob, Value::Blob(v)) => w.write_bytes(v),
        (StorageKind::CompressedBlob, Value::CompressedBlob(v)) => w.write_bytes(v),
        (expected, value) => {
            return Err(CodecError::KindMismatch {
                expected,
                actual: value.type_name(),
            })
        }
    }
    Ok(())
}

/// Read a value through the compact serializer for `kind`.
pub fn read_compact(kind: StorageKind, r: &mut ByteReader<'_>) -> Result<Value, CodecError> {
    let value = match kind {
        StorageKind::I16 => Value::I16(r.read_i16()?),
        StorageKind::I32 => Value::I32(r.read_i32()?),
        StorageKind::I64 => Value::I64(r.read_i64()?),
        StorageKind::F32 => Value::F32(r.read_f32()?),
        StorageKind::F64 => Value::F64(r.read_f64()?),
        StorageKind::Bool => Value::Bool(r.read_bool()?),
        StorageKind::Char => Value::Char(r.read_char()?),
        StorageKind::Str => read_string(r)?,
        StorageKind::Blob => Value::Blob(r.read_bytes()?),
        StorageKind::CompressedBlob => Value::CompressedBlob(r.read_bytes()?),
        StorageKind::Object => {
            // No compact form registered; callers route Object through
            // the generic encoding instead.
            return read_generic(r);
        }
    };
    Ok(value)
}

/// Write a value through the generic self-describing encoding.
pub fn write_generic(value: &Value, w: &mut ByteWriter) {
    match value {
        Value::I16(v) => {
            w.write_u8(TAG_I16);
            w.write_i16(*v);
        }
        Value::I32(v) => {
            w.write_u8(TAG_I32);
            w.write_i32(*v);
        }
        Value::I64(v) => {
            w.write_u8(TAG_I64);
            w.write_i64(*v);
        }
        Value::F32(v) => {
            w.write_u8(TAG_F32);
            w.write_f32(*v);
        }
        Value::F64(v) => {
            w.write_u8(TAG_F64);
            w.write_f64(*v);
        }
        Value::Bool(v) => {
            w.write_u8(TAG_BOOL);
            w.write_bool(*v);
        }
        Value::Char(v) => {
            w.write_u8(TAG_CHAR);
            w.write_char(*v);
        }
        Value::Str(v) => {
            w.write_u8(TAG_STR);
            w.write_str(v);
        }
        Value::Blob(v) => {
            w.write_u8(TAG_BLOB);
            w.write_bytes(v);
        }
        Value::CompressedBlob(v) => {
            w.write_u8(TAG_COMPRESSED_BLOB);
            w.write_bytes(v);
        }
    }
}

/// Read a value written by [`write_generic`].
pub fn read_generic(r: &mut ByteReader<'_>) -> Result<Value, CodecError> {
    let tag = r.read_u8()?;
    let value = match tag {
        TAG_I16 => Value::I16(r.read_i16()?),
        TAG_I32 => Value::I32(r.read_i32()?),
        TAG_I64 => Value::I64(r.read_i64()?),
        TAG_F32 => Value::F32(r.read_f32()?),
        TAG_F64 => Value::F64(r.read_f64()?),
        TAG_BOOL => Value::Bool(r.read_bool()?),
        TAG_CHAR => Value::Char(r.read_char()?),
        TAG_STR => Value::Str(r.read_str()?),
        TAG_BLOB => Value::Blob(r.read_bytes()?),
        TAG_COMPRESSED_BLOB => Value::CompressedBlob(r.read_bytes()?),
        other => return Err(CodecError::InvalidValueTag(other)),
    };
    Ok(value)
}

// Compact path for short strings, generic fallback beyond the transport
// ceiling. The flag byte keeps both paths distinguishable to the reader.
fn write_string(s: &str, w: &mut ByteWriter) {
    if s.chars().count() <= MAX_COMPACT_STRING_CHARS {
        w.write_bool(true);
        w.write_str(s);
    } else {
        w.write_bool(false);
        write_generic(&Value::Str(s.to_string()), w);
    }
}

fn read_string(r: &mut ByteReader<'_>) -> Result<Value, CodecError> {
    if r.read_bool()? {
        Ok(Value::Str(r.read_str()?))
    } else {
        read_generic(r)
    }
}
