//! Entry codec: records to/from the tiered wire format
//!
//! Encoding writes the fixed-field array twice, partitioned by index
//! participation: the indexed section first, then (unless the payload is
//! index-only) the non-indexed section. Within each pass a control byte
//! precedes every group of 7 positions; each bit flags whether the
//! corresponding position is non-null *and* belongs to the current
//! partition, and a value immediately follows its bit only when set.
//!
//! The reader parses from the control bits alone and never consults the
//! live index mask, so full decoding is immune to partition drift. The
//! mask only decides whether an index-only decode request can be honored;
//! when the stored index format version disagrees with the live mask (or
//! no mask is registered at all), the request transparently upgrades to a
//! full decode.

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::CodecError;
use crate::layout::{FormatVersion, MarkerFlags, Sections};
use crate::serializer;
use gridstore_core::limits::DYNAMIC_INDICATOR_WIDTH;
use gridstore_core::{
    IndexMask, Record, SchemaOracle, SequenceMarkers, TypeSchema, Uid, Value, EXPIRATION_NEVER,
};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

static EMPTY_DYNAMIC_KEYS: Lazy<HashSet<String>> = Lazy::new(HashSet::new);

/// Wire profile of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Profile {
    /// Durable store framing; may carry a format-version token
    Persistent,
    /// Transient in-process framing; no version envelope
    OffHeap,
}

/// What the caller asks a decode to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Materialize the whole record
    Full,
    /// Materialize only index-participating fields
    IndexOnly,
}

/// What a decode actually produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedScope {
    /// All sections were read
    Full,
    /// Only the index-participating sections were read
    IndexOnly,
}

/// A decoded record together with the scope that was materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEntry {
    /// The reconstructed record
    pub record: Record,
    /// Whether the non-indexed sections were read
    pub scope: DecodedScope,
}

/// Stateless encoder/decoder for the tiered entry layout.
///
/// Safe for unlimited concurrent invocation: each call operates on its
/// own buffer, and the only shared state consulted is the oracle's
/// atomically published index mask.
pub struct EntryCodec {
    oracle: Arc<dyn SchemaOracle>,
}

impl EntryCodec {
    /// Create a codec bound to a schema oracle
    pub fn new(oracle: Arc<dyn SchemaOracle>) -> Self {
        EntryCodec { oracle }
    }

    /// Encode for the durable cold store.
    ///
    /// When `recoverable` is set the payload carries a format-version
    /// token so it can be parsed across software upgrades.
    pub fn encode_persistent(&self, record: &Record, recoverable: bool) -> Result<Vec<u8>, CodecError> {
        self.encode_at(record, Profile::Persistent, recoverable, false, FormatVersion::CURRENT)
    }

    /// Decode a persistent payload.
    ///
    /// An [`DecodeMode::IndexOnly`] request upgrades to a full decode when
    /// the stored index format version does not match the live mask, or
    /// when the type has no registered mask.
    pub fn decode_persistent(&self, bytes: &[u8], mode: DecodeMode) -> Result<DecodedEntry, CodecError> {
        self.decode_at(bytes, Profile::Persistent, mode)
    }

    /// Encode the transient off-heap representation (full payload).
    pub fn encode_off_heap(&self, record: &Record) -> Result<Vec<u8>, CodecError> {
        self.encode_at(record, Profile::OffHeap, false, false, FormatVersion::CURRENT)
    }

    /// Encode just the index-relevant byte range (off-heap framing).
    pub fn encode_index_slice(&self, record: &Record) -> Result<Vec<u8>, CodecError> {
        self.encode_at(record, Profile::OffHeap, false, true, FormatVersion::CURRENT)
    }

    /// Decode an off-heap payload.
    ///
    /// The mode is honored literally: pass [`DecodeMode::IndexOnly`] for
    /// payloads produced by [`encode_index_slice`](Self::encode_index_slice).
    pub fn decode_off_heap(&self, bytes: &[u8], mode: DecodeMode) -> Result<DecodedEntry, CodecError> {
        self.decode_at(bytes, Profile::OffHeap, mode)
    }

    fn encode_at(
        &self,
        record: &Record,
        profile: Profile,
        recoverable: bool,
        index_only: bool,
        version: FormatVersion,
    ) -> Result<Vec<u8>, CodecError> {
        let schema = self
            .oracle
            .type_schema(&record.type_name)
            .ok_or_else(|| CodecError::UnknownType(record.type_name.clone()))?;
        if record.fixed.len() != schema.fixed_count() {
            return Err(CodecError::FieldCountMismatch {
                type_name: record.type_name.clone(),
                expected: schema.fixed_count(),
                actual: record.fixed.len(),
            });
        }

        let mask = self.oracle.index_mask(&record.type_name);
        let mask_ref = mask.as_deref();
        let (mask_version, dynamic_keys): (u16, &HashSet<String>) = match mask_ref {
            Some(m) => (m.version, &m.dynamic),
            None => (0, &EMPTY_DYNAMIC_KEYS),
        };

        let recoverable = recoverable && profile == Profile::Persistent;
        let sections = sections_for(record, recoverable);
        let phantom = record.is_phantom();

        let mut w = ByteWriter::new();
        w.write_u8(sections.to_byte());
        if sections.recoverable {
            version.write(&mut w);
        }
        w.write_str(record.uid.as_str());

        if version.supports(FormatVersion::SEQUENCE_MARKERS) {
            let flags = MarkerFlags {
                present: record.markers.is_some(),
                phantom,
                multi_uid: record.markers.map(|m| m.multi_uid).unwrap_or(false),
            };
            w.write_u8(flags.to_byte());
            if let Some(markers) = record.markers {
                w.write_i64(markers.generation_id);
                w.write_i64(markers.sequence_id);
            }
        }

        w.write_u16(record.store_version);
        w.write_str(&record.type_name);
        w.write_u8(record.type_code);
        w.write_i64(record.created_at);
        if sections.order {
            w.write_i32(record.order);
        }
        if sections.version {
            w.write_u32(record.version);
        }
        if sections.expiration {
            w.write_i64(record.expiration);
        }

        // Stamp the index format version so a future reader can detect
        // index-definition drift.
        w.write_u16(mask_version);

        write_fixed_pass(&mut w, record, &schema, mask_ref, true)?;

        let entries: Vec<(&String, &Value)> = record
            .dynamic
            .as_ref()
            .map(|m| m.iter().collect())
            .unwrap_or_default();
        let partition = DynamicPartition::compute(&entries, dynamic_keys);

        if sections.dynamic {
            write_dynamic_pass(&mut w, &entries, &partition, dynamic_keys, true, phantom);
        }

        if !index_only {
            write_fixed_pass(&mut w, record, &schema, mask_ref, false)?;
            if sections.dynamic {
                write_dynamic_pass(&mut w, &entries, &partition, dynamic_keys, false, phantom);
            }
        }

        Ok(w.into_bytes())
    }

    fn decode_at(&self, bytes: &[u8], profile: Profile, mode: DecodeMode) -> Result<DecodedEntry, CodecError> {
        let mut r = ByteReader::new(bytes);

        let sections = Sections::from_byte(r.read_u8()?);
        let version = if profile == Profile::Persistent && sections.recoverable {
            FormatVersion::read(&mut r)?
        } else {
            // No token on the wire: the payload is from the current format.
            FormatVersion::CURRENT
        };

        let uid = Uid::from(r.read_str()?);

        let mut markers = None;
        if version.supports(FormatVersion::SEQUENCE_MARKERS) {
            let flags = MarkerFlags::from_byte(r.read_u8()?);
            if flags.present {
                let generation_id = r.read_i64()?;
                let sequence_id = r.read_i64()?;
                markers = Some(SequenceMarkers {
                    generation_id,
                    sequence_id,
                    phantom: flags.phantom,
                    multi_uid: flags.multi_uid,
                });
            }
        }

        let store_version = r.read_u16()?;
        let type_name = r.read_str()?;
        let type_code = r.read_u8()?;
        let created_at = r.read_i64()?;
        let order = if sections.order { r.read_i32()? } else { 0 };
        let record_version = if sections.version { r.read_u32()? } else { 1 };
        let expiration = if sections.expiration {
            r.read_i64()?
        } else {
            EXPIRATION_NEVER
        };
        let stored_mask_version = r.read_u16()?;

        let schema = self
            .oracle
            .type_schema(&type_name)
            .ok_or_else(|| CodecError::UnknownType(type_name.clone()))?;

        let mut scope = match mode {
            DecodeMode::Full => DecodedScope::Full,
            DecodeMode::IndexOnly => DecodedScope::IndexOnly,
        };
        if profile == Profile::Persistent && scope == DecodedScope::IndexOnly {
            // A stale partition layout cannot be trusted to contain the
            // currently-indexed fields.
            match self.oracle.index_mask(&type_name) {
                None => {
                    scope = DecodedScope::Full;
                    info!(
                        type_name = %type_name,
                        uid = %uid,
                        "full entry decoded: type has no registered index mask"
                    );
                }
                Some(mask) if mask.version != stored_mask_version => {
                    scope = DecodedScope::Full;
                    info!(
                        type_name = %type_name,
                        uid = %uid,
                        stored = stored_mask_version,
                        current = mask.version,
                        "full entry decoded: index format version changed"
                    );
                }
                Some(_) => {}
            }
        }

        let mut fixed = vec![None; schema.fixed_count()];
        read_fixed_pass(&mut r, &schema, &mut fixed)?;
        let mut dynamic = None;
        if sections.dynamic {
            dynamic = read_dynamic_pass(&mut r, dynamic)?;
        }

        if scope == DecodedScope::Full {
            read_fixed_pass(&mut r, &schema, &mut fixed)?;
            if sections.dynamic {
                dynamic = read_dynamic_pass(&mut r, dynamic)?;
            }
            debug!(uid = %uid, "full entry decoded");
        }

        let record = Record {
            uid,
            type_name,
            type_code,
            store_version,
            created_at,
            transient: sections.transient,
            order,
            version: record_version,
            expiration,
            fixed,
            dynamic,
            markers,
        };
        Ok(DecodedEntry { record, scope })
    }
}

impl std::fmt::Debug for EntryCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryCodec").finish_non_exhaustive()
    }
}

fn sections_for(record: &Record, recoverable: bool) -> Sections {
    Sections {
        recoverable,
        order: record.order != 0,
        version: record.version != 1,
        expiration: record.expiration != EXPIRATION_NEVER,
        dynamic: record.dynamic.is_some(),
        transient: record.transient,
    }
}

fn write_fixed_pass(
    w: &mut ByteWriter,
    record: &Record,
    schema: &TypeSchema,
    mask: Option<&IndexMask>,
    indexed_pass: bool,
) -> Result<(), CodecError> {
    let phantom = record.is_phantom();
    let n = record.fixed.len();
    w.write_i32(n as i32);

    let in_pass = |i: usize| mask.map(|m| m.fixed_at(i)).unwrap_or(false) == indexed_pass;
    for i in 0..n {
        if i % 7 == 0 {
            // Control byte for the next group of up to 7 positions.
            let mut bits = 0u8;
            let lim = n.min(i + 7);
            for j in i..lim {
                if !phantom && record.fixed[j].is_some() && in_pass(j) {
                    bits |= 1 << (j % 7);
                }
            }
            w.write_u8(bits);
        }
        if in_pass(i) && !phantom {
            if let Some(value) = &record.fixed[i] {
                write_field_value(schema, i, value, w).map_err(|e| e.at_position(i))?;
            }
        }
    }
    Ok(())
}

fn read_fixed_pass(
    r: &mut ByteReader<'_>,
    schema: &TypeSchema,
    fixed: &mut [Option<Value>],
) -> Result<(), CodecError> {
    let len = r.read_i32()?;
    if len < 0 {
        return Ok(());
    }
    let len = len as usize;
    if len > schema.fixed_count() {
        return Err(CodecError::FieldCountMismatch {
            type_name: schema.type_name.clone(),
            expected: schema.fixed_count(),
            actual: len,
        });
    }

    let mut bits = 0u8;
    for i in 0..len {
        if i % 7 == 0 {
            bits = r.read_u8()?;
        }
        if bits & (1 << (i % 7)) != 0 {
            let value = read_field_value(schema, i, r).map_err(|e| e.at_position(i))?;
            fixed[i] = Some(value);
        }
    }
    Ok(())
}

fn write_field_value(
    schema: &TypeSchema,
    position: usize,
    value: &Value,
    w: &mut ByteWriter,
) -> Result<(), CodecError> {
    match schema.kind_at(position) {
        Some(kind) if serializer::has_compact_form(kind) => serializer::write_compact(kind, value, w),
        _ => {
            serializer::write_generic(value, w);
            Ok(())
        }
    }
}

fn read_field_value(
    schema: &TypeSchema,
    position: usize,
    r: &mut ByteReader<'_>,
) -> Result<Value, CodecError> {
    match schema.kind_at(position) {
        Some(kind) if serializer::has_compact_form(kind) => serializer::read_compact(kind, r),
        _ => serializer::read_generic(r),
    }
}

/// Which dynamic-field entries belong to the indexed partition, computed
/// once per encode and threaded through both passes.
struct DynamicPartition {
    /// Bit per entry for the first [`DYNAMIC_INDICATOR_WIDTH`] entries
    indicator: u64,
    /// Total index-participating entries
    indexed_len: usize,
}

impl DynamicPartition {
    fn compute(entries: &[(&String, &Value)], keys: &HashSet<String>) -> Self {
        let mut indicator = 0u64;
        let mut indexed_len = 0;
        for (overall, (key, _)) in entries.iter().enumerate() {
            if keys.contains(key.as_str()) {
                if overall < DYNAMIC_INDICATOR_WIDTH {
                    indicator |= 1u64 << overall;
                }
                indexed_len += 1;
            }
        }
        DynamicPartition {
            indicator,
            indexed_len,
        }
    }

    fn is_indexed(&self, overall: usize, key: &str, keys: &HashSet<String>) -> bool {
        if overall < DYNAMIC_INDICATOR_WIDTH {
            self.indicator & (1u64 << overall) != 0
        } else {
            keys.contains(key)
        }
    }
}

fn write_dynamic_pass(
    w: &mut ByteWriter,
    entries: &[(&String, &Value)],
    partition: &DynamicPartition,
    keys: &HashSet<String>,
    indexed_pass: bool,
    phantom: bool,
) {
    if phantom {
        w.write_i32(-1);
        return;
    }
    let count = if indexed_pass {
        partition.indexed_len
    } else {
        entries.len() - partition.indexed_len
    };
    w.write_i32(count as i32);
    if count == 0 {
        return;
    }
    for (overall, (key, value)) in entries.iter().enumerate() {
        if partition.is_indexed(overall, key, keys) == indexed_pass {
            w.write_str(key);
            serializer::write_generic(value, w);
        }
    }
}

fn read_dynamic_pass(
    r: &mut ByteReader<'_>,
    current: Option<HashMap<String, Value>>,
) -> Result<Option<HashMap<String, Value>>, CodecError> {
    let len = r.read_i32()?;
    if len < 0 {
        return Ok(current);
    }
    let mut map = current.unwrap_or_default();
    for _ in 0..len as usize {
        let key = r.read_str()?;
        let value = serializer::read_generic(r)?;
        map.insert(key, value);
    }
    Ok(Some(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstore_core::{IdentityStrategy, PropertyDef, SchemaRegistry, StorageKind};
    use proptest::prelude::*;

    const TRADE: &str = "Trade";

    fn trade_registry() -> Arc<SchemaRegistry> {
        let registry = SchemaRegistry::new();
        registry.introduce_type(TypeSchema::new(
            TRADE,
            vec![
                PropertyDef::new("id", StorageKind::I64),
                PropertyDef::new("symbol", StorageKind::Str),
                PropertyDef::new("qty", StorageKind::I32),
                PropertyDef::new("price", StorageKind::F64),
                PropertyDef::new("note", StorageKind::Object),
            ],
            0,
            IdentityStrategy::CallerSupplied,
        ));
        registry
            .publish_mask(
                TRADE,
                vec![true, false, true, false, false],
                ["route".to_string()].into_iter().collect(),
            )
            .unwrap();
        Arc::new(registry)
    }

    fn trade_record() -> Record {
        let mut record = Record::new(
            Uid::from("Trade:7"),
            TRADE,
            vec![
                Some(Value::I64(7)),
                Some(Value::Str("ACME".into())),
                None,
                Some(Value::F64(101.5)),
                Some(Value::Char('x')),
            ],
        );
        record.type_code = 3;
        record.store_version = 2;
        record.created_at = 1_000;
        record
    }

    fn codec(registry: Arc<SchemaRegistry>) -> EntryCodec {
        EntryCodec::new(registry)
    }

    #[test]
    fn test_roundtrip_persistent_recoverable() {
        let codec = codec(trade_registry());
        let record = trade_record();

        let bytes = codec.encode_persistent(&record, true).unwrap();
        let decoded = codec.decode_persistent(&bytes, DecodeMode::Full).unwrap();
        assert_eq!(decoded.scope, DecodedScope::Full);
        assert_eq!(decoded.record, record);
    }

    #[test]
    fn test_roundtrip_persistent_not_recoverable() {
        let codec = codec(trade_registry());
        let record = trade_record();

        let recoverable = codec.encode_persistent(&record, true).unwrap();
        let bare = codec.encode_persistent(&record, false).unwrap();
        // No version token on the wire without the recoverable section.
        assert_eq!(recoverable.len(), bare.len() + 2);

        let decoded = codec.decode_persistent(&bare, DecodeMode::Full).unwrap();
        assert_eq!(decoded.record, record);
    }

    #[test]
    fn test_roundtrip_off_heap() {
        let codec = codec(trade_registry());
        let record = trade_record();

        let bytes = codec.encode_off_heap(&record).unwrap();
        let decoded = codec.decode_off_heap(&bytes, DecodeMode::Full).unwrap();
        assert_eq!(decoded.record, record);
    }

    #[test]
    fn test_roundtrip_optional_sections() {
        let codec = codec(trade_registry());
        let mut record = trade_record();
        record.order = 9;
        record.version = 5;
        record.expiration = 123_456;
        record.transient = true;
        record.markers = Some(SequenceMarkers::new(11, 42));

        let bytes = codec.encode_persistent(&record, true).unwrap();
        let decoded = codec.decode_persistent(&bytes, DecodeMode::Full).unwrap();
        assert_eq!(decoded.record, record);

        let bytes = codec.encode_off_heap(&record).unwrap();
        let decoded = codec.decode_off_heap(&bytes, DecodeMode::Full).unwrap();
        assert_eq!(decoded.record, record);
    }

    #[test]
    fn test_default_sections_decode_to_defaults() {
        let codec = codec(trade_registry());
        let record = trade_record();

        let bytes = codec.encode_persistent(&record, false).unwrap();
        let decoded = codec.decode_persistent(&bytes, DecodeMode::Full).unwrap().record;
        assert_eq!(decoded.version, 1);
        assert_eq!(decoded.expiration, EXPIRATION_NEVER);
        assert_eq!(decoded.order, 0);
        assert!(!decoded.transient);
        assert!(decoded.markers.is_none());
        assert!(decoded.dynamic.is_none());
    }

    #[test]
    fn test_dynamic_fields_roundtrip() {
        let codec = codec(trade_registry());
        let mut record = trade_record();
        let mut dynamic = HashMap::new();
        dynamic.insert("route".to_string(), Value::Str("fast".into()));
        dynamic.insert("venue".to_string(), Value::I32(4));
        dynamic.insert("memo".to_string(), Value::Str("hold".into()));
        record.dynamic = Some(dynamic.clone());

        let bytes = codec.encode_persistent(&record, true).unwrap();
        let decoded = codec.decode_persistent(&bytes, DecodeMode::Full).unwrap().record;
        assert_eq!(decoded.dynamic, Some(dynamic));
    }

    #[test]
    fn test_index_only_decode_yields_indexed_fields() {
        let codec = codec(trade_registry());
        let record = trade_record();

        let bytes = codec.encode_persistent(&record, true).unwrap();
        let decoded = codec
            .decode_persistent(&bytes, DecodeMode::IndexOnly)
            .unwrap();
        assert_eq!(decoded.scope, DecodedScope::IndexOnly);

        // Mask is [true, false, true, false, false]: only positions 0 and
        // 2 may be materialized; position 2 was null to begin with.
        let fixed = &decoded.record.fixed;
        assert_eq!(fixed[0], Some(Value::I64(7)));
        assert_eq!(fixed[1], None);
        assert_eq!(fixed[2], None);
        assert_eq!(fixed[3], None);
        assert_eq!(fixed[4], None);
    }

    #[test]
    fn test_index_only_decode_keeps_indexed_dynamic_fields() {
        let codec = codec(trade_registry());
        let mut record = trade_record();
        let mut dynamic = HashMap::new();
        dynamic.insert("route".to_string(), Value::Str("fast".into()));
        dynamic.insert("memo".to_string(), Value::Str("hold".into()));
        record.dynamic = Some(dynamic);

        let bytes = codec.encode_persistent(&record, true).unwrap();
        let decoded = codec
            .decode_persistent(&bytes, DecodeMode::IndexOnly)
            .unwrap();
        let dynamic = decoded.record.dynamic.unwrap();
        assert_eq!(dynamic.get("route"), Some(&Value::Str("fast".into())));
        assert_eq!(dynamic.get("memo"), None);
    }

    #[test]
    fn test_partition_completeness() {
        // Full decode materializes the union of both sections with no
        // position left behind.
        let codec = codec(trade_registry());
        let mut record = trade_record();
        record.fixed[2] = Some(Value::I32(55));

        let bytes = codec.encode_persistent(&record, true).unwrap();
        let decoded = codec.decode_persistent(&bytes, DecodeMode::Full).unwrap().record;
        assert_eq!(decoded.fixed, record.fixed);
    }

    #[test]
    fn test_stale_index_version_upgrades_to_full() {
        let registry = trade_registry();
        let codec = EntryCodec::new(registry.clone());
        let record = trade_record();

        let bytes = codec.encode_persistent(&record, true).unwrap();

        // Index definition changes after the payload was written.
        registry
            .publish_mask(
                TRADE,
                vec![false, true, false, false, false],
                HashSet::new(),
            )
            .unwrap();

        let decoded = codec
            .decode_persistent(&bytes, DecodeMode::IndexOnly)
            .unwrap();
        assert_eq!(decoded.scope, DecodedScope::Full);
        assert_eq!(decoded.record, record);
    }

    #[test]
    fn test_unmasked_type_upgrades_to_full() {
        let registry = SchemaRegistry::new();
        registry.introduce_type(TypeSchema::new(
            "Bare",
            vec![PropertyDef::new("id", StorageKind::I64)],
            0,
            IdentityStrategy::CallerSupplied,
        ));
        let registry = Arc::new(registry);
        let codec = EntryCodec::new(registry);

        let record = Record::new(Uid::from("Bare:1"), "Bare", vec![Some(Value::I64(1))]);
        let bytes = codec.encode_persistent(&record, true).unwrap();
        let decoded = codec
            .decode_persistent(&bytes, DecodeMode::IndexOnly)
            .unwrap();
        assert_eq!(decoded.scope, DecodedScope::Full);
        assert_eq!(decoded.record, record);
    }

    #[test]
    fn test_unknown_type_is_schema_violation() {
        let codec = codec(trade_registry());
        let record = Record::new(Uid::from("u"), "Ghost", vec![]);
        assert!(matches!(
            codec.encode_persistent(&record, true).unwrap_err(),
            CodecError::UnknownType(_)
        ));
    }

    #[test]
    fn test_arity_mismatch_is_schema_violation() {
        let codec = codec(trade_registry());
        let record = Record::new(Uid::from("u"), TRADE, vec![Some(Value::I64(1))]);
        assert!(matches!(
            codec.encode_persistent(&record, true).unwrap_err(),
            CodecError::FieldCountMismatch {
                expected: 5,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_positional_failure_reports_position() {
        let codec = codec(trade_registry());
        let mut record = trade_record();
        // Declared I32 at position 2, value is a string.
        record.fixed[2] = Some(Value::Str("not a qty".into()));

        let err = codec.encode_persistent(&record, true).unwrap_err();
        match err {
            CodecError::Position { position, source } => {
                assert_eq!(position, 2);
                assert!(matches!(*source, CodecError::KindMismatch { .. }));
            }
            other => panic!("expected Position, got {:?}", other),
        }
    }

    #[test]
    fn test_phantom_roundtrip_drops_payload() {
        let codec = codec(trade_registry());
        let mut record = trade_record();
        let mut dynamic = HashMap::new();
        dynamic.insert("route".to_string(), Value::Str("fast".into()));
        record.dynamic = Some(dynamic);
        record.markers = Some(SequenceMarkers {
            generation_id: 8,
            sequence_id: 21,
            phantom: true,
            multi_uid: true,
        });

        let bytes = codec.encode_persistent(&record, true).unwrap();
        let decoded = codec.decode_persistent(&bytes, DecodeMode::Full).unwrap().record;

        assert_eq!(decoded.uid, record.uid);
        assert_eq!(decoded.type_name, record.type_name);
        assert_eq!(decoded.markers, record.markers);
        assert!(decoded.fixed.iter().all(|slot| slot.is_none()));
        assert!(decoded.dynamic.is_none());
    }

    #[test]
    fn test_old_format_decodes_with_default_markers() {
        let codec = codec(trade_registry());
        let mut record = trade_record();
        record.markers = Some(SequenceMarkers::new(1, 2));

        // A writer from before the sequence-marker checkpoint.
        let bytes = codec
            .encode_at(&record, Profile::Persistent, true, false, FormatVersion::BASE)
            .unwrap();
        let decoded = codec.decode_persistent(&bytes, DecodeMode::Full).unwrap().record;
        assert!(decoded.markers.is_none());
        assert_eq!(decoded.fixed, record.fixed);
    }

    #[test]
    fn test_index_slice_roundtrip() {
        let codec = codec(trade_registry());
        let record = trade_record();

        let slice = codec.encode_index_slice(&record).unwrap();
        let full = codec.encode_off_heap(&record).unwrap();
        // The slice is a strict prefix of the full off-heap payload.
        assert_eq!(&full[..slice.len()], &slice[..]);
        assert!(full.len() > slice.len());

        let decoded = codec.decode_off_heap(&slice, DecodeMode::IndexOnly).unwrap();
        assert_eq!(decoded.scope, DecodedScope::IndexOnly);
        assert_eq!(decoded.record.fixed[0], Some(Value::I64(7)));
        assert_eq!(decoded.record.fixed[1], None);
    }

    #[test]
    fn test_shorter_payload_from_older_schema_tolerated() {
        // Writer knew 2 properties; reader's schema has 5. The trailing
        // positions decode as absent.
        let writer_registry = SchemaRegistry::new();
        writer_registry.introduce_type(TypeSchema::new(
            TRADE,
            vec![
                PropertyDef::new("id", StorageKind::I64),
                PropertyDef::new("symbol", StorageKind::Str),
            ],
            0,
            IdentityStrategy::CallerSupplied,
        ));
        let writer = EntryCodec::new(Arc::new(writer_registry));
        let record = Record::new(
            Uid::from("Trade:7"),
            TRADE,
            vec![Some(Value::I64(7)), Some(Value::Str("ACME".into()))],
        );
        let bytes = writer.encode_persistent(&record, true).unwrap();

        let reader = codec(trade_registry());
        let decoded = reader.decode_persistent(&bytes, DecodeMode::Full).unwrap().record;
        assert_eq!(decoded.fixed.len(), 5);
        assert_eq!(decoded.fixed[0], Some(Value::I64(7)));
        assert_eq!(decoded.fixed[1], Some(Value::Str("ACME".into())));
        assert_eq!(decoded.fixed[2], None);
    }

    #[test]
    fn test_wider_payload_than_schema_rejected() {
        let writer = codec(trade_registry());
        let record = trade_record();
        let bytes = writer.encode_persistent(&record, true).unwrap();

        let narrow_registry = SchemaRegistry::new();
        narrow_registry.introduce_type(TypeSchema::new(
            TRADE,
            vec![PropertyDef::new("id", StorageKind::I64)],
            0,
            IdentityStrategy::CallerSupplied,
        ));
        let reader = EntryCodec::new(Arc::new(narrow_registry));
        assert!(matches!(
            reader.decode_persistent(&bytes, DecodeMode::Full).unwrap_err(),
            CodecError::FieldCountMismatch {
                expected: 1,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_many_fields_cross_control_byte_groups() {
        // 17 properties exercise three control-byte groups per pass.
        let registry = SchemaRegistry::new();
        let properties = (0..17)
            .map(|i| PropertyDef::new(format!("p{}", i), StorageKind::I32))
            .collect();
        registry.introduce_type(TypeSchema::new(
            "Wide",
            properties,
            0,
            IdentityStrategy::CallerSupplied,
        ));
        let mask = (0..17).map(|i| i % 3 == 0).collect();
        registry.publish_mask("Wide", mask, HashSet::new()).unwrap();
        let codec = EntryCodec::new(Arc::new(registry));

        let fixed = (0..17)
            .map(|i| if i % 4 == 0 { None } else { Some(Value::I32(i)) })
            .collect();
        let record = Record::new(Uid::from("Wide:1"), "Wide", fixed);

        let bytes = codec.encode_persistent(&record, true).unwrap();
        let decoded = codec.decode_persistent(&bytes, DecodeMode::Full).unwrap().record;
        assert_eq!(decoded.fixed, record.fixed);
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i16>().prop_map(Value::I16),
            any::<i32>().prop_map(Value::I32),
            any::<i64>().prop_map(Value::I64),
            (-1.0e15f32..1.0e15).prop_map(Value::F32),
            (-1.0e15f64..1.0e15).prop_map(Value::F64),
            any::<bool>().prop_map(Value::Bool),
            any::<char>().prop_map(Value::Char),
            "[a-z0-9 ]{0,24}".prop_map(Value::Str),
            prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Blob),
            prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::CompressedBlob),
        ]
    }

    proptest! {
        #[test]
        fn prop_roundtrip_both_profiles(
            fields in prop::collection::vec(prop::option::of(value_strategy()), 0..12),
            mask_bits in prop::collection::vec(any::<bool>(), 12),
            dynamic in prop::collection::hash_map("[a-z]{1,8}", value_strategy(), 0..6),
            has_dynamic in any::<bool>(),
        ) {
            let registry = SchemaRegistry::new();
            let properties = (0..fields.len())
                .map(|i| PropertyDef::new(format!("p{}", i), StorageKind::Object))
                .collect();
            registry.introduce_type(TypeSchema::new(
                "P",
                properties,
                0,
                IdentityStrategy::SystemGenerated,
            ));
            registry
                .publish_mask("P", mask_bits[..fields.len()].to_vec(), HashSet::new())
                .unwrap();
            let codec = EntryCodec::new(Arc::new(registry));

            let mut record = Record::new(Uid::from("p-1"), "P", fields);
            if has_dynamic {
                record.dynamic = Some(dynamic);
            }

            let bytes = codec.encode_persistent(&record, true).unwrap();
            let decoded = codec.decode_persistent(&bytes, DecodeMode::Full).unwrap();
            prop_assert_eq!(&decoded.record, &record);

            let bytes = codec.encode_off_heap(&record).unwrap();
            let decoded = codec.decode_off_heap(&bytes, DecodeMode::Full).unwrap();
            prop_assert_eq!(&decoded.record, &record);
        }
    }
}
