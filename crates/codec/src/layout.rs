//! Wire-layout framing: present-section sets and format checkpoints
//!
//! # Layout
//!
//! ```text
//! Entry payload (both profiles):
//! ┌──────────────┬───────────────────┬─────┬──────────────┬───────────────┐
//! │ Sections (1) │ Version token (2) │ Uid │ Markers (1+) │ Metadata ...  │
//! └──────────────┴───────────────────┴─────┴──────────────┴───────────────┘
//!                  persistent profile,       gated on the
//!                  recoverable only          SEQUENCE_MARKERS checkpoint
//! ```
//!
//! The sections byte enumerates which optional sections follow; it is
//! computed once at encode time and consulted symmetrically at decode
//! time. Format evolution is modeled as ordered checkpoints: each
//! checkpoint adds one named optional section, and readers gate on
//! "does this payload's version include that checkpoint".

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::CodecError;

/// Section bits of the flags byte
const SECTION_RECOVERABLE: u8 = 1 << 0;
const SECTION_ORDER: u8 = 1 << 1;
const SECTION_VERSION: u8 = 1 << 2;
const SECTION_EXPIRATION: u8 = 1 << 3;
const SECTION_DYNAMIC: u8 = 1 << 4;
const SECTION_TRANSIENT: u8 = 1 << 5;

/// Marker bits of the sequence-marker flags byte
const MARKER_PRESENT: u8 = 1 << 0;
const MARKER_PHANTOM: u8 = 1 << 1;
const MARKER_MULTI_UID: u8 = 1 << 2;

/// The set of optional sections present in a payload.
///
/// Only sections whose bit is set are written, minimizing the payload for
/// common cases (version 1, never expires, no dynamic fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Sections {
    /// Payload carries a format-version token (persistent profile)
    pub recoverable: bool,
    /// Non-default insertion ordinal follows
    pub order: bool,
    /// Version differs from the default of 1
    pub version: bool,
    /// Expiration differs from the never-expires sentinel
    pub expiration: bool,
    /// Dynamic-field passes follow
    pub dynamic: bool,
    /// Record is transient (flag only, no payload)
    pub transient: bool,
}

impl Sections {
    pub(crate) fn to_byte(self) -> u8 {
        let mut flags = 0;
        if self.recoverable {
            flags |= SECTION_RECOVERABLE;
        }
        if self.order {
            flags |= SECTION_ORDER;
        }
        if self.version {
            flags |= SECTION_VERSION;
        }
        if self.expiration {
            flags |= SECTION_EXPIRATION;
        }
        if self.dynamic {
            flags |= SECTION_DYNAMIC;
        }
        if self.transient {
            flags |= SECTION_TRANSIENT;
        }
        flags
    }

    pub(crate) fn from_byte(flags: u8) -> Self {
        Sections {
            recoverable: flags & SECTION_RECOVERABLE != 0,
            order: flags & SECTION_ORDER != 0,
            version: flags & SECTION_VERSION != 0,
            expiration: flags & SECTION_EXPIRATION != 0,
            dynamic: flags & SECTION_DYNAMIC != 0,
            transient: flags & SECTION_TRANSIENT != 0,
        }
    }
}

/// Sequence-marker flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct MarkerFlags {
    /// Generation and sequence ids follow
    pub present: bool,
    /// Record is a phantom (no field payload)
    pub phantom: bool,
    /// Mutation covered multiple uids
    pub multi_uid: bool,
}

impl MarkerFlags {
    pub(crate) fn to_byte(self) -> u8 {
        let mut flags = 0;
        if self.present {
            flags |= MARKER_PRESENT;
        }
        if self.phantom {
            flags |= MARKER_PHANTOM;
        }
        if self.multi_uid {
            flags |= MARKER_MULTI_UID;
        }
        flags
    }

    pub(crate) fn from_byte(flags: u8) -> Self {
        MarkerFlags {
            present: flags & MARKER_PRESENT != 0,
            phantom: flags & MARKER_PHANTOM != 0,
            multi_uid: flags & MARKER_MULTI_UID != 0,
        }
    }
}

/// A format-version checkpoint of the tiered wire format.
///
/// Checkpoints are ordered; each one adds a named optional section.
/// Payloads without a version token (off-heap profile, or persistent
/// without the recoverable section) are assumed to be [`CURRENT`].
///
/// [`CURRENT`]: FormatVersion::CURRENT
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FormatVersion(u16);

impl FormatVersion {
    /// First tiered format
    pub const BASE: FormatVersion = FormatVersion(1);
    /// Checkpoint that introduced the embedded sequence-marker section
    pub const SEQUENCE_MARKERS: FormatVersion = FormatVersion(2);
    /// Newest checkpoint this software writes and reads
    pub const CURRENT: FormatVersion = Self::SEQUENCE_MARKERS;

    /// Whether this version includes `checkpoint`'s section
    pub fn supports(self, checkpoint: FormatVersion) -> bool {
        self >= checkpoint
    }

    /// Raw token value
    pub fn as_u16(self) -> u16 {
        self.0
    }

    pub(crate) fn write(self, w: &mut ByteWriter) {
        w.write_u16(self.0);
    }

    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let token = r.read_u16()?;
        let version = FormatVersion(token);
        if version > Self::CURRENT {
            return Err(CodecError::UnsupportedVersion {
                version: token,
                max_supported: Self::CURRENT.0,
            });
        }
        Ok(version)
    }
}
