//! Format limits shared by the codec and its callers
//!
//! These constants are part of the wire contract: changing them changes
//! which payloads older readers can parse.

/// Longest string (in characters) written through the compact string token.
///
/// Strings above this length travel through the generic self-describing
/// encoding instead. The ceiling is inherited from the text-transport
/// primitive of the original storage format.
pub const MAX_COMPACT_STRING_CHARS: usize = 20_000;

/// Number of dynamic-field entries covered by the per-record partition
/// indicator bitmask. Entries beyond this fall back to set-membership
/// lookups against the live index mask.
pub const DYNAMIC_INDICATOR_WIDTH: usize = 63;
