//! Tier residency states and match selectors

use serde::{Deserialize, Serialize};

/// Where a record currently resides.
///
/// Absence from both tiers is not a state: the resolver reports it as
/// "no result" for that identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TieredState {
    /// Only the cache-resident tier holds a copy
    Hot,
    /// Only the disk-resident tier holds a copy
    Cold,
    /// Both tiers hold a copy
    HotAndCold,
}

impl TieredState {
    /// Canonical tier-state name
    pub fn as_str(self) -> &'static str {
        match self {
            TieredState::Hot => "HOT",
            TieredState::Cold => "COLD",
            TieredState::HotAndCold => "HOT_AND_COLD",
        }
    }
}

/// Result of reconciling one record identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTieredMetaData {
    /// Residency classification
    pub tiered_state: TieredState,
    /// Whether the two copies agree; populated only for
    /// [`TieredState::HotAndCold`]
    pub identical_to_cache: Option<bool>,
}

impl EntryTieredMetaData {
    /// Metadata for a record resident in one tier only
    pub fn single_tier(state: TieredState) -> Self {
        EntryTieredMetaData {
            tiered_state: state,
            identical_to_cache: None,
        }
    }

    /// Metadata for a record resident in both tiers
    pub fn both_tiers(identical: bool) -> Self {
        EntryTieredMetaData {
            tiered_state: TieredState::HotAndCold,
            identical_to_cache: Some(identical),
        }
    }
}

/// Query-time selector for which tier(s) a predicate should match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTier {
    /// Match records resident in the hot tier
    MatchHot,
    /// Match records resident in the cold tier
    MatchCold,
    /// Match records resident in either tier
    MatchHotAndCold,
}

/// Concrete tier names used when building a cold-store filter predicate.
///
/// The selector enum is closed, so inputs outside the three match modes
/// are unrepresentable.
pub fn tiers_for_match(match_tier: MatchTier) -> Vec<&'static str> {
    match match_tier {
        MatchTier::MatchHot => vec!["HOT"],
        MatchTier::MatchCold => vec!["COLD"],
        MatchTier::MatchHotAndCold => vec!["HOT", "COLD"],
    }
}
