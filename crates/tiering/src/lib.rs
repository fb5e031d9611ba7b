//! Tier residency classification and divergence detection
//!
//! This crate implements the read side of tiered storage reconciliation:
//! - `TieredState` / `EntryTieredMetaData`: classification results
//! - `HotStore` / `ColdStore`: narrow accessor contracts for the two tiers
//! - `TierResolver`: per-identity and batch reconciliation
//! - `testing`: in-memory tier doubles with context-release accounting
//!
//! Tier lookups are two independent point reads with no ordering
//! guarantee; the consistency check is a best-effort snapshot comparison,
//! not a transactional one.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod resolver;
pub mod state;
pub mod store;
pub mod testing;

pub use error::{ColdError, TieringError};
pub use resolver::TierResolver;
pub use state::{tiers_for_match, EntryTieredMetaData, MatchTier, TieredState};
pub use store::{row_to_record, ColdContext, ColdStore, HotStore};
