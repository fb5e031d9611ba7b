//! Tier reconciliation
//!
//! `TierResolver` classifies where a record identity resides and, when
//! both tiers hold a copy, verifies the copies agree. The two lookups are
//! independent point reads; a record concurrently moving between tiers
//! during resolution yields a best-effort snapshot, by contract.

use crate::error::TieringError;
use crate::state::{EntryTieredMetaData, TieredState};
use crate::store::{ColdContext, ColdStore, HotStore};
use gridstore_core::{IdentityStrategy, Record, RecordId, SchemaOracle, TypeSchema};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Classifies tier residency and detects hot/cold divergence.
pub struct TierResolver {
    oracle: Arc<dyn SchemaOracle>,
    hot: Arc<dyn HotStore>,
    cold: Option<Arc<dyn ColdStore>>,
}

impl TierResolver {
    /// Create a resolver.
    ///
    /// `cold` is `None` on grids without tiered storage; every resolution
    /// then fails fast with [`TieringError::NotEnabled`].
    pub fn new(
        oracle: Arc<dyn SchemaOracle>,
        hot: Arc<dyn HotStore>,
        cold: Option<Arc<dyn ColdStore>>,
    ) -> Self {
        TierResolver { oracle, hot, cold }
    }

    fn cold(&self) -> Result<&Arc<dyn ColdStore>, TieringError> {
        self.cold.as_ref().ok_or(TieringError::NotEnabled)
    }

    /// Resolve tier residency for one identity.
    ///
    /// Returns `Ok(None)` when the record is present in neither tier;
    /// that is a not-found outcome, not a tiered state.
    pub fn resolve(
        &self,
        type_name: &str,
        id: &RecordId,
    ) -> Result<Option<EntryTieredMetaData>, TieringError> {
        let cold = self.cold()?;
        let mut ctx = cold.acquire_context()?;
        self.resolve_in_context(ctx.as_mut(), type_name, id)
    }

    /// Resolve tier residency for a batch of identities.
    ///
    /// The batch shares one cold-tier context. Identities resolve
    /// independently: not-found identities are omitted from the result,
    /// and a per-identity failure is logged and omitted rather than
    /// aborting the rest. Only structural misconfiguration (no cold tier,
    /// unknown type) fails the whole batch, before any per-identity work.
    pub fn resolve_many(
        &self,
        type_name: &str,
        ids: &[RecordId],
    ) -> Result<HashMap<RecordId, EntryTieredMetaData>, TieringError> {
        let cold = self.cold()?;
        if self.oracle.type_schema(type_name).is_none() {
            return Err(TieringError::UnknownType(type_name.to_string()));
        }

        let mut ctx = cold.acquire_context()?;
        let mut results = HashMap::with_capacity(ids.len());
        for id in ids {
            match self.resolve_in_context(ctx.as_mut(), type_name, id) {
                Ok(Some(metadata)) => {
                    results.insert(id.clone(), metadata);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(type_name, id = %id, error = %err, "tier resolution failed for identity");
                }
            }
        }
        Ok(results)
    }

    fn resolve_in_context(
        &self,
        ctx: &mut dyn ColdContext,
        type_name: &str,
        id: &RecordId,
    ) -> Result<Option<EntryTieredMetaData>, TieringError> {
        let schema = self
            .oracle
            .type_schema(type_name)
            .ok_or_else(|| TieringError::UnknownType(type_name.to_string()))?;
        let cold_store = self.cold()?;

        let (hot, cold) = match (schema.identity, id) {
            (IdentityStrategy::SystemGenerated, RecordId::Uid(uid)) => {
                let hot = self.hot.get_by_uid(uid);
                let cold = cold_store.get_by_uid(ctx, type_name, uid)?;
                (hot, cold)
            }
            (IdentityStrategy::CallerSupplied, RecordId::Value(value)) => {
                let hot = self.hot.get_by_id(type_name, value);
                let cold = cold_store.get_by_id(ctx, type_name, value)?;
                (hot, cold)
            }
            _ => {
                return Err(TieringError::IdentityStrategyMismatch {
                    type_name: type_name.to_string(),
                    id: id.to_string(),
                })
            }
        };

        let metadata = match (hot, cold) {
            (Some(_), None) => Some(EntryTieredMetaData::single_tier(TieredState::Hot)),
            (None, Some(_)) => Some(EntryTieredMetaData::single_tier(TieredState::Cold)),
            (Some(hot), Some(cold)) => Some(EntryTieredMetaData::both_tiers(is_identical_to_cache(
                &schema, &hot, &cold,
            ))),
            (None, None) => None,
        };
        Ok(metadata)
    }
}

impl std::fmt::Debug for TierResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TierResolver")
            .field("tiered_storage_enabled", &self.cold.is_some())
            .finish()
    }
}

/// Compare a hot and a cold copy field by field.
///
/// Stops at the first mismatch and logs one diagnostic. At the id
/// position of system-generated-identity types the resolved unique
/// identifiers are compared instead of the stored values, because the
/// identity is not stored as an ordinary field under that strategy. Two
/// nulls at the same position are equal; exactly one null is a mismatch.
fn is_identical_to_cache(schema: &TypeSchema, hot: &Record, cold: &Record) -> bool {
    if hot.fixed.len() != cold.fixed.len() {
        return false;
    }
    for position in 0..hot.fixed.len() {
        if schema.identity == IdentityStrategy::SystemGenerated && position == schema.id_position {
            if hot.uid != cold.uid {
                warn!(
                    type_name = %schema.type_name,
                    position,
                    hot = %hot.uid,
                    cold = %cold.uid,
                    "hot and cold tier copies diverge at the identity position"
                );
                return false;
            }
            continue;
        }
        match (&hot.fixed[position], &cold.fixed[position]) {
            (None, None) => {}
            (Some(hot_value), Some(cold_value)) if hot_value == cold_value => {}
            (hot_value, cold_value) => {
                warn!(
                    type_name = %schema.type_name,
                    position,
                    hot = ?hot_value,
                    cold = ?cold_value,
                    "hot and cold tier copies diverge"
                );
                return false;
            }
        }
    }
    true
}
