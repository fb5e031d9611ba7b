//! Accessor contracts for the two storage tiers
//!
//! The hot tier is the owning cache: point lookups cannot fail. The cold
//! tier is an opaque keyed row store reachable only through a narrow
//! get-by-identity contract; it distinguishes the expected "not present"
//! outcome (`Ok(None)`) from any other failure (`Err`), and every access
//! happens inside a scoped context that is released on drop on every
//! exit path.

use crate::error::{ColdError, TieringError};
use gridstore_core::{IdentityStrategy, Record, TypeSchema, Uid, Value};

/// Scoped cold-tier access handle.
///
/// Acquired per call (or per batch) and released when dropped, including
/// on error paths and on the expected not-found outcome.
pub trait ColdContext: Send {}

/// Cache-resident tier accessor.
pub trait HotStore: Send + Sync {
    /// Look up by system-generated unique identifier
    fn get_by_uid(&self, uid: &Uid) -> Option<Record>;

    /// Look up by caller-supplied id
    fn get_by_id(&self, type_name: &str, id: &Value) -> Option<Record>;
}

/// Disk-resident tier accessor.
pub trait ColdStore: Send + Sync {
    /// Acquire a scoped access context
    fn acquire_context(&self) -> Result<Box<dyn ColdContext>, ColdError>;

    /// Look up by system-generated unique identifier.
    ///
    /// `Ok(None)` is the expected "no cold copy" outcome; any `Err`
    /// propagates to the caller.
    fn get_by_uid(
        &self,
        ctx: &mut dyn ColdContext,
        type_name: &str,
        uid: &Uid,
    ) -> Result<Option<Record>, ColdError>;

    /// Look up by caller-supplied id. Same outcome contract as
    /// [`get_by_uid`](Self::get_by_uid).
    fn get_by_id(
        &self,
        ctx: &mut dyn ColdContext,
        type_name: &str,
        id: &Value,
    ) -> Result<Option<Record>, ColdError>;
}

/// Reconstruct a record from a tabular cold-tier result row.
///
/// The row carries one column per fixed property, in schema order. The
/// uid is derived via the type's identity strategy: system-generated
/// types store the uid in the id column; caller-supplied types derive it
/// from the type name and the id value.
pub fn row_to_record(schema: &TypeSchema, row: Vec<Option<Value>>) -> Result<Record, TieringError> {
    if row.len() != schema.fixed_count() {
        return Err(TieringError::RowArityMismatch {
            type_name: schema.type_name.clone(),
            expected: schema.fixed_count(),
            actual: row.len(),
        });
    }

    let uid = match schema.identity {
        IdentityStrategy::SystemGenerated => {
            let id = row
                .get(schema.id_position)
                .and_then(|slot| slot.as_ref())
                .ok_or_else(|| gridstore_core::Error::MissingId {
                    type_name: schema.type_name.clone(),
                    position: schema.id_position,
                })?;
            match id {
                Value::Str(s) => Uid::from(s.as_str()),
                other => Uid::from(other.to_string()),
            }
        }
        IdentityStrategy::CallerSupplied => {
            let id = row
                .get(schema.id_position)
                .and_then(|slot| slot.as_ref())
                .ok_or_else(|| gridstore_core::Error::MissingId {
                    type_name: schema.type_name.clone(),
                    position: schema.id_position,
                })?;
            schema.uid_for_id(id)
        }
    };

    Ok(Record::new(uid, schema.type_name.clone(), row))
}
