//! In-memory tier doubles for testing
//!
//! This module provides tools for exercising the resolver without a real
//! grid behind it:
//!
//! - **MemoryHotStore**: dashmap-backed cache double
//! - **MemoryColdStore**: dashmap-backed row-store double with scoped
//!   context accounting and per-identity fault injection
//!
//! The cold double counts acquired and live contexts so tests can assert
//! the guaranteed-release contract on every exit path.

use crate::error::ColdError;
use crate::store::{ColdContext, ColdStore, HotStore};
use dashmap::DashMap;
use gridstore_core::{IdentityStrategy, Record, RecordId, TypeSchema, Uid, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Cache-resident tier double.
#[derive(Debug, Default)]
pub struct MemoryHotStore {
    by_uid: DashMap<Uid, Record>,
    id_index: DashMap<(String, RecordId), Uid>,
}

impl MemoryHotStore {
    /// Create an empty hot store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, indexing it per the type's identity strategy.
    pub fn insert(&self, schema: &TypeSchema, record: Record) {
        if schema.identity == IdentityStrategy::CallerSupplied {
            if let Some(id) = record.fixed_value(schema.id_position) {
                self.id_index.insert(
                    (record.type_name.clone(), RecordId::Value(id.clone())),
                    record.uid.clone(),
                );
            }
        }
        self.by_uid.insert(record.uid.clone(), record);
    }

    /// Remove a record by uid
    pub fn remove(&self, uid: &Uid) -> Option<Record> {
        self.by_uid.remove(uid).map(|(_, record)| record)
    }

    /// Number of resident records
    pub fn len(&self) -> usize {
        self.by_uid.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.by_uid.is_empty()
    }
}

impl HotStore for MemoryHotStore {
    fn get_by_uid(&self, uid: &Uid) -> Option<Record> {
        self.by_uid.get(uid).map(|entry| entry.value().clone())
    }

    fn get_by_id(&self, type_name: &str, id: &Value) -> Option<Record> {
        let key = (type_name.to_string(), RecordId::Value(id.clone()));
        let uid = self.id_index.get(&key)?.value().clone();
        self.by_uid.get(&uid).map(|entry| entry.value().clone())
    }
}

#[derive(Debug, Default)]
struct ColdInner {
    by_uid: DashMap<Uid, Record>,
    id_index: DashMap<(String, RecordId), Uid>,
    poisoned: DashMap<(String, RecordId), ()>,
    contexts_acquired: AtomicUsize,
    live_contexts: AtomicUsize,
}

/// Disk-resident tier double with context accounting and fault injection.
#[derive(Debug, Default)]
pub struct MemoryColdStore {
    inner: Arc<ColdInner>,
}

struct MemoryColdContext {
    inner: Arc<ColdInner>,
}

impl ColdContext for MemoryColdContext {}

impl Drop for MemoryColdContext {
    fn drop(&mut self) {
        self.inner.live_contexts.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryColdStore {
    /// Create an empty cold store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, indexing it per the type's identity strategy.
    pub fn insert(&self, schema: &TypeSchema, record: Record) {
        if schema.identity == IdentityStrategy::CallerSupplied {
            if let Some(id) = record.fixed_value(schema.id_position) {
                self.inner.id_index.insert(
                    (record.type_name.clone(), RecordId::Value(id.clone())),
                    record.uid.clone(),
                );
            }
        }
        self.inner.by_uid.insert(record.uid.clone(), record);
    }

    /// Make lookups of this caller-supplied id fail with a backend error.
    pub fn poison_id(&self, type_name: &str, id: &Value) {
        self.inner
            .poisoned
            .insert((type_name.to_string(), RecordId::Value(id.clone())), ());
    }

    /// Make lookups of this uid fail with a backend error.
    pub fn poison_uid(&self, type_name: &str, uid: &Uid) {
        self.inner
            .poisoned
            .insert((type_name.to_string(), RecordId::Uid(uid.clone())), ());
    }

    /// Total contexts handed out so far
    pub fn contexts_acquired(&self) -> usize {
        self.inner.contexts_acquired.load(Ordering::SeqCst)
    }

    /// Contexts acquired and not yet released
    pub fn live_contexts(&self) -> usize {
        self.inner.live_contexts.load(Ordering::SeqCst)
    }

    fn check_poisoned(&self, key: &(String, RecordId)) -> Result<(), ColdError> {
        if self.inner.poisoned.contains_key(key) {
            return Err(ColdError::Backend(format!(
                "injected failure for {}",
                key.1
            )));
        }
        Ok(())
    }
}

impl ColdStore for MemoryColdStore {
    fn acquire_context(&self) -> Result<Box<dyn ColdContext>, ColdError> {
        self.inner.contexts_acquired.fetch_add(1, Ordering::SeqCst);
        self.inner.live_contexts.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryColdContext {
            inner: self.inner.clone(),
        }))
    }

    fn get_by_uid(
        &self,
        _ctx: &mut dyn ColdContext,
        type_name: &str,
        uid: &Uid,
    ) -> Result<Option<Record>, ColdError> {
        let key = (type_name.to_string(), RecordId::Uid(uid.clone()));
        self.check_poisoned(&key)?;
        Ok(self.inner.by_uid.get(uid).map(|entry| entry.value().clone()))
    }

    fn get_by_id(
        &self,
        _ctx: &mut dyn ColdContext,
        type_name: &str,
        id: &Value,
    ) -> Result<Option<Record>, ColdError> {
        let key = (type_name.to_string(), RecordId::Value(id.clone()));
        self.check_poisoned(&key)?;
        let uid = match self.inner.id_index.get(&key) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };
        Ok(self.inner.by_uid.get(&uid).map(|entry| entry.value().clone()))
    }
}
