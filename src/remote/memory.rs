//! In-memory remote collection for exercising the pipelines.
//!
//! Records every call, and can be told to reject a batch, refuse reads, or
//! lose documents between the insert and the count.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::RemoteCollection;
use crate::record::LevelRecord;
use crate::sync::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchAll(String),
    DeleteAll(String),
    InsertAll(String, Vec<String>),
    Count(String),
}

#[derive(Debug, Default)]
struct State {
    /// collection -> documents in insertion order
    collections: BTreeMap<String, Vec<LevelRecord>>,
    calls: Vec<Call>,
    unavailable: bool,
    reject_delete: bool,
    reject_insert: bool,
    /// Documents silently dropped right after a successful insert.
    drop_after_insert: usize,
}

#[derive(Debug, Default)]
pub struct MemoryCollection {
    state: Mutex<State>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `collection` with `records`, in fetch order.
    pub fn with_records(collection: &str, records: Vec<LevelRecord>) -> Self {
        let store = Self::new();
        store
            .state
            .lock()
            .unwrap()
            .collections
            .insert(collection.to_string(), records);
        store
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    pub fn reject_delete(&self) {
        self.state.lock().unwrap().reject_delete = true;
    }

    pub fn reject_insert(&self) {
        self.state.lock().unwrap().reject_insert = true;
    }

    /// Simulates an external deletion racing the post-insert count.
    pub fn drop_after_insert(&self, n: usize) {
        self.state.lock().unwrap().drop_after_insert = n;
    }

    pub fn records(&self, collection: &str) -> Vec<LevelRecord> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn ids(&self, collection: &str) -> Vec<String> {
        self.records(collection)
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl RemoteCollection for MemoryCollection {
    async fn fetch_all(&self, collection: &str) -> Result<Vec<LevelRecord>, SyncError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::FetchAll(collection.to_string()));
        if state.unavailable {
            return Err(SyncError::RemoteUnavailable("store offline".to_string()));
        }
        Ok(state.collections.get(collection).cloned().unwrap_or_default())
    }

    async fn delete_all(&self, collection: &str) -> Result<usize, SyncError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteAll(collection.to_string()));
        if state.unavailable {
            return Err(SyncError::RemoteUnavailable("store offline".to_string()));
        }
        if state.reject_delete {
            return Err(SyncError::RemoteWriteFailed("delete batch rejected".to_string()));
        }
        let removed = state
            .collections
            .remove(collection)
            .map(|docs| docs.len())
            .unwrap_or(0);
        Ok(removed)
    }

    async fn insert_all(
        &self,
        collection: &str,
        records: &[LevelRecord],
    ) -> Result<(), SyncError> {
        let mut state = self.state.lock().unwrap();
        let ids = records.iter().map(|r| r.id().to_string()).collect();
        state.calls.push(Call::InsertAll(collection.to_string(), ids));
        if state.reject_insert {
            return Err(SyncError::RemoteWriteFailed("insert batch rejected".to_string()));
        }

        let lost = state.drop_after_insert;
        let docs = state.collections.entry(collection.to_string()).or_default();
        for record in records {
            // Same key overwrites, like a document set.
            match docs.iter_mut().find(|d| d.id() == record.id()) {
                Some(existing) => *existing = record.clone(),
                None => docs.push(record.clone()),
            }
        }
        let keep = docs.len().saturating_sub(lost);
        docs.truncate(keep);
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize, SyncError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Count(collection.to_string()));
        if state.unavailable {
            return Err(SyncError::RemoteUnavailable("store offline".to_string()));
        }
        Ok(state.collections.get(collection).map_or(0, Vec::len))
    }
}
