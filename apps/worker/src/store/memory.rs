use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{RecordStore, StoreError};

/// In-memory store for tests. Individual operations can be made to fail.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<(String, String), Value>>,
    failing_reads: Mutex<HashSet<String>>,
    failing_updates: Mutex<HashSet<String>>,
    fail_list: Mutex<bool>,
}

impl MemoryStore {
    pub fn insert(&self, kind: &str, id: &str, record: Value) {
        self.records.lock().unwrap().insert((kind.to_string(), id.to_string()), record);
    }

    pub fn get(&self, kind: &str, id: &str) -> Option<Value> {
        self.records.lock().unwrap().get(&(kind.to_string(), id.to_string())).cloned()
    }

    /// List the id but fail any read of it, as if deleted after listing.
    pub fn list_but_fail_read(&self, id: &str) {
        self.failing_reads.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_updates_for(&self, id: &str) {
        self.failing_updates.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_list(&self) {
        *self.fail_list.lock().unwrap() = true;
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, kind: &str) -> Result<Vec<String>, StoreError> {
        if *self.fail_list.lock().unwrap() {
            return Err(std::io::Error::other("listing unavailable").into());
        }
        let mut ids: Vec<String> = self
            .records
            .lock()
            .unwrap()
            .keys()
            .filter(|(k, _)| k == kind)
            .map(|(_, id)| id.clone())
            .collect();
        ids.extend(self.failing_reads.lock().unwrap().iter().cloned());
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn read(&self, kind: &str, id: &str) -> Result<Value, StoreError> {
        if self.failing_reads.lock().unwrap().contains(id) {
            return Err(StoreError::NotFound { kind: kind.to_string(), id: id.to_string() });
        }
        self.get(kind, id)
            .ok_or_else(|| StoreError::NotFound { kind: kind.to_string(), id: id.to_string() })
    }

    async fn update(&self, kind: &str, id: &str, record: &Value) -> Result<(), StoreError> {
        if self.failing_updates.lock().unwrap().contains(id) {
            return Err(std::io::Error::other("disk full").into());
        }
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&(kind.to_string(), id.to_string())) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound { kind: kind.to_string(), id: id.to_string() }),
        }
    }
}
