//! In-memory key-value store

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};

use super::KeyValueStore;

/// Process-local store, shared between clones.
///
/// Used for tests and sessions that should not touch disk. Reads and writes
/// can be switched to fail for fault-injection.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent reads fail until switched back
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail until switched back
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw access for seeding fixtures, bypassing failure injection
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.entries()?.insert(key.into(), value.into());
        Ok(())
    }

    /// Raw access for assertions, bypassing failure injection
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    /// Keys currently stored, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = self.entries()?.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        Ok(keys)
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("injected read failure for {key}")));
        }
        self.get_raw(key)
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("injected write failure for {key}")));
        }
        self.insert_raw(key, value)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("injected write failure for {key}")));
        }
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_missing_key() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.read("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryKeyValueStore::new();
        let other = store.clone();

        store.write("queue", "[]").await.unwrap();
        assert_eq!(other.read("queue").await.unwrap().as_deref(), Some("[]"));

        other.remove("queue").await.unwrap();
        assert_eq!(store.read("queue").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_injected_write_failure_keeps_previous_value() {
        let store = MemoryKeyValueStore::new();
        store.write("queue", "old").await.unwrap();

        store.set_fail_writes(true);
        assert!(store.write("queue", "new").await.is_err());
        assert_eq!(store.get_raw("queue").unwrap().as_deref(), Some("old"));

        store.set_fail_writes(false);
        store.write("queue", "new").await.unwrap();
        assert_eq!(store.read("queue").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_injected_read_failure() {
        let store = MemoryKeyValueStore::new();
        store.set_fail_reads(true);
        assert!(matches!(
            store.read("queue").await,
            Err(Error::Storage(_))
        ));
    }
}
