// # Memory Record Store
//
// In-memory implementation of RecordStore.
//
// ## Purpose
//
// Provides a fast store that doesn't persist across restarts.
// Useful for testing, ephemeral deployments, or embedding the resolver
// in another process that owns persistence.
//
// ## Crash Behavior
//
// - All hosts and records are lost on restart/crash
// - No recovery possible (state is in-memory only)

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::model::{Host, HostCreate, Record, RecordCreate, RecordUpdate};
use crate::store::tables::RecordTables;
use crate::traits::record_store::{RecordStore, RecordStoreFactory};

/// In-memory record store implementation
///
/// Hosts and records live in tables protected by a RwLock. Clones share
/// the same tables.
///
/// # Example
///
/// ```rust,no_run
/// use minidns_core::model::{HostCreate, RecordCreate};
/// use minidns_core::store::MemoryRecordStore;
/// use minidns_core::traits::RecordStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new();
///
///     let host = store.insert_host(HostCreate::new("example.com")).await?;
///     store.insert_record(RecordCreate::a(host.id, "10.0.0.1")).await?;
///
///     let found = store.find_host_by_name("example.com").await?;
///     assert_eq!(found.map(|h| h.id), Some(host.id));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<RecordTables>>,
}

impl MemoryRecordStore {
    /// Create a new empty memory record store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RecordTables::new())),
        }
    }

    /// Get the number of hosts in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.host_count()
    }

    /// Check if the store has no hosts
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove all hosts and records
    pub async fn clear(&self) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        *guard = RecordTables::new();
        Ok(())
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_host_by_name(&self, hostname: &str) -> Result<Option<Host>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.host_by_name(hostname).cloned())
    }

    async fn find_host_by_id(&self, host_id: u64) -> Result<Option<Host>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.host_by_id(host_id).cloned())
    }

    async fn list_records_for_host(&self, host_id: u64) -> Result<Vec<Record>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.records_for_host(host_id))
    }

    async fn insert_host(&self, host: HostCreate) -> Result<Host, Error> {
        let mut guard = self.inner.write().await;
        guard.insert_host(host, chrono::Utc::now())
    }

    async fn insert_record(&self, record: RecordCreate) -> Result<Record, Error> {
        let mut guard = self.inner.write().await;
        guard.insert_record(record, chrono::Utc::now())
    }

    async fn find_record_by_id(&self, record_id: u64) -> Result<Option<Record>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.record_by_id(record_id).cloned())
    }

    async fn update_record(&self, record_id: u64, update: RecordUpdate) -> Result<Record, Error> {
        let mut guard = self.inner.write().await;
        guard.update_record(record_id, update, chrono::Utc::now())
    }

    async fn list_hosts(&self) -> Result<Vec<Host>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.hosts())
    }

    async fn list_records(&self) -> Result<Vec<Record>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.records())
    }

    async fn delete_host(&self, host_id: u64) -> Result<bool, Error> {
        let mut guard = self.inner.write().await;
        Ok(guard.delete_host(host_id))
    }

    async fn delete_record(&self, record_id: u64) -> Result<bool, Error> {
        let mut guard = self.inner.write().await;
        Ok(guard.delete_record(record_id))
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing buffered
        Ok(())
    }
}

/// Factory registered under the name "memory"
#[derive(Debug, Default)]
pub struct MemoryRecordStoreFactory;

#[async_trait]
impl RecordStoreFactory for MemoryRecordStoreFactory {
    async fn create(&self, _config: &serde_json::Value) -> Result<Box<dyn RecordStore>, Error> {
        Ok(Box::new(MemoryRecordStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryRecordStore::new();

        // Initially empty
        assert!(store.is_empty().await);

        let host = store.insert_host(HostCreate::new("example.com")).await.unwrap();
        assert_eq!(store.len().await, 1);

        let found = store.find_host_by_name("example.com").await.unwrap();
        assert_eq!(found, Some(host.clone()));
        let by_id = store.find_host_by_id(host.id).await.unwrap();
        assert_eq!(by_id, Some(host));

        // Exact, case-sensitive lookup
        assert!(store.find_host_by_name("EXAMPLE.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_duplicate_hostname() {
        let store = MemoryRecordStore::new();
        store.insert_host(HostCreate::new("example.com")).await.unwrap();

        let err = store
            .insert_host(HostCreate::new("example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateHostname(name) if name == "example.com"));
    }

    #[tokio::test]
    async fn test_memory_store_records() {
        let store = MemoryRecordStore::new();
        let host = store.insert_host(HostCreate::new("example.com")).await.unwrap();

        let a = store.insert_record(RecordCreate::a(host.id, "10.0.0.1")).await.unwrap();
        store
            .insert_record(RecordCreate::mx(host.id, "mail.example.com", 10))
            .await
            .unwrap();

        assert_eq!(store.list_records_for_host(host.id).await.unwrap().len(), 2);
        assert_eq!(store.list_records().await.unwrap().len(), 2);

        assert!(store.delete_record(a.id).await.unwrap());
        assert!(!store.delete_record(a.id).await.unwrap());
        assert_eq!(store.list_records_for_host(host.id).await.unwrap().len(), 1);

        let err = store.insert_record(RecordCreate::a(99, "10.0.0.2")).await.unwrap_err();
        assert!(matches!(err, Error::HostIdNotFound(99)));
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_tables() {
        let store = MemoryRecordStore::new();
        let clone = store.clone();

        store.insert_host(HostCreate::new("example.com")).await.unwrap();
        assert_eq!(clone.len().await, 1);

        clone.clear().await.unwrap();
        assert!(store.is_empty().await);
    }
}
