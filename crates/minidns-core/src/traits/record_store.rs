// # Record Store Trait
//
// Defines the interface for durable host and record storage.
//
// ## Purpose
//
// The record store is the only source of truth the resolver and validators
// read from. It keeps:
// - Hosts, keyed by id and unique by hostname
// - Records, each owned by exactly one host
//
// ## Implementations
//
// - In-memory: `MemoryRecordStore`
// - File-based: `FileRecordStore` (JSON with atomic writes)
//
// ## Usage
//
// ```rust,ignore
// use minidns_core::{HostCreate, RecordCreate, RecordStore};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* RecordStore implementation */;
//
//     let host = store.insert_host(HostCreate::new("example.com")).await?;
//     store.insert_record(RecordCreate::a(host.id, "10.0.0.1")).await?;
//
//     let records = store.list_records_for_host(host.id).await?;
//     assert_eq!(records.len(), 1);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::{Host, HostCreate, Record, RecordCreate, RecordUpdate};

/// Trait for record store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Consistency
///
/// Every call is an independent read or write. Callers must not assume
/// that two successive reads observe the same snapshot: a host returned
/// by one call may be gone by the next.
///
/// # Responsibilities
///
/// - ✅ Enforce hostname uniqueness at insert time (`DuplicateHostname`)
/// - ✅ Reject records for unknown hosts
/// - ✅ Assign ids and timestamps
/// - ❌ Validate record values or conflict rules (owned by `validate`)
/// - ❌ Follow CNAME chains (owned by `resolver`)
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up a host by exact hostname
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Host))`: The host
    /// - `Ok(None)`: No host with that name
    /// - `Err(Error)`: Storage error
    async fn find_host_by_name(&self, hostname: &str) -> Result<Option<Host>, crate::Error>;

    /// Look up a host by id
    async fn find_host_by_id(&self, host_id: u64) -> Result<Option<Host>, crate::Error>;

    /// All records currently attached to a host
    ///
    /// No ordering is guaranteed. An unknown host yields an empty list.
    async fn list_records_for_host(&self, host_id: u64) -> Result<Vec<Record>, crate::Error>;

    /// Register a new host
    ///
    /// # Returns
    ///
    /// - `Ok(Host)`: The stored host with its assigned id
    /// - `Err(Error::DuplicateHostname)`: The hostname is already registered
    /// - `Err(Error)`: Storage error
    async fn insert_host(&self, host: HostCreate) -> Result<Host, crate::Error>;

    /// Attach a record to a host
    ///
    /// The caller is expected to have run the validators already; the store
    /// only checks that the owning host exists.
    ///
    /// # Returns
    ///
    /// - `Ok(Record)`: The stored record with its assigned id
    /// - `Err(Error::HostIdNotFound)`: The owning host does not exist
    /// - `Err(Error)`: Storage error
    async fn insert_record(&self, record: RecordCreate) -> Result<Record, crate::Error>;

    /// Look up a record by id
    async fn find_record_by_id(&self, record_id: u64) -> Result<Option<Record>, crate::Error>;

    /// Apply `update` to a stored record and stamp `updated_at`
    ///
    /// Like [`RecordStore::insert_record`], no validation happens here.
    ///
    /// # Returns
    ///
    /// - `Ok(Record)`: The record after the update
    /// - `Err(Error::RecordNotFound)`: No such record
    /// - `Err(Error)`: Storage error
    async fn update_record(
        &self,
        record_id: u64,
        update: RecordUpdate,
    ) -> Result<Record, crate::Error>;

    /// List all hosts
    async fn list_hosts(&self) -> Result<Vec<Host>, crate::Error>;

    /// List all records across all hosts
    async fn list_records(&self) -> Result<Vec<Record>, crate::Error>;

    /// Delete a host together with its records
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: The host existed and was removed
    /// - `Ok(false)`: No such host
    async fn delete_host(&self, host_id: u64) -> Result<bool, crate::Error>;

    /// Delete a single record
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: The record existed and was removed
    /// - `Ok(false)`: No such record
    async fn delete_record(&self, record_id: u64) -> Result<bool, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

/// Helper trait for constructing record stores from configuration
#[async_trait]
pub trait RecordStoreFactory: Send + Sync {
    /// Create a RecordStore instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: The serialized [`crate::config::StoreConfig`]
    async fn create(
        &self,
        config: &serde_json::Value,
    ) -> Result<Box<dyn RecordStore>, crate::Error>;
}
