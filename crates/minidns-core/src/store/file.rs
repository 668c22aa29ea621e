// # File Record Store
//
// File-based implementation of RecordStore with crash recovery.
//
// ## Purpose
//
// Keeps hosts and records across daemon restarts and crashes.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity (`<path>.tmp`)
// - Staged mutations: Changes become visible only after they reach disk
// - Corruption detection: Validates JSON and referential integrity on load
// - Automatic backup: Keeps `<path>.backup` of last known good state
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "next_host_id": 3,
//   "next_record_id": 2,
//   "hosts": [
//     { "id": 1, "hostname": "example.com", "description": null,
//       "created_at": "2025-01-09T12:00:00Z", "updated_at": null }
//   ],
//   "records": [
//     { "id": 1, "host_id": 1, "type": "A", "value": "10.0.0.1", "ttl": 3600,
//       "priority": null, "created_at": "2025-01-09T12:00:00Z", "updated_at": null }
//   ]
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::model::{Host, HostCreate, Record, RecordCreate, RecordUpdate};
use crate::store::tables::{RecordTables, TablesSnapshot};
use crate::traits::record_store::{RecordStore, RecordStoreFactory};

/// Store file format version
const STORE_FILE_VERSION: &str = "1.0";

/// File-based record store with crash recovery
///
/// Every mutation rewrites the whole file atomically, so a crash leaves
/// either the previous or the new contents on disk, never a mix.
///
/// # Example
///
/// ```rust,no_run
/// use minidns_core::model::HostCreate;
/// use minidns_core::store::FileRecordStore;
/// use minidns_core::traits::RecordStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileRecordStore::new("/var/lib/minidns/records.json").await?;
///
///     // Atomically written to disk
///     store.insert_host(HostCreate::new("example.com")).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

#[derive(Debug)]
struct FileState {
    tables: RecordTables,
}

/// Serializable store file format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFileFormat {
    version: String,
    #[serde(flatten)]
    snapshot: TablesSnapshot,
}

/// Why a store file could not be loaded
enum LoadFailure {
    /// The file exists but its contents are unusable; recover from backup
    Corrupt(Error),
    /// The file could not be read at all
    Unreadable(Error),
}

impl FileRecordStore {
    /// Create or load a file record store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing store file
    /// 3. If corruption detected, try to load from backup
    /// 4. If both fail, start with an empty store
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let tables = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState { tables })),
        })
    }

    /// Path of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load tables from file with automatic recovery
    async fn load_with_recovery(path: &Path) -> Result<RecordTables, Error> {
        let err = match Self::load(path).await {
            Ok(tables) => {
                tracing::debug!(
                    "Loaded record store from {}: {} hosts",
                    path.display(),
                    tables.host_count()
                );
                return Ok(tables);
            }
            Err(LoadFailure::Unreadable(e)) => return Err(e),
            Err(LoadFailure::Corrupt(e)) => e,
        };

        tracing::warn!(
            "Store file appears corrupted: {}. Attempting recovery from backup.",
            err
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with empty store.");
            return Ok(RecordTables::new());
        }

        match Self::load(&backup_path).await {
            Ok(tables) => {
                tracing::info!(
                    "Recovered record store from backup: {} hosts",
                    tables.host_count()
                );

                if let Err(restore_err) = Self::restore_from_backup(path, &backup_path).await {
                    tracing::error!(
                        "Failed to restore store file from backup: {}",
                        restore_err
                    );
                }

                Ok(tables)
            }
            Err(LoadFailure::Corrupt(backup_err)) | Err(LoadFailure::Unreadable(backup_err)) => {
                tracing::error!(
                    "Backup also unusable: {}. Starting with empty store.",
                    backup_err
                );
                Ok(RecordTables::new())
            }
        }
    }

    /// Load tables from a single file
    async fn load(path: &Path) -> Result<RecordTables, LoadFailure> {
        if !path.exists() {
            tracing::debug!("Store file does not exist: {}", path.display());
            return Ok(RecordTables::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            LoadFailure::Unreadable(Error::record_store(format!(
                "Failed to read store file {}: {}",
                path.display(),
                e
            )))
        })?;

        let file: StoreFileFormat = serde_json::from_str(&content).map_err(|e| {
            LoadFailure::Corrupt(Error::record_store(format!(
                "Failed to parse store file {}: {}",
                path.display(),
                e
            )))
        })?;

        if file.version != STORE_FILE_VERSION {
            tracing::warn!(
                "Store file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                STORE_FILE_VERSION,
                file.version
            );
        }

        RecordTables::from_snapshot(file.snapshot).map_err(LoadFailure::Corrupt)
    }

    /// Write the current tables to file atomically
    async fn write_state(&self) -> Result<(), Error> {
        // Hold the write lock for the whole write so concurrent mutations
        // cannot interleave their renames.
        let guard = self.state.write().await;
        self.persist(&guard.tables).await
    }

    /// Write `tables` to file atomically
    ///
    /// Callers must hold the state write lock.
    async fn persist(&self, tables: &RecordTables) -> Result<(), Error> {
        let file = StoreFileFormat {
            version: STORE_FILE_VERSION.to_string(),
            snapshot: tables.snapshot(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::record_store(format!("Failed to serialize store: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut out = fs::File::create(&temp_path).await.map_err(|e| {
                Error::record_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            out.write_all(json.as_bytes()).await.map_err(|e| {
                Error::record_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            out.flush().await.map_err(|e| {
                Error::record_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::record_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Record store written to file: {}", self.path.display());
        Ok(())
    }

    /// Restore store file from backup
    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::record_store(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored store file from backup");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        Self::sibling_path(&self.path, ".tmp")
    }

    fn backup_path(path: &Path) -> PathBuf {
        Self::sibling_path(path, ".backup")
    }

    /// `path` with `suffix` appended to the full file name
    fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Force immediate write to disk
    pub async fn sync(&self) -> Result<(), Error> {
        self.write_state().await
    }

    /// Apply a mutation and persist it immediately
    ///
    /// The mutation runs on a copy of the tables. The copy replaces the live
    /// tables only once it is on disk, so a failed write leaves readers
    /// seeing the previous state.
    async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut RecordTables) -> Result<T, Error> + Send,
    ) -> Result<T, Error> {
        let mut guard = self.state.write().await;

        let mut staged = guard.tables.clone();
        let result = op(&mut staged)?;

        self.persist(&staged).await?;
        guard.tables = staged;
        Ok(result)
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn find_host_by_name(&self, hostname: &str) -> Result<Option<Host>, Error> {
        let guard = self.state.read().await;
        Ok(guard.tables.host_by_name(hostname).cloned())
    }

    async fn find_host_by_id(&self, host_id: u64) -> Result<Option<Host>, Error> {
        let guard = self.state.read().await;
        Ok(guard.tables.host_by_id(host_id).cloned())
    }

    async fn list_records_for_host(&self, host_id: u64) -> Result<Vec<Record>, Error> {
        let guard = self.state.read().await;
        Ok(guard.tables.records_for_host(host_id))
    }

    async fn insert_host(&self, host: HostCreate) -> Result<Host, Error> {
        let now = chrono::Utc::now();
        self.mutate(move |tables| tables.insert_host(host, now)).await
    }

    async fn insert_record(&self, record: RecordCreate) -> Result<Record, Error> {
        let now = chrono::Utc::now();
        self.mutate(move |tables| tables.insert_record(record, now)).await
    }

    async fn find_record_by_id(&self, record_id: u64) -> Result<Option<Record>, Error> {
        let guard = self.state.read().await;
        Ok(guard.tables.record_by_id(record_id).cloned())
    }

    async fn update_record(&self, record_id: u64, update: RecordUpdate) -> Result<Record, Error> {
        let now = chrono::Utc::now();
        self.mutate(move |tables| tables.update_record(record_id, update, now))
            .await
    }

    async fn list_hosts(&self) -> Result<Vec<Host>, Error> {
        let guard = self.state.read().await;
        Ok(guard.tables.hosts())
    }

    async fn list_records(&self) -> Result<Vec<Record>, Error> {
        let guard = self.state.read().await;
        Ok(guard.tables.records())
    }

    async fn delete_host(&self, host_id: u64) -> Result<bool, Error> {
        self.mutate(move |tables| Ok(tables.delete_host(host_id))).await
    }

    async fn delete_record(&self, record_id: u64) -> Result<bool, Error> {
        self.mutate(move |tables| Ok(tables.delete_record(record_id))).await
    }

    async fn flush(&self) -> Result<(), Error> {
        // Mutations are persisted before they become visible
        Ok(())
    }
}

/// Factory registered under the name "file"
///
/// Expects the serialized `StoreConfig::File { path }`.
#[derive(Debug, Default)]
pub struct FileRecordStoreFactory;

#[async_trait]
impl RecordStoreFactory for FileRecordStoreFactory {
    async fn create(&self, config: &serde_json::Value) -> Result<Box<dyn RecordStore>, Error> {
        let path = config
            .get("path")
            .and_then(|p| p.as_str())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::config("File record store requires a non-empty 'path'"))?;

        Ok(Box::new(FileRecordStore::new(path).await?))
    }
}
