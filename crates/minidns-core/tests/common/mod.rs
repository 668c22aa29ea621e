//! Test doubles and common utilities for record store contract tests
//!
//! The doubles wrap a real `MemoryRecordStore` and add call counting or
//! controlled misbehaviour on top of it.

#![allow(dead_code)]

use async_trait::async_trait;
use minidns_core::error::{Error, Result};
use minidns_core::model::{Host, HostCreate, Record, RecordCreate, RecordUpdate};
use minidns_core::store::MemoryRecordStore;
use minidns_core::traits::RecordStore;
use minidns_core::{RecordService, ServiceConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Store that counts reads and forwards everything to a memory store
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryRecordStore,
    host_lookups: AtomicUsize,
    record_lookups: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_host_by_name` calls so far
    pub fn host_lookups(&self) -> usize {
        self.host_lookups.load(Ordering::SeqCst)
    }

    /// Number of `list_records_for_host` calls so far
    pub fn record_lookups(&self) -> usize {
        self.record_lookups.load(Ordering::SeqCst)
    }

    pub fn reset_counts(&self) {
        self.host_lookups.store(0, Ordering::SeqCst);
        self.record_lookups.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn find_host_by_name(&self, hostname: &str) -> Result<Option<Host>> {
        self.host_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_host_by_name(hostname).await
    }

    async fn find_host_by_id(&self, host_id: u64) -> Result<Option<Host>> {
        self.inner.find_host_by_id(host_id).await
    }

    async fn list_records_for_host(&self, host_id: u64) -> Result<Vec<Record>> {
        self.record_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.list_records_for_host(host_id).await
    }

    async fn insert_host(&self, host: HostCreate) -> Result<Host> {
        self.inner.insert_host(host).await
    }

    async fn insert_record(&self, record: RecordCreate) -> Result<Record> {
        self.inner.insert_record(record).await
    }

    async fn find_record_by_id(&self, record_id: u64) -> Result<Option<Record>> {
        self.inner.find_record_by_id(record_id).await
    }

    async fn update_record(&self, record_id: u64, update: RecordUpdate) -> Result<Record> {
        self.inner.update_record(record_id, update).await
    }

    async fn list_hosts(&self) -> Result<Vec<Host>> {
        self.inner.list_hosts().await
    }

    async fn list_records(&self) -> Result<Vec<Record>> {
        self.inner.list_records().await
    }

    async fn delete_host(&self, host_id: u64) -> Result<bool> {
        self.inner.delete_host(host_id).await
    }

    async fn delete_record(&self, record_id: u64) -> Result<bool> {
        self.inner.delete_record(record_id).await
    }

    async fn flush(&self) -> Result<()> {
        self.inner.flush().await
    }
}

/// Store that deletes `victim` right after `trigger` is looked up
///
/// Simulates a concurrent writer removing a host while a chain walk is in
/// progress.
pub struct VanishingStore {
    inner: MemoryRecordStore,
    trigger: String,
    victim: String,
    armed: AtomicBool,
}

impl VanishingStore {
    pub fn new(trigger: impl Into<String>, victim: impl Into<String>) -> Self {
        Self {
            inner: MemoryRecordStore::new(),
            trigger: trigger.into(),
            victim: victim.into(),
            armed: AtomicBool::new(false),
        }
    }

    /// Start deleting on the next lookup of the trigger host
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for VanishingStore {
    async fn find_host_by_name(&self, hostname: &str) -> Result<Option<Host>> {
        let found = self.inner.find_host_by_name(hostname).await?;

        if hostname == self.trigger && self.armed.swap(false, Ordering::SeqCst) {
            if let Some(victim) = self.inner.find_host_by_name(&self.victim).await? {
                self.inner.delete_host(victim.id).await?;
            }
        }

        Ok(found)
    }

    async fn find_host_by_id(&self, host_id: u64) -> Result<Option<Host>> {
        self.inner.find_host_by_id(host_id).await
    }

    async fn list_records_for_host(&self, host_id: u64) -> Result<Vec<Record>> {
        self.inner.list_records_for_host(host_id).await
    }

    async fn insert_host(&self, host: HostCreate) -> Result<Host> {
        self.inner.insert_host(host).await
    }

    async fn insert_record(&self, record: RecordCreate) -> Result<Record> {
        self.inner.insert_record(record).await
    }

    async fn find_record_by_id(&self, record_id: u64) -> Result<Option<Record>> {
        self.inner.find_record_by_id(record_id).await
    }

    async fn update_record(&self, record_id: u64, update: RecordUpdate) -> Result<Record> {
        self.inner.update_record(record_id, update).await
    }

    async fn list_hosts(&self) -> Result<Vec<Host>> {
        self.inner.list_hosts().await
    }

    async fn list_records(&self) -> Result<Vec<Record>> {
        self.inner.list_records().await
    }

    async fn delete_host(&self, host_id: u64) -> Result<bool> {
        self.inner.delete_host(host_id).await
    }

    async fn delete_record(&self, record_id: u64) -> Result<bool> {
        self.inner.delete_record(record_id).await
    }

    async fn flush(&self) -> Result<()> {
        self.inner.flush().await
    }
}

/// Store whose record reads always fail
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryRecordStore,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn find_host_by_name(&self, hostname: &str) -> Result<Option<Host>> {
        self.inner.find_host_by_name(hostname).await
    }

    async fn find_host_by_id(&self, host_id: u64) -> Result<Option<Host>> {
        self.inner.find_host_by_id(host_id).await
    }

    async fn list_records_for_host(&self, _host_id: u64) -> Result<Vec<Record>> {
        Err(Error::record_store("backend unavailable"))
    }

    async fn insert_host(&self, host: HostCreate) -> Result<Host> {
        self.inner.insert_host(host).await
    }

    async fn insert_record(&self, record: RecordCreate) -> Result<Record> {
        self.inner.insert_record(record).await
    }

    async fn find_record_by_id(&self, record_id: u64) -> Result<Option<Record>> {
        self.inner.find_record_by_id(record_id).await
    }

    async fn update_record(&self, record_id: u64, update: RecordUpdate) -> Result<Record> {
        self.inner.update_record(record_id, update).await
    }

    async fn list_hosts(&self) -> Result<Vec<Host>> {
        self.inner.list_hosts().await
    }

    async fn list_records(&self) -> Result<Vec<Record>> {
        Err(Error::record_store("backend unavailable"))
    }

    async fn delete_host(&self, host_id: u64) -> Result<bool> {
        self.inner.delete_host(host_id).await
    }

    async fn delete_record(&self, record_id: u64) -> Result<bool> {
        self.inner.delete_record(record_id).await
    }

    async fn flush(&self) -> Result<()> {
        self.inner.flush().await
    }
}

/// Hostname of the `index`th link in a chain built by [`build_chain`]
pub fn chain_host(index: usize) -> String {
    format!("h{}.chain.example.com", index)
}

/// Insert `h0 -> h1 -> ... -> h{hops}` as CNAMEs, with an A record on the
/// last host
///
/// Writes go straight to the store, bypassing the service's write-time
/// checks.
pub async fn build_chain(store: &dyn RecordStore, hops: usize) -> Vec<Host> {
    let mut hosts = Vec::with_capacity(hops + 1);
    for i in 0..=hops {
        let host = store
            .insert_host(HostCreate::new(chain_host(i)))
            .await
            .expect("insert host");
        hosts.push(host);
    }

    for i in 0..hops {
        store
            .insert_record(RecordCreate::cname(hosts[i].id, chain_host(i + 1)))
            .await
            .expect("insert cname");
    }
    store
        .insert_record(RecordCreate::a(hosts[hops].id, "10.0.0.1"))
        .await
        .expect("insert a");

    hosts
}

/// Create a host with a single CNAME record, bypassing service checks
pub async fn insert_cname(store: &dyn RecordStore, alias: &str, target: &str) -> Host {
    let host = match store.find_host_by_name(alias).await.expect("lookup") {
        Some(host) => host,
        None => store.insert_host(HostCreate::new(alias)).await.expect("insert host"),
    };
    store
        .insert_record(RecordCreate::cname(host.id, target))
        .await
        .expect("insert cname");
    host
}

/// Record service over a fresh memory store with default settings
pub fn memory_service() -> RecordService {
    RecordService::new(Arc::new(MemoryRecordStore::new()), ServiceConfig::default())
        .expect("default service config is valid")
}
