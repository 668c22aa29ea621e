// In-memory host and record tables shared by the store backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::Error;
use crate::model::{Host, HostCreate, Record, RecordCreate, RecordUpdate};

/// Host and record tables with a hostname index
#[derive(Debug, Clone)]
pub(crate) struct RecordTables {
    hosts: BTreeMap<u64, Host>,
    names: HashMap<String, u64>,
    records: BTreeMap<u64, Record>,
    next_host_id: u64,
    next_record_id: u64,
}

/// Serializable form of [`RecordTables`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TablesSnapshot {
    pub next_host_id: u64,
    pub next_record_id: u64,
    pub hosts: Vec<Host>,
    pub records: Vec<Record>,
}

impl RecordTables {
    pub fn new() -> Self {
        Self {
            hosts: BTreeMap::new(),
            names: HashMap::new(),
            records: BTreeMap::new(),
            next_host_id: 1,
            next_record_id: 1,
        }
    }

    /// Rebuild tables from a snapshot, checking referential integrity
    pub fn from_snapshot(snapshot: TablesSnapshot) -> Result<Self, Error> {
        let mut tables = Self::new();

        for host in snapshot.hosts {
            if tables.names.contains_key(&host.hostname) {
                return Err(Error::record_store(format!(
                    "Duplicate hostname '{}' in snapshot",
                    host.hostname
                )));
            }
            tables.next_host_id = tables.next_host_id.max(host.id + 1);
            tables.names.insert(host.hostname.clone(), host.id);
            tables.hosts.insert(host.id, host);
        }

        for record in snapshot.records {
            if !tables.hosts.contains_key(&record.host_id) {
                return Err(Error::record_store(format!(
                    "Record {} references missing host {}",
                    record.id, record.host_id
                )));
            }
            tables.next_record_id = tables.next_record_id.max(record.id + 1);
            tables.records.insert(record.id, record);
        }

        tables.next_host_id = tables.next_host_id.max(snapshot.next_host_id);
        tables.next_record_id = tables.next_record_id.max(snapshot.next_record_id);

        Ok(tables)
    }

    pub fn snapshot(&self) -> TablesSnapshot {
        TablesSnapshot {
            next_host_id: self.next_host_id,
            next_record_id: self.next_record_id,
            hosts: self.hosts.values().cloned().collect(),
            records: self.records.values().cloned().collect(),
        }
    }

    pub fn host_by_name(&self, hostname: &str) -> Option<&Host> {
        self.names.get(hostname).and_then(|id| self.hosts.get(id))
    }

    pub fn host_by_id(&self, host_id: u64) -> Option<&Host> {
        self.hosts.get(&host_id)
    }

    pub fn records_for_host(&self, host_id: u64) -> Vec<Record> {
        self.records
            .values()
            .filter(|r| r.host_id == host_id)
            .cloned()
            .collect()
    }

    pub fn hosts(&self) -> Vec<Host> {
        self.hosts.values().cloned().collect()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.values().cloned().collect()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn insert_host(&mut self, host: HostCreate, now: DateTime<Utc>) -> Result<Host, Error> {
        if self.names.contains_key(&host.hostname) {
            return Err(Error::DuplicateHostname(host.hostname));
        }

        let id = self.next_host_id;
        self.next_host_id += 1;

        let stored = Host {
            id,
            hostname: host.hostname,
            description: host.description,
            created_at: now,
            updated_at: None,
        };
        self.names.insert(stored.hostname.clone(), id);
        self.hosts.insert(id, stored.clone());
        Ok(stored)
    }

    pub fn insert_record(
        &mut self,
        record: RecordCreate,
        now: DateTime<Utc>,
    ) -> Result<Record, Error> {
        if !self.hosts.contains_key(&record.host_id) {
            return Err(Error::HostIdNotFound(record.host_id));
        }

        let id = self.next_record_id;
        self.next_record_id += 1;

        let stored = Record {
            id,
            host_id: record.host_id,
            record_type: record.record_type,
            value: record.value,
            ttl: record.ttl,
            priority: record.priority,
            created_at: now,
            updated_at: None,
        };
        self.records.insert(id, stored.clone());
        Ok(stored)
    }

    pub fn record_by_id(&self, record_id: u64) -> Option<&Record> {
        self.records.get(&record_id)
    }

    pub fn update_record(
        &mut self,
        record_id: u64,
        update: RecordUpdate,
        now: DateTime<Utc>,
    ) -> Result<Record, Error> {
        let record = self
            .records
            .get_mut(&record_id)
            .ok_or(Error::RecordNotFound(record_id))?;

        if let Some(value) = update.value {
            record.value = value;
        }
        if let Some(ttl) = update.ttl {
            record.ttl = ttl;
        }
        if update.priority.is_some() {
            record.priority = update.priority;
        }
        record.updated_at = Some(now);
        Ok(record.clone())
    }

    pub fn delete_host(&mut self, host_id: u64) -> bool {
        match self.hosts.remove(&host_id) {
            Some(host) => {
                self.names.remove(&host.hostname);
                self.records.retain(|_, r| r.host_id != host_id);
                true
            }
            None => false,
        }
    }

    pub fn delete_record(&mut self, record_id: u64) -> bool {
        self.records.remove(&record_id).is_some()
    }
}

impl Default for RecordTables {
    fn default() -> Self {
        Self::new()
    }
}
