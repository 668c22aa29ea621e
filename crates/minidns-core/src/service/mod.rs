//! Record service
//!
//! The RecordService is the write path of the record store:
//! - Validating hostnames, values, TTLs and priorities
//! - Enforcing CNAME exclusivity and duplicate suppression
//! - Rejecting CNAMEs that would loop or chain too deep
//! - Persisting accepted writes through the RecordStore
//!
//! Reads go through the same service so that resolution uses the configured
//! depth bound.
//!
//! ## Write Flow
//!
//! ```text
//! RecordCreate ──► host exists? ──► ttl / priority ──► value syntax
//!                                                          │
//!      RecordStore::insert_record ◄── loop check ◄── conflict check
//! ```
//!
//! Updates merge a `RecordUpdate` into the stored record and run the same
//! checks, leaving the record itself out of the conflict comparison.
//!
//! Checks and the final insert are separate store calls. The store rejects
//! duplicate hostnames at commit; record-level rules are only as strong as
//! the absence of concurrent writers for the same host.

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::model::{Host, HostCreate, Record, RecordCreate, RecordType, RecordUpdate};
use crate::resolution::{self, ChainResult, ResolutionResult};
use crate::traits::RecordStore;
use crate::validate::{self, MAX_DESCRIPTION_LENGTH};
use std::sync::Arc;
use tracing::{debug, info};

/// Validating front end over a [`RecordStore`]
///
/// Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct RecordService {
    /// Backing store
    store: Arc<dyn RecordStore>,

    /// Bound for the write-time loop check and for resolution
    max_cname_depth: usize,
}

impl RecordService {
    /// Create a new record service
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `config` fails validation.
    pub fn new(store: Arc<dyn RecordStore>, config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            max_cname_depth: config.max_cname_depth,
        })
    }

    /// The backing store
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Configured CNAME depth bound
    pub fn max_cname_depth(&self) -> usize {
        self.max_cname_depth
    }

    /// Register a new hostname
    ///
    /// # Errors
    ///
    /// - `InvalidHostnameFormat`: hostname fails the label grammar
    /// - `InvalidInput`: description longer than [`MAX_DESCRIPTION_LENGTH`]
    /// - `DuplicateHostname`: hostname already registered
    pub async fn create_host(&self, host: HostCreate) -> Result<Host> {
        if !validate::validate_hostname(&host.hostname) {
            return Err(Error::InvalidHostnameFormat(host.hostname));
        }

        if let Some(description) = &host.description
            && description.chars().count() > MAX_DESCRIPTION_LENGTH
        {
            return Err(Error::invalid_input(format!(
                "Description must be at most {} characters",
                MAX_DESCRIPTION_LENGTH
            )));
        }

        let host = self.store.insert_host(host).await?;
        info!("Created host {} (id {})", host.hostname, host.id);
        Ok(host)
    }

    /// Attach a record to an existing host
    ///
    /// CNAME and MX values are lower-cased before validation and storage.
    ///
    /// # Errors
    ///
    /// - `HostNotFound`: `host_id` is not registered
    /// - `InvalidInput`: TTL out of range, or priority missing/extra/out of range
    /// - `InvalidRecordValue`: value fails the per-type syntax check
    /// - `RecordConflict`: duplicate record or CNAME exclusivity violation
    /// - `LoopDetected`: a CNAME that would loop or exceed the depth bound
    pub async fn add_record(&self, record: RecordCreate) -> Result<Record> {
        let host = self
            .store
            .find_host_by_id(record.host_id)
            .await?
            .ok_or(Error::HostIdNotFound(record.host_id))?;

        let record = self.check_record(&host, record, None).await?;

        let record = self.store.insert_record(record).await?;
        info!(
            "Added {} record {} -> {} (id {})",
            record.record_type, host.hostname, record.value, record.id
        );
        Ok(record)
    }

    /// Change the value, TTL or priority of an existing record
    ///
    /// The merged record goes through the same checks as [`Self::add_record`],
    /// with the record itself left out of the conflict comparison.
    ///
    /// # Errors
    ///
    /// - `RecordNotFound`: `record_id` is not registered
    /// - any error [`Self::add_record`] can return
    pub async fn update_record(&self, record_id: u64, update: RecordUpdate) -> Result<Record> {
        let existing = self
            .store
            .find_record_by_id(record_id)
            .await?
            .ok_or(Error::RecordNotFound(record_id))?;
        let host = self
            .store
            .find_host_by_id(existing.host_id)
            .await?
            .ok_or(Error::HostIdNotFound(existing.host_id))?;

        let merged = update.merged_with(&existing);
        let merged = self.check_record(&host, merged, Some(existing.id)).await?;

        let update = RecordUpdate {
            value: Some(merged.value),
            ttl: Some(merged.ttl),
            priority: merged.priority,
        };
        let record = self.store.update_record(record_id, update).await?;
        info!(
            "Updated {} record {} -> {} (id {})",
            record.record_type, host.hostname, record.value, record.id
        );
        Ok(record)
    }

    /// Run the write-time checks for `record` on `host`
    ///
    /// Returns the normalized record.
    async fn check_record(
        &self,
        host: &Host,
        record: RecordCreate,
        excluding_record_id: Option<u64>,
    ) -> Result<RecordCreate> {
        validate::validate_ttl(record.ttl)?;
        validate::validate_priority(record.record_type, record.priority)?;

        let record = record.normalized();
        if !validate::validate_record_value(record.record_type, &record.value) {
            return Err(Error::InvalidRecordValue {
                record_type: record.record_type,
                value: record.value,
            });
        }

        if let Some(conflict) = validate::find_record_conflict(
            self.store.as_ref(),
            host.id,
            record.record_type,
            &record.value,
            excluding_record_id,
        )
        .await?
        {
            debug!("Rejected {} record for {}: {}", record.record_type, host.hostname, conflict);
            return Err(Error::conflict(format!("{} on {}", conflict, host.hostname)));
        }

        if record.record_type == RecordType::Cname
            && validate::would_create_cname_loop(
                self.store.as_ref(),
                &host.hostname,
                &record.value,
                self.max_cname_depth,
            )
            .await?
        {
            return Err(Error::LoopDetected(host.hostname.clone()));
        }

        Ok(record)
    }

    /// Resolve a hostname through its CNAME chain
    pub async fn resolve(
        &self,
        hostname: &str,
        type_filter: Option<RecordType>,
    ) -> Result<ResolutionResult> {
        resolution::resolve_with_depth(
            self.store.as_ref(),
            hostname,
            type_filter,
            self.max_cname_depth,
        )
        .await
    }

    /// List the CNAME hops for a hostname
    ///
    /// `max_depth` overrides the configured bound for this call.
    pub async fn cname_chain(
        &self,
        hostname: &str,
        max_depth: Option<usize>,
    ) -> Result<ChainResult> {
        let max_depth = max_depth.unwrap_or(self.max_cname_depth);
        resolution::resolve_cname_chain(self.store.as_ref(), hostname, max_depth).await
    }

    /// Look up a host by name
    pub async fn get_host(&self, hostname: &str) -> Result<Host> {
        self.store
            .find_host_by_name(hostname)
            .await?
            .ok_or_else(|| Error::HostNotFound(hostname.to_string()))
    }

    /// All registered hosts
    pub async fn list_hosts(&self) -> Result<Vec<Host>> {
        self.store.list_hosts().await
    }

    /// All records, optionally only those of one host
    pub async fn list_records(&self, host_id: Option<u64>) -> Result<Vec<Record>> {
        match host_id {
            Some(id) => self.store.list_records_for_host(id).await,
            None => self.store.list_records().await,
        }
    }
}
