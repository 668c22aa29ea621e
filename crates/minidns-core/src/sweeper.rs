//! Background record sweeper
//!
//! Periodically scans the store for records whose TTL has elapsed and logs a
//! statistics snapshot. The sweeper is owned by whoever spawns it; stop it
//! through the shutdown channel passed to [`RecordSweeper::run_with_shutdown`].

use crate::config::SweeperConfig;
use crate::error::Result;
use crate::model::{Record, RecordType};
use crate::traits::RecordStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{MissedTickBehavior, interval};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info};

/// Snapshot of store contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStats {
    /// Number of records per type; every type is present, zero or not
    pub record_counts: BTreeMap<RecordType, usize>,
    pub host_count: usize,
    pub record_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Periodic expiry scan and statistics job
pub struct RecordSweeper {
    store: Arc<dyn RecordStore>,
    config: SweeperConfig,
}

impl RecordSweeper {
    /// Create a new sweeper
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `config` fails validation.
    pub fn new(store: Arc<dyn RecordStore>, config: SweeperConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Find records whose TTL has elapsed at `now`
    ///
    /// The records are deleted when `delete_expired` is set; otherwise they
    /// are only reported. Returns the expired records either way.
    pub async fn expire_records(&self, now: DateTime<Utc>) -> Result<Vec<Record>> {
        let expired: Vec<Record> = self
            .store
            .list_records()
            .await?
            .into_iter()
            .filter(|r| r.is_expired(now))
            .collect();

        if expired.is_empty() {
            debug!("No expired records");
            return Ok(expired);
        }

        if self.config.delete_expired {
            let mut deleted = 0usize;
            for record in &expired {
                if self.store.delete_record(record.id).await? {
                    deleted += 1;
                }
            }
            self.store.flush().await?;
            info!("Deleted {} expired records", deleted);
        } else {
            info!("Found {} expired records", expired.len());
        }

        Ok(expired)
    }

    /// Count hosts and records, per record type
    pub async fn collect_stats(&self, now: DateTime<Utc>) -> Result<RecordStats> {
        let host_count = self.store.list_hosts().await?.len();
        let records = self.store.list_records().await?;

        let mut record_counts: BTreeMap<RecordType, usize> =
            RecordType::ALL.iter().map(|t| (*t, 0)).collect();
        for record in &records {
            *record_counts.entry(record.record_type).or_insert(0) += 1;
        }

        Ok(RecordStats {
            record_counts,
            host_count,
            record_count: records.len(),
            timestamp: now,
        })
    }

    /// Run both jobs on their intervals until `shutdown_rx` fires
    ///
    /// Job failures are logged and do not stop the loop. Both jobs run once
    /// immediately on start.
    pub async fn run_with_shutdown(&self, mut shutdown_rx: oneshot::Receiver<()>) {
        let mut expire_ticks = ticks(self.config.expire_interval_secs);
        let mut stats_ticks = ticks(self.config.stats_interval_secs);

        info!(
            "Sweeper started (expiry every {}s, stats every {}s, delete_expired={})",
            self.config.expire_interval_secs,
            self.config.stats_interval_secs,
            self.config.delete_expired
        );

        loop {
            tokio::select! {
                Some(_) = expire_ticks.next() => {
                    if let Err(e) = self.expire_records(Utc::now()).await {
                        error!("Record expiry failed: {}", e);
                    }
                }
                Some(_) = stats_ticks.next() => {
                    match self.collect_stats(Utc::now()).await {
                        Ok(stats) => info!(
                            hosts = stats.host_count,
                            records = stats.record_count,
                            "Record stats: {:?}",
                            stats.record_counts
                        ),
                        Err(e) => error!("Stats collection failed: {}", e),
                    }
                }
                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received, sweeper stopping");
                    break;
                }
            }
        }
    }
}

fn ticks(secs: u64) -> IntervalStream {
    let mut interval = interval(Duration::from_secs(secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    IntervalStream::new(interval)
}
