//! CNAME chain resolver
//!
//! Follows CNAME edges from a starting hostname to the host holding the
//! terminal record set.
//!
//! ## Walk
//!
//! ```text
//! START ──► WALKING(depth, visited) ──► TERMINAL_ANSWER
//!                 │    ▲                HOST_NOT_FOUND
//!                 └────┘ CNAME hop      LOOP_DETECTED
//!                                       CHAIN_TOO_LONG
//!                                       MULTIPLE_CNAMES
//! ```
//!
//! The walk is an explicit loop. Each hop does its own store reads, so the
//! store may change between hops; a host that vanishes mid-walk ends the
//! walk with `HostNotFound`. Nothing is cached between calls.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Record, RecordType};
use crate::traits::RecordStore;
use crate::validate::MAX_CNAME_CHAIN_LENGTH;

/// Default bound on CNAME hops per resolution
pub const DEFAULT_MAX_DEPTH: usize = MAX_CNAME_CHAIN_LENGTH;

/// One CNAME indirection taken during a walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHop {
    /// Hostname owning the CNAME record
    pub hostname: String,
    /// CNAME target
    pub cname: String,
    /// TTL of the CNAME record
    pub ttl: u32,
}

/// Outcome of a successful walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    /// Hostname where the walk stopped
    pub canonical_name: String,
    /// Every record attached to the canonical host
    pub records: Vec<Record>,
    /// Hops taken, in order from the starting hostname
    pub hops: Vec<ChainHop>,
}

/// Resolve `hostname` to its canonical host and record set
///
/// With `follow_cname` unset the starting host's records are returned as-is,
/// CNAME records included.
///
/// # Errors
///
/// - `HostNotFound`: the start or a CNAME target is not registered
/// - `LoopDetected`: a hostname is reached twice
/// - `ChainTooLong`: more than `max_depth` hops
/// - `MultipleCnames`: a host on the chain has more than one CNAME
///
/// Failures after at least one hop are wrapped in [`Error::CnameHop`] for
/// each hop taken, innermost hop closest to the failure; [`Error::kind`]
/// still reports the original failure. Store errors are returned unwrapped.
pub async fn resolve_chain(
    store: &dyn RecordStore,
    hostname: &str,
    follow_cname: bool,
    max_depth: usize,
) -> Result<Chain> {
    let mut hops = Vec::new();

    match walk(store, hostname, follow_cname, max_depth, &mut hops).await {
        Ok((canonical_name, records)) => Ok(Chain {
            canonical_name,
            records,
            hops,
        }),
        Err(err) if err.is_resolution_failure() => Err(hops
            .iter()
            .rev()
            .fold(err, |err, hop| err.with_hop(&hop.hostname, &hop.cname))),
        Err(err) => Err(err),
    }
}

async fn walk(
    store: &dyn RecordStore,
    hostname: &str,
    follow_cname: bool,
    max_depth: usize,
    hops: &mut Vec<ChainHop>,
) -> Result<(String, Vec<Record>)> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = hostname.to_string();
    let mut depth = 0usize;

    loop {
        if depth > max_depth {
            return Err(Error::ChainTooLong(max_depth));
        }
        if !visited.insert(current.clone()) {
            return Err(Error::LoopDetected(current));
        }

        let host = store
            .find_host_by_name(&current)
            .await?
            .ok_or_else(|| Error::HostNotFound(current.clone()))?;

        let records = store.list_records_for_host(host.id).await?;

        if follow_cname {
            let mut cnames = records.iter().filter(|r| r.record_type == RecordType::Cname);
            if let Some(cname) = cnames.next() {
                if cnames.next().is_some() {
                    return Err(Error::MultipleCnames(current));
                }

                debug!(
                    hostname = %current,
                    target = %cname.value,
                    depth = depth + 1,
                    "Following CNAME"
                );
                hops.push(ChainHop {
                    hostname: current,
                    cname: cname.value.clone(),
                    ttl: cname.ttl,
                });
                current = cname.value.clone();
                depth += 1;
                continue;
            }
        }

        debug!(hostname, canonical_name = %current, depth, "Resolved chain");
        return Ok((current, records));
    }
}
