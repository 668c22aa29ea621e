//! Resolution entry points
//!
//! [`resolve`] reports resolution failures as data inside a
//! [`ResolutionResult`]; callers decide whether an unresolved name is an
//! error. [`resolve_cname_chain`] is for chain inspection and returns those
//! failures as errors. Both return `Err` for store faults.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::model::{RecordType, ResolvedRecord};
use crate::resolver::{ChainHop, DEFAULT_MAX_DEPTH, resolve_chain};
use crate::traits::RecordStore;

/// Answer for a single hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Hostname as requested
    pub hostname: String,
    /// Hostname at the end of the CNAME chain; absent on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_name: Option<String>,
    /// Records of the canonical host, after type filtering
    pub records: Vec<ResolvedRecord>,
    /// Whether at least one record survived filtering
    pub resolved: bool,
    /// Failure message when the chain could not be resolved
    #[serde(default)]
    pub error: Option<String>,
}

/// Ordered CNAME hops for a hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainResult {
    pub hostname: String,
    pub chain: Vec<ChainHop>,
    pub resolved: bool,
}

/// Resolve a hostname with the default depth bound
///
/// # Parameters
///
/// - `hostname`: Hostname to resolve
/// - `type_filter`: Keep only records of this exact type
pub async fn resolve(
    store: &dyn RecordStore,
    hostname: &str,
    type_filter: Option<RecordType>,
) -> Result<ResolutionResult> {
    resolve_with_depth(store, hostname, type_filter, DEFAULT_MAX_DEPTH).await
}

/// Resolve a hostname with an explicit depth bound
pub async fn resolve_with_depth(
    store: &dyn RecordStore,
    hostname: &str,
    type_filter: Option<RecordType>,
    max_depth: usize,
) -> Result<ResolutionResult> {
    match resolve_chain(store, hostname, true, max_depth).await {
        Ok(chain) => {
            let records: Vec<ResolvedRecord> = chain
                .records
                .iter()
                .filter(|r| type_filter.is_none_or(|t| r.record_type == t))
                .map(ResolvedRecord::from)
                .collect();

            Ok(ResolutionResult {
                hostname: hostname.to_string(),
                canonical_name: Some(chain.canonical_name),
                resolved: !records.is_empty(),
                records,
                error: None,
            })
        }
        Err(err) if err.is_resolution_failure() => {
            debug!(hostname, error = %err, "Resolution failed");
            Ok(ResolutionResult {
                hostname: hostname.to_string(),
                canonical_name: None,
                records: Vec::new(),
                resolved: false,
                error: Some(err.to_string()),
            })
        }
        Err(err) => Err(err),
    }
}

/// List the CNAME hops from `hostname` to its terminal answer
///
/// # Errors
///
/// `LoopDetected`, `ChainTooLong`, `MultipleCnames` and `HostNotFound` are
/// returned as errors, wrapped with hop context.
pub async fn resolve_cname_chain(
    store: &dyn RecordStore,
    hostname: &str,
    max_depth: usize,
) -> Result<ChainResult> {
    let chain = resolve_chain(store, hostname, true, max_depth).await?;

    Ok(ChainResult {
        hostname: hostname.to_string(),
        chain: chain.hops,
        resolved: true,
    })
}
