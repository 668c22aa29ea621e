//! Hostname, record value and record-set validation
//!
//! The syntax checks are pure functions. The conflict and loop checks read
//! the [`RecordStore`] immediately before a write decision; they do not make
//! the check-then-write pair atomic. Hostname uniqueness is enforced by the
//! store itself at insert time.

use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Record, RecordType};
use crate::traits::RecordStore;

/// Maximum number of CNAME hops, shared by the write-time loop check and
/// read-time resolution
pub const MAX_CNAME_CHAIN_LENGTH: usize = 8;

/// Maximum total hostname length
pub const MAX_HOSTNAME_LENGTH: usize = 253;

/// Maximum length of a single hostname label
pub const MAX_LABEL_LENGTH: usize = 63;

/// TTL bounds in seconds (inclusive)
pub const MIN_TTL: u32 = 60;
pub const MAX_TTL: u32 = 86400;

/// Upper bound for MX priority (inclusive)
pub const MAX_PRIORITY: u32 = 65535;

/// Maximum host description length
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

/// Validate a hostname
///
/// Rules:
/// - Total length: 1-253 characters
/// - Labels separated by single dots, no leading/trailing dot
/// - Each label: 1-63 ASCII alphanumerics and hyphens
/// - Labels cannot start or end with a hyphen
pub fn validate_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > MAX_HOSTNAME_LENGTH {
        return false;
    }

    hostname.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LENGTH
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Validate a strict dotted-quad IPv4 address
pub fn validate_ipv4(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

/// Validate an IPv6 address literal
pub fn validate_ipv6(value: &str) -> bool {
    value.parse::<Ipv6Addr>().is_ok()
}

/// Accept any non-empty text
pub fn validate_text(value: &str) -> bool {
    !value.is_empty()
}

/// Validate a record value against its type
///
/// Empty values are always rejected; everything else is dispatched to the
/// type's own validator.
pub fn validate_record_value(record_type: RecordType, value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    (record_type.value_validator())(value)
}

/// Check a TTL against [`MIN_TTL`]..=[`MAX_TTL`]
pub fn validate_ttl(ttl: u32) -> Result<()> {
    if !(MIN_TTL..=MAX_TTL).contains(&ttl) {
        return Err(Error::invalid_input(format!(
            "TTL must be between {} and {} seconds. Got: {}",
            MIN_TTL, MAX_TTL, ttl
        )));
    }
    Ok(())
}

/// Check that a priority is present iff the type requires one, and in range
pub fn validate_priority(record_type: RecordType, priority: Option<u32>) -> Result<()> {
    match (record_type.requires_priority(), priority) {
        (true, None) => Err(Error::invalid_input(format!(
            "Priority is required for {} records",
            record_type
        ))),
        (false, Some(_)) => Err(Error::invalid_input(format!(
            "Priority should only be set for MX records, not {}",
            record_type
        ))),
        (true, Some(p)) if p > MAX_PRIORITY => Err(Error::invalid_input(format!(
            "Priority must be between 0 and {}. Got: {}",
            MAX_PRIORITY, p
        ))),
        _ => Ok(()),
    }
}

/// Reason a new record cannot join a host's record set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordConflict {
    /// A record with the same type and value already exists
    Duplicate,
    /// A CNAME cannot coexist with any other record
    CnameWithOtherRecords,
    /// The host already has a CNAME, so nothing else can be added
    HostHasCname,
}

impl fmt::Display for RecordConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordConflict::Duplicate => f.write_str("an identical record already exists"),
            RecordConflict::CnameWithOtherRecords => {
                f.write_str("a CNAME record cannot coexist with other records")
            }
            RecordConflict::HostHasCname => {
                f.write_str("the host already has a CNAME record")
            }
        }
    }
}

/// Find the first conflict a new record would cause on a host
///
/// `excluding_record_id` leaves one existing record out of the comparison,
/// for updates of that record.
pub async fn find_record_conflict(
    store: &dyn RecordStore,
    host_id: u64,
    record_type: RecordType,
    value: &str,
    excluding_record_id: Option<u64>,
) -> Result<Option<RecordConflict>> {
    let existing: Vec<Record> = store
        .list_records_for_host(host_id)
        .await?
        .into_iter()
        .filter(|r| Some(r.id) != excluding_record_id)
        .collect();

    if existing
        .iter()
        .any(|r| r.record_type == record_type && r.value == value)
    {
        return Ok(Some(RecordConflict::Duplicate));
    }

    if record_type == RecordType::Cname && !existing.is_empty() {
        return Ok(Some(RecordConflict::CnameWithOtherRecords));
    }

    if existing.iter().any(|r| r.record_type == RecordType::Cname) {
        return Ok(Some(RecordConflict::HostHasCname));
    }

    Ok(None)
}

/// Check that a new record would not conflict with a host's records
///
/// Returns `false` on a duplicate (type, value), on a CNAME for a host that
/// has any other record, or on any record for a host that has a CNAME.
pub async fn validate_no_conflicting_records(
    store: &dyn RecordStore,
    host_id: u64,
    record_type: RecordType,
    value: &str,
    excluding_record_id: Option<u64>,
) -> Result<bool> {
    let conflict =
        find_record_conflict(store, host_id, record_type, value, excluding_record_id).await?;
    Ok(conflict.is_none())
}

/// Detect whether the CNAME graph reachable from `start_hostname` loops or
/// runs deeper than `max_depth`
///
/// Every CNAME edge is followed, including extra CNAMEs on hosts that
/// should only have one. Missing hosts end a branch without a finding.
pub async fn detect_cname_chain_loop(
    store: &dyn RecordStore,
    start_hostname: &str,
    max_depth: usize,
) -> Result<bool> {
    walk_for_loop(store, Vec::new(), start_hostname, 0, max_depth).await
}

/// Detect whether adding `alias -> target` would create a loop or a chain
/// deeper than `max_depth`
///
/// The depth counts the longest existing chain that already ends at `alias`,
/// so a chain joined from its tail is measured from its true head.
pub async fn would_create_cname_loop(
    store: &dyn RecordStore,
    alias: &str,
    target: &str,
    max_depth: usize,
) -> Result<bool> {
    let upstream = longest_chain_into(store, alias, max_depth).await?;
    if upstream + 1 > max_depth {
        debug!(
            "CNAME chain into {} is already {} hops deep",
            alias, upstream
        );
        return Ok(true);
    }

    walk_for_loop(store, vec![alias.to_string()], target, upstream + 1, max_depth).await
}

/// Length of the longest CNAME chain ending at `hostname`
///
/// The search stops once it finds a chain longer than `limit`.
async fn longest_chain_into(
    store: &dyn RecordStore,
    hostname: &str,
    limit: usize,
) -> Result<usize> {
    let names: HashMap<u64, String> = store
        .list_hosts()
        .await?
        .into_iter()
        .map(|h| (h.id, h.hostname))
        .collect();

    // target -> hosts holding a CNAME to it
    let mut aliases: HashMap<String, Vec<String>> = HashMap::new();
    for record in store.list_records().await? {
        if record.record_type != RecordType::Cname {
            continue;
        }
        if let Some(name) = names.get(&record.host_id) {
            aliases.entry(record.value).or_default().push(name.clone());
        }
    }

    let mut longest = 0;
    let mut pending = vec![(hostname.to_string(), 0usize, Vec::new())];

    while let Some((name, length, mut path)) = pending.pop() {
        longest = longest.max(length);
        if longest > limit {
            break;
        }

        let Some(sources) = aliases.get(&name) else {
            continue;
        };
        path.push(name);
        for source in sources {
            if !path.contains(source) {
                pending.push((source.clone(), length + 1, path.clone()));
            }
        }
    }

    Ok(longest)
}

async fn walk_for_loop(
    store: &dyn RecordStore,
    path: Vec<String>,
    start: &str,
    depth: usize,
    max_depth: usize,
) -> Result<bool> {
    // Depth-first over (hostname, depth, path to hostname)
    let mut pending = vec![(start.to_string(), depth, path)];

    while let Some((hostname, depth, mut path)) = pending.pop() {
        if depth > max_depth {
            debug!("CNAME chain through {} exceeds depth {}", hostname, max_depth);
            return Ok(true);
        }
        if path.contains(&hostname) {
            debug!("CNAME loop through {}", hostname);
            return Ok(true);
        }

        let Some(host) = store.find_host_by_name(&hostname).await? else {
            continue;
        };

        let targets: Vec<String> = store
            .list_records_for_host(host.id)
            .await?
            .into_iter()
            .filter(|r| r.record_type == RecordType::Cname)
            .map(|r| r.value)
            .collect();

        path.push(hostname);
        for target in targets {
            pending.push((target, depth + 1, path.clone()));
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HostCreate, RecordCreate};
    use crate::store::MemoryRecordStore;

    #[test]
    fn test_valid_hostnames() {
        assert!(validate_hostname("example.com"));
        assert!(validate_hostname("a"));
        assert!(validate_hostname("www.sub-domain.example.com"));
        assert!(validate_hostname("x1.y2.z3"));
        assert!(validate_hostname(&"a".repeat(63)));
    }

    #[test]
    fn test_invalid_hostnames() {
        assert!(!validate_hostname(""));
        assert!(!validate_hostname("-example.com"));
        assert!(!validate_hostname("example-.com"));
        assert!(!validate_hostname("example..com"));
        assert!(!validate_hostname(".example.com"));
        assert!(!validate_hostname("example.com."));
        assert!(!validate_hostname("exa_mple.com"));
        assert!(!validate_hostname("exämple.com"));
        assert!(!validate_hostname(&"a".repeat(64)));
    }

    #[test]
    fn test_hostname_length_limit() {
        // 4 labels of 63 + 3 dots = 255
        let too_long = vec!["a".repeat(63); 4].join(".");
        assert!(!validate_hostname(&too_long));

        // 3 labels of 63 + 1 label of 61 + 3 dots = 253
        let max = format!("{}.{}", vec!["a".repeat(63); 3].join("."), "b".repeat(61));
        assert_eq!(max.len(), 253);
        assert!(validate_hostname(&max));
    }

    #[test]
    fn test_accepted_hostnames_respect_bounds() {
        let samples = [
            "example.com",
            "a.b.c.d.e",
            "xn--bcher-kva.example",
            "host-1.internal",
        ];
        for name in samples {
            assert!(validate_hostname(name));
            assert!(name.len() <= MAX_HOSTNAME_LENGTH);
            assert!(name
                .split('.')
                .all(|l| (1..=MAX_LABEL_LENGTH).contains(&l.len())));
        }
    }

    #[test]
    fn test_ipv4() {
        assert!(validate_ipv4("192.168.1.1"));
        assert!(validate_ipv4("0.0.0.0"));
        assert!(validate_ipv4("255.255.255.255"));
        assert!(!validate_ipv4("256.1.1.1"));
        assert!(!validate_ipv4("1.2.3"));
        assert!(!validate_ipv4("1.2.3.4.5"));
        assert!(!validate_ipv4("1.2.3.4 "));
        assert!(!validate_ipv4("a.b.c.d"));
        assert!(!validate_ipv4(""));
    }

    #[test]
    fn test_record_value_dispatch() {
        assert!(validate_record_value(RecordType::A, "10.0.0.1"));
        assert!(!validate_record_value(RecordType::A, "example.com"));
        assert!(validate_record_value(RecordType::Cname, "example.com"));
        assert!(!validate_record_value(RecordType::Cname, "10.0.0.1."));
        assert!(validate_record_value(RecordType::Mx, "mail.example.com"));
        assert!(validate_record_value(RecordType::Aaaa, "2001:db8::1"));
        assert!(!validate_record_value(RecordType::Aaaa, "10.0.0.1"));
        assert!(validate_record_value(RecordType::Txt, "anything goes"));

        for t in RecordType::ALL {
            assert!(!validate_record_value(t, ""));
        }
    }

    #[test]
    fn test_ttl_bounds() {
        assert!(validate_ttl(60).is_ok());
        assert!(validate_ttl(86400).is_ok());
        assert!(validate_ttl(59).is_err());
        assert!(validate_ttl(86401).is_err());
    }

    #[test]
    fn test_priority_rules() {
        assert!(validate_priority(RecordType::Mx, Some(10)).is_ok());
        assert!(validate_priority(RecordType::Mx, Some(0)).is_ok());
        assert!(validate_priority(RecordType::Mx, Some(65535)).is_ok());
        assert!(validate_priority(RecordType::Mx, Some(65536)).is_err());
        assert!(validate_priority(RecordType::Mx, None).is_err());
        assert!(validate_priority(RecordType::A, Some(10)).is_err());
        assert!(validate_priority(RecordType::A, None).is_ok());
    }

    #[tokio::test]
    async fn test_conflicts() {
        let store = MemoryRecordStore::new();
        let x = store.insert_host(HostCreate::new("x.example.com")).await.unwrap();
        let a = store
            .insert_record(RecordCreate::a(x.id, "10.0.0.1"))
            .await
            .unwrap();

        // Duplicate
        let conflict = find_record_conflict(&store, x.id, RecordType::A, "10.0.0.1", None)
            .await
            .unwrap();
        assert_eq!(conflict, Some(RecordConflict::Duplicate));

        // Same record excluded: updating it in place is fine
        assert!(
            validate_no_conflicting_records(&store, x.id, RecordType::A, "10.0.0.1", Some(a.id))
                .await
                .unwrap()
        );

        // CNAME next to an A record
        let conflict = find_record_conflict(&store, x.id, RecordType::Cname, "y.example.com", None)
            .await
            .unwrap();
        assert_eq!(conflict, Some(RecordConflict::CnameWithOtherRecords));

        // Second A record is fine
        assert!(
            validate_no_conflicting_records(&store, x.id, RecordType::A, "10.0.0.2", None)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_no_records_next_to_cname() {
        let store = MemoryRecordStore::new();
        let x = store.insert_host(HostCreate::new("x.example.com")).await.unwrap();
        store
            .insert_record(RecordCreate::cname(x.id, "y.example.com"))
            .await
            .unwrap();

        let conflict = find_record_conflict(&store, x.id, RecordType::A, "10.0.0.1", None)
            .await
            .unwrap();
        assert_eq!(conflict, Some(RecordConflict::HostHasCname));

        let conflict = find_record_conflict(&store, x.id, RecordType::Cname, "z.example.com", None)
            .await
            .unwrap();
        assert_eq!(conflict, Some(RecordConflict::CnameWithOtherRecords));
    }

    async fn link(store: &MemoryRecordStore, alias: &str, target: &str) {
        let host = match store.find_host_by_name(alias).await.unwrap() {
            Some(host) => host,
            None => store.insert_host(HostCreate::new(alias)).await.unwrap(),
        };
        store
            .insert_record(RecordCreate::cname(host.id, target))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_detect_loop() {
        let store = MemoryRecordStore::new();
        link(&store, "a.example.com", "b.example.com").await;
        link(&store, "b.example.com", "a.example.com").await;

        assert!(detect_cname_chain_loop(&store, "a.example.com", MAX_CNAME_CHAIN_LENGTH)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_detect_loop_terminal_and_dangling_chains() {
        let store = MemoryRecordStore::new();
        link(&store, "a.example.com", "b.example.com").await;
        let b = store.insert_host(HostCreate::new("b.example.com")).await.unwrap();
        store
            .insert_record(RecordCreate::a(b.id, "10.0.0.1"))
            .await
            .unwrap();
        link(&store, "c.example.com", "missing.example.com").await;

        assert!(!detect_cname_chain_loop(&store, "a.example.com", MAX_CNAME_CHAIN_LENGTH)
            .await
            .unwrap());
        assert!(!detect_cname_chain_loop(&store, "c.example.com", MAX_CNAME_CHAIN_LENGTH)
            .await
            .unwrap());
        assert!(!detect_cname_chain_loop(&store, "nowhere.example.com", MAX_CNAME_CHAIN_LENGTH)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_detect_depth_bound() {
        let store = MemoryRecordStore::new();
        // d0 -> d1 -> ... -> d9: nine hops
        for i in 0..9 {
            link(&store, &format!("d{}.example.com", i), &format!("d{}.example.com", i + 1)).await;
        }

        assert!(detect_cname_chain_loop(&store, "d0.example.com", 8).await.unwrap());
        assert!(!detect_cname_chain_loop(&store, "d1.example.com", 8).await.unwrap());
    }

    #[tokio::test]
    async fn test_would_create_loop() {
        let store = MemoryRecordStore::new();
        link(&store, "b.example.com", "c.example.com").await;
        link(&store, "c.example.com", "a.example.com").await;

        // a -> b would close a -> b -> c -> a
        assert!(would_create_cname_loop(&store, "a.example.com", "b.example.com", 8)
            .await
            .unwrap());
        // Self reference
        assert!(would_create_cname_loop(&store, "a.example.com", "a.example.com", 8)
            .await
            .unwrap());
        // a -> d is a plain dangling alias
        assert!(!would_create_cname_loop(&store, "a.example.com", "d.example.com", 8)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_would_create_loop_counts_chain_into_alias() {
        let store = MemoryRecordStore::new();
        // u0 -> u1 -> ... -> u8: eight hops already end at u8
        for i in 0..8 {
            link(&store, &format!("u{}.example.com", i), &format!("u{}.example.com", i + 1)).await;
        }
        let t = store.insert_host(HostCreate::new("t.example.com")).await.unwrap();
        store
            .insert_record(RecordCreate::a(t.id, "10.0.0.1"))
            .await
            .unwrap();

        assert_eq!(longest_chain_into(&store, "u8.example.com", 8).await.unwrap(), 8);
        assert_eq!(longest_chain_into(&store, "u0.example.com", 8).await.unwrap(), 0);

        assert!(would_create_cname_loop(&store, "u8.example.com", "t.example.com", 8)
            .await
            .unwrap());
        // Nothing points at u0, and a looser bound admits the full chain
        assert!(!would_create_cname_loop(&store, "u0.example.com", "t.example.com", 9)
            .await
            .unwrap());
        assert!(!would_create_cname_loop(&store, "u8.example.com", "t.example.com", 9)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_chain_into_ignores_existing_cycles() {
        let store = MemoryRecordStore::new();
        link(&store, "a.example.com", "b.example.com").await;
        link(&store, "b.example.com", "a.example.com").await;
        link(&store, "b.example.com", "x.example.com").await;

        // a and b each reach x; the cycle between them is not followed forever
        assert_eq!(longest_chain_into(&store, "x.example.com", 8).await.unwrap(), 2);
    }
}
