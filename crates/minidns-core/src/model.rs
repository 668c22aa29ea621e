//! Hosts, records and record types
//!
//! A [`Host`] is a registered hostname; it owns zero or more [`Record`]s.
//! [`HostCreate`] and [`RecordCreate`] are the write-side inputs accepted by
//! [`crate::traits::RecordStore`] and [`crate::service::RecordService`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validate;

/// Default TTL for new records (seconds)
pub const DEFAULT_TTL: u32 = 3600;

/// DNS record type
///
/// Each variant owns its value validator (see [`RecordType::value_validator`]),
/// so adding a type only touches this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Canonical name (alias)
    Cname,
    /// Mail exchange, requires a priority
    Mx,
    /// Free-form text
    Txt,
}

impl RecordType {
    /// Every registered record type
    pub const ALL: [RecordType; 5] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Cname,
        RecordType::Mx,
        RecordType::Txt,
    ];

    /// Upper-case type name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
        }
    }

    /// Syntax check applied to values of this type
    pub fn value_validator(&self) -> fn(&str) -> bool {
        match self {
            RecordType::A => validate::validate_ipv4,
            RecordType::Aaaa => validate::validate_ipv6,
            RecordType::Cname | RecordType::Mx => validate::validate_hostname,
            RecordType::Txt => validate::validate_text,
        }
    }

    /// Whether records of this type must carry a priority
    pub fn requires_priority(&self) -> bool {
        matches!(self, RecordType::Mx)
    }

    /// Whether the value of this type names another host
    pub fn targets_hostname(&self) -> bool {
        matches!(self, RecordType::Cname | RecordType::Mx)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::invalid_input(format!("Unknown record type: {}", s)))
    }
}

/// A registered hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub id: u64,
    pub hostname: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for registering a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCreate {
    pub hostname: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl HostCreate {
    /// Create a host input without description
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            description: None,
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A typed record attached to a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub host_id: u64,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub value: String,
    pub ttl: u32,
    #[serde(default)]
    pub priority: Option<u32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Point in time after which this record is stale
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at) + Duration::seconds(i64::from(self.ttl))
    }

    /// Check if the record's TTL has elapsed at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() < now
    }
}

/// Input for attaching a record to a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCreate {
    pub host_id: u64,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub value: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub priority: Option<u32>,
}

impl RecordCreate {
    /// Create a record input with the default TTL and no priority
    pub fn new(host_id: u64, record_type: RecordType, value: impl Into<String>) -> Self {
        Self {
            host_id,
            record_type,
            value: value.into(),
            ttl: DEFAULT_TTL,
            priority: None,
        }
    }

    /// A record input
    pub fn a(host_id: u64, address: impl Into<String>) -> Self {
        Self::new(host_id, RecordType::A, address)
    }

    /// CNAME record input
    pub fn cname(host_id: u64, target: impl Into<String>) -> Self {
        Self::new(host_id, RecordType::Cname, target)
    }

    /// MX record input
    pub fn mx(host_id: u64, exchange: impl Into<String>, priority: u32) -> Self {
        Self::new(host_id, RecordType::Mx, exchange).with_priority(priority)
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Canonical form of the value: hostname-valued types are lower-cased
    pub fn normalized(mut self) -> Self {
        if self.record_type.targets_hostname() {
            self.value = self.value.to_ascii_lowercase();
        }
        self
    }
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

/// Changes to an existing record
///
/// Unset fields keep their stored value. The record type and owning host
/// cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub priority: Option<u32>,
}

impl RecordUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Replace the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Replace the priority
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// The record as it would look after this update
    pub fn merged_with(&self, record: &Record) -> RecordCreate {
        RecordCreate {
            host_id: record.host_id,
            record_type: record.record_type,
            value: self.value.clone().unwrap_or_else(|| record.value.clone()),
            ttl: self.ttl.unwrap_or(record.ttl),
            priority: self.priority.or(record.priority),
        }
    }
}

/// A record as it appears in a resolution answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub value: String,
    pub ttl: u32,
    #[serde(default)]
    pub priority: Option<u32>,
}

impl From<&Record> for ResolvedRecord {
    fn from(record: &Record) -> Self {
        Self {
            record_type: record.record_type,
            value: record.value.clone(),
            ttl: record.ttl,
            priority: record.priority,
        }
    }
}
