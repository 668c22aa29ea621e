//! Error types for minidns
//!
//! This module defines all error types used throughout the crate.
//!
//! Resolution failures (`HostNotFound`, `LoopDetected`, `ChainTooLong`,
//! `MultipleCnames`) can be wrapped in [`Error::CnameHop`] to carry the chain
//! context in which they happened. Use [`Error::kind`] to match on the
//! underlying failure regardless of wrapping.

use crate::model::RecordType;
use thiserror::Error;

/// Result type alias for minidns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for minidns
#[derive(Error, Debug)]
pub enum Error {
    /// Hostname fails the label grammar
    #[error("Invalid hostname format: '{0}'")]
    InvalidHostnameFormat(String),

    /// Record value fails the per-type syntax check
    #[error("Invalid value for {record_type} record: '{value}'")]
    InvalidRecordValue {
        /// Type the value was checked against
        record_type: RecordType,
        /// Offending value
        value: String,
    },

    /// Out-of-range TTL, priority or description
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Duplicate record or CNAME exclusivity violation
    #[error("Record conflict: {0}")]
    RecordConflict(String),

    /// Hostname is already registered
    #[error("Hostname '{0}' already exists")]
    DuplicateHostname(String),

    /// Hostname is not registered
    #[error("Hostname '{0}' not found")]
    HostNotFound(String),

    /// Host id is not registered
    #[error("Host with ID {0} not found")]
    HostIdNotFound(u64),

    /// Record id is not registered
    #[error("Record with ID {0} not found")]
    RecordNotFound(u64),

    /// A hostname was visited twice during a CNAME walk
    #[error("CNAME loop detected at {0}")]
    LoopDetected(String),

    /// The CNAME walk went deeper than the configured bound
    #[error("Maximum CNAME chain length ({0}) exceeded")]
    ChainTooLong(usize),

    /// More than one CNAME record is attached to a single host
    #[error("Multiple CNAME records found for {0}")]
    MultipleCnames(String),

    /// A resolution failure that happened after following `alias -> target`
    #[error("Error resolving CNAME {alias} -> {target}: {source}")]
    CnameHop {
        /// Hostname owning the CNAME record
        alias: String,
        /// CNAME target
        target: String,
        /// Failure further down the chain
        source: Box<Error>,
    },

    /// Record store backend errors
    #[error("Record store error: {0}")]
    RecordStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Flat classification of [`Error`], looking through hop wrappers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidHostnameFormat,
    InvalidRecordValue,
    InvalidInput,
    RecordConflict,
    DuplicateHostname,
    HostNotFound,
    RecordNotFound,
    LoopDetected,
    ChainTooLong,
    MultipleCnames,
    RecordStore,
    Config,
    Io,
    Json,
    Other,
}

impl Error {
    /// Create a record store error
    pub fn record_store(msg: impl Into<String>) -> Self {
        Self::RecordStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a record conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::RecordConflict(msg.into())
    }

    /// Wrap this error with the CNAME hop that led to it
    pub fn with_hop(self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        Self::CnameHop {
            alias: alias.into(),
            target: target.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all hop context removed
    pub fn root(&self) -> &Error {
        let mut current = self;
        while let Error::CnameHop { source, .. } = current {
            current = source;
        }
        current
    }

    /// Classify this error, looking through hop wrappers
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Error::InvalidHostnameFormat(_) => ErrorKind::InvalidHostnameFormat,
            Error::InvalidRecordValue { .. } => ErrorKind::InvalidRecordValue,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::RecordConflict(_) => ErrorKind::RecordConflict,
            Error::DuplicateHostname(_) => ErrorKind::DuplicateHostname,
            Error::HostNotFound(_) | Error::HostIdNotFound(_) => ErrorKind::HostNotFound,
            Error::RecordNotFound(_) => ErrorKind::RecordNotFound,
            Error::LoopDetected(_) => ErrorKind::LoopDetected,
            Error::ChainTooLong(_) => ErrorKind::ChainTooLong,
            Error::MultipleCnames(_) => ErrorKind::MultipleCnames,
            Error::RecordStore(_) => ErrorKind::RecordStore,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) => ErrorKind::Json,
            Error::Other(_) => ErrorKind::Other,
            // root() never returns a hop
            Error::CnameHop { .. } => ErrorKind::Other,
        }
    }

    /// Whether this is one of the terminal states of a chain walk
    ///
    /// These are deterministic functions of store contents and are reported
    /// as data by [`crate::resolution::resolve`].
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::HostNotFound
                | ErrorKind::LoopDetected
                | ErrorKind::ChainTooLong
                | ErrorKind::MultipleCnames
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
