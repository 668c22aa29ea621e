// # minidns-core
//
// Core library for a simplified DNS-like record store.
//
// ## Architecture Overview
//
// - **RecordStore**: Trait for host and record persistence (memory, file)
// - **validate**: Hostname, value, TTL and conflict rules
// - **resolver**: Bounded CNAME chain walk with loop detection
// - **resolution**: Result types and the public resolve entry points
// - **RecordService**: Validating write path over a RecordStore
// - **RecordSweeper**: Background expiry scan and statistics job
// - **StoreRegistry**: Plugin-based registry for record store backends
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Resolution and validation only talk to the store trait
// 2. **Bounded Work**: Every chain walk is capped by a configurable depth
// 3. **Plugin-Based**: Store backends are registered dynamically, no hard-coded if-else
// 4. **Library-First**: The daemon is a thin layer over this crate

pub mod config;
pub mod error;
pub mod model;
pub mod registry;
pub mod resolution;
pub mod resolver;
pub mod service;
pub mod store;
pub mod sweeper;
pub mod traits;
pub mod validate;

// Re-export core types for convenience
pub use config::{MiniDnsConfig, ServiceConfig, StoreConfig, SweeperConfig};
pub use error::{Error, ErrorKind, Result};
pub use model::{Host, HostCreate, Record, RecordCreate, RecordType, RecordUpdate, ResolvedRecord};
pub use registry::StoreRegistry;
pub use resolution::{ChainResult, ResolutionResult, resolve, resolve_cname_chain};
pub use resolver::ChainHop;
pub use service::RecordService;
pub use store::{FileRecordStore, MemoryRecordStore};
pub use sweeper::{RecordStats, RecordSweeper};
pub use traits::{RecordStore, RecordStoreFactory};
