//! Core traits for minidns
//!
//! This module defines the abstract interfaces that storage backends follow.
//!
//! - [`RecordStore`]: Host and record storage consumed by the resolver
//! - [`RecordStoreFactory`]: Builds a store from configuration

pub mod record_store;

pub use record_store::{RecordStore, RecordStoreFactory};
