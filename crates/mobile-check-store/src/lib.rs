//! # Mobile Check Store
//!
//! Transient storage for uploaded checklist payloads.
//!
//! ## Backends
//!
//! - **Memory**: a process-local map, lost on restart
//! - **File**: one JSON document per identifier under a local directory
//!
//! Both implement [`PayloadStore`] and are chosen at startup through
//! [`StoreConfig`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod file;
pub mod store;

pub use config::{open_store, StoreBackend, StoreConfig};
pub use file::FileStore;
pub use store::{InMemoryStore, PayloadStore};
