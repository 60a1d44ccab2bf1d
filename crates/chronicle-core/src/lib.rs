//! # chronicle-core
//!
//! Core abstractions for the chronicle event archive toolkit.
//!
//! This crate provides the foundational types and traits used across all
//! chronicle components:
//!
//! - **Identifiers**: Strongly-typed aggregate identities
//! - **Events**: Committed domain events and the paged read unit
//! - **Storage**: The durable sink abstraction archives are written through
//! - **Paths**: Canonical archive artifact path layout
//! - **Error Types**: Shared error definitions and result types
//!
//! ## Crate Boundary
//!
//! `chronicle-core` is the **only** crate allowed to define shared
//! primitives. The archive domain (formatters, the orchestrator, concrete
//! stores) lives in `chronicle-archive` and is defined purely against the
//! capability traits in this crate.
//!
//! ## Example
//!
//! ```rust
//! use chronicle_core::prelude::*;
//!
//! // Identify the aggregate whose history is being exported.
//! let aggregate_id = AggregateId::new("thingy-42").unwrap();
//!
//! // Resolve where its archive artifact would live.
//! let store = MemoryArchiveStore::new();
//! let locator = store.resolve_locator(&aggregate_id);
//! assert_eq!(locator.as_str(), "mem://archives/thingy-42.json.gz");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod archive_paths;
pub mod error;
pub mod event;
pub mod id;
pub mod observability;
pub mod storage;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use chronicle_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::archive_paths::ArchivePaths;
    pub use crate::error::{Error, Result};
    pub use crate::event::{CommittedDomainEvent, EventPage};
    pub use crate::id::AggregateId;
    pub use crate::storage::{ArchiveLocator, ArchiveSink, ArchiveStore, MemoryArchiveStore};
}

// Re-export key types at crate root for ergonomics
pub use archive_paths::ArchivePaths;
pub use error::{Error, Result};
pub use event::{CommittedDomainEvent, EventPage};
pub use id::AggregateId;
pub use observability::{LogFormat, init_logging};
pub use storage::{ArchiveLocator, ArchiveSink, ArchiveStore, MemoryArchiveStore};
