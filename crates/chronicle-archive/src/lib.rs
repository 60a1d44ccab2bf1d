//! # chronicle-archive
//!
//! The event archive export pipeline.
//!
//! This crate exports the full committed history of an event-sourced
//! aggregate into a single durable, self-contained archive artifact,
//! independent of the live event store:
//!
//! - **Stream boundary**: the paged committed-event source contract
//! - **Formatter**: the gzipped-JSON wire format, writing and reading
//! - **Stores**: filesystem-backed artifacts (in-memory lives in core)
//! - **Registry**: explicit event-type registry for decoding payloads
//! - **Orchestrator**: coordinates producer, formatter, and sink
//!
//! ## Guarantees
//!
//! - **Ordered**: events are archived exactly in stream order
//! - **Round-trippable**: reading an archive back yields the identical
//!   record sequence, byte-for-byte payloads included
//! - **Honest failure**: any error (or cancellation) yields no
//!   [`ArchiveDetails`](archiver::ArchiveDetails), never a truncated
//!   archive represented as success
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chronicle_archive::archiver::EventArchiver;
//! use chronicle_archive::gzip_json::GzipJsonFormatter;
//! use chronicle_archive::stream::InMemoryEventStream;
//! use chronicle_core::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> chronicle_archive::error::Result<()> {
//! let store = Arc::new(MemoryArchiveStore::new());
//! let archiver = EventArchiver::new(store, Arc::new(GzipJsonFormatter::new()));
//!
//! let aggregate_id = AggregateId::new("thingy-42")?;
//! let mut stream = InMemoryEventStream::new(Vec::new(), 3)?;
//! let details = archiver
//!     .archive(&aggregate_id, &mut stream, &CancellationToken::new())
//!     .await?;
//! assert_eq!(details.event_count, 0);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod archiver;
pub mod error;
pub mod file_store;
pub mod formatter;
pub mod gzip_json;
pub mod registry;
pub mod stream;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::archiver::{ArchiveDetails, EventArchiver};
    pub use crate::error::{Error, Result};
    pub use crate::file_store::{FileArchiveStore, FileArchiveStoreConfig};
    pub use crate::formatter::{
        ArchiveReader, ArchiveRecord, ArchiveStreamFormatter, ArchiveWriteSession,
    };
    pub use crate::gzip_json::GzipJsonFormatter;
    pub use crate::registry::EventTypeRegistry;
    pub use crate::stream::{CommittedEventStream, InMemoryEventStream};
}

// Re-export key types at crate root for ergonomics
pub use archiver::{ArchiveDetails, EventArchiver};
pub use error::{Error, Result};
pub use file_store::{FileArchiveStore, FileArchiveStoreConfig};
pub use formatter::{ArchiveReader, ArchiveRecord, ArchiveStreamFormatter, ArchiveWriteSession};
pub use gzip_json::GzipJsonFormatter;
pub use registry::EventTypeRegistry;
pub use stream::{CommittedEventStream, InMemoryEventStream};
