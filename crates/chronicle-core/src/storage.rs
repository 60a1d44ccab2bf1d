//! Durable sink abstraction for archive artifacts.
//!
//! This module defines the storage contract the archive pipeline writes
//! through. A store resolves an aggregate identity to a destination locator
//! and opens that destination exactly once per archive operation as a
//! streaming byte sink. Backends apply backpressure naturally: `write`
//! suspends until the chunk is accepted.
//!
//! The locator is an opaque URI so different backends can coexist:
//! - Filesystem: `file:///var/archives/...`
//! - In-memory (tests): `mem://archives/...`

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::archive_paths::ArchivePaths;
use crate::error::{Error, Result};
use crate::id::AggregateId;

/// Destination locator for one archive artifact.
///
/// An opaque URI string; backends interpret the scheme. Resolution from an
/// aggregate identity is deterministic within one store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchiveLocator(String);

impl ArchiveLocator {
    /// Creates a locator from a URI string.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Returns the locator as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A streaming byte sink accepting one archive artifact.
///
/// Opened once per archive operation and exclusively owned by it. Dropping
/// a sink without calling [`finish`](ArchiveSink::finish) is the abort
/// path: backends must not publish a finished artifact for an unfinished
/// sink, though partially written bytes may remain at the destination.
#[async_trait]
pub trait ArchiveSink: Send {
    /// Appends a chunk of bytes to the artifact.
    ///
    /// Suspends under backpressure until the chunk is accepted.
    async fn write(&mut self, chunk: Bytes) -> Result<()>;

    /// Flushes and durably publishes the artifact.
    ///
    /// No further writes are permitted after `finish`.
    async fn finish(&mut self) -> Result<()>;
}

/// Resolves destinations and opens durable sinks for archive artifacts.
///
/// Implementations decide where artifacts live (filesystem, object store,
/// memory) behind a uniform capability interface, so the orchestrator never
/// depends on concrete storage types.
#[async_trait]
pub trait ArchiveStore: Send + Sync + 'static {
    /// Resolves the destination locator for an aggregate.
    ///
    /// Deterministic: repeated calls with the same identity yield the same
    /// locator within one store configuration.
    fn resolve_locator(&self, aggregate_id: &AggregateId) -> ArchiveLocator;

    /// Opens the destination for streamed writing.
    ///
    /// With `overwrite = false` the store refuses to replace an existing
    /// artifact. The cancellation token aborts in-flight I/O setup.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyExists` when `overwrite` is false and an
    /// artifact is already present, `Error::Cancelled` when the token fires
    /// during setup, and `Error::SinkIo` for I/O failures.
    async fn create(
        &self,
        locator: &ArchiveLocator,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn ArchiveSink>>;
}

/// In-memory archive store for testing.
///
/// Thread-safe via `RwLock`. Sinks buffer all writes and commit the
/// artifact atomically on `finish`; an aborted sink leaves no artifact
/// behind.
#[derive(Debug, Default, Clone)]
pub struct MemoryArchiveStore {
    archives: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryArchiveStore {
    /// Creates a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the finished artifact at `locator`, if any.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the store lock is poisoned.
    pub fn archived(&self, locator: &ArchiveLocator) -> Result<Option<Bytes>> {
        let archives = self.archives.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;
        Ok(archives.get(locator.as_str()).cloned())
    }

    /// Whether a finished artifact exists at `locator`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the store lock is poisoned.
    pub fn contains(&self, locator: &ArchiveLocator) -> Result<bool> {
        Ok(self.archived(locator)?.is_some())
    }
}

#[async_trait]
impl ArchiveStore for MemoryArchiveStore {
    fn resolve_locator(&self, aggregate_id: &AggregateId) -> ArchiveLocator {
        ArchiveLocator::new(format!("mem://{}", ArchivePaths::archive_file(aggregate_id)))
    }

    async fn create(
        &self,
        locator: &ArchiveLocator,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn ArchiveSink>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if !overwrite && self.contains(locator)? {
            return Err(Error::AlreadyExists(locator.to_string()));
        }

        Ok(Box::new(MemorySink {
            key: locator.as_str().to_string(),
            buffer: Vec::new(),
            archives: Arc::clone(&self.archives),
            finished: false,
        }))
    }
}

struct MemorySink {
    key: String,
    buffer: Vec<u8>,
    archives: Arc<RwLock<HashMap<String, Bytes>>>,
    finished: bool,
}

#[async_trait]
impl ArchiveSink for MemorySink {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        if self.finished {
            return Err(Error::sink_io("write after finish"));
        }
        self.buffer.extend_from_slice(&chunk);
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Err(Error::sink_io("sink already finished"));
        }
        self.finished = true;

        let mut archives = self.archives.write().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;
        archives.insert(self.key.clone(), Bytes::from(std::mem::take(&mut self.buffer)));
        Ok(())
    }
}
