//! The archive stream formatter contract and wire model.
//!
//! A formatter is the single authority on the archive wire format: it
//! serializes committed events into bytes written to a sink, and decodes
//! archive bytes back into the same ordered records. Archives must be
//! self-describing: decodable with generic tooling, with no dependency on
//! the producing system's internal types.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use chronicle_core::event::CommittedDomainEvent;
use chronicle_core::id::AggregateId;
use chronicle_core::storage::ArchiveSink;

use crate::error::Result;

/// The persisted per-event record inside an archive.
///
/// Carries everything needed to reconstruct a [`CommittedDomainEvent`]
/// for a known aggregate without consulting the original store. The
/// aggregate identity itself is not repeated per record: an archive holds
/// the history of exactly one aggregate, named by its locator and
/// [`ArchiveDetails`](crate::archiver::ArchiveDetails).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRecord {
    /// Monotonic, 1-based sequence number within the aggregate.
    pub sequence_number: u64,

    /// Event type name.
    pub event_type: String,

    /// Event schema version.
    pub event_version: u32,

    /// Serialized event payload, opaque to the archive.
    pub payload: String,

    /// String-keyed event metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ArchiveRecord {
    /// Builds the wire record for a committed event.
    #[must_use]
    pub fn from_committed(event: &CommittedDomainEvent) -> Self {
        Self {
            sequence_number: event.sequence_number,
            event_type: event.event_type.clone(),
            event_version: event.event_version,
            payload: event.payload.clone(),
            metadata: event.metadata.clone(),
        }
    }

    /// Rebuilds the committed event this record was written from.
    #[must_use]
    pub fn into_committed(self, aggregate_id: AggregateId) -> CommittedDomainEvent {
        CommittedDomainEvent {
            aggregate_id,
            sequence_number: self.sequence_number,
            event_type: self.event_type,
            event_version: self.event_version,
            payload: self.payload,
            metadata: self.metadata,
        }
    }
}

/// An in-flight streaming write session bound to a sink.
///
/// Sessions accept events page by page, so the whole archive is never
/// buffered in memory. After [`finish`](ArchiveWriteSession::finish) the
/// session is spent: further calls fail with `InvalidSessionState`.
#[async_trait]
pub trait ArchiveWriteSession: Send {
    /// Appends events in the given order.
    ///
    /// May be called multiple times (once per page); order is preserved
    /// exactly as given.
    async fn write(&mut self, events: &[CommittedDomainEvent]) -> Result<()>;

    /// Flushes, closes the compression framing, and finalizes the sink.
    ///
    /// Returns the total number of events written across all pages. No
    /// further writes are permitted after `finish`.
    async fn finish(&mut self) -> Result<u64>;
}

/// Serializes and deserializes archives; the single authority on the wire
/// format.
#[async_trait]
pub trait ArchiveStreamFormatter: Send + Sync + 'static {
    /// Begins a streaming write session bound to `sink`.
    ///
    /// May begin writing framing bytes immediately.
    async fn open_writer(&self, sink: Box<dyn ArchiveSink>) -> Result<Box<dyn ArchiveWriteSession>>;

    /// Decodes archive bytes into the original ordered record sequence.
    ///
    /// # Errors
    ///
    /// Returns `Error::FormatCorruption` for truncated or malformed input;
    /// never a silently short sequence.
    fn open_reader(&self, archive: Bytes) -> Result<ArchiveReader>;
}

/// A finite, forward-only sequence of decoded archive records.
///
/// Yields records in their original sequence order.
#[derive(Debug)]
pub struct ArchiveReader {
    records: std::vec::IntoIter<ArchiveRecord>,
}

impl ArchiveReader {
    pub(crate) fn new(records: Vec<ArchiveRecord>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }
}

impl Iterator for ArchiveReader {
    type Item = ArchiveRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for ArchiveReader {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_committed_event() {
        let event = CommittedDomainEvent {
            aggregate_id: AggregateId::new_unchecked("thingy-1"),
            sequence_number: 5,
            event_type: "thingy-ping".to_string(),
            event_version: 2,
            payload: r#"{"value":5}"#.to_string(),
            metadata: BTreeMap::from([("timestamp".to_string(), "2026-01-01T00:00:00Z".to_string())]),
        };

        let record = ArchiveRecord::from_committed(&event);
        let rebuilt = record.into_committed(AggregateId::new_unchecked("thingy-1"));
        assert_eq!(rebuilt, event);
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = ArchiveRecord {
            sequence_number: 1,
            event_type: "thingy-ping".to_string(),
            event_version: 1,
            payload: "{}".to_string(),
            metadata: BTreeMap::new(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("sequenceNumber").is_some());
        assert!(json.get("eventType").is_some());
        assert!(json.get("eventVersion").is_some());
    }

    #[test]
    fn reader_is_exact_size_and_ordered() {
        let records: Vec<ArchiveRecord> = (1..=3)
            .map(|seq| ArchiveRecord {
                sequence_number: seq,
                event_type: "thingy-ping".to_string(),
                event_version: 1,
                payload: "{}".to_string(),
                metadata: BTreeMap::new(),
            })
            .collect();

        let reader = ArchiveReader::new(records);
        assert_eq!(reader.len(), 3);
        let sequences: Vec<u64> = reader.map(|r| r.sequence_number).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }
}
