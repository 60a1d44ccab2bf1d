//! Committed domain events and the paged read unit.
//!
//! A committed domain event is an event the store has already durably
//! persisted: immutable, with a unique 1-based sequence number within its
//! aggregate. Event payloads stay opaque here; decoding them into concrete
//! shapes is the job of an event type registry.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::id::AggregateId;

/// Well-known metadata keys carried alongside event payloads.
pub mod metadata_keys {
    /// RFC 3339 timestamp of when the event was committed.
    pub const TIMESTAMP: &str = "timestamp";
    /// ID of the event or command that caused this event.
    pub const CAUSATION_ID: &str = "causation_id";
    /// Correlation ID shared by all events of one logical operation.
    pub const CORRELATION_ID: &str = "correlation_id";
}

/// One already-persisted event belonging to an aggregate.
///
/// Immutable once committed. The payload is an opaque serialized form; the
/// metadata is a string-keyed map (see [`metadata_keys`] for well-known
/// keys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedDomainEvent {
    /// The aggregate this event belongs to.
    pub aggregate_id: AggregateId,

    /// Monotonic, 1-based sequence number, unique per aggregate.
    pub sequence_number: u64,

    /// Event type name (stable across producers).
    pub event_type: String,

    /// Event schema version (starts at `1`).
    pub event_version: u32,

    /// Serialized event payload, opaque to the archive pipeline.
    pub payload: String,

    /// String-keyed metadata (timestamp, causation id, ...).
    pub metadata: BTreeMap<String, String>,
}

impl CommittedDomainEvent {
    /// Creates a committed event with a timestamp metadata entry.
    #[must_use]
    pub fn new(
        aggregate_id: AggregateId,
        sequence_number: u64,
        event_type: impl Into<String>,
        event_version: u32,
        payload: impl Into<String>,
        committed_at: DateTime<Utc>,
    ) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            metadata_keys::TIMESTAMP.to_string(),
            committed_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        );
        Self {
            aggregate_id,
            sequence_number,
            event_type: event_type.into(),
            event_version,
            payload: payload.into(),
            metadata,
        }
    }

    /// Validates required event fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequence number is zero, the event type is
    /// empty, or the event version is zero.
    pub fn validate(&self) -> Result<()> {
        if self.sequence_number == 0 {
            return Err(Error::InvalidInput(
                "sequence_number must be >= 1".to_string(),
            ));
        }
        if self.event_type.trim().is_empty() {
            return Err(Error::InvalidInput(
                "event_type must be non-empty".to_string(),
            ));
        }
        if self.event_version == 0 {
            return Err(Error::InvalidInput(
                "event_version must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A bounded, ordered slice of committed events for one paged read.
///
/// The concatenation of all pages, in order, reproduces the full gap-free,
/// strictly increasing sequence-number run for the aggregate. Each page
/// carries its continuation marker implicitly: the sequence number of its
/// last event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPage {
    events: Vec<CommittedDomainEvent>,
}

impl EventPage {
    /// Creates a page after validating internal ordering.
    ///
    /// # Errors
    ///
    /// Returns an error if any event fails [`CommittedDomainEvent::validate`]
    /// or if sequence numbers within the page are not contiguous ascending.
    pub fn new(events: Vec<CommittedDomainEvent>) -> Result<Self> {
        for pair in events.windows(2) {
            if pair[1].sequence_number != pair[0].sequence_number + 1 {
                return Err(Error::InvalidInput(format!(
                    "page is not gap-free: sequence {} followed by {}",
                    pair[0].sequence_number, pair[1].sequence_number
                )));
            }
        }
        for event in &events {
            event.validate()?;
        }
        Ok(Self { events })
    }

    /// The events in this page, in sequence order.
    #[must_use]
    pub fn events(&self) -> &[CommittedDomainEvent] {
        &self.events
    }

    /// The continuation marker: the sequence number of the last event,
    /// or `None` for an empty page.
    #[must_use]
    pub fn last_sequence(&self) -> Option<u64> {
        self.events.last().map(|e| e.sequence_number)
    }

    /// Number of events in this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether this page holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Consumes the page, returning its events.
    #[must_use]
    pub fn into_events(self) -> Vec<CommittedDomainEvent> {
        self.events
    }
}
