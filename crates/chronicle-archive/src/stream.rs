//! The committed event stream boundary.
//!
//! The archive pipeline consumes an ordered, paged sequence of previously
//! committed events through this trait. The live event store implements it;
//! the in-memory implementation here backs tests and small migrations.

use async_trait::async_trait;

use chronicle_core::event::{CommittedDomainEvent, EventPage};

use crate::error::{Error, Result};

/// An ordered, paged source of committed events for one aggregate.
///
/// `next_page` is called repeatedly with the sequence number of the last
/// event already consumed (`0` for the first call) and must yield pages in
/// strictly increasing sequence order with no gaps or duplicates. `None`
/// signals end of stream; an empty page is likewise treated as exhaustion.
///
/// Any error aborts the archive operation; the orchestrator does not
/// distinguish transient from fatal failures.
#[async_trait]
pub trait CommittedEventStream: Send {
    /// Returns the next page of events after `after_sequence`, or `None`
    /// at end of stream.
    async fn next_page(&mut self, after_sequence: u64) -> Result<Option<EventPage>>;
}

/// In-memory committed event stream with a fixed page size.
///
/// Holds the full event run up front and serves it back in pages, the way
/// a store reader would. Construction validates the gap-free, strictly
/// increasing sequence invariant so downstream code can rely on it.
#[derive(Debug, Clone)]
pub struct InMemoryEventStream {
    events: Vec<CommittedDomainEvent>,
    page_size: usize,
}

impl InMemoryEventStream {
    /// Creates a stream over `events` served in pages of `page_size`.
    ///
    /// # Errors
    ///
    /// Returns an error if `page_size` is zero or the events are not a
    /// gap-free, strictly increasing sequence run.
    pub fn new(events: Vec<CommittedDomainEvent>, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::source_read("page size must be >= 1"));
        }
        for pair in events.windows(2) {
            if pair[1].sequence_number != pair[0].sequence_number + 1 {
                return Err(Error::source_read(format!(
                    "event run is not gap-free: sequence {} followed by {}",
                    pair[0].sequence_number, pair[1].sequence_number
                )));
            }
        }
        Ok(Self { events, page_size })
    }

    /// Total number of events this stream will yield.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the stream holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl CommittedEventStream for InMemoryEventStream {
    async fn next_page(&mut self, after_sequence: u64) -> Result<Option<EventPage>> {
        let remaining: Vec<CommittedDomainEvent> = self
            .events
            .iter()
            .filter(|e| e.sequence_number > after_sequence)
            .take(self.page_size)
            .cloned()
            .collect();

        if remaining.is_empty() {
            return Ok(None);
        }

        let page = EventPage::new(remaining).map_err(Error::from)?;
        Ok(Some(page))
    }
}
