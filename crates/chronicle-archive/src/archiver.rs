//! The archive orchestrator.
//!
//! Pulls pages from a committed event stream, feeds them to a formatter
//! write session bound to a durable sink, and assembles the result
//! descriptor. Defined purely against the capability interfaces: any
//! conforming store, formatter, or stream implementation can be
//! substituted.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use chronicle_core::id::AggregateId;
use chronicle_core::storage::{ArchiveLocator, ArchiveStore};

use crate::error::{Error, Result};
use crate::formatter::ArchiveStreamFormatter;
use crate::stream::CommittedEventStream;

/// The result descriptor of one successful archive operation.
///
/// Produced exactly once, at successful completion; never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveDetails {
    /// Destination the artifact was written to.
    pub locator: ArchiveLocator,

    /// Total number of events archived across all pages.
    pub event_count: u64,

    /// The aggregate whose history was archived.
    pub aggregate_id: AggregateId,
}

/// Exports the full committed history of an aggregate into one archive
/// artifact.
pub struct EventArchiver {
    store: Arc<dyn ArchiveStore>,
    formatter: Arc<dyn ArchiveStreamFormatter>,
}

impl EventArchiver {
    /// Creates an archiver over the given store and formatter.
    #[must_use]
    pub fn new(store: Arc<dyn ArchiveStore>, formatter: Arc<dyn ArchiveStreamFormatter>) -> Self {
        Self { store, formatter }
    }

    /// Archives the aggregate's full committed history.
    ///
    /// Resolves the destination, opens it for streamed writing, copies
    /// every page of `stream` through the formatter in arrival order, and
    /// finalizes the artifact. On success exactly one artifact exists at
    /// the returned locator (an existing artifact is overwritten).
    ///
    /// No retries are attempted: the first source, sink, or formatter
    /// error aborts the operation and is surfaced unmodified. Cleanup on
    /// abort is best-effort: the session and sink are dropped, which
    /// closes file handles and discards uncommitted buffers, but a
    /// partially written artifact may remain at the destination and is
    /// never represented as valid. Stores that stage writes (see
    /// `FileArchiveStore`) additionally guarantee the final artifact only
    /// appears on success.
    ///
    /// Cancelling `cancel` aborts in-flight sink I/O and page fetches
    /// promptly; the operation then fails with [`Error::Cancelled`].
    ///
    /// Concurrent calls for the same aggregate race at the caller's risk;
    /// serialize them externally (e.g., a distributed lock) if needed.
    ///
    /// # Errors
    ///
    /// Returns the first error from the stream (`SourceRead`), the sink
    /// (`Core`), the formatter, or [`Error::Cancelled`].
    #[tracing::instrument(
        skip(self, stream, cancel),
        fields(
            aggregate_id = %aggregate_id,
            locator = tracing::field::Empty,
            pages = tracing::field::Empty,
            event_count = tracing::field::Empty
        )
    )]
    pub async fn archive(
        &self,
        aggregate_id: &AggregateId,
        stream: &mut dyn CommittedEventStream,
        cancel: &CancellationToken,
    ) -> Result<ArchiveDetails> {
        let locator = self.store.resolve_locator(aggregate_id);
        tracing::Span::current().record("locator", tracing::field::display(&locator));

        let sink = cancellable(cancel, self.store.create(&locator, true, cancel)).await?;
        let mut session = cancellable(cancel, self.formatter.open_writer(sink)).await?;

        let mut after = 0u64;
        let mut pages = 0u64;
        loop {
            let Some(page) = cancellable(cancel, stream.next_page(after)).await? else {
                break;
            };
            if page.is_empty() {
                break;
            }

            pages += 1;
            after = page.last_sequence().unwrap_or(after);
            cancellable(cancel, session.write(page.events())).await?;
        }

        let event_count = cancellable(cancel, session.finish()).await?;

        let span = tracing::Span::current();
        span.record("pages", pages);
        span.record("event_count", event_count);
        tracing::info!("aggregate history archived");

        Ok(ArchiveDetails {
            locator,
            event_count,
            aggregate_id: aggregate_id.clone(),
        })
    }
}

/// Races `operation` against the cancellation token.
///
/// `biased` so an already-cancelled token wins even when the operation is
/// immediately ready.
async fn cancellable<T, E, F>(cancel: &CancellationToken, operation: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    Error: From<E>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        result = operation => result.map_err(Error::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::ArchiveRecord;
    use crate::gzip_json::GzipJsonFormatter;
    use crate::stream::InMemoryEventStream;
    use chronicle_core::event::CommittedDomainEvent;
    use chronicle_core::storage::MemoryArchiveStore;
    use std::collections::BTreeMap;

    fn events(count: u64) -> Vec<CommittedDomainEvent> {
        (1..=count)
            .map(|seq| CommittedDomainEvent {
                aggregate_id: AggregateId::new_unchecked("thingy-1"),
                sequence_number: seq,
                event_type: "thingy-ping".to_string(),
                event_version: 1,
                payload: format!(r#"{{"value":{seq}}}"#),
                metadata: BTreeMap::new(),
            })
            .collect()
    }

    fn archiver(store: &MemoryArchiveStore) -> EventArchiver {
        EventArchiver::new(Arc::new(store.clone()), Arc::new(GzipJsonFormatter::new()))
    }

    #[tokio::test]
    async fn archives_paged_history_and_reports_details() {
        let store = MemoryArchiveStore::new();
        let archiver = archiver(&store);
        let aggregate_id = AggregateId::new_unchecked("thingy-1");
        let mut stream = InMemoryEventStream::new(events(27), 3).unwrap();

        let details = archiver
            .archive(&aggregate_id, &mut stream, &CancellationToken::new())
            .await
            .expect("archive");

        assert_eq!(details.event_count, 27);
        assert_eq!(details.aggregate_id, aggregate_id);
        assert_eq!(details.locator, store.resolve_locator(&aggregate_id));

        let bytes = store.archived(&details.locator).unwrap().expect("artifact");
        let decoded: Vec<ArchiveRecord> = GzipJsonFormatter::new()
            .open_reader(bytes)
            .unwrap()
            .collect();
        let sequences: Vec<u64> = decoded.iter().map(|r| r.sequence_number).collect();
        assert_eq!(sequences, (1..=27).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn precancelled_token_yields_cancelled_and_no_artifact() {
        let store = MemoryArchiveStore::new();
        let archiver = archiver(&store);
        let aggregate_id = AggregateId::new_unchecked("thingy-1");
        let mut stream = InMemoryEventStream::new(events(3), 3).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = archiver.archive(&aggregate_id, &mut stream, &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(!store
            .contains(&store.resolve_locator(&aggregate_id))
            .unwrap());
    }
}
