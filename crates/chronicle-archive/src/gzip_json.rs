//! Gzipped JSON archive format.
//!
//! The reference wire format: the ordered event records are encoded as one
//! JSON array of [`ArchiveRecord`] objects, wrapped in a single gzip
//! stream. Both transforms are standard and widely implemented, so an
//! archive decodes with any gzip decoder plus any JSON parser, with no
//! dependency on this codebase.
//!
//! The writer streams: compressed output produced so far is drained to the
//! sink after every page, so the whole archive is never buffered in memory.

use async_trait::async_trait;
use bytes::Bytes;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

use chronicle_core::event::CommittedDomainEvent;
use chronicle_core::storage::ArchiveSink;

use crate::error::{Error, Result};
use crate::formatter::{ArchiveReader, ArchiveRecord, ArchiveStreamFormatter, ArchiveWriteSession};

/// Formatter producing gzip-compressed JSON array archives.
#[derive(Debug, Clone)]
pub struct GzipJsonFormatter {
    level: Compression,
}

impl GzipJsonFormatter {
    /// Creates a formatter with the default compression level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
        }
    }

    /// Creates a formatter with an explicit compression level (0-9).
    #[must_use]
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level),
        }
    }
}

impl Default for GzipJsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArchiveStreamFormatter for GzipJsonFormatter {
    async fn open_writer(&self, sink: Box<dyn ArchiveSink>) -> Result<Box<dyn ArchiveWriteSession>> {
        let mut encoder = GzEncoder::new(Vec::new(), self.level);
        // The array framing opens eagerly so even an empty archive is a
        // complete JSON document.
        write_framing(&mut encoder, b"[")?;

        Ok(Box::new(GzipJsonWriteSession {
            sink,
            encoder: Some(encoder),
            written: 0,
        }))
    }

    fn open_reader(&self, archive: Bytes) -> Result<ArchiveReader> {
        let mut decoder = GzDecoder::new(archive.as_ref());
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| Error::format_corruption(format!("gzip stream is corrupt: {e}")))?;

        let records: Vec<ArchiveRecord> = serde_json::from_slice(&decompressed)
            .map_err(|e| Error::format_corruption(format!("archive JSON is malformed: {e}")))?;

        Ok(ArchiveReader::new(records))
    }
}

struct GzipJsonWriteSession {
    sink: Box<dyn ArchiveSink>,
    /// `None` once the session has been finished.
    encoder: Option<GzEncoder<Vec<u8>>>,
    written: u64,
}

#[async_trait]
impl ArchiveWriteSession for GzipJsonWriteSession {
    async fn write(&mut self, events: &[CommittedDomainEvent]) -> Result<()> {
        let encoder = self.encoder.as_mut().ok_or(Error::InvalidSessionState {
            message: "write after finish".to_string(),
        })?;

        for event in events {
            let record = ArchiveRecord::from_committed(event);
            let json = serde_json::to_string(&record).map_err(|e| Error::Serialization {
                message: format!(
                    "failed to encode archive record (sequence {}): {e}",
                    event.sequence_number
                ),
            })?;

            if self.written > 0 {
                write_framing(encoder, b",")?;
            }
            write_framing(encoder, json.as_bytes())?;
            self.written += 1;
        }

        // Forward whatever the encoder has emitted so far; the sink applies
        // its own backpressure.
        let chunk = std::mem::take(encoder.get_mut());
        if !chunk.is_empty() {
            self.sink.write(Bytes::from(chunk)).await?;
        }

        Ok(())
    }

    async fn finish(&mut self) -> Result<u64> {
        let mut encoder = self.encoder.take().ok_or(Error::InvalidSessionState {
            message: "session already finished".to_string(),
        })?;

        write_framing(&mut encoder, b"]")?;
        let tail = encoder
            .finish()
            .map_err(|e| Error::Serialization {
                message: format!("failed to close gzip stream: {e}"),
            })?;

        if !tail.is_empty() {
            self.sink.write(Bytes::from(tail)).await?;
        }
        self.sink.finish().await?;

        Ok(self.written)
    }
}

fn write_framing(encoder: &mut GzEncoder<Vec<u8>>, bytes: &[u8]) -> Result<()> {
    encoder.write_all(bytes).map_err(|e| Error::Serialization {
        message: format!("failed to write compressed frame: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::storage::{ArchiveStore, MemoryArchiveStore};
    use chronicle_core::AggregateId;
    use std::collections::BTreeMap;
    use tokio_util::sync::CancellationToken;

    fn events(count: u64) -> Vec<CommittedDomainEvent> {
        (1..=count)
            .map(|seq| CommittedDomainEvent {
                aggregate_id: AggregateId::new_unchecked("thingy-1"),
                sequence_number: seq,
                event_type: "thingy-ping".to_string(),
                event_version: 1,
                payload: format!(r#"{{"value":{seq}}}"#),
                metadata: BTreeMap::from([(
                    "timestamp".to_string(),
                    "2026-01-01T00:00:00Z".to_string(),
                )]),
            })
            .collect()
    }

    async fn archive_bytes(pages: &[&[CommittedDomainEvent]]) -> (Bytes, u64) {
        let store = MemoryArchiveStore::new();
        let locator = store.resolve_locator(&AggregateId::new_unchecked("thingy-1"));
        let sink = store
            .create(&locator, true, &CancellationToken::new())
            .await
            .expect("create sink");

        let formatter = GzipJsonFormatter::new();
        let mut session = formatter.open_writer(sink).await.expect("open writer");
        for page in pages {
            session.write(page).await.expect("write page");
        }
        let count = session.finish().await.expect("finish");

        let bytes = store.archived(&locator).unwrap().expect("artifact");
        (bytes, count)
    }

    #[tokio::test]
    async fn round_trip_preserves_records_and_order() {
        let all = events(5);
        let (bytes, count) = archive_bytes(&[&all]).await;
        assert_eq!(count, 5);

        let formatter = GzipJsonFormatter::new();
        let decoded: Vec<ArchiveRecord> = formatter.open_reader(bytes).unwrap().collect();
        assert_eq!(decoded.len(), 5);
        for (record, event) in decoded.iter().zip(&all) {
            assert_eq!(record, &ArchiveRecord::from_committed(event));
        }
    }

    #[tokio::test]
    async fn page_boundaries_do_not_affect_output() {
        let all = events(7);
        let (single, _) = archive_bytes(&[&all]).await;
        let (paged, _) = archive_bytes(&[&all[..2], &all[2..3], &all[3..]]).await;

        let formatter = GzipJsonFormatter::new();
        let from_single: Vec<ArchiveRecord> = formatter.open_reader(single).unwrap().collect();
        let from_paged: Vec<ArchiveRecord> = formatter.open_reader(paged).unwrap().collect();
        assert_eq!(from_single, from_paged);
    }

    #[tokio::test]
    async fn empty_archive_decodes_to_empty_sequence() {
        let (bytes, count) = archive_bytes(&[]).await;
        assert_eq!(count, 0);

        let formatter = GzipJsonFormatter::new();
        let reader = formatter.open_reader(bytes).unwrap();
        assert_eq!(reader.len(), 0);
    }

    #[tokio::test]
    async fn write_after_finish_fails() {
        let store = MemoryArchiveStore::new();
        let locator = store.resolve_locator(&AggregateId::new_unchecked("thingy-1"));
        let sink = store
            .create(&locator, true, &CancellationToken::new())
            .await
            .unwrap();

        let formatter = GzipJsonFormatter::new();
        let mut session = formatter.open_writer(sink).await.unwrap();
        session.finish().await.unwrap();

        let write = session.write(&events(1)).await;
        assert!(matches!(write, Err(Error::InvalidSessionState { .. })));
        let finish = session.finish().await;
        assert!(matches!(finish, Err(Error::InvalidSessionState { .. })));
    }

    #[tokio::test]
    async fn truncated_archive_is_corrupt() {
        let (bytes, _) = archive_bytes(&[&events(5)]).await;
        let truncated = bytes.slice(..bytes.len() - 4);

        let formatter = GzipJsonFormatter::new();
        let result = formatter.open_reader(truncated);
        assert!(matches!(result, Err(Error::FormatCorruption { .. })));
    }

    #[tokio::test]
    async fn bit_flipped_archive_is_corrupt() {
        let (bytes, _) = archive_bytes(&[&events(5)]).await;
        let mut flipped = bytes.to_vec();
        let middle = flipped.len() / 2;
        flipped[middle] ^= 0x40;

        let formatter = GzipJsonFormatter::new();
        let result = formatter.open_reader(Bytes::from(flipped));
        assert!(matches!(result, Err(Error::FormatCorruption { .. })));
    }

    #[tokio::test]
    async fn archive_decodes_with_generic_tooling_only() {
        let (bytes, _) = archive_bytes(&[&events(2)]).await;

        // A generic gzip decoder plus a generic JSON parser is enough.
        let mut decoder = GzDecoder::new(bytes.as_ref());
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&decompressed).unwrap();

        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["sequenceNumber"], 1);
        assert_eq!(records[0]["eventType"], "thingy-ping");
        assert!(records[0]["payload"].is_string());
        assert!(records[0]["metadata"].is_object());
    }
}
