//! Canonical storage paths for archive artifacts.
//!
//! This module is the single source of truth for archive artifact paths.
//! All stores must use these functions to construct paths; no hardcoded
//! path strings should exist outside this module.
//!
//! # Path Layout
//!
//! ```text
//! archives/
//! └── {aggregate_id}.json.gz            # finished artifact
//! └── {aggregate_id}.json.gz.partial    # staging file during write
//! ```

use crate::id::AggregateId;

/// Canonical path generator for archive storage.
///
/// # Example
///
/// ```
/// use chronicle_core::archive_paths::ArchivePaths;
/// use chronicle_core::id::AggregateId;
///
/// let id = AggregateId::new("thingy-42").unwrap();
/// assert_eq!(ArchivePaths::archive_file(&id), "archives/thingy-42.json.gz");
/// ```
pub struct ArchivePaths;

impl ArchivePaths {
    /// Prefix under which all archive artifacts live.
    pub const ARCHIVE_PREFIX: &'static str = "archives/";

    /// File extension of finished artifacts (gzipped JSON).
    pub const ARCHIVE_EXTENSION: &'static str = "json.gz";

    /// Suffix appended to the artifact path while a write is in flight.
    pub const STAGING_SUFFIX: &'static str = ".partial";

    /// Returns the artifact path for an aggregate.
    #[must_use]
    pub fn archive_file(aggregate_id: &AggregateId) -> String {
        format!(
            "{}{aggregate_id}.{}",
            Self::ARCHIVE_PREFIX,
            Self::ARCHIVE_EXTENSION
        )
    }

    /// Returns the staging path used for write-then-rename publication.
    #[must_use]
    pub fn staging_file(aggregate_id: &AggregateId) -> String {
        format!("{}{}", Self::archive_file(aggregate_id), Self::STAGING_SUFFIX)
    }
}
