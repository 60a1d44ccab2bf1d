//! Strongly-typed aggregate identity.
//!
//! Aggregate identities map deterministically into archive storage paths, so
//! the same validation rules apply as for any path segment: non-empty, ASCII
//! lowercase alphanumeric plus `-` and `_`, no separators or control
//! characters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

use crate::error::{Error, Result};

/// The identity of one event-sourced aggregate.
///
/// Aggregates are the unit of consistency in an event-sourced system; each
/// archive operation exports the full committed history of exactly one
/// aggregate identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(String);

impl AggregateId {
    /// Creates a new aggregate ID after validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID is empty, longer than 128 characters, or
    /// contains characters other than ASCII lowercase letters, digits, `-`,
    /// or `_`.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Creates an aggregate ID without validation.
    ///
    /// The caller must ensure the ID is valid. This is intended for IDs that
    /// have already been validated (e.g., read back from storage).
    #[must_use]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new globally unique aggregate ID.
    ///
    /// Uses ULID generation, which is lexicographically sortable by creation
    /// time and requires no coordination. The ULID is lowercased to keep the
    /// ID path-safe.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("agg-{}", Ulid::new().to_string().to_lowercase()))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(Error::invalid_id("aggregate ID cannot be empty"));
        }

        if id.len() > 128 {
            return Err(Error::invalid_id(format!(
                "aggregate ID '{id}' is too long (maximum 128 characters)"
            )));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(Error::invalid_id(format!(
                "aggregate ID '{id}' contains invalid characters (allowed: a-z, 0-9, '-', '_')"
            )));
        }

        Ok(())
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AggregateId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for AggregateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
