//! Event type registry for decoding archived payloads.
//!
//! Archive records carry their payload as an opaque serialized string plus
//! an `(event_type, event_version)` identifier. Turning that back into a
//! concrete payload shape requires a registry mapping the identifier to a
//! decode function. The registry is explicit, passed-in state rather than
//! a global, so multiple archives and registries coexist safely.

use serde::de::DeserializeOwned;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::formatter::ArchiveRecord;

type PayloadDecoder = Arc<dyn Fn(&str) -> Result<Box<dyn Any + Send>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EventTypeKey {
    name: String,
    version: u32,
}

/// Maps `(event_type, event_version)` identifiers to payload decoders.
///
/// # Example
///
/// ```rust
/// use chronicle_archive::registry::EventTypeRegistry;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct ThingyPing { value: u64 }
///
/// let mut registry = EventTypeRegistry::new();
/// registry.register::<ThingyPing>("thingy-ping", 1).unwrap();
/// assert!(registry.contains("thingy-ping", 1));
/// ```
#[derive(Clone, Default)]
pub struct EventTypeRegistry {
    decoders: HashMap<EventTypeKey, PayloadDecoder>,
}

impl EventTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a payload type for an event type identifier.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateEventType` if the identifier is already
    /// registered.
    pub fn register<T>(&mut self, name: impl Into<String>, version: u32) -> Result<()>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let key = EventTypeKey {
            name: name.into(),
            version,
        };
        if self.decoders.contains_key(&key) {
            return Err(Error::DuplicateEventType {
                name: key.name,
                version: key.version,
            });
        }

        let name_for_errors = key.name.clone();
        let decoder: PayloadDecoder = Arc::new(move |payload| {
            let decoded: T = serde_json::from_str(payload).map_err(|e| Error::Serialization {
                message: format!("failed to decode payload for {name_for_errors} v{version}: {e}"),
            })?;
            Ok(Box::new(decoded))
        });
        self.decoders.insert(key, decoder);
        Ok(())
    }

    /// Whether a decoder is registered for the identifier.
    #[must_use]
    pub fn contains(&self, name: &str, version: u32) -> bool {
        self.decoders.contains_key(&EventTypeKey {
            name: name.to_string(),
            version,
        })
    }

    /// Registered identifiers, as `(name, version)` pairs.
    #[must_use]
    pub fn registered_types(&self) -> Vec<(String, u32)> {
        self.decoders
            .keys()
            .map(|k| (k.name.clone(), k.version))
            .collect()
    }

    /// Decodes a record's payload using the registered decoder.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownEventType` when no decoder is registered for
    /// the record's identifier, or a serialization error when the payload
    /// does not match the registered shape.
    pub fn decode(&self, record: &ArchiveRecord) -> Result<Box<dyn Any + Send>> {
        let key = EventTypeKey {
            name: record.event_type.clone(),
            version: record.event_version,
        };
        let decoder = self
            .decoders
            .get(&key)
            .ok_or(Error::UnknownEventType {
                name: key.name.clone(),
                version: key.version,
            })?;
        decoder(&record.payload)
    }

    /// Decodes a record's payload into a known concrete type.
    ///
    /// # Errors
    ///
    /// In addition to the [`decode`](Self::decode) errors, fails if the
    /// registered decoder produced a different type than `T`.
    pub fn decode_as<T: 'static>(&self, record: &ArchiveRecord) -> Result<T> {
        let decoded = self.decode(record)?;
        decoded
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| Error::Serialization {
                message: format!(
                    "decoded payload for {} v{} has an unexpected type",
                    record.event_type, record.event_version
                ),
            })
    }
}

impl fmt::Debug for EventTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTypeRegistry")
            .field("registered", &self.registered_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Eq, Deserialize)]
    struct ThingyPing {
        value: u64,
    }

    #[derive(Debug, PartialEq, Eq, Deserialize)]
    struct ThingyRenamed {
        name: String,
    }

    fn record(event_type: &str, version: u32, payload: &str) -> ArchiveRecord {
        ArchiveRecord {
            sequence_number: 1,
            event_type: event_type.to_string(),
            event_version: version,
            payload: payload.to_string(),
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn decode_round_trip() {
        let mut registry = EventTypeRegistry::new();
        registry.register::<ThingyPing>("thingy-ping", 1).unwrap();

        let decoded: ThingyPing = registry
            .decode_as(&record("thingy-ping", 1, r#"{"value":42}"#))
            .unwrap();
        assert_eq!(decoded, ThingyPing { value: 42 });
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = EventTypeRegistry::new();
        registry.register::<ThingyPing>("thingy-ping", 1).unwrap();
        let result = registry.register::<ThingyPing>("thingy-ping", 1);
        assert!(matches!(result, Err(Error::DuplicateEventType { .. })));

        // A new version of the same name is a distinct identifier.
        assert!(registry.register::<ThingyPing>("thingy-ping", 2).is_ok());
    }

    #[test]
    fn unknown_event_type_fails() {
        let registry = EventTypeRegistry::new();
        let result = registry.decode(&record("thingy-ping", 1, "{}"));
        assert!(matches!(result, Err(Error::UnknownEventType { .. })));
    }

    #[test]
    fn mismatched_payload_shape_fails() {
        let mut registry = EventTypeRegistry::new();
        registry.register::<ThingyPing>("thingy-ping", 1).unwrap();

        let result = registry.decode(&record("thingy-ping", 1, r#"{"name":"nope"}"#));
        assert!(matches!(result, Err(Error::Serialization { .. })));
    }

    #[test]
    fn decode_as_with_wrong_type_fails() {
        let mut registry = EventTypeRegistry::new();
        registry.register::<ThingyPing>("thingy-ping", 1).unwrap();

        let result: Result<ThingyRenamed> =
            registry.decode_as(&record("thingy-ping", 1, r#"{"value":42}"#));
        assert!(matches!(result, Err(Error::Serialization { .. })));
    }

    #[test]
    fn registries_are_independent() {
        let mut a = EventTypeRegistry::new();
        let b = EventTypeRegistry::new();
        a.register::<ThingyPing>("thingy-ping", 1).unwrap();

        assert!(a.contains("thingy-ping", 1));
        assert!(!b.contains("thingy-ping", 1));
    }
}
