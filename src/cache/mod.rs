//! Generic shared-cache plumbing.
//!
//! A minimal keyed store with secondary indexes, the list/watch contracts a
//! reconciler drives, and the [`Reflector`] loop that keeps the store
//! synchronized against a remote source:
//!
//! - **[`store`]**: thread-safe keyed store with named secondary indexes.
//! - **[`selector`]**: equality-based attribute selectors for list queries.
//! - **[`reflector`]**: list-then-watch reconcile loop with backoff.

pub mod reflector;
pub mod selector;
pub mod store;

pub use reflector::Reflector;
pub use selector::{Labeled, Selector, SelectorError};
pub use store::{Keyed, Store};

use std::fmt::Debug;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use crossbeam_channel::Receiver;
use thiserror::Error;

/// A single change notification delivered by a watch session.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<T> {
    Added(T),
    Modified(T),
    Deleted(T),
    /// Terminal error event; the consumer must relist.
    Error(EventError),
}

/// Error payload carried by [`Event::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("watch closed after {interval:?}, resync required")]
    Expired { interval: Duration },
}

impl EventError {
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}

/// A live watch session.
///
/// Single-use: once the event channel disconnects the session is finished
/// and a fresh one must be opened. Within one session at most one event is
/// ever delivered, always followed by channel closure; closure without an
/// event means the session was stopped cleanly.
pub trait Watch<T>: Send + Sync + Debug {
    /// Receive-only view of the session's event stream.
    fn events(&self) -> &Receiver<Event<T>>;

    /// Request teardown. Idempotent and safe to call concurrently with the
    /// session's own termination; returns only once no further send can
    /// race the channel close.
    fn stop(&self);
}

/// The two-operation contract a [`Reflector`] drives.
pub trait ListWatch<T> {
    /// Fetch the full authoritative snapshot.
    fn list(&self) -> anyhow::Result<Vec<T>>;

    /// Open a watch session starting at `resource_version`.
    fn watch(&self, resource_version: &str) -> anyhow::Result<Box<dyn Watch<T>>>;
}

/// Serialize the current instant as an opaque resource-version token.
pub fn resource_version_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a resource-version token.
///
/// The empty token means "no particular version" and is accepted; any other
/// value must be a valid RFC 3339 timestamp. The parsed instant carries no
/// filtering semantics, validation is an interface-conformance contract.
pub fn parse_resource_version(
    token: &str,
) -> Result<Option<DateTime<Utc>>, InvalidResourceVersion> {
    if token.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(token)
        .map(|t| Some(t.with_timezone(&Utc)))
        .map_err(|source| InvalidResourceVersion {
            token: token.to_string(),
            source,
        })
}

/// Rejected resource-version token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid resource version {token:?}: {source}")]
pub struct InvalidResourceVersion {
    token: String,
    source: chrono::ParseError,
}

impl InvalidResourceVersion {
    pub fn token(&self) -> &str {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_version_round_trips() {
        let token = resource_version_now();
        let parsed = parse_resource_version(&token).unwrap();
        assert!(parsed.is_some());
    }

    #[test]
    fn empty_resource_version_is_accepted() {
        assert_eq!(parse_resource_version("").unwrap(), None);
    }

    #[test]
    fn garbage_resource_version_is_rejected() {
        let err = parse_resource_version("not-a-timestamp").unwrap_err();
        assert_eq!(err.token(), "not-a-timestamp");
        assert!(err.to_string().contains("not-a-timestamp"));
    }

    #[test]
    fn expiry_event_names_the_interval() {
        let err = EventError::Expired {
            interval: Duration::from_millis(50),
        };
        assert!(err.is_expired());
        assert!(err.to_string().contains("50ms"));
    }
}
