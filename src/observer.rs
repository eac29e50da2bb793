//! Observer bus for re-broadcasting producer records.
//!
//! Observers see every intermediate record under its discriminator, failures
//! under `error`, and the resolved value under `end`. Observers never affect
//! how a call resolves, and events already sent are not retracted when a
//! call later fails.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::protocol::ProtocolRecord;

/// Event name for failure records.
pub const ERROR_EVENT: &str = "error";

/// Event name for the resolved call value.
pub const END_EVENT: &str = "end";

/// Returns true for event names the bus reserves for call outcomes.
#[must_use]
pub fn is_reserved_event(name: &str) -> bool {
    name == ERROR_EVENT || name == END_EVENT
}

/// Default number of buffered events per subscriber.
pub const DEFAULT_OBSERVER_CAPACITY: usize = 256;

/// An event delivered to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverEvent {
    /// Record discriminator, `error`, or `end`.
    pub name: String,
    /// When the producer emitted the record, or when the event was created.
    pub timestamp: DateTime<Utc>,
    /// Record fields minus `time`, `level` and `msg`.
    pub fields: Map<String, Value>,
}

impl ObserverEvent {
    /// Create an event from a decoded record under the given name.
    #[must_use]
    pub fn from_record(name: impl Into<String>, record: &ProtocolRecord) -> Self {
        Self {
            name: name.into(),
            timestamp: record.timestamp().unwrap_or_else(Utc::now),
            fields: record.fields(),
        }
    }

    /// Create the `end` event carrying the resolved value.
    #[must_use]
    pub fn end(value: Value) -> Self {
        let mut fields = Map::new();
        fields.insert("value".to_string(), value);
        Self {
            name: END_EVENT.to_string(),
            timestamp: Utc::now(),
            fields,
        }
    }

    /// The resolved value of an `end` event.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.fields.get("value")
    }
}

/// Cloneable broadcast handle shared between a publisher and its observers.
#[derive(Debug, Clone)]
pub struct ObserverBus {
    tx: broadcast::Sender<ObserverEvent>,
}

impl Default for ObserverBus {
    fn default() -> Self {
        Self::new(DEFAULT_OBSERVER_CAPACITY)
    }
}

impl ObserverBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to every event.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ObserverEvent> {
        self.tx.subscribe()
    }

    /// Subscribe to events with a single name.
    pub fn events(&self, name: impl Into<String>) -> impl Stream<Item = ObserverEvent> {
        let name = name.into();
        BroadcastStream::new(self.tx.subscribe()).filter_map(move |event| match event {
            Ok(event) if event.name == name => Some(event),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Observer lagged, events dropped");
                None
            }
        })
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Broadcast an event. Having no subscribers is not an error.
    pub fn emit(&self, event: ObserverEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No observers subscribed");
        }
    }
}
