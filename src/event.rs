//! Event and listener definitions

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;
use uuid::Uuid;

/// Event trait
///
/// All events dispatched through the bus implement this trait. The bus routes
/// by the event's concrete type (`TypeId`), so the only structural requirement
/// is that the type is distinguishable at runtime; any payload fields belong
/// to the concrete event.
pub trait Event: Send + Sync + Debug + 'static {
    /// Get event name (used for logging and diagnostics)
    fn event_name(&self) -> &str;

    /// Cast to Any for checked downcasting at invocation time
    fn as_any(&self) -> &dyn Any;
}

/// Base event metadata
///
/// Optional envelope for events that want standard fields (id, name,
/// timestamp, correlation). The bus core never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event ID
    pub id: Uuid,

    /// Event name/type
    pub name: String,

    /// Timestamp when event was created
    pub timestamp: DateTime<Utc>,

    /// Optional correlation ID for tracing
    pub correlation_id: Option<Uuid>,

    /// Optional causation ID (ID of the event that caused this event)
    pub causation_id: Option<Uuid>,

    /// Custom metadata
    pub metadata: serde_json::Value,
}

impl EventMetadata {
    /// Create new event metadata
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            causation_id: None,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Set correlation ID
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Set causation ID
    pub fn with_causation_id(mut self, id: Uuid) -> Self {
        self.causation_id = Some(id);
        self
    }
}

/// Listener trait
///
/// A listener is invoked with one event of its registered type per dispatch.
/// The body runs on its own spawned task and may suspend freely (I/O, timers)
/// without blocking sibling listeners or the bus.
#[async_trait]
pub trait Listener<E: Event>: Send + Sync {
    /// Handle one event
    async fn on_event(&self, event: &E) -> Result<(), ListenerError>;
}

/// Listener invocation error
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("listener failed: {0}")]
    Failed(String),

    #[error("listener panicked: {0}")]
    Panicked(String),

    #[error("listener invoked with an event of an unexpected type")]
    TypeMismatch,
}

/// Type-erased listener
///
/// The directory stores listeners behind this trait so sets for different
/// event types share one map. Erasure is paired with the registration-time
/// `TypeId` key, so the downcast inside [`TypedListener`] only fails if the
/// directory itself routed incorrectly.
#[async_trait]
pub trait DynListener: Send + Sync {
    /// Invoke with a type-erased event
    async fn invoke(&self, event: Arc<dyn Event>) -> Result<(), ListenerError>;
}

/// Adapter from a typed [`Listener`] to [`DynListener`]
///
/// Performs a checked downcast back to the concrete event type; a mismatch is
/// reported as [`ListenerError::TypeMismatch`] rather than cast unchecked.
pub struct TypedListener<E: Event, L: Listener<E>> {
    listener: Arc<L>,
    _marker: std::marker::PhantomData<fn(E)>,
}

impl<E: Event, L: Listener<E>> TypedListener<E, L> {
    pub fn new(listener: Arc<L>) -> Self {
        Self {
            listener,
            _marker: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<E: Event, L: Listener<E> + 'static> DynListener for TypedListener<E, L> {
    async fn invoke(&self, event: Arc<dyn Event>) -> Result<(), ListenerError> {
        match event.as_any().downcast_ref::<E>() {
            Some(typed) => self.listener.on_event(typed).await,
            None => Err(ListenerError::TypeMismatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct TestEvent {
        metadata: EventMetadata,
    }

    #[derive(Debug)]
    struct OtherEvent;

    impl Event for TestEvent {
        fn event_name(&self) -> &str {
            &self.metadata.name
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl Event for OtherEvent {
        fn event_name(&self) -> &str {
            "other_event"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct NameRecorder;

    #[async_trait]
    impl Listener<TestEvent> for NameRecorder {
        async fn on_event(&self, event: &TestEvent) -> Result<(), ListenerError> {
            assert_eq!(event.event_name(), "test_event");
            Ok(())
        }
    }

    #[test]
    fn test_event_metadata() {
        let metadata = EventMetadata::new("test_event").with_correlation_id(Uuid::new_v4());

        assert_eq!(metadata.name, "test_event");
        assert!(metadata.correlation_id.is_some());
    }

    #[tokio::test]
    async fn test_typed_listener_invokes_on_matching_type() {
        let erased = TypedListener::new(Arc::new(NameRecorder));
        let event: Arc<dyn Event> = Arc::new(TestEvent {
            metadata: EventMetadata::new("test_event"),
        });

        assert!(erased.invoke(event).await.is_ok());
    }

    #[tokio::test]
    async fn test_typed_listener_rejects_mismatched_type() {
        let erased = TypedListener::new(Arc::new(NameRecorder));
        let event: Arc<dyn Event> = Arc::new(OtherEvent);

        match erased.invoke(event).await {
            Err(ListenerError::TypeMismatch) => {}
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }
}
