//! Event bus facade

use crate::directory::{ListenerDirectory, ListenerId};
use crate::dispatch::{fan_out, DispatchHandle, DispatchOutcome};
use crate::event::{DynListener, Event, Listener, TypedListener};
use std::any::TypeId;
use std::sync::Arc;
use tracing::debug;

/// Event bus for in-process publish/subscribe with concurrent fan-out
///
/// The bus is an explicit value: construct one at startup and pass clones to
/// producers and registration sites (clones share the same directory). It is
/// safe to call from any number of concurrent tasks without external locking.
#[derive(Clone)]
pub struct EventBus {
    /// Listeners registered for each event type
    directory: Arc<ListenerDirectory>,

    /// Configuration
    config: Arc<EventBusConfig>,
}

/// Event bus configuration
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Emit structured logs for register/unregister/dispatch
    pub enable_logging: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
        }
    }
}

impl EventBus {
    /// Create new event bus
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create event bus with custom config
    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            directory: Arc::new(ListenerDirectory::new()),
            config: Arc::new(config),
        }
    }

    /// Create an event bus builder
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::new()
    }

    /// Register a listener for events of type `E`
    ///
    /// Registering the same `Arc` twice under the same type is idempotent:
    /// the listener is still invoked exactly once per dispatch.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let bus = EventBus::new();
    /// let listener = Arc::new(MyListener::new());
    /// bus.register::<MyEvent, _>(listener);
    /// ```
    pub fn register<E, L>(&self, listener: Arc<L>)
    where
        E: Event,
        L: Listener<E> + 'static,
    {
        let type_id = TypeId::of::<E>();
        let id = ListenerId::of(&listener);
        let erased: Arc<dyn DynListener> = Arc::new(TypedListener::new(listener));

        self.directory.insert(type_id, id, erased);

        if self.config.enable_logging {
            debug!(event_type = ?type_id, listener = %id, "registered listener");
        }
    }

    /// Unregister a listener for events of type `E`
    ///
    /// A no-op if the listener was never registered for `E`. In-flight
    /// dispatches that already snapshotted the listener still complete; no
    /// new dispatch will invoke it.
    pub fn unregister<E, L>(&self, listener: &Arc<L>)
    where
        E: Event,
        L: Listener<E> + 'static,
    {
        let type_id = TypeId::of::<E>();
        let id = ListenerId::of(listener);

        self.directory.remove(type_id, id);

        if self.config.enable_logging {
            debug!(event_type = ?type_id, listener = %id, "unregistered listener");
        }
    }

    /// Dispatch an event to all listeners registered for its type
    ///
    /// Snapshots the current listener set and spawns one task per listener;
    /// returns the handle immediately. Dispatching with no listeners
    /// registered is a successful no-op (an already-complete handle).
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let handle = bus.dispatch(MyEvent::new("data"));
    /// let outcome = handle.join().await;
    /// ```
    pub fn dispatch<E: Event>(&self, event: E) -> DispatchHandle {
        let snapshot = self.directory.snapshot(TypeId::of::<E>());

        if self.config.enable_logging {
            debug!(
                event = event.event_name(),
                listeners = snapshot.len(),
                "dispatching event"
            );
        }

        let event: Arc<dyn Event> = Arc::new(event);
        fan_out(event, snapshot)
    }

    /// Dispatch an event and wait until every listener has finished
    ///
    /// Identical fan-out to [`dispatch`](EventBus::dispatch); the listeners
    /// still run concurrently with each other, so the await is bounded by the
    /// slowest listener, not the sum. Returns only after every snapshotted
    /// listener completed; the outcome reports any failures.
    pub async fn dispatch_and_wait<E: Event>(&self, event: E) -> DispatchOutcome {
        self.dispatch(event).join().await
    }

    /// Number of listeners currently registered for `E`
    pub fn listener_count<E: Event>(&self) -> usize {
        self.directory.len(TypeId::of::<E>())
    }

    /// Ids of listeners currently registered for `E` (introspection/debug)
    pub fn listener_ids<E: Event>(&self) -> Vec<ListenerId> {
        self.directory.ids(TypeId::of::<E>())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event bus builder
pub struct EventBusBuilder {
    config: EventBusConfig,
}

impl EventBusBuilder {
    /// Create new event bus builder
    pub fn new() -> Self {
        Self {
            config: EventBusConfig::default(),
        }
    }

    /// Enable/disable structured logging
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Build the event bus
    pub fn build(self) -> EventBus {
        EventBus::with_config(self.config)
    }
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}
