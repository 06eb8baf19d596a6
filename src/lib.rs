//! Type-indexed async event bus with concurrent fan-out dispatch
//!
//! This crate provides in-process publish/subscribe: producers dispatch typed
//! event values, and every listener registered for that exact type receives
//! one concurrent, asynchronous invocation. Producers and listeners never
//! depend on each other directly.
//!
//! ## Features
//!
//! - **Type-indexed routing** - listeners register per concrete event type
//! - **Concurrent fan-out** - one spawned task per listener per dispatch
//! - **Joinable dispatch** - fire-and-forget handle, or wait for completion
//! - **Failure isolation** - a failing listener never cancels its siblings
//! - **Thread-safe** - register, unregister, and dispatch from any task
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use typebus::*;
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! // Define an event
//! #[derive(Debug, Clone)]
//! struct UserCreated {
//!     metadata: EventMetadata,
//!     email: String,
//! }
//!
//! impl Event for UserCreated {
//!     fn event_name(&self) -> &str { &self.metadata.name }
//!     fn as_any(&self) -> &dyn std::any::Any { self }
//! }
//!
//! // Define a listener
//! struct WelcomeMailer;
//!
//! #[async_trait]
//! impl Listener<UserCreated> for WelcomeMailer {
//!     async fn on_event(&self, event: &UserCreated) -> Result<(), ListenerError> {
//!         println!("Sending welcome email to {}", event.email);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = EventBus::new();
//!
//!     // Register listener
//!     bus.register::<UserCreated, _>(Arc::new(WelcomeMailer));
//!
//!     // Dispatch without waiting...
//!     let handle = bus.dispatch(UserCreated {
//!         metadata: EventMetadata::new("user_created"),
//!         email: "alice@example.com".to_string(),
//!     });
//!     let outcome = handle.join().await;
//!
//!     // ...or dispatch and wait for every listener to finish
//!     let outcome = bus.dispatch_and_wait(UserCreated {
//!         metadata: EventMetadata::new("user_created"),
//!         email: "bob@example.com".to_string(),
//!     }).await;
//!     assert!(outcome.all_succeeded());
//! }
//! ```
//!
//! ## Multiple Listeners
//!
//! ```rust,ignore
//! // Every listener registered for the type is invoked, concurrently,
//! // in no particular order.
//! bus.register::<UserCreated, _>(Arc::new(WelcomeMailer));
//! bus.register::<UserCreated, _>(Arc::new(AnalyticsRecorder));
//! bus.register::<UserCreated, _>(Arc::new(AuditTrail));
//!
//! bus.dispatch_and_wait(event).await;
//! ```
//!
//! ## Failure Handling
//!
//! A listener that returns an error or panics never cancels its siblings.
//! Failures are logged and collected per listener on the outcome:
//!
//! ```rust,ignore
//! let outcome = bus.dispatch_and_wait(event).await;
//! for failure in &outcome.failures {
//!     eprintln!("listener {} failed: {}", failure.listener, failure.error);
//! }
//! ```
//!
//! ## Routing Semantics
//!
//! Routing is by exact type: a listener registered for `UserCreated` is never
//! invoked for any other event type, however similar. A listener interested
//! in several event types registers once per type and may share one
//! implementation across them.

pub mod bus;
pub mod directory;
pub mod dispatch;
pub mod event;

pub use bus::{EventBus, EventBusBuilder, EventBusConfig};
pub use directory::{ListenerDirectory, ListenerId};
pub use dispatch::{DispatchFailure, DispatchHandle, DispatchOutcome};
pub use event::{DynListener, Event, EventMetadata, Listener, ListenerError, TypedListener};
