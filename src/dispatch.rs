//! Fan-out dispatch engine and the joinable dispatch handle

use crate::directory::ListenerId;
use crate::event::{DynListener, Event, ListenerError};
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::error;

/// One failed listener invocation within a fan-out
#[derive(Debug)]
pub struct DispatchFailure {
    /// Identity of the listener that failed
    pub listener: ListenerId,

    /// The error it failed with (panics surface as [`ListenerError::Panicked`])
    pub error: ListenerError,
}

/// Result of a joined fan-out
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Listeners that completed without error
    pub delivered: usize,

    /// Listeners that returned an error or panicked
    pub failures: Vec<DispatchFailure>,
}

impl DispatchOutcome {
    /// True when every snapshotted listener completed without error.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of listener invocations covered by this dispatch.
    pub fn total(&self) -> usize {
        self.delivered + self.failures.len()
    }
}

/// Handle over one fan-out operation
///
/// Covers every listener snapshotted at dispatch time. The spawned tasks run
/// whether or not the handle is awaited; dropping the handle detaches them
/// (it does not cancel them). [`join`](DispatchHandle::join) waits for all of
/// them and reports per-listener outcomes.
#[must_use = "listener tasks run detached unless the handle is joined"]
pub struct DispatchHandle {
    event_name: String,
    tasks: Vec<(ListenerId, JoinHandle<Result<(), ListenerError>>)>,
}

impl DispatchHandle {
    /// Number of listener tasks spawned for this dispatch.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when the snapshot was empty and nothing was spawned.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Name of the dispatched event (diagnostics).
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Wait until every listener task for this dispatch has finished.
    ///
    /// Failures never cancel sibling tasks; each one is logged and collected
    /// into the outcome. A listener that panicked is reported as
    /// [`ListenerError::Panicked`]. The await completes once the slowest
    /// listener does, since all tasks run concurrently.
    pub async fn join(self) -> DispatchOutcome {
        let (ids, handles): (Vec<_>, Vec<_>) = self.tasks.into_iter().unzip();
        let mut outcome = DispatchOutcome::default();

        for (listener, result) in ids.into_iter().zip(join_all(handles).await) {
            let error = match result {
                Ok(Ok(())) => {
                    outcome.delivered += 1;
                    continue;
                }
                Ok(Err(e)) => e,
                Err(join_error) => ListenerError::Panicked(join_error.to_string()),
            };

            error!(
                event = %self.event_name,
                %listener,
                %error,
                "listener invocation failed"
            );
            outcome.failures.push(DispatchFailure { listener, error });
        }

        outcome
    }
}

/// Spawn one independent task per snapshotted listener.
///
/// Every task shares the same `Arc`'d event. Returns before any listener
/// necessarily starts executing; an empty snapshot yields an already-complete
/// handle.
pub(crate) fn fan_out(
    event: Arc<dyn Event>,
    snapshot: Vec<(ListenerId, Arc<dyn DynListener>)>,
) -> DispatchHandle {
    let event_name = event.event_name().to_string();
    let tasks = snapshot
        .into_iter()
        .map(|(id, listener)| {
            let event = event.clone();
            (id, tokio::spawn(async move { listener.invoke(event).await }))
        })
        .collect();

    DispatchHandle { event_name, tasks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::any::Any;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    struct Tick;

    impl Event for Tick {
        fn event_name(&self) -> &str {
            "tick"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Counting {
        counter: Arc<AtomicU32>,
    }

    #[async_trait]
    impl DynListener for Counting {
        async fn invoke(&self, _event: Arc<dyn Event>) -> Result<(), ListenerError> {
            self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl DynListener for Failing {
        async fn invoke(&self, _event: Arc<dyn Event>) -> Result<(), ListenerError> {
            Err(ListenerError::Failed("boom".into()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl DynListener for Panicking {
        async fn invoke(&self, _event: Arc<dyn Event>) -> Result<(), ListenerError> {
            panic!("listener blew up");
        }
    }

    struct Slow {
        counter: Arc<AtomicU32>,
    }

    #[async_trait]
    impl DynListener for Slow {
        async fn invoke(&self, _event: Arc<dyn Event>) -> Result<(), ListenerError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn entry(listener: Arc<dyn DynListener>) -> (ListenerId, Arc<dyn DynListener>) {
        (ListenerId::of(&listener), listener)
    }

    #[tokio::test]
    async fn test_empty_snapshot_completes_immediately() {
        let handle = fan_out(Arc::new(Tick), Vec::new());

        assert!(handle.is_empty());
        let outcome = handle.join().await;
        assert_eq!(outcome.total(), 0);
        assert!(outcome.all_succeeded());
    }

    #[tokio::test]
    async fn test_failure_does_not_cancel_siblings() {
        let counter = Arc::new(AtomicU32::new(0));
        let snapshot = vec![
            entry(Arc::new(Counting {
                counter: counter.clone(),
            })),
            entry(Arc::new(Failing)),
            entry(Arc::new(Counting {
                counter: counter.clone(),
            })),
        ];

        let outcome = fan_out(Arc::new(Tick), snapshot).join().await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.delivered, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(outcome.failures[0].error, ListenerError::Failed(_)));
    }

    #[tokio::test]
    async fn test_panic_is_captured_not_propagated() {
        let counter = Arc::new(AtomicU32::new(0));
        let snapshot = vec![
            entry(Arc::new(Panicking)),
            entry(Arc::new(Counting {
                counter: counter.clone(),
            })),
        ];

        let outcome = fan_out(Arc::new(Tick), snapshot).join().await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(
            outcome.failures[0].error,
            ListenerError::Panicked(_)
        ));
    }

    #[tokio::test]
    async fn test_listeners_run_concurrently_not_sequentially() {
        let counter = Arc::new(AtomicU32::new(0));
        let snapshot = (0..8)
            .map(|_| {
                entry(Arc::new(Slow {
                    counter: counter.clone(),
                }))
            })
            .collect();

        let started = tokio::time::Instant::now();
        let outcome = fan_out(Arc::new(Tick), snapshot).join().await;
        let elapsed = started.elapsed();

        assert_eq!(outcome.delivered, 8);
        // Eight 200ms sleeps joined concurrently finish well under 8 * 200ms.
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(1200));
    }
}
