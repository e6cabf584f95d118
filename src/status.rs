//! Published service status
//!
//! The service publishes a single coarse status value for presentation
//! layers. The lifecycle callbacks of [`crate::service::CallPilotService`] are
//! the only writers; everyone else gets a read-only [`StatusHandle`].
//!
//! ## Transitions
//!
//! ```text
//!              create                 connected
//! ┌─────────┐ ────────► ┌──────┐ ─────────────────► ┌─────────┐
//! │ STOPPED │           │ IDLE │                    │ RUNNING │
//! └─────────┘           └──────┘                    └─────────┘
//!      ▲                    │ interrupt                  │ interrupt
//!      │                    ▼                            │
//!      │  destroy     ┌─────────────┐                    │
//!      │◄─────────────│ INTERRUPTED │◄───────────────────┘
//!      │              └─────────────┘
//!      │                destroy (from any state)
//!      └──────────────────────────────────────────────────
//! ```
//!
//! `create` is accepted from every state and starts a fresh lifetime.
//! `connected` is only accepted from IDLE, so an interrupted session can never
//! go back to RUNNING without being recreated.

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pending notifications kept per subscriber before new ones are dropped
const SUBSCRIBER_CAPACITY: usize = 16;

/// Coarse status of the call automation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Not created, or torn down
    #[default]
    Stopped,
    /// Created, waiting for the event source to connect
    Idle,
    /// Connected and reacting to events
    Running,
    /// The event source reported an interruption
    Interrupted,
}

impl ServiceStatus {
    /// Returns a human-readable description of the status
    pub fn description(&self) -> &'static str {
        match self {
            ServiceStatus::Stopped => "Service is not running",
            ServiceStatus::Idle => "Service is preparing",
            ServiceStatus::Running => "Service is running",
            ServiceStatus::Interrupted => "Service was interrupted",
        }
    }

    /// Returns whether the service has been created and not torn down or interrupted
    pub fn is_active(&self) -> bool {
        matches!(self, ServiceStatus::Idle | ServiceStatus::Running)
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Stopped => write!(f, "stopped"),
            ServiceStatus::Idle => write!(f, "idle"),
            ServiceStatus::Running => write!(f, "running"),
            ServiceStatus::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Lifecycle signals delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The host instantiated the service
    Create,
    /// The accessibility event source is fully connected
    Connected,
    /// The event source reported an interruption
    Interrupt,
    /// The host is tearing the service down
    Destroy,
}

/// Computes the status that follows `event`, or `None` if the event is not
/// valid in `current`
pub fn next_status(current: ServiceStatus, event: LifecycleEvent) -> Option<ServiceStatus> {
    match (current, event) {
        (_, LifecycleEvent::Create) => Some(ServiceStatus::Idle),
        (ServiceStatus::Idle, LifecycleEvent::Connected) => Some(ServiceStatus::Running),
        (ServiceStatus::Idle | ServiceStatus::Running, LifecycleEvent::Interrupt) => {
            Some(ServiceStatus::Interrupted)
        }
        (_, LifecycleEvent::Destroy) => Some(ServiceStatus::Stopped),
        _ => None,
    }
}

/// Notification sent to subscribers on every applied transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Status before the transition
    pub previous: ServiceStatus,
    /// Status after the transition
    pub status: ServiceStatus,
    /// Lifecycle signal that caused it
    pub cause: LifecycleEvent,
    /// When the transition was applied
    pub changed_at: DateTime<Utc>,
}

struct Shared {
    status: RwLock<ServiceStatus>,
    subscribers: Mutex<Vec<Sender<StatusChange>>>,
}

/// Owned status cell
///
/// Held by the service. Only the crate can apply transitions; observers read
/// through [`StatusHandle`].
pub struct StatusCell {
    shared: Arc<Shared>,
}

impl StatusCell {
    /// Creates a cell holding [`ServiceStatus::Stopped`]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                status: RwLock::new(ServiceStatus::Stopped),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns the current status
    pub fn get(&self) -> ServiceStatus {
        *self.shared.status.read()
    }

    /// Returns a read-only handle for external observers
    pub fn handle(&self) -> StatusHandle {
        StatusHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Returns whether `event` would be accepted in the current status
    pub(crate) fn accepts(&self, event: LifecycleEvent) -> bool {
        next_status(self.get(), event).is_some()
    }

    /// Applies a lifecycle event, notifying subscribers on success
    ///
    /// Returns `None` (and leaves the status untouched) if the event is not
    /// valid in the current status.
    pub(crate) fn apply(&self, event: LifecycleEvent) -> Option<StatusChange> {
        let change = {
            let mut status = self.shared.status.write();
            let previous = *status;
            let Some(next) = next_status(previous, event) else {
                tracing::warn!("Ignoring {:?} while service is {}", event, previous);
                return None;
            };
            *status = next;
            StatusChange {
                previous,
                status: next,
                cause: event,
                changed_at: Utc::now(),
            }
        };

        tracing::info!(
            "Service status: {} -> {} ({:?})",
            change.previous,
            change.status,
            change.cause
        );

        // Dropped receivers are pruned here; full queues keep their subscriber
        self.shared
            .subscribers
            .lock()
            .retain(|tx| match tx.try_send(change) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!("Status subscriber queue full, dropping {}", change.status);
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            });

        Some(change)
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the published status
#[derive(Clone)]
pub struct StatusHandle {
    shared: Arc<Shared>,
}

impl StatusHandle {
    /// Returns the latest published status
    pub fn get(&self) -> ServiceStatus {
        *self.shared.status.read()
    }

    /// Subscribes to status changes
    ///
    /// The receiver gets the transitions applied after this call. At most
    /// 16 undrained changes are queued; later ones are dropped until the
    /// receiver catches up. [`StatusHandle::get`] always has the latest value.
    pub fn subscribe(&self) -> Receiver<StatusChange> {
        let (tx, rx) = bounded(SUBSCRIBER_CAPACITY);
        self.shared.subscribers.lock().push(tx);
        rx
    }
}

impl std::fmt::Debug for StatusHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusHandle")
            .field("status", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status_is_stopped() {
        let cell = StatusCell::new();
        assert_eq!(cell.get(), ServiceStatus::Stopped);
    }

    #[test]
    fn test_create_transitions_to_idle() {
        let cell = StatusCell::new();
        let change = cell.apply(LifecycleEvent::Create).unwrap();

        assert_eq!(change.previous, ServiceStatus::Stopped);
        assert_eq!(change.status, ServiceStatus::Idle);
        assert_eq!(cell.get(), ServiceStatus::Idle);
    }

    #[test]
    fn test_connected_transitions_idle_to_running() {
        let cell = StatusCell::new();
        cell.apply(LifecycleEvent::Create);
        let change = cell.apply(LifecycleEvent::Connected);

        assert!(change.is_some());
        assert_eq!(cell.get(), ServiceStatus::Running);
    }

    #[test]
    fn test_connected_rejected_when_stopped() {
        let cell = StatusCell::new();
        assert!(cell.apply(LifecycleEvent::Connected).is_none());
        assert_eq!(cell.get(), ServiceStatus::Stopped);
    }

    #[test]
    fn test_interrupted_cannot_return_to_running() {
        let cell = StatusCell::new();
        cell.apply(LifecycleEvent::Create);
        cell.apply(LifecycleEvent::Connected);
        cell.apply(LifecycleEvent::Interrupt);
        assert_eq!(cell.get(), ServiceStatus::Interrupted);

        assert!(!cell.accepts(LifecycleEvent::Connected));
        assert!(cell.apply(LifecycleEvent::Connected).is_none());
        assert_eq!(cell.get(), ServiceStatus::Interrupted);
    }

    #[test]
    fn test_recreate_after_interrupt_yields_idle() {
        let cell = StatusCell::new();
        cell.apply(LifecycleEvent::Create);
        cell.apply(LifecycleEvent::Interrupt);
        cell.apply(LifecycleEvent::Destroy);
        cell.apply(LifecycleEvent::Create);

        assert_eq!(cell.get(), ServiceStatus::Idle);
        assert!(cell.apply(LifecycleEvent::Connected).is_some());
    }

    #[test]
    fn test_interrupt_rejected_when_stopped() {
        assert_eq!(
            next_status(ServiceStatus::Stopped, LifecycleEvent::Interrupt),
            None
        );
        assert_eq!(
            next_status(ServiceStatus::Interrupted, LifecycleEvent::Interrupt),
            None
        );
    }

    #[test]
    fn test_destroy_accepted_from_every_status() {
        for status in [
            ServiceStatus::Stopped,
            ServiceStatus::Idle,
            ServiceStatus::Running,
            ServiceStatus::Interrupted,
        ] {
            assert_eq!(
                next_status(status, LifecycleEvent::Destroy),
                Some(ServiceStatus::Stopped)
            );
        }
    }

    #[test]
    fn test_handle_observes_latest_status() {
        let cell = StatusCell::new();
        let handle = cell.handle();
        assert_eq!(handle.get(), ServiceStatus::Stopped);

        cell.apply(LifecycleEvent::Create);
        assert_eq!(handle.get(), ServiceStatus::Idle);
    }

    #[test]
    fn test_subscriber_receives_changes_in_order() {
        let cell = StatusCell::new();
        let rx = cell.handle().subscribe();

        cell.apply(LifecycleEvent::Create);
        cell.apply(LifecycleEvent::Connected);
        cell.apply(LifecycleEvent::Destroy);

        let seen: Vec<ServiceStatus> = rx.try_iter().map(|c| c.status).collect();
        assert_eq!(
            seen,
            vec![
                ServiceStatus::Idle,
                ServiceStatus::Running,
                ServiceStatus::Stopped
            ]
        );
    }

    #[test]
    fn test_rejected_transition_not_published() {
        let cell = StatusCell::new();
        let rx = cell.handle().subscribe();

        cell.apply(LifecycleEvent::Interrupt);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let cell = StatusCell::new();
        let rx = cell.handle().subscribe();
        drop(rx);

        cell.apply(LifecycleEvent::Create);
        assert!(cell.shared.subscribers.lock().is_empty());
    }

    #[test]
    fn test_slow_subscriber_queue_is_capped() {
        let cell = StatusCell::new();
        let rx = cell.handle().subscribe();

        for _ in 0..SUBSCRIBER_CAPACITY + 4 {
            cell.apply(LifecycleEvent::Create);
        }

        assert_eq!(rx.len(), SUBSCRIBER_CAPACITY);
        assert_eq!(cell.shared.subscribers.lock().len(), 1);

        // Draining makes room again
        while rx.try_recv().is_ok() {}
        cell.apply(LifecycleEvent::Destroy);
        assert_eq!(rx.try_recv().unwrap().status, ServiceStatus::Stopped);
    }

    #[test]
    fn test_status_descriptions() {
        assert_eq!(ServiceStatus::Stopped.description(), "Service is not running");
        assert_eq!(ServiceStatus::Idle.description(), "Service is preparing");
        assert_eq!(ServiceStatus::Running.description(), "Service is running");
        assert_eq!(
            ServiceStatus::Interrupted.description(),
            "Service was interrupted"
        );
    }

    #[test]
    fn test_status_serialisation() {
        assert_eq!(
            serde_json::to_string(&ServiceStatus::Interrupted).unwrap(),
            "\"interrupted\""
        );
        assert_eq!(
            serde_json::from_str::<ServiceStatus>("\"running\"").unwrap(),
            ServiceStatus::Running
        );
    }
}
