//! Serialized host event dispatch
//!
//! Hosts that receive callbacks on several threads funnel them into one
//! `crossbeam-channel` and let [`run_event_loop`] feed the service one event at
//! a time on a single thread.

use crate::accessibility::{AccessibilityEvent, UiNode};
use crate::audio::AudioSubsystem;
use crate::keys::KeyEvent;
use crate::service::CallPilotService;
use crossbeam_channel::Receiver;

/// A callback from the accessibility-automation host
#[derive(Debug, Clone)]
pub enum HostEvent<N> {
    Create,
    Connected,
    Accessibility(AccessibilityEvent<N>),
    Key(KeyEvent),
    Interrupt,
    Destroy,
}

/// Why the event loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The host delivered [`HostEvent::Destroy`]
    Destroyed,
    /// Every sender was dropped before a destroy arrived
    Disconnected,
}

/// Result of [`run_event_loop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    /// Events handed to the service, including the final destroy
    pub dispatched: usize,
    pub exit: LoopExit,
}

/// Delivers one host event to the service
///
/// Returns `false` once the service has been destroyed.
pub fn dispatch<A, N>(service: &CallPilotService<A>, event: &HostEvent<N>) -> bool
where
    A: AudioSubsystem,
    N: UiNode,
{
    match event {
        HostEvent::Create => service.on_create(),
        HostEvent::Connected => service.on_service_connected(),
        HostEvent::Accessibility(event) => service.on_accessibility_event(event),
        HostEvent::Key(key) => {
            service.on_key_event(key);
        }
        HostEvent::Interrupt => service.on_interrupt(),
        HostEvent::Destroy => {
            service.on_destroy();
            return false;
        }
    }
    true
}

/// Runs the service on the calling thread until it is destroyed
///
/// If the channel disconnects first, the service is torn down so observers
/// never see a stale status.
pub fn run_event_loop<A, N>(
    service: &CallPilotService<A>,
    events: &Receiver<HostEvent<N>>,
) -> LoopSummary
where
    A: AudioSubsystem,
    N: UiNode,
{
    let mut dispatched = 0;

    for event in events.iter() {
        dispatched += 1;
        if !dispatch(service, &event) {
            tracing::info!("Host event loop finished after {} events", dispatched);
            return LoopSummary {
                dispatched,
                exit: LoopExit::Destroyed,
            };
        }
    }

    tracing::warn!("Host event channel disconnected, tearing service down");
    service.on_destroy();
    LoopSummary {
        dispatched,
        exit: LoopExit::Disconnected,
    }
}
