//! Call automation service
//!
//! Reacts to the callbacks of the host's accessibility-automation API:
//!
//! - accessibility events from the in-call UI switch the hands-free control on;
//! - connecting to the event source and pressing a hardware volume key raise
//!   the configured stream channels to their maximum;
//! - lifecycle callbacks drive the published [`ServiceStatus`].
//!
//! All callbacks run to completion on the host's single callback thread and
//! never return an error. Failures are logged and dropped.

use crate::accessibility::{AccessibilityEvent, UiNode};
use crate::actuator::ControlActuator;
use crate::audio::AudioSubsystem;
use crate::config::Config;
use crate::keys::KeyEvent;
use crate::status::{LifecycleEvent, ServiceStatus, StatusCell, StatusHandle};

/// The call automation service
pub struct CallPilotService<A> {
    call_ui_package: String,
    normalize_on_volume_keys: bool,
    actuator: ControlActuator<A>,
    status: StatusCell,
}

impl<A: AudioSubsystem> CallPilotService<A> {
    /// Creates a service using `audio` for stream volumes
    ///
    /// The status starts as [`ServiceStatus::Stopped`] until the host calls
    /// [`CallPilotService::on_create`].
    pub fn new(config: &Config, audio: A) -> Self {
        Self {
            call_ui_package: config.call_ui.package_name.clone(),
            normalize_on_volume_keys: config.volume.normalize_on_volume_keys,
            actuator: ControlActuator::new(audio, config),
            status: StatusCell::new(),
        }
    }

    /// Current status
    pub fn status(&self) -> ServiceStatus {
        self.status.get()
    }

    /// Read-only status accessor for presentation layers
    pub fn status_handle(&self) -> StatusHandle {
        self.status.handle()
    }

    /// The actuator performing hands-free and volume changes
    pub fn actuator(&self) -> &ControlActuator<A> {
        &self.actuator
    }

    /// The host created the service
    pub fn on_create(&self) {
        self.status.apply(LifecycleEvent::Create);
    }

    /// The accessibility event source is connected
    ///
    /// Raises all stream volumes once, then publishes
    /// [`ServiceStatus::Running`]. Ignored unless the service is idle.
    pub fn on_service_connected(&self) {
        if !self.status.accepts(LifecycleEvent::Connected) {
            tracing::warn!(
                "Event source connected while service is {}, ignoring",
                self.status.get()
            );
            return;
        }

        self.actuator.normalize_volumes();
        self.status.apply(LifecycleEvent::Connected);
    }

    /// An accessibility event arrived
    pub fn on_accessibility_event<N: UiNode>(&self, event: &AccessibilityEvent<N>) {
        tracing::trace!(
            "onAccessibilityEvent eventType={} packageName={}",
            event.event_type,
            event.package_name
        );

        if event.package_name != self.call_ui_package {
            return;
        }

        match &event.source {
            Some(root) => {
                self.actuator.activate_hands_free(root);
            }
            None => tracing::warn!("Call UI event source is missing"),
        }
    }

    /// A physical key event arrived
    ///
    /// Always returns `false`: the key is never consumed, so the platform
    /// still applies its own volume handling.
    pub fn on_key_event(&self, event: &KeyEvent) -> bool {
        tracing::debug!("onKeyEvent: {} ({:?})", event.code, event.action);

        if self.normalize_on_volume_keys && event.is_volume_press() {
            self.actuator.normalize_volumes();
        }

        false
    }

    /// The event source reported an interruption
    pub fn on_interrupt(&self) {
        self.status.apply(LifecycleEvent::Interrupt);
    }

    /// The host is tearing the service down
    pub fn on_destroy(&self) {
        self.status.apply(LifecycleEvent::Destroy);
    }
}
