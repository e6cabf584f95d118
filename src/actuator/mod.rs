//! Control actuator
//!
//! Performs the two side effects of the service:
//!
//! - **Hands-free activation**: finds the in-call speaker toggle in a UI node
//!   tree and clicks it once if it is off ([`handsfree`]).
//! - **Volume normalization**: raises each configured stream channel to its
//!   maximum with a bounded retry loop ([`volume`]).
//!
//! The actuator keeps no state between calls. The audio subsystem is injected
//! at construction so tests can substitute [`crate::simulation::SimMixer`].

pub mod handsfree;
pub mod volume;

pub use handsfree::{activate_hands_free, HandsFreeOutcome};
pub use volume::{
    normalize_channel, normalize_volumes, ChannelOutcome, ChannelReport, NormalizationReport,
    RaiseStrategy, MAX_ATTEMPTS,
};

use crate::accessibility::UiNode;
use crate::audio::{AudioSubsystem, StreamChannel};
use crate::config::Config;

/// Stateless executor for hands-free activation and volume normalization
pub struct ControlActuator<A> {
    audio: A,
    hands_free_view_id: String,
    channels: Vec<StreamChannel>,
    strategy: RaiseStrategy,
}

impl<A: AudioSubsystem> ControlActuator<A> {
    /// Creates an actuator using the identifiers and channels from `config`
    pub fn new(audio: A, config: &Config) -> Self {
        Self {
            audio,
            hands_free_view_id: config.call_ui.hands_free_view_id.clone(),
            channels: config.volume.channels.clone(),
            strategy: config.volume.strategy,
        }
    }

    /// The injected audio subsystem
    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Channels normalized on every pass, in order
    pub fn channels(&self) -> &[StreamChannel] {
        &self.channels
    }

    /// Active raise strategy
    pub fn strategy(&self) -> RaiseStrategy {
        self.strategy
    }

    /// Switches the hands-free control under `root` on if it is off
    pub fn activate_hands_free<N: UiNode>(&self, root: &N) -> HandsFreeOutcome {
        activate_hands_free(root, &self.hands_free_view_id)
    }

    /// Raises every configured channel to its maximum
    pub fn normalize_volumes(&self) -> NormalizationReport {
        let report = normalize_volumes(&self.audio, &self.channels, self.strategy);
        let exhausted = report.exhausted();
        if exhausted.is_empty() {
            tracing::debug!("Volume check finished for {} channels", report.channels.len());
        } else {
            tracing::warn!("Volume check left channels below max: {:?}", exhausted);
        }
        report
    }
}
