//! Audio stream channels and the audio-subsystem seam
//!
//! Levels are integers on a channel-specific scale and are never cached: every
//! call goes back to the [`AudioSubsystem`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Logical audio stream category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamChannel {
    /// In-call voice
    VoiceCall,
    /// Notification sounds
    Notification,
    /// Phone ringer
    Ring,
    /// System sounds
    System,
    /// Alarms
    Alarm,
    /// Media playback
    Music,
}

impl StreamChannel {
    /// Every channel, in the default processing order
    pub const ALL: [StreamChannel; 6] = [
        StreamChannel::VoiceCall,
        StreamChannel::Notification,
        StreamChannel::Alarm,
        StreamChannel::Ring,
        StreamChannel::System,
        StreamChannel::Music,
    ];

    /// Stable snake_case name, matching the serialised form
    pub fn name(&self) -> &'static str {
        match self {
            StreamChannel::VoiceCall => "voice_call",
            StreamChannel::Notification => "notification",
            StreamChannel::Ring => "ring",
            StreamChannel::System => "system",
            StreamChannel::Alarm => "alarm",
            StreamChannel::Music => "music",
        }
    }
}

impl std::fmt::Display for StreamChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors reported by the audio subsystem
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    #[error("Permission denied for {0} stream")]
    PermissionDenied(StreamChannel),

    #[error("{0} stream is not supported on this device")]
    Unsupported(StreamChannel),

    #[error("Audio subsystem failure: {0}")]
    Failure(String),
}

impl AudioError {
    /// Permanent errors resolve the channel; transient ones consume an attempt
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            AudioError::PermissionDenied(_) | AudioError::Unsupported(_)
        )
    }
}

/// Access to per-stream volume levels
pub trait AudioSubsystem {
    /// Current level of `channel`
    fn stream_volume(&self, channel: StreamChannel) -> Result<u32, AudioError>;

    /// Maximum level of `channel`
    fn stream_max_volume(&self, channel: StreamChannel) -> Result<u32, AudioError>;

    /// Sets `channel` to `level`
    fn set_stream_volume(&self, channel: StreamChannel, level: u32) -> Result<(), AudioError>;

    /// Raises `channel` by one step
    fn raise_stream_volume(&self, channel: StreamChannel) -> Result<(), AudioError>;
}

impl<T: AudioSubsystem + ?Sized> AudioSubsystem for Arc<T> {
    fn stream_volume(&self, channel: StreamChannel) -> Result<u32, AudioError> {
        (**self).stream_volume(channel)
    }

    fn stream_max_volume(&self, channel: StreamChannel) -> Result<u32, AudioError> {
        (**self).stream_max_volume(channel)
    }

    fn set_stream_volume(&self, channel: StreamChannel, level: u32) -> Result<(), AudioError> {
        (**self).set_stream_volume(channel, level)
    }

    fn raise_stream_volume(&self, channel: StreamChannel) -> Result<(), AudioError> {
        (**self).raise_stream_volume(channel)
    }
}
