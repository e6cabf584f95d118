//! In-memory audio mixer

use crate::audio::{AudioError, AudioSubsystem, StreamChannel};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a simulated stream reacts to reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StreamBehavior {
    /// Reads and writes work
    #[default]
    Normal,
    /// Writes are accepted but the level never changes
    Stuck,
    /// Writes fail with a permission error (e.g. ring stream under Do Not Disturb)
    Denied,
    /// Reads and writes fail as unsupported
    Unsupported,
    /// The first `failures` operations fail transiently, then it behaves normally
    Flaky { failures: u32 },
    /// Reads work; the first `failures` writes fail transiently
    FlakyWrites { failures: u32 },
}

/// Initial state of one simulated stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSpec {
    pub channel: StreamChannel,
    pub current: u32,
    pub max: u32,
    #[serde(default)]
    pub behavior: StreamBehavior,
}

/// One call made against the mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerCall {
    ReadVolume(StreamChannel),
    ReadMaxVolume(StreamChannel),
    SetVolume(StreamChannel, u32),
    RaiseVolume(StreamChannel),
}

impl MixerCall {
    /// Channel the call targeted
    pub fn channel(&self) -> StreamChannel {
        match *self {
            MixerCall::ReadVolume(c)
            | MixerCall::ReadMaxVolume(c)
            | MixerCall::SetVolume(c, _)
            | MixerCall::RaiseVolume(c) => c,
        }
    }

    /// Returns whether the call tried to change a level
    pub fn is_mutation(&self) -> bool {
        matches!(self, MixerCall::SetVolume(..) | MixerCall::RaiseVolume(_))
    }
}

#[derive(Debug)]
struct SimStream {
    current: u32,
    max: u32,
    behavior: StreamBehavior,
}

impl SimStream {
    /// Consumes one pending transient failure, if any
    fn check_flaky(&mut self) -> Result<(), AudioError> {
        if let StreamBehavior::Flaky { failures } = &mut self.behavior {
            if *failures > 0 {
                *failures -= 1;
                return Err(AudioError::Failure("stream busy".to_string()));
            }
        }
        Ok(())
    }
}

/// An audio subsystem backed by memory
///
/// Channels without a stream are reported as unsupported. Every call is
/// recorded, including calls that fail.
#[derive(Debug, Default)]
pub struct SimMixer {
    streams: Mutex<HashMap<StreamChannel, SimStream>>,
    calls: Mutex<Vec<MixerCall>>,
}

impl SimMixer {
    /// Creates a mixer with no streams
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mixer from stream specs
    pub fn from_specs(specs: &[StreamSpec]) -> Self {
        let mixer = Self::new();
        for spec in specs {
            mixer.add_stream(*spec);
        }
        mixer
    }

    /// Adds or replaces a stream
    pub fn add_stream(&self, spec: StreamSpec) {
        self.streams.lock().insert(
            spec.channel,
            SimStream {
                current: spec.current.min(spec.max),
                max: spec.max,
                behavior: spec.behavior,
            },
        );
    }

    /// Sets the current level of an existing stream, as if the user moved a slider
    pub fn set_level(&self, channel: StreamChannel, level: u32) {
        if let Some(stream) = self.streams.lock().get_mut(&channel) {
            stream.current = level.min(stream.max);
        }
    }

    /// Current level of a stream, bypassing behaviors
    pub fn level(&self, channel: StreamChannel) -> Option<u32> {
        self.streams.lock().get(&channel).map(|s| s.current)
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<MixerCall> {
        self.calls.lock().clone()
    }

    /// Write attempts made against `channel`
    pub fn mutation_count(&self, channel: StreamChannel) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.is_mutation() && c.channel() == channel)
            .count()
    }

    /// Channels of all write attempts, in call order with repeats collapsed
    pub fn mutation_order(&self) -> Vec<StreamChannel> {
        let mut order: Vec<StreamChannel> = Vec::new();
        for call in self.calls.lock().iter().filter(|c| c.is_mutation()) {
            if order.last() != Some(&call.channel()) {
                order.push(call.channel());
            }
        }
        order
    }

    /// Forgets recorded calls
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn with_stream<T>(
        &self,
        call: MixerCall,
        op: impl FnOnce(&mut SimStream) -> Result<T, AudioError>,
    ) -> Result<T, AudioError> {
        self.calls.lock().push(call);

        let channel = call.channel();
        let mut streams = self.streams.lock();
        let stream = streams
            .get_mut(&channel)
            .ok_or(AudioError::Unsupported(channel))?;

        if stream.behavior == StreamBehavior::Unsupported {
            return Err(AudioError::Unsupported(channel));
        }
        stream.check_flaky()?;
        op(stream)
    }

    fn write(
        &self,
        call: MixerCall,
        apply: impl FnOnce(&mut SimStream),
    ) -> Result<(), AudioError> {
        let channel = call.channel();
        self.with_stream(call, |stream| {
            match stream.behavior {
                StreamBehavior::Denied => return Err(AudioError::PermissionDenied(channel)),
                StreamBehavior::Stuck => return Ok(()),
                StreamBehavior::FlakyWrites { failures } if failures > 0 => {
                    stream.behavior = StreamBehavior::FlakyWrites {
                        failures: failures - 1,
                    };
                    return Err(AudioError::Failure("write rejected".to_string()));
                }
                _ => {}
            }
            apply(stream);
            Ok(())
        })
    }
}

impl AudioSubsystem for SimMixer {
    fn stream_volume(&self, channel: StreamChannel) -> Result<u32, AudioError> {
        self.with_stream(MixerCall::ReadVolume(channel), |s| Ok(s.current))
    }

    fn stream_max_volume(&self, channel: StreamChannel) -> Result<u32, AudioError> {
        self.with_stream(MixerCall::ReadMaxVolume(channel), |s| Ok(s.max))
    }

    fn set_stream_volume(&self, channel: StreamChannel, level: u32) -> Result<(), AudioError> {
        self.write(MixerCall::SetVolume(channel, level), |s| {
            s.current = level.min(s.max)
        })
    }

    fn raise_stream_volume(&self, channel: StreamChannel) -> Result<(), AudioError> {
        self.write(MixerCall::RaiseVolume(channel), |s| {
            s.current = (s.current + 1).min(s.max)
        })
    }
}
