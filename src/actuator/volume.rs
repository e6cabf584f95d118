//! Stream volume normalization
//!
//! Drives every configured stream channel to its maximum level, one channel
//! after another. Each channel gets at most [`MAX_ATTEMPTS`] raise attempts so
//! a platform that silently ignores writes cannot stall the event thread.

use crate::audio::{AudioError, AudioSubsystem, StreamChannel};
use serde::{Deserialize, Serialize};

/// Maximum raise attempts per channel and per normalization pass
pub const MAX_ATTEMPTS: u32 = 5;

/// How a channel below its maximum is raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RaiseStrategy {
    /// Set the level straight to the maximum just read
    #[default]
    SetToMax,
    /// Raise by one step per attempt
    StepUp,
}

/// Final state of one channel after a normalization pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    /// At maximum on the first read; nothing was written
    AlreadyMax,
    /// Reached maximum after `raises` raise commands
    Raised { raises: u32 },
    /// The platform refused access or does not support the channel
    Skipped(AudioError),
    /// Still below maximum when the attempt bound ran out
    Exhausted { attempts: u32 },
}

impl ChannelOutcome {
    /// Returns whether the channel ended at its maximum level
    pub fn is_at_max(&self) -> bool {
        matches!(
            self,
            ChannelOutcome::AlreadyMax | ChannelOutcome::Raised { .. }
        )
    }
}

/// Outcome of a single channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: StreamChannel,
    pub outcome: ChannelOutcome,
}

/// Per-channel outcomes of one pass, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub channels: Vec<ChannelReport>,
}

impl NormalizationReport {
    /// Outcome recorded for `channel`, if it was processed
    pub fn outcome(&self, channel: StreamChannel) -> Option<&ChannelOutcome> {
        self.channels
            .iter()
            .find(|r| r.channel == channel)
            .map(|r| &r.outcome)
    }

    /// Returns whether every processed channel ended at maximum
    pub fn all_at_max(&self) -> bool {
        self.channels.iter().all(|r| r.outcome.is_at_max())
    }

    /// Channels whose attempt bound ran out
    pub fn exhausted(&self) -> Vec<StreamChannel> {
        self.channels
            .iter()
            .filter(|r| matches!(r.outcome, ChannelOutcome::Exhausted { .. }))
            .map(|r| r.channel)
            .collect()
    }
}

/// Normalizes every channel in `channels`, strictly in order
pub fn normalize_volumes<A: AudioSubsystem + ?Sized>(
    audio: &A,
    channels: &[StreamChannel],
    strategy: RaiseStrategy,
) -> NormalizationReport {
    let channels = channels
        .iter()
        .map(|&channel| ChannelReport {
            channel,
            outcome: normalize_channel(audio, channel, strategy),
        })
        .collect();

    NormalizationReport { channels }
}

/// Raises one channel to its maximum with a bounded number of attempts
pub fn normalize_channel<A: AudioSubsystem + ?Sized>(
    audio: &A,
    channel: StreamChannel,
    strategy: RaiseStrategy,
) -> ChannelOutcome {
    let mut attempts = 0;
    let mut raises = 0;

    while attempts < MAX_ATTEMPTS {
        let (current, max) = match read_levels(audio, channel) {
            Ok(levels) => levels,
            Err(e) if e.is_permanent() => {
                tracing::warn!("Skipping {} stream: {}", channel, e);
                return ChannelOutcome::Skipped(e);
            }
            Err(e) => {
                attempts += 1;
                tracing::warn!(
                    "Cannot read {} volume (attempt {}/{}): {}",
                    channel,
                    attempts,
                    MAX_ATTEMPTS,
                    e
                );
                continue;
            }
        };

        if current >= max {
            if raises == 0 {
                tracing::info!("{} volume is already max: {}", channel, max);
                return ChannelOutcome::AlreadyMax;
            }
            tracing::info!("{} volume reached max {} after {} raises", channel, max, raises);
            return ChannelOutcome::Raised { raises };
        }

        attempts += 1;
        raises += 1;
        tracing::info!(
            "{} volume is not max ({}/{}), adjusting (attempt {}/{})",
            channel,
            current,
            max,
            attempts,
            MAX_ATTEMPTS
        );

        if let Err(e) = raise(audio, channel, strategy, max) {
            if e.is_permanent() {
                tracing::warn!("Cannot adjust {} volume, skipping: {}", channel, e);
                return ChannelOutcome::Skipped(e);
            }
            tracing::warn!("Adjusting {} volume failed: {}", channel, e);
        }
    }

    tracing::error!(
        "{} volume adjust failed after {} attempts",
        channel,
        MAX_ATTEMPTS
    );
    ChannelOutcome::Exhausted { attempts }
}

fn read_levels<A: AudioSubsystem + ?Sized>(
    audio: &A,
    channel: StreamChannel,
) -> Result<(u32, u32), AudioError> {
    let max = audio.stream_max_volume(channel)?;
    let current = audio.stream_volume(channel)?;
    Ok((current, max))
}

fn raise<A: AudioSubsystem + ?Sized>(
    audio: &A,
    channel: StreamChannel,
    strategy: RaiseStrategy,
    max: u32,
) -> Result<(), AudioError> {
    match strategy {
        RaiseStrategy::SetToMax => audio.set_stream_volume(channel, max),
        RaiseStrategy::StepUp => audio.raise_stream_volume(channel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{SimMixer, StreamBehavior, StreamSpec};

    fn mixer(streams: &[(StreamChannel, u32, u32, StreamBehavior)]) -> SimMixer {
        let mixer = SimMixer::new();
        for &(channel, current, max, behavior) in streams {
            mixer.add_stream(StreamSpec {
                channel,
                current,
                max,
                behavior,
            });
        }
        mixer
    }

    #[test]
    fn test_already_max_issues_no_writes() {
        let mixer = mixer(&[(StreamChannel::Ring, 7, 7, StreamBehavior::Normal)]);

        let outcome = normalize_channel(&mixer, StreamChannel::Ring, RaiseStrategy::SetToMax);

        assert_eq!(outcome, ChannelOutcome::AlreadyMax);
        assert_eq!(mixer.mutation_count(StreamChannel::Ring), 0);
    }

    #[test]
    fn test_set_to_max_converges_in_one_raise() {
        let mixer = mixer(&[(StreamChannel::Music, 2, 15, StreamBehavior::Normal)]);

        let outcome = normalize_channel(&mixer, StreamChannel::Music, RaiseStrategy::SetToMax);

        assert_eq!(outcome, ChannelOutcome::Raised { raises: 1 });
        assert_eq!(mixer.level(StreamChannel::Music), Some(15));
    }

    #[test]
    fn test_step_up_uses_several_attempts() {
        let mixer = mixer(&[(StreamChannel::Alarm, 4, 7, StreamBehavior::Normal)]);

        let outcome = normalize_channel(&mixer, StreamChannel::Alarm, RaiseStrategy::StepUp);

        assert_eq!(outcome, ChannelOutcome::Raised { raises: 3 });
        assert_eq!(mixer.level(StreamChannel::Alarm), Some(7));
    }

    #[test]
    fn test_step_up_gives_up_when_gap_exceeds_bound() {
        let mixer = mixer(&[(StreamChannel::Music, 0, 15, StreamBehavior::Normal)]);

        let outcome = normalize_channel(&mixer, StreamChannel::Music, RaiseStrategy::StepUp);

        assert_eq!(outcome, ChannelOutcome::Exhausted { attempts: MAX_ATTEMPTS });
        assert_eq!(mixer.level(StreamChannel::Music), Some(5));
    }

    #[test]
    fn test_stuck_channel_is_bounded() {
        let mixer = mixer(&[(StreamChannel::Ring, 3, 7, StreamBehavior::Stuck)]);

        let outcome = normalize_channel(&mixer, StreamChannel::Ring, RaiseStrategy::SetToMax);

        assert_eq!(outcome, ChannelOutcome::Exhausted { attempts: 5 });
        assert_eq!(mixer.mutation_count(StreamChannel::Ring), 5);
        assert_eq!(mixer.level(StreamChannel::Ring), Some(3));
    }

    #[test]
    fn test_denied_write_skips_channel() {
        let mixer = mixer(&[(StreamChannel::Ring, 3, 7, StreamBehavior::Denied)]);

        let outcome = normalize_channel(&mixer, StreamChannel::Ring, RaiseStrategy::SetToMax);

        assert_eq!(
            outcome,
            ChannelOutcome::Skipped(AudioError::PermissionDenied(StreamChannel::Ring))
        );
        assert_eq!(mixer.mutation_count(StreamChannel::Ring), 1);
    }

    #[test]
    fn test_unknown_channel_is_skipped_without_writes() {
        let mixer = SimMixer::new();

        let outcome = normalize_channel(&mixer, StreamChannel::System, RaiseStrategy::SetToMax);

        assert_eq!(
            outcome,
            ChannelOutcome::Skipped(AudioError::Unsupported(StreamChannel::System))
        );
        assert_eq!(mixer.mutation_count(StreamChannel::System), 0);
    }

    #[test]
    fn test_transient_failures_are_retried() {
        let mixer = mixer(&[(
            StreamChannel::VoiceCall,
            1,
            5,
            StreamBehavior::Flaky { failures: 2 },
        )]);

        let outcome = normalize_channel(&mixer, StreamChannel::VoiceCall, RaiseStrategy::SetToMax);

        assert_eq!(outcome, ChannelOutcome::Raised { raises: 1 });
        assert_eq!(mixer.level(StreamChannel::VoiceCall), Some(5));
    }

    #[test]
    fn test_persistent_transient_failure_is_bounded() {
        let mixer = mixer(&[(
            StreamChannel::VoiceCall,
            1,
            5,
            StreamBehavior::Flaky { failures: 100 },
        )]);

        let outcome = normalize_channel(&mixer, StreamChannel::VoiceCall, RaiseStrategy::SetToMax);

        assert_eq!(outcome, ChannelOutcome::Exhausted { attempts: 5 });
        assert_eq!(mixer.mutation_count(StreamChannel::VoiceCall), 0);
    }

    #[test]
    fn test_failed_write_consumes_an_attempt() {
        let mixer = mixer(&[(
            StreamChannel::Ring,
            3,
            7,
            StreamBehavior::FlakyWrites { failures: 1 },
        )]);

        let outcome = normalize_channel(&mixer, StreamChannel::Ring, RaiseStrategy::SetToMax);

        assert_eq!(outcome, ChannelOutcome::Raised { raises: 2 });
        assert_eq!(mixer.mutation_count(StreamChannel::Ring), 2);
        assert_eq!(mixer.level(StreamChannel::Ring), Some(7));
    }

    #[test]
    fn test_writes_that_always_fail_are_bounded() {
        let mixer = mixer(&[(
            StreamChannel::Ring,
            3,
            7,
            StreamBehavior::FlakyWrites { failures: 100 },
        )]);

        let outcome = normalize_channel(&mixer, StreamChannel::Ring, RaiseStrategy::StepUp);

        assert_eq!(outcome, ChannelOutcome::Exhausted { attempts: 5 });
        assert_eq!(
            mixer.mutation_count(StreamChannel::Ring),
            MAX_ATTEMPTS as usize
        );
        assert_eq!(mixer.level(StreamChannel::Ring), Some(3));
    }

    #[test]
    fn test_failure_does_not_block_next_channel() {
        let mixer = mixer(&[
            (StreamChannel::Ring, 3, 7, StreamBehavior::Stuck),
            (StreamChannel::System, 1, 7, StreamBehavior::Normal),
        ]);

        let report = normalize_volumes(
            &mixer,
            &[StreamChannel::Ring, StreamChannel::System],
            RaiseStrategy::SetToMax,
        );

        assert_eq!(report.exhausted(), vec![StreamChannel::Ring]);
        assert_eq!(
            report.outcome(StreamChannel::System),
            Some(&ChannelOutcome::Raised { raises: 1 })
        );
        assert!(!report.all_at_max());
    }

    #[test]
    fn test_channels_processed_in_declared_order() {
        let mixer = mixer(&[
            (StreamChannel::Music, 0, 15, StreamBehavior::Normal),
            (StreamChannel::Ring, 0, 7, StreamBehavior::Normal),
            (StreamChannel::Alarm, 0, 7, StreamBehavior::Normal),
        ]);
        let order = [StreamChannel::Alarm, StreamChannel::Music, StreamChannel::Ring];

        let report = normalize_volumes(&mixer, &order, RaiseStrategy::SetToMax);

        let reported: Vec<_> = report.channels.iter().map(|r| r.channel).collect();
        assert_eq!(reported, order);
        assert_eq!(mixer.mutation_order(), order);
        assert!(report.all_at_max());
    }
}
