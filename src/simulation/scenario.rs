//! Scenario files and replay
//!
//! A scenario describes the simulated audio streams and a sequence of host
//! callbacks. [`replay`] runs it through a real [`CallPilotService`] using the
//! host dispatch path.
//!
//! ```json
//! {
//!   "streams": [{"channel": "ring", "current": 3, "max": 7}],
//!   "events": [
//!     {"type": "create"},
//!     {"type": "connected"},
//!     {"type": "accessibility", "package": "com.android.incallui",
//!      "tree": {"children": [{"id": "com.android.incallui:id/audioButton"}]}},
//!     {"type": "key", "code": "volume_up"},
//!     {"type": "destroy"}
//!   ]
//! }
//! ```

use super::mixer::{MixerCall, SimMixer, StreamSpec};
use super::node::{NodeSpec, SimNode};
use crate::accessibility::{AccessibilityEvent, AccessibilityEventType};
use crate::audio::StreamChannel;
use crate::config::Config;
use crate::host::{dispatch, HostEvent, LoopExit, LoopSummary};
use crate::keys::{KeyAction, KeyCode, KeyEvent};
use crate::service::CallPilotService;
use crate::status::{ServiceStatus, StatusChange};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Errors loading a scenario file
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One host callback in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioEvent {
    Create,
    Connected,
    Accessibility {
        package: String,
        #[serde(default)]
        event_type: AccessibilityEventType,
        #[serde(default)]
        tree: Option<NodeSpec>,
    },
    Key {
        code: KeyCode,
        #[serde(default)]
        action: KeyAction,
    },
    Interrupt,
    Destroy,
}

/// Simulated streams plus the callbacks to deliver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub streams: Vec<StreamSpec>,
    pub events: Vec<ScenarioEvent>,
}

impl Scenario {
    /// Parse a scenario from JSON text
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a scenario file
    pub fn from_path(path: &Path) -> Result<Self, ScenarioError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

/// What a replay did
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    /// Status after the last event
    pub final_status: ServiceStatus,
    /// Every status transition, in order
    pub transitions: Vec<StatusChange>,
    /// Successful clicks across all event trees
    pub clicks: u32,
    /// Every call made against the simulated mixer
    pub mixer_calls: Vec<MixerCall>,
    /// Final level of each simulated stream, in scenario order
    pub levels: Vec<(StreamChannel, u32)>,
    pub summary: LoopSummary,
}

impl ReplayOutcome {
    /// Number of write attempts made against `channel`
    pub fn mutations(&self, channel: StreamChannel) -> usize {
        self.mixer_calls
            .iter()
            .filter(|c| c.is_mutation() && c.channel() == channel)
            .count()
    }
}

fn host_event(event: &ScenarioEvent, trees: &mut Vec<SimNode>) -> HostEvent<SimNode> {
    match event {
        ScenarioEvent::Create => HostEvent::Create,
        ScenarioEvent::Connected => HostEvent::Connected,
        ScenarioEvent::Accessibility {
            package,
            event_type,
            tree,
        } => {
            let mut accessibility = AccessibilityEvent::new(*event_type, package.clone());
            if let Some(spec) = tree {
                let root = SimNode::from(spec);
                trees.push(root.clone());
                accessibility = accessibility.with_source(root);
            }
            HostEvent::Accessibility(accessibility)
        }
        ScenarioEvent::Key { code, action } => HostEvent::Key(KeyEvent {
            code: *code,
            action: *action,
        }),
        ScenarioEvent::Interrupt => HostEvent::Interrupt,
        ScenarioEvent::Destroy => HostEvent::Destroy,
    }
}

/// Replay `scenario` against a fresh service built from `config`
///
/// Events are dispatched one at a time, the same way [`crate::host::run_event_loop`]
/// does, and status changes are collected after each one. Events after a
/// destroy are not delivered; a scenario without a destroy is torn down at the
/// end.
pub fn replay(scenario: &Scenario, config: &Config) -> ReplayOutcome {
    let mixer = Arc::new(SimMixer::from_specs(&scenario.streams));
    let service = CallPilotService::new(config, Arc::clone(&mixer));
    let status_rx = service.status_handle().subscribe();

    let mut trees = Vec::new();
    let mut transitions = Vec::new();
    let mut dispatched = 0;
    let mut exit = LoopExit::Disconnected;

    for event in &scenario.events {
        let event = host_event(event, &mut trees);
        dispatched += 1;
        let alive = dispatch(&service, &event);
        transitions.extend(status_rx.try_iter());
        if !alive {
            exit = LoopExit::Destroyed;
            break;
        }
    }

    if exit == LoopExit::Destroyed {
        let skipped = scenario.events.len() - dispatched;
        if skipped > 0 {
            tracing::warn!("{} scenario events after destroy were not delivered", skipped);
        }
    } else {
        tracing::warn!("Scenario has no destroy event, tearing service down");
        service.on_destroy();
        transitions.extend(status_rx.try_iter());
    }

    ReplayOutcome {
        final_status: service.status(),
        transitions,
        clicks: trees.iter().map(SimNode::total_clicks).sum(),
        mixer_calls: mixer.calls(),
        levels: scenario
            .streams
            .iter()
            .filter_map(|s| mixer.level(s.channel).map(|level| (s.channel, level)))
            .collect(),
        summary: LoopSummary { dispatched, exit },
    }
}
