//! In-memory host doubles
//!
//! Stand-ins for the accessibility node tree and the audio subsystem. They
//! back the unit and integration tests and the `callpilot` replay binary.

pub mod mixer;
pub mod node;
pub mod scenario;

pub use mixer::{MixerCall, SimMixer, StreamBehavior, StreamSpec};
pub use node::{NodeSpec, SimNode};
pub use scenario::{replay, ReplayOutcome, Scenario, ScenarioError, ScenarioEvent};
