//! CallPilot - hands-free automation for phone calls
//!
//! When the in-call UI appears, the service switches the speaker (hands-free)
//! toggle on through the host's accessibility API and keeps the audio stream
//! volumes at their maximum.
//!
//! The host owns the platform glue. It builds a [`service::CallPilotService`]
//! with an [`audio::AudioSubsystem`] implementation, forwards its lifecycle,
//! accessibility and key callbacks (directly or through
//! [`host::run_event_loop`]), and reads the published status through a
//! [`status::StatusHandle`].

pub mod accessibility;
pub mod actuator;
pub mod audio;
pub mod config;
pub mod host;
pub mod keys;
pub mod logging;
pub mod service;
pub mod simulation;
pub mod status;

pub use service::CallPilotService;
pub use status::{ServiceStatus, StatusHandle};
