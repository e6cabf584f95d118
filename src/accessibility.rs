//! Accessibility events and UI-node access
//!
//! The host's accessibility API is abstracted behind [`UiNode`] so the
//! actuator can be driven by a real node tree or by
//! [`crate::simulation::SimNode`].

use serde::{Deserialize, Serialize};

/// Accessibility event types the service knows by name
///
/// Raw values follow the Android `AccessibilityEvent.TYPE_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessibilityEventType {
    /// A view was clicked
    ViewClicked,
    /// A view took input focus
    ViewFocused,
    /// A window opened or changed its state
    #[default]
    WindowStateChanged,
    /// A notification was posted
    NotificationStateChanged,
    /// The content of a window changed
    WindowContentChanged,
    /// Any other event type
    Other(u32),
}

impl From<u32> for AccessibilityEventType {
    fn from(value: u32) -> Self {
        match value {
            0x0000_0001 => AccessibilityEventType::ViewClicked,
            0x0000_0008 => AccessibilityEventType::ViewFocused,
            0x0000_0020 => AccessibilityEventType::WindowStateChanged,
            0x0000_0040 => AccessibilityEventType::NotificationStateChanged,
            0x0000_0800 => AccessibilityEventType::WindowContentChanged,
            other => AccessibilityEventType::Other(other),
        }
    }
}

impl std::fmt::Display for AccessibilityEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessibilityEventType::ViewClicked => write!(f, "TYPE_VIEW_CLICKED"),
            AccessibilityEventType::ViewFocused => write!(f, "TYPE_VIEW_FOCUSED"),
            AccessibilityEventType::WindowStateChanged => write!(f, "TYPE_WINDOW_STATE_CHANGED"),
            AccessibilityEventType::NotificationStateChanged => {
                write!(f, "TYPE_NOTIFICATION_STATE_CHANGED")
            }
            AccessibilityEventType::WindowContentChanged => {
                write!(f, "TYPE_WINDOW_CONTENT_CHANGED")
            }
            AccessibilityEventType::Other(raw) => write!(f, "TYPE_UNKNOWN({:#x})", raw),
        }
    }
}

/// An accessibility event delivered by the host
///
/// Borrowed by the service for the duration of one callback.
#[derive(Debug, Clone)]
pub struct AccessibilityEvent<N> {
    /// Event type tag
    pub event_type: AccessibilityEventType,
    /// Package name of the application that produced the event
    pub package_name: String,
    /// Root of the UI node tree involved, if the host exposes one
    pub source: Option<N>,
}

impl<N> AccessibilityEvent<N> {
    /// Creates an event without a source node
    pub fn new(event_type: AccessibilityEventType, package_name: impl Into<String>) -> Self {
        Self {
            event_type,
            package_name: package_name.into(),
            source: None,
        }
    }

    /// Attaches a source node to the event
    pub fn with_source(mut self, source: N) -> Self {
        self.source = Some(source);
        self
    }
}

/// Errors raised by node queries and actions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("Node is no longer attached to a window")]
    Detached,

    #[error("Node rejected the action")]
    ActionRejected,

    #[error("Accessibility platform error: {0}")]
    Platform(String),
}

/// A node in the host's UI accessibility tree
pub trait UiNode: Sized {
    /// Fully qualified view identifier, if the node has one
    fn view_id(&self) -> Option<&str>;

    /// Whether the node is in its checked/toggled-on state
    fn is_checked(&self) -> Result<bool, NodeError>;

    /// Finds descendants whose view identifier equals `view_id`
    fn find_by_view_id(&self, view_id: &str) -> Result<Vec<Self>, NodeError>;

    /// Performs the primary (click) action on the node
    fn perform_click(&self) -> Result<(), NodeError>;
}
