//! Physical key events forwarded by the host

use serde::{Deserialize, Serialize};

/// Key codes the service reacts to
///
/// Raw values follow the Android `KeyEvent.KEYCODE_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCode {
    VolumeUp,
    VolumeDown,
    VolumeMute,
    Other(u32),
}

impl KeyCode {
    /// Returns whether this is one of the hardware volume keys
    pub fn is_volume_key(&self) -> bool {
        matches!(
            self,
            KeyCode::VolumeUp | KeyCode::VolumeDown | KeyCode::VolumeMute
        )
    }
}

impl From<u32> for KeyCode {
    fn from(value: u32) -> Self {
        match value {
            24 => KeyCode::VolumeUp,
            25 => KeyCode::VolumeDown,
            164 => KeyCode::VolumeMute,
            other => KeyCode::Other(other),
        }
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyCode::VolumeUp => write!(f, "KEYCODE_VOLUME_UP"),
            KeyCode::VolumeDown => write!(f, "KEYCODE_VOLUME_DOWN"),
            KeyCode::VolumeMute => write!(f, "KEYCODE_VOLUME_MUTE"),
            KeyCode::Other(raw) => write!(f, "KEYCODE_{}", raw),
        }
    }
}

/// Whether the key went down or came back up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    #[default]
    Down,
    Up,
}

/// A key event delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub code: KeyCode,
    #[serde(default)]
    pub action: KeyAction,
}

impl KeyEvent {
    /// Key-down event for `code`
    pub fn down(code: KeyCode) -> Self {
        Self {
            code,
            action: KeyAction::Down,
        }
    }

    /// Key-up event for `code`
    pub fn up(code: KeyCode) -> Self {
        Self {
            code,
            action: KeyAction::Up,
        }
    }

    /// Returns whether this event is a volume key being pressed
    pub fn is_volume_press(&self) -> bool {
        self.code.is_volume_key() && self.action == KeyAction::Down
    }
}
