//! Hands-free (speaker) control activation
//!
//! Finds the in-call speaker toggle below the event's root node and clicks it
//! once if it is not already on. Failures are logged and abandoned for the
//! current event; the next call-UI event runs the whole procedure again.

use crate::accessibility::{NodeError, UiNode};

/// What happened to the hands-free control for one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandsFreeOutcome {
    /// No node with the control identifier below the root
    ControlNotFound,
    /// The control was already toggled on; nothing was clicked
    AlreadyOn,
    /// The control was off and has been clicked once
    Activated,
    /// A query or the click failed
    Failed(NodeError),
}

impl HandsFreeOutcome {
    /// Returns whether a click was issued
    pub fn clicked(&self) -> bool {
        matches!(self, HandsFreeOutcome::Activated)
    }
}

/// Switches the hands-free control under `root` on
pub fn activate_hands_free<N: UiNode>(root: &N, view_id: &str) -> HandsFreeOutcome {
    match try_activate(root, view_id) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Failed to activate hands-free control {}: {}", view_id, e);
            HandsFreeOutcome::Failed(e)
        }
    }
}

fn try_activate<N: UiNode>(root: &N, view_id: &str) -> Result<HandsFreeOutcome, NodeError> {
    let Some(control) = root.find_by_view_id(view_id)?.into_iter().next() else {
        tracing::debug!("No hands-free control ({}) on this screen", view_id);
        return Ok(HandsFreeOutcome::ControlNotFound);
    };

    tracing::debug!("Found hands-free control: {}", view_id);

    if control.is_checked()? {
        tracing::debug!("Hands-free is already on");
        return Ok(HandsFreeOutcome::AlreadyOn);
    }

    tracing::info!("Hands-free is off, performing click");
    control.perform_click()?;
    Ok(HandsFreeOutcome::Activated)
}
