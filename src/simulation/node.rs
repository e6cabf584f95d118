//! In-memory UI node tree

use crate::accessibility::{NodeError, UiNode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default)]
struct NodeState {
    checked: bool,
    detached: bool,
    click_rejected: bool,
    clicks: u32,
    click_attempts: u32,
    queries: u32,
}

#[derive(Debug)]
struct NodeInner {
    view_id: Option<String>,
    children: Vec<SimNode>,
    state: Mutex<NodeState>,
}

/// A UI node backed by memory
///
/// Clones share the same node, so a test can keep a handle to a descendant
/// and inspect it after the service has worked on the tree. A successful click
/// flips the checked state, like a real toggle button.
#[derive(Debug, Clone)]
pub struct SimNode {
    inner: Arc<NodeInner>,
}

impl SimNode {
    /// Creates a node
    pub fn new(view_id: Option<&str>, checked: bool, children: Vec<SimNode>) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                view_id: view_id.map(str::to_string),
                children,
                state: Mutex::new(NodeState {
                    checked,
                    ..Default::default()
                }),
            }),
        }
    }

    /// Creates a node with an identifier and no children
    pub fn leaf(view_id: &str, checked: bool) -> Self {
        Self::new(Some(view_id), checked, Vec::new())
    }

    /// Creates an anonymous node holding `children`
    pub fn container(children: Vec<SimNode>) -> Self {
        Self::new(None, false, children)
    }

    /// Direct children
    pub fn children(&self) -> &[SimNode] {
        &self.inner.children
    }

    /// Current checked state, bypassing failure injection
    pub fn checked_now(&self) -> bool {
        self.inner.state.lock().checked
    }

    /// Successful clicks on this node
    pub fn clicks(&self) -> u32 {
        self.inner.state.lock().clicks
    }

    /// Click attempts on this node, including rejected ones
    pub fn click_attempts(&self) -> u32 {
        self.inner.state.lock().click_attempts
    }

    /// Descendant queries issued on this node
    pub fn queries(&self) -> u32 {
        self.inner.state.lock().queries
    }

    /// Successful clicks on this node and all its descendants
    pub fn total_clicks(&self) -> u32 {
        self.clicks()
            + self
                .inner
                .children
                .iter()
                .map(SimNode::total_clicks)
                .sum::<u32>()
    }

    /// Makes every query and action on this node fail with [`NodeError::Detached`]
    pub fn set_detached(&self, detached: bool) {
        self.inner.state.lock().detached = detached;
    }

    /// Makes clicks on this node fail with [`NodeError::ActionRejected`]
    pub fn set_click_rejected(&self, rejected: bool) {
        self.inner.state.lock().click_rejected = rejected;
    }

    fn ensure_attached(&self) -> Result<(), NodeError> {
        if self.inner.state.lock().detached {
            Err(NodeError::Detached)
        } else {
            Ok(())
        }
    }

    fn collect_matches(&self, view_id: &str, out: &mut Vec<SimNode>) {
        for child in &self.inner.children {
            if child.inner.view_id.as_deref() == Some(view_id) {
                out.push(child.clone());
            }
            child.collect_matches(view_id, out);
        }
    }
}

impl UiNode for SimNode {
    fn view_id(&self) -> Option<&str> {
        self.inner.view_id.as_deref()
    }

    fn is_checked(&self) -> Result<bool, NodeError> {
        self.ensure_attached()?;
        Ok(self.inner.state.lock().checked)
    }

    fn find_by_view_id(&self, view_id: &str) -> Result<Vec<Self>, NodeError> {
        self.inner.state.lock().queries += 1;
        self.ensure_attached()?;

        let mut matches = Vec::new();
        self.collect_matches(view_id, &mut matches);
        Ok(matches)
    }

    fn perform_click(&self) -> Result<(), NodeError> {
        let mut state = self.inner.state.lock();
        state.click_attempts += 1;
        if state.detached {
            return Err(NodeError::Detached);
        }
        if state.click_rejected {
            return Err(NodeError::ActionRejected);
        }
        state.clicks += 1;
        state.checked = !state.checked;
        Ok(())
    }
}

/// Serialisable description of a node tree, used by scenario files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    pub id: Option<String>,
    pub checked: bool,
    pub detached: bool,
    pub children: Vec<NodeSpec>,
}

impl From<&NodeSpec> for SimNode {
    fn from(spec: &NodeSpec) -> Self {
        let children = spec.children.iter().map(SimNode::from).collect();
        let node = SimNode::new(spec.id.as_deref(), spec.checked, children);
        node.set_detached(spec.detached);
        node
    }
}
