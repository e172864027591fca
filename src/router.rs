//! Panel router
//!
//! Maps the selected tree node to the panel whose subtree contains it.
//! [`resolve`] is a pure lookup; [`PanelRouter`] tracks the active panel and
//! keeps the same [`ActivePanel`] (and its local state) while the resolved
//! key does not change.

use crate::panel::CitationPanel;
use crate::tree::NodeKey;
use std::sync::Arc;

/// First panel, in registry order, whose subtree contains `key`
pub fn resolve<'a>(key: &NodeKey, panels: &'a [Arc<CitationPanel>]) -> Option<&'a Arc<CitationPanel>> {
    panels.iter().find(|panel| panel.tree_node.contains(key))
}

/// The panel currently displayed, with state that lives as long as it does
#[derive(Debug, Clone)]
pub struct ActivePanel {
    pub panel: Arc<CitationPanel>,
    /// Search text typed into the panel
    pub search: String,
}

impl ActivePanel {
    fn new(panel: Arc<CitationPanel>) -> Self {
        Self {
            panel,
            search: String::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.panel.key
    }
}

/// Outcome of routing a node selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteChange {
    /// Same panel as before; nothing replaced
    Unchanged,
    /// A different panel (or the first one) is now active
    Switched { from: Option<String>, to: String },
    /// No panel owns the node; nothing is displayed
    Cleared { from: Option<String> },
}

/// Tracks the active panel across node selections
#[derive(Debug, Clone, Default)]
pub struct PanelRouter {
    active: Option<ActivePanel>,
}

impl PanelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActivePanel> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ActivePanel> {
        self.active.as_mut()
    }

    /// Re-resolve for a newly selected node
    pub fn route(&mut self, key: &NodeKey, panels: &[Arc<CitationPanel>]) -> RouteChange {
        let resolved = resolve(key, panels);
        let from = self.active.as_ref().map(|a| a.panel.key.clone());

        match resolved {
            Some(panel) if from.as_deref() == Some(panel.key.as_str()) => {
                tracing::trace!("Node '{}' stays on panel '{}'", key, panel.key);
                RouteChange::Unchanged
            }
            Some(panel) => {
                tracing::trace!("Node '{}' routes to panel '{}'", key, panel.key);
                self.active = Some(ActivePanel::new(Arc::clone(panel)));
                RouteChange::Switched {
                    from,
                    to: panel.key.clone(),
                }
            }
            None if from.is_none() => RouteChange::Unchanged,
            None => {
                tracing::trace!("No panel owns node '{}'", key);
                self.active = None;
                RouteChange::Cleared { from }
            }
        }
    }
}
