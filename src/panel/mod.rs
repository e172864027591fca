//! Citation panels
//!
//! A panel is a category provider: it owns exactly one root [`TreeNode`] of
//! the catalog and knows how to describe its own UI for whatever node inside
//! that subtree is selected.
//!
//! # Architecture
//!
//! ```text
//! PanelProvider ──build──▶ CitationPanel { key, tree_node, kind }
//!                                          │
//!                          render(props) ──┴──▶ PanelView (plain data)
//! ```
//!
//! Panel variants form a closed set ([`PanelKind`]). Routing only ever looks
//! at `key` and `tree_node`, never at the variant.
//!
//! Panels do not call back into the picker. Each [`PanelEntry`] carries the
//! source it offers; the host turns a user's choice into
//! [`PickerEvent::SourceAdded`](crate::picker::PickerEvent::SourceAdded).

use crate::bibliography::{Bibliography, BibliographySource};
use crate::context::{EditorUi, PickerContext};
use crate::tree::TreeNode;
use serde::Serialize;
use std::sync::Arc;

mod bibliography;
mod doi;
pub mod registry;

pub use bibliography::{BibliographyPanel, BibliographyPanelProvider, BIBLIOGRAPHY_ROOT};
pub use doi::{DoiPanel, DoiPanelProvider, DOI_ROOT};
pub use registry::PanelRegistry;

/// Properties handed to a panel when it renders
#[derive(Debug, Clone, Copy)]
pub struct CitationPanelProps<'a> {
    pub ui: &'a EditorUi,
    pub selected_node: Option<&'a TreeNode>,
    /// Current accumulated sources, most recent first
    pub sources_to_add: &'a [BibliographySource],
    /// Panel-local search text
    pub search: &'a str,
}

/// One row offered by a panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelEntry {
    /// `@id` form shown to the user
    pub display_key: String,
    pub title: Option<String>,
    /// Whether the source is already in the accumulated list
    pub added: bool,
    #[serde(skip)]
    pub source: BibliographySource,
}

/// Framework-free description of a panel's UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub panel_key: String,
    pub heading: String,
    /// Input prompt for panels that take a query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub entries: Vec<PanelEntry>,
}

/// The closed set of panel variants
#[derive(Debug, Clone)]
pub enum PanelKind {
    BibliographySearch(BibliographyPanel),
    DoiLookup(DoiPanel),
}

impl PanelKind {
    pub fn name(&self) -> &'static str {
        match self {
            PanelKind::BibliographySearch(_) => "bibliography-search",
            PanelKind::DoiLookup(_) => "doi-lookup",
        }
    }
}

/// A category provider and the subtree it owns
#[derive(Debug, Clone)]
pub struct CitationPanel {
    pub key: String,
    pub tree_node: TreeNode,
    pub kind: PanelKind,
}

impl CitationPanel {
    pub fn new(key: impl Into<String>, tree_node: TreeNode, kind: PanelKind) -> Self {
        Self {
            key: key.into(),
            tree_node,
            kind,
        }
    }

    pub fn render(&self, props: &CitationPanelProps<'_>) -> PanelView {
        match &self.kind {
            PanelKind::BibliographySearch(panel) => panel.render(&self.key, props),
            PanelKind::DoiLookup(panel) => panel.render(&self.key, props),
        }
    }
}

/// Builds one panel once bibliography data is available
///
/// Providers are invoked in registry order, exactly once per session.
pub trait PanelProvider: Send + Sync {
    /// Stable key of the panel this provider builds
    fn key(&self) -> &'static str;

    fn build(&self, ctx: &PickerContext, bibliography: &Arc<Bibliography>) -> CitationPanel;
}

/// Built-in providers in their default display order
pub fn default_providers() -> Vec<Arc<dyn PanelProvider>> {
    vec![
        Arc::new(BibliographyPanelProvider),
        Arc::new(DoiPanelProvider),
    ]
}

/// Built-in providers in a configured order
///
/// Unknown names are skipped with a warning. An empty result falls back to
/// [`default_providers`].
pub fn providers_by_name(order: &[String]) -> Vec<Arc<dyn PanelProvider>> {
    let mut providers: Vec<Arc<dyn PanelProvider>> = Vec::new();
    for name in order {
        match name.as_str() {
            bibliography::PANEL_KEY => providers.push(Arc::new(BibliographyPanelProvider)),
            doi::PANEL_KEY => providers.push(Arc::new(DoiPanelProvider)),
            other => tracing::warn!("Unknown citation panel '{}' ignored", other),
        }
    }
    if providers.is_empty() {
        return default_providers();
    }
    providers
}

/// Build an entry for a source, flagging it if already accumulated
pub(crate) fn entry_for(source: &BibliographySource, added: &[BibliographySource]) -> PanelEntry {
    PanelEntry {
        display_key: crate::accumulator::for_display(&source.id),
        title: source.title().map(str::to_string),
        added: added.iter().any(|s| s.id == source.id),
        source: source.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_is_bibliography_then_doi() {
        let keys: Vec<&str> = default_providers().iter().map(|p| p.key()).collect();
        assert_eq!(keys, vec!["bibliography", "doi"]);
    }

    #[test]
    fn test_providers_by_name_follows_config_order() {
        let order = vec!["doi".to_string(), "crossref".to_string(), "bibliography".to_string()];
        let keys: Vec<&str> = providers_by_name(&order).iter().map(|p| p.key()).collect();
        assert_eq!(keys, vec!["doi", "bibliography"]);
    }

    #[test]
    fn test_providers_by_name_empty_falls_back() {
        let keys: Vec<&str> = providers_by_name(&["nope".to_string()])
            .iter()
            .map(|p| p.key())
            .collect();
        assert_eq!(keys, vec!["bibliography", "doi"]);
    }

    #[test]
    fn test_entry_flags_added_sources() {
        let source = BibliographySource::new("smith2020").with_field("title", "On Citations");
        let added = vec![BibliographySource::new("smith2020")];

        let entry = entry_for(&source, &added);
        assert_eq!(entry.display_key, "@smith2020");
        assert_eq!(entry.title.as_deref(), Some("On Citations"));
        assert!(entry.added);
        assert!(!entry_for(&source, &[]).added);
    }
}
