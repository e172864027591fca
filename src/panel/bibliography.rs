//! Bibliography panel: browse the sources loaded for the document
//!
//! Tree: one root with a child per bibliography file. Selecting the root
//! lists every source, selecting a file lists that file's sources. The
//! panel-local search text narrows the list by id or title.

use super::{entry_for, CitationPanel, CitationPanelProps, PanelKind, PanelProvider, PanelView};
use crate::bibliography::{Bibliography, BibliographySource};
use crate::context::PickerContext;
use crate::tree::{NodeKey, TreeNode};
use std::sync::Arc;

pub(super) const PANEL_KEY: &str = "bibliography";

/// Root node key owned by the bibliography panel
pub const BIBLIOGRAPHY_ROOT: &str = "bib";

const ROOT_LABEL: &str = "My Bibliography";

#[derive(Debug, Clone)]
pub struct BibliographyPanel {
    bibliography: Arc<Bibliography>,
}

impl BibliographyPanel {
    pub fn new(bibliography: Arc<Bibliography>) -> Self {
        Self { bibliography }
    }

    /// Sources under the selected node
    fn sources_for(&self, node: Option<&TreeNode>) -> Vec<&BibliographySource> {
        let root = NodeKey::new(BIBLIOGRAPHY_ROOT);
        let Some(node) = node else {
            return self.bibliography.sources().collect();
        };
        if node.key == root {
            return self.bibliography.sources().collect();
        }

        self.bibliography
            .files
            .iter()
            .filter(|file| root.join(&file.name).contains(&node.key))
            .flat_map(|file| file.sources.iter())
            .collect()
    }

    pub(super) fn render(&self, key: &str, props: &CitationPanelProps<'_>) -> PanelView {
        let needle = props.search.trim().to_lowercase();
        let entries = self
            .sources_for(props.selected_node)
            .into_iter()
            .filter(|source| needle.is_empty() || matches_search(source, &needle))
            .map(|source| entry_for(source, props.sources_to_add))
            .collect();

        let heading = props
            .selected_node
            .map(|node| node.label.clone())
            .unwrap_or_else(|| props.ui.translate(ROOT_LABEL));

        PanelView {
            panel_key: key.to_string(),
            heading,
            prompt: None,
            entries,
        }
    }
}

fn matches_search(source: &BibliographySource, needle: &str) -> bool {
    source.id.to_lowercase().contains(needle)
        || source
            .title()
            .map(|t| t.to_lowercase().contains(needle))
            .unwrap_or(false)
}

/// Provider for the bibliography panel
#[derive(Debug, Clone, Copy, Default)]
pub struct BibliographyPanelProvider;

impl PanelProvider for BibliographyPanelProvider {
    fn key(&self) -> &'static str {
        PANEL_KEY
    }

    fn build(&self, ctx: &PickerContext, bibliography: &Arc<Bibliography>) -> CitationPanel {
        let root = bibliography.files.iter().fold(
            TreeNode::new(BIBLIOGRAPHY_ROOT, ctx.ui.translate(ROOT_LABEL)),
            |node, file| node.child(&file.name, file.title.clone()),
        );

        CitationPanel::new(
            PANEL_KEY,
            root,
            PanelKind::BibliographySearch(BibliographyPanel::new(Arc::clone(bibliography))),
        )
    }
}
