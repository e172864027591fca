//! DOI panel: look up a source by its DOI
//!
//! Resolving a DOI against a remote registry belongs to the lookup service,
//! not the picker. The panel describes the lookup prompt and offers any
//! already-loaded source whose `DOI` field equals the typed query.

use super::{entry_for, CitationPanel, CitationPanelProps, PanelKind, PanelProvider, PanelView};
use crate::bibliography::Bibliography;
use crate::context::PickerContext;
use crate::tree::TreeNode;
use std::sync::Arc;

pub(super) const PANEL_KEY: &str = "doi";

/// Root node key owned by the DOI panel
pub const DOI_ROOT: &str = "doi";

const ROOT_LABEL: &str = "From DOI";
const PROMPT: &str = "Paste a DOI to search";

#[derive(Debug, Clone)]
pub struct DoiPanel {
    bibliography: Arc<Bibliography>,
}

impl DoiPanel {
    pub fn new(bibliography: Arc<Bibliography>) -> Self {
        Self { bibliography }
    }

    pub(super) fn render(&self, key: &str, props: &CitationPanelProps<'_>) -> PanelView {
        let query = normalize_doi(props.search);
        let entries = if query.is_empty() {
            Vec::new()
        } else {
            self.bibliography
                .sources()
                .filter(|s| s.doi().map(normalize_doi).as_deref() == Some(query.as_str()))
                .map(|s| entry_for(s, props.sources_to_add))
                .collect()
        };

        PanelView {
            panel_key: key.to_string(),
            heading: props.ui.translate(ROOT_LABEL),
            prompt: Some(props.ui.translate(PROMPT)),
            entries,
        }
    }
}

/// Lowercase and strip a `doi:` or resolver URL prefix
fn normalize_doi(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    for prefix in ["https://doi.org/", "http://doi.org/", "doi:"] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            return rest.trim().to_string();
        }
    }
    lower
}

/// Provider for the DOI panel
#[derive(Debug, Clone, Copy, Default)]
pub struct DoiPanelProvider;

impl PanelProvider for DoiPanelProvider {
    fn key(&self) -> &'static str {
        PANEL_KEY
    }

    fn build(&self, ctx: &PickerContext, bibliography: &Arc<Bibliography>) -> CitationPanel {
        CitationPanel::new(
            PANEL_KEY,
            TreeNode::new(DOI_ROOT, ctx.ui.translate(ROOT_LABEL)),
            PanelKind::DoiLookup(DoiPanel::new(Arc::clone(bibliography))),
        )
    }
}
