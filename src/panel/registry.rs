//! Panel registry
//!
//! Awaits the bibliography load, then asks each provider for its panel in
//! order. The resulting order is the tree display order and decides which
//! panel is selected first.

use super::{CitationPanel, PanelProvider};
use crate::bibliography::{Bibliography, BibliographyLoader};
use crate::context::PickerContext;
use crate::error::{PickerError, Result};
use crate::tree::TreeNode;
use std::sync::Arc;

/// The ordered, immutable set of panels for one picker session
#[derive(Debug, Clone)]
pub struct PanelRegistry {
    panels: Vec<Arc<CitationPanel>>,
    bibliography: Arc<Bibliography>,
}

impl PanelRegistry {
    /// Load bibliography data, then build every panel
    ///
    /// No panel is constructed until the loader has completed. A loader
    /// failure yields [`PickerError::LoadFailed`] and no panels.
    pub async fn load(
        ctx: &PickerContext,
        loader: &dyn BibliographyLoader,
        providers: &[Arc<dyn PanelProvider>],
    ) -> Result<Self> {
        tracing::debug!("Awaiting bibliography loader '{}'", loader.name());
        let bibliography = loader
            .load(&ctx.ui, &ctx.document)
            .await
            .map_err(|e| PickerError::load_failed(&e))?;

        Self::build(ctx, Arc::new(bibliography), providers)
    }

    /// Build panels from already-loaded data
    pub fn build(
        ctx: &PickerContext,
        bibliography: Arc<Bibliography>,
        providers: &[Arc<dyn PanelProvider>],
    ) -> Result<Self> {
        let panels = providers
            .iter()
            .map(|provider| {
                let panel = provider.build(ctx, &bibliography);
                tracing::trace!(
                    "Provider '{}' built panel '{}' rooted at '{}'",
                    provider.key(),
                    panel.key,
                    panel.tree_node.key
                );
                panel
            })
            .collect();

        Self::from_panels(panels, bibliography)
    }

    /// Validate a panel list
    ///
    /// Panel keys must be unique and no panel root may lie inside another
    /// panel's subtree, so that routing has at most one match.
    pub fn from_panels(panels: Vec<CitationPanel>, bibliography: Arc<Bibliography>) -> Result<Self> {
        if panels.is_empty() {
            return Err(PickerError::NoPanels);
        }

        for (i, first) in panels.iter().enumerate() {
            for second in &panels[i + 1..] {
                if first.key == second.key {
                    return Err(PickerError::DuplicatePanelKey(first.key.clone()));
                }
                if first.tree_node.contains(&second.tree_node.key)
                    || second.tree_node.contains(&first.tree_node.key)
                {
                    return Err(PickerError::OverlappingPanels {
                        first: first.key.clone(),
                        second: second.key.clone(),
                    });
                }
            }
        }

        Ok(Self {
            panels: panels.into_iter().map(Arc::new).collect(),
            bibliography,
        })
    }

    pub fn panels(&self) -> &[Arc<CitationPanel>] {
        &self.panels
    }

    pub fn first(&self) -> Option<&Arc<CitationPanel>> {
        self.panels.first()
    }

    pub fn get(&self, key: &str) -> Option<&Arc<CitationPanel>> {
        self.panels.iter().find(|p| p.key == key)
    }

    /// Root nodes of every panel, in registry order
    pub fn tree_nodes(&self) -> Vec<TreeNode> {
        self.panels.iter().map(|p| p.tree_node.clone()).collect()
    }

    pub fn bibliography(&self) -> &Arc<Bibliography> {
        &self.bibliography
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bibliography::{BibliographyFile, BibliographySource};
    use crate::context::{DocumentRef, EditorUi};
    use crate::panel::{default_providers, DoiPanel, PanelKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Loader returning fixed data, counting calls
    pub(crate) struct StaticLoader {
        pub bibliography: Bibliography,
        pub calls: AtomicUsize,
    }

    impl StaticLoader {
        pub(crate) fn new(ids: &[&str]) -> Self {
            Self {
                bibliography: Bibliography::new(vec![BibliographyFile {
                    name: "refs".into(),
                    title: "refs.json".into(),
                    sources: ids.iter().map(|id| BibliographySource::new(*id)).collect(),
                }]),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BibliographyLoader for StaticLoader {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn load(&self, _ui: &EditorUi, _document: &DocumentRef) -> anyhow::Result<Bibliography> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.bibliography.clone())
        }
    }

    pub(crate) struct FailingLoader;

    #[async_trait]
    impl BibliographyLoader for FailingLoader {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn load(&self, _ui: &EditorUi, _document: &DocumentRef) -> anyhow::Result<Bibliography> {
            Err(anyhow::anyhow!("bibliography server unavailable"))
        }
    }

    fn doi_panel(key: &str, root: &str) -> CitationPanel {
        CitationPanel::new(
            key,
            TreeNode::new(root, root),
            PanelKind::DoiLookup(DoiPanel::new(Arc::default())),
        )
    }

    #[tokio::test]
    async fn test_load_builds_panels_in_order() {
        let loader = StaticLoader::new(&["smith2020"]);
        let registry = PanelRegistry::load(&PickerContext::default(), &loader, &default_providers())
            .await
            .unwrap();

        let keys: Vec<&str> = registry.panels().iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["bibliography", "doi"]);
        assert_eq!(registry.first().map(|p| p.key.as_str()), Some("bibliography"));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

        let roots: Vec<String> = registry
            .tree_nodes()
            .into_iter()
            .map(|n| n.key.to_string())
            .collect();
        assert_eq!(roots, vec!["bib", "doi"]);
        assert_eq!(registry.bibliography().sources().count(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_builds_nothing() {
        let err = PanelRegistry::load(&PickerContext::default(), &FailingLoader, &default_providers())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PickerError::LoadFailed("bibliography server unavailable".to_string())
        );
    }

    #[test]
    fn test_rejects_empty_panel_list() {
        let err = PanelRegistry::from_panels(vec![], Arc::default()).unwrap_err();
        assert_eq!(err, PickerError::NoPanels);
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let panels = vec![doi_panel("doi", "doi"), doi_panel("doi", "other")];
        let err = PanelRegistry::from_panels(panels, Arc::default()).unwrap_err();
        assert_eq!(err, PickerError::DuplicatePanelKey("doi".into()));
    }

    #[test]
    fn test_rejects_overlapping_roots() {
        let panels = vec![doi_panel("outer", "bib"), doi_panel("inner", "bib/nested")];
        let err = PanelRegistry::from_panels(panels, Arc::default()).unwrap_err();
        assert_eq!(
            err,
            PickerError::OverlappingPanels {
                first: "outer".into(),
                second: "inner".into(),
            }
        );
    }

    #[test]
    fn test_get_by_key() {
        let panels = vec![doi_panel("a", "a"), doi_panel("b", "b")];
        let registry = PanelRegistry::from_panels(panels, Arc::default()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get("b").is_some());
        assert!(registry.get("c").is_none());
    }
}
