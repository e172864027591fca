//! Picker controller
//!
//! Orchestrates one citation-picker session: the single bibliography load,
//! routing of node selections to panels, and accumulation of the sources the
//! user wants to insert.
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──start──▶ Loading ──load ok──▶ Ready ◀─┐ node selected
//!                            │                   │  └───┘ source added / deleted
//!                            └──load err──▶ Failed│
//!        any state ──stop──▶ Closed ◀────────────┘
//! ```
//!
//! Every entry point performs one atomic transition. A load completion that
//! arrives after `stop`, or carries a stale ticket, is discarded.

use crate::accumulator::SourceAccumulator;
use crate::bibliography::BibliographySource;
use crate::context::{PickerContext, PickerSize};
use crate::error::{PickerError, Result};
use crate::panel::{CitationPanelProps, PanelRegistry, PanelView};
use crate::router::{ActivePanel, PanelRouter, RouteChange};
use crate::tree::{self, NodeKey, TreeNode};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

mod driver;

pub use driver::{run_picker, PickerEvent};

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Generate a session id for log correlation
/// Format: YYYYMMDD-HHMMSS-XXXX (timestamp + 4 random hex chars)
fn generate_session_id() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
    let random = RandomState::new().build_hasher().finish();
    format!("{}-{:04x}", timestamp, random & 0xFFFF)
}

/// Receives picker notifications on behalf of the host
pub trait PickerHost: Send + Sync {
    /// Called after every change of the accumulated sources, with the full list
    fn on_source_changed(&self, sources: &[BibliographySource]);

    /// Called once if the bibliography load fails
    fn on_load_failed(&self, error: &PickerError) {
        let _ = error;
    }

    /// Called when the host asked for a fresh view
    fn on_view(&self, view: &PickerView) {
        let _ = view;
    }
}

/// Identifies the load started by a particular `start` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket(u64);

/// Outcome of delivering a load completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready,
    Failed,
    /// Completion arrived after teardown or for another session
    Discarded,
}

/// Session state while the picker is usable
#[derive(Debug)]
pub struct ReadyState {
    registry: PanelRegistry,
    tree: Vec<TreeNode>,
    selected_node: Option<TreeNode>,
    router: PanelRouter,
    sources: SourceAccumulator,
}

#[derive(Debug)]
pub enum PickerState {
    Uninitialized,
    Loading { ticket: SessionTicket },
    Ready(Box<ReadyState>),
    Failed(PickerError),
    Closed,
}

impl PickerState {
    pub fn name(&self) -> &'static str {
        match self {
            PickerState::Uninitialized => "uninitialized",
            PickerState::Loading { .. } => "loading",
            PickerState::Ready(_) => "ready",
            PickerState::Failed(_) => "failed",
            PickerState::Closed => "closed",
        }
    }
}

/// Everything the host needs to draw the picker
#[derive(Debug, Clone, Serialize)]
pub struct PickerView {
    pub size: PickerSize,
    pub tree: Vec<TreeNode>,
    pub selected_node: Option<NodeKey>,
    pub panel: Option<PanelView>,
    /// Display keys of the accumulated sources, most recent first
    pub tags: Vec<String>,
}

/// The citation picker controller
pub struct PickerController {
    session_id: String,
    context: PickerContext,
    host: Arc<dyn PickerHost>,
    state: PickerState,
}

impl PickerController {
    pub fn new(context: PickerContext, host: Arc<dyn PickerHost>) -> Self {
        Self {
            session_id: generate_session_id(),
            context,
            host,
            state: PickerState::Uninitialized,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn context(&self) -> &PickerContext {
        &self.context
    }

    pub fn state(&self) -> &PickerState {
        &self.state
    }

    fn invalid(&self, operation: &'static str) -> PickerError {
        PickerError::InvalidState {
            operation,
            state: self.state.name(),
        }
    }

    fn ready(&self) -> Option<&ReadyState> {
        match &self.state {
            PickerState::Ready(ready) => Some(&**ready),
            _ => None,
        }
    }

    fn ready_mut(&mut self, operation: &'static str) -> Result<&mut ReadyState> {
        match self.state {
            PickerState::Ready(ref mut ready) => Ok(&mut **ready),
            _ => Err(PickerError::InvalidState {
                operation,
                state: self.state.name(),
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Begin the session: `Uninitialized -> Loading`
    ///
    /// The returned ticket must accompany the load completion. A session
    /// loads exactly once, so calling this again is an error.
    pub fn start(&mut self) -> Result<SessionTicket> {
        if !matches!(self.state, PickerState::Uninitialized) {
            return Err(self.invalid("start"));
        }
        let ticket = SessionTicket(NEXT_TICKET.fetch_add(1, Ordering::Relaxed));
        self.state = PickerState::Loading { ticket };
        tracing::info!(session = %self.session_id, "Citation picker loading");
        Ok(ticket)
    }

    /// Apply the result of the bibliography load
    ///
    /// On success the first panel's root is selected. On failure the picker
    /// moves to `Failed` and the host is told. Completions that do not match
    /// the outstanding load are dropped without touching state.
    pub fn on_load_complete(
        &mut self,
        ticket: SessionTicket,
        result: Result<PanelRegistry>,
    ) -> LoadOutcome {
        match self.state {
            PickerState::Loading { ticket: expected } if expected == ticket => {}
            _ => {
                tracing::warn!(
                    session = %self.session_id,
                    "Discarding load completion received while {}",
                    self.state.name()
                );
                return LoadOutcome::Discarded;
            }
        }

        match result {
            Ok(registry) => {
                let tree = registry.tree_nodes();
                let mut router = PanelRouter::new();
                let selected_node = tree.first().cloned();
                if let Some(node) = &selected_node {
                    router.route(&node.key, registry.panels());
                }

                tracing::info!(
                    session = %self.session_id,
                    "Citation picker ready with {} panels",
                    registry.len()
                );
                self.state = PickerState::Ready(Box::new(ReadyState {
                    registry,
                    tree,
                    selected_node,
                    router,
                    sources: SourceAccumulator::new(),
                }));
                LoadOutcome::Ready
            }
            Err(error) => {
                tracing::warn!(session = %self.session_id, "Citation picker load failed: {}", error);
                self.host.on_load_failed(&error);
                self.state = PickerState::Failed(error);
                LoadOutcome::Failed
            }
        }
    }

    /// The user selected a node in the catalog tree
    pub fn on_node_selected(&mut self, node: TreeNode) -> Result<RouteChange> {
        let session = self.session_id.clone();
        let ready = self.ready_mut("select a node")?;

        let change = ready.router.route(&node.key, ready.registry.panels());
        tracing::debug!(session = %session, "Selected node '{}': {:?}", node.key, change);
        ready.selected_node = Some(node);
        Ok(change)
    }

    /// Select a node by key, using the tree's node when it exists
    pub fn select_key(&mut self, key: &NodeKey) -> Result<RouteChange> {
        let node = self
            .ready()
            .and_then(|ready| tree::find_in(&ready.tree, key))
            .cloned()
            .unwrap_or_else(|| TreeNode::new(key.clone(), key.to_string()));
        self.on_node_selected(node)
    }

    /// A panel offered a source and the user picked it
    pub fn on_source_added(&mut self, source: BibliographySource) -> Result<()> {
        let session = self.session_id.clone();
        let host = Arc::clone(&self.host);
        let ready = self.ready_mut("add a source")?;

        tracing::debug!(session = %session, "Adding source '{}'", source.id);
        let sources = ready.sources.add(source);
        host.on_source_changed(sources);
        Ok(())
    }

    /// Add the source behind one of the active panel's entries
    ///
    /// `id` may be the raw source id or its display key. Returns `false`
    /// when the panel offers no such entry; nothing changes then.
    pub fn on_entry_chosen(&mut self, id: &str) -> Result<bool> {
        let view = self.view().ok_or_else(|| self.invalid("choose an entry"))?;
        let source = view.panel.and_then(|panel| {
            panel
                .entries
                .into_iter()
                .find(|e| e.source.id == id || e.display_key == id)
                .map(|e| e.source)
        });

        match source {
            Some(source) => {
                self.on_source_added(source)?;
                Ok(true)
            }
            None => {
                tracing::debug!(session = %self.session_id, "Active panel offers no entry '{}'", id);
                Ok(false)
            }
        }
    }

    /// The user removed a tag from the accumulated list
    ///
    /// Removes every source whose display key matches. The host is notified
    /// with the resulting list even when nothing matched.
    pub fn on_source_deleted(&mut self, display_key: &str) -> Result<()> {
        let session = self.session_id.clone();
        let host = Arc::clone(&self.host);
        let ready = self.ready_mut("delete a source")?;

        let before = ready.sources.len();
        let sources = ready.sources.delete(display_key);
        if sources.len() == before {
            tracing::debug!(session = %session, "No source matches '{}'", display_key);
        } else {
            tracing::debug!(
                session = %session,
                "Deleted {} source(s) matching '{}'",
                before - sources.len(),
                display_key
            );
        }
        host.on_source_changed(sources);
        Ok(())
    }

    /// Update the active panel's search text
    ///
    /// Ignored when no panel is displayed.
    pub fn on_search_changed(&mut self, text: &str) -> Result<()> {
        let ready = self.ready_mut("search")?;
        if let Some(active) = ready.router.active_mut() {
            active.search = text.to_string();
        }
        Ok(())
    }

    /// Hand the current view to the host
    pub fn on_render_requested(&mut self) -> Result<()> {
        let view = self.view().ok_or_else(|| self.invalid("render"))?;
        self.host.on_view(&view);
        Ok(())
    }

    /// Tear down the session. Terminal; later events are rejected.
    pub fn stop(&mut self) {
        if matches!(self.state, PickerState::Closed) {
            return;
        }
        tracing::info!(
            session = %self.session_id,
            "Citation picker closed from {}",
            self.state.name()
        );
        self.state = PickerState::Closed;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn is_ready(&self) -> bool {
        self.ready().is_some()
    }

    pub fn selected_node(&self) -> Option<&TreeNode> {
        self.ready().and_then(|r| r.selected_node.as_ref())
    }

    pub fn selected_panel(&self) -> Option<&ActivePanel> {
        self.ready().and_then(|r| r.router.active())
    }

    pub fn sources(&self) -> &[BibliographySource] {
        self.ready().map(|r| r.sources.sources()).unwrap_or(&[])
    }

    /// Panel root nodes, in display order
    pub fn tree_nodes(&self) -> &[TreeNode] {
        self.ready().map(|r| r.tree.as_slice()).unwrap_or(&[])
    }

    pub fn registry(&self) -> Option<&PanelRegistry> {
        self.ready().map(|r| &r.registry)
    }

    /// Describe the picker for drawing; `None` until ready
    pub fn view(&self) -> Option<PickerView> {
        let ready = self.ready()?;

        let panel = ready.router.active().map(|active| {
            active.panel.render(&CitationPanelProps {
                ui: &self.context.ui,
                selected_node: ready.selected_node.as_ref(),
                sources_to_add: ready.sources.sources(),
                search: &active.search,
            })
        });

        Some(PickerView {
            size: self.context.size,
            tree: ready.tree.clone(),
            selected_node: ready.selected_node.as_ref().map(|n| n.key.clone()),
            panel,
            tags: ready.sources.display_keys(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bibliography::{Bibliography, BibliographyFile};
    use crate::panel::default_providers;
    use std::sync::Mutex;

    /// Host that records every notification
    #[derive(Default)]
    pub(crate) struct RecordingHost {
        pub changes: Mutex<Vec<Vec<String>>>,
        pub failures: Mutex<Vec<PickerError>>,
        pub views: Mutex<Vec<PickerView>>,
    }

    impl RecordingHost {
        pub(crate) fn changes(&self) -> Vec<Vec<String>> {
            self.changes.lock().unwrap().clone()
        }
    }

    impl PickerHost for RecordingHost {
        fn on_source_changed(&self, sources: &[BibliographySource]) {
            self.changes
                .lock()
                .unwrap()
                .push(sources.iter().map(|s| s.id.clone()).collect());
        }

        fn on_load_failed(&self, error: &PickerError) {
            self.failures.lock().unwrap().push(error.clone());
        }

        fn on_view(&self, view: &PickerView) {
            self.views.lock().unwrap().push(view.clone());
        }
    }

    fn registry() -> PanelRegistry {
        let bib = Bibliography::new(vec![BibliographyFile {
            name: "journal-1".into(),
            title: "journal-1.json".into(),
            sources: vec![
                BibliographySource::new("smith2020").with_field("title", "Citation Graphs"),
                BibliographySource::new("jones2019"),
            ],
        }]);
        PanelRegistry::build(&PickerContext::default(), Arc::new(bib), &default_providers()).unwrap()
    }

    fn ready_controller() -> (PickerController, Arc<RecordingHost>) {
        let host = Arc::new(RecordingHost::default());
        let mut picker = PickerController::new(PickerContext::default(), host.clone());
        let ticket = picker.start().unwrap();
        assert_eq!(picker.on_load_complete(ticket, Ok(registry())), LoadOutcome::Ready);
        (picker, host)
    }

    #[test]
    fn test_initial_selection_is_first_panel_root() {
        let (picker, host) = ready_controller();

        assert_eq!(picker.selected_node().map(|n| n.key.as_str()), Some("bib"));
        assert_eq!(picker.selected_panel().map(|p| p.key()), Some("bibliography"));
        assert!(picker.sources().is_empty());
        assert!(host.changes().is_empty());

        let roots: Vec<&str> = picker.tree_nodes().iter().map(|n| n.key.as_str()).collect();
        assert_eq!(roots, vec!["bib", "doi"]);
    }

    #[test]
    fn test_node_selection_routes_to_owner() {
        let (mut picker, _) = ready_controller();

        picker.select_key(&NodeKey::new("bib/journal-1")).unwrap();
        assert_eq!(picker.selected_panel().map(|p| p.key()), Some("bibliography"));
        assert_eq!(picker.selected_node().map(|n| n.label.as_str()), Some("journal-1.json"));

        picker.select_key(&NodeKey::new("doi")).unwrap();
        assert_eq!(picker.selected_panel().map(|p| p.key()), Some("doi"));
    }

    #[test]
    fn test_selection_within_panel_keeps_panel_state() {
        let (mut picker, _) = ready_controller();
        picker.on_search_changed("smith").unwrap();

        let change = picker.select_key(&NodeKey::new("bib/journal-1")).unwrap();
        assert_eq!(change, RouteChange::Unchanged);
        assert_eq!(picker.selected_panel().map(|p| p.search.as_str()), Some("smith"));
    }

    #[test]
    fn test_unowned_node_clears_panel_without_error() {
        let (mut picker, _) = ready_controller();
        picker.on_source_added(BibliographySource::new("smith2020")).unwrap();

        let change = picker.select_key(&NodeKey::new("crossref")).unwrap();
        assert!(matches!(change, RouteChange::Cleared { .. }));
        assert!(picker.selected_panel().is_none());
        assert_eq!(picker.selected_node().map(|n| n.key.as_str()), Some("crossref"));

        let view = picker.view().unwrap();
        assert!(view.panel.is_none());
        // Sources carry over
        assert_eq!(view.tags, vec!["@smith2020"]);
    }

    #[test]
    fn test_add_source_notifies_with_full_list() {
        let (mut picker, host) = ready_controller();

        picker.on_source_added(BibliographySource::new("smith2020")).unwrap();
        assert_eq!(host.changes(), vec![vec!["smith2020".to_string()]]);

        picker.on_source_added(BibliographySource::new("jones2019")).unwrap();
        assert_eq!(
            host.changes().last().unwrap(),
            &vec!["jones2019".to_string(), "smith2020".to_string()]
        );
        assert_eq!(host.changes().len(), 2);
    }

    #[test]
    fn test_delete_source_notifies_with_empty_list() {
        let (mut picker, host) = ready_controller();
        picker.on_source_added(BibliographySource::new("smith2020")).unwrap();

        picker.on_source_deleted("@smith2020").unwrap();
        assert!(picker.sources().is_empty());
        assert_eq!(host.changes(), vec![vec!["smith2020".to_string()], vec![]]);
    }

    #[test]
    fn test_delete_without_match_still_notifies() {
        let (mut picker, host) = ready_controller();
        picker.on_source_added(BibliographySource::new("smith2020")).unwrap();

        picker.on_source_deleted("@nobody").unwrap();
        assert_eq!(picker.sources().len(), 1);
        assert_eq!(
            host.changes(),
            vec![vec!["smith2020".to_string()], vec!["smith2020".to_string()]]
        );
    }

    #[test]
    fn test_duplicate_adds_are_kept_and_deleted_together() {
        let (mut picker, host) = ready_controller();
        picker.on_source_added(BibliographySource::new("smith2020")).unwrap();
        picker.on_source_added(BibliographySource::new("smith2020")).unwrap();
        assert_eq!(picker.sources().len(), 2);

        picker.on_source_deleted("@smith2020").unwrap();
        assert!(picker.sources().is_empty());
        assert_eq!(host.changes().len(), 3);
    }

    #[test]
    fn test_entry_chosen_adds_full_source() {
        let (mut picker, host) = ready_controller();

        assert!(picker.on_entry_chosen("@smith2020").unwrap());
        assert_eq!(picker.sources()[0].title(), Some("Citation Graphs"));
        assert_eq!(host.changes().len(), 1);

        // The DOI panel offers nothing without a query
        picker.select_key(&NodeKey::new("doi")).unwrap();
        assert!(!picker.on_entry_chosen("jones2019").unwrap());
        assert_eq!(host.changes().len(), 1);
    }

    #[test]
    fn test_view_renders_active_panel() {
        let (mut picker, _) = ready_controller();
        picker.on_source_added(BibliographySource::new("jones2019")).unwrap();

        let view = picker.view().unwrap();
        assert_eq!(view.selected_node.as_ref().map(NodeKey::as_str), Some("bib"));
        assert_eq!(view.size, PickerSize::default());
        assert_eq!(view.tree.len(), 2);

        let panel = view.panel.unwrap();
        assert_eq!(panel.panel_key, "bibliography");
        let added: Vec<(&str, bool)> = panel
            .entries
            .iter()
            .map(|e| (e.display_key.as_str(), e.added))
            .collect();
        assert_eq!(added, vec![("@smith2020", false), ("@jones2019", true)]);
    }

    #[test]
    fn test_render_request_hands_view_to_host() {
        let (mut picker, host) = ready_controller();
        picker.select_key(&NodeKey::new("doi")).unwrap();
        picker.on_render_requested().unwrap();

        let views = host.views.lock().unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(
            views[0].panel.as_ref().map(|p| p.panel_key.as_str()),
            Some("doi")
        );
    }

    #[test]
    fn test_load_failure_surfaces_to_host() {
        let host = Arc::new(RecordingHost::default());
        let mut picker = PickerController::new(PickerContext::default(), host.clone());
        let ticket = picker.start().unwrap();

        let outcome = picker.on_load_complete(ticket, Err(PickerError::LoadFailed("offline".into())));
        assert_eq!(outcome, LoadOutcome::Failed);
        assert_eq!(picker.state().name(), "failed");
        assert_eq!(
            host.failures.lock().unwrap().as_slice(),
            &[PickerError::LoadFailed("offline".into())]
        );
        assert!(picker.view().is_none());
    }

    #[test]
    fn test_late_completion_after_stop_is_discarded() {
        let host = Arc::new(RecordingHost::default());
        let mut picker = PickerController::new(PickerContext::default(), host.clone());
        let ticket = picker.start().unwrap();
        picker.stop();

        assert_eq!(picker.on_load_complete(ticket, Ok(registry())), LoadOutcome::Discarded);
        assert_eq!(picker.state().name(), "closed");

        // Failures arriving late are not reported either
        assert_eq!(
            picker.on_load_complete(ticket, Err(PickerError::LoadFailed("late".into()))),
            LoadOutcome::Discarded
        );
        assert!(host.failures.lock().unwrap().is_empty());
    }

    #[test]
    fn test_completion_with_foreign_ticket_is_discarded() {
        let host = Arc::new(RecordingHost::default());
        let mut first = PickerController::new(PickerContext::default(), host.clone());
        let mut second = PickerController::new(PickerContext::default(), host);
        let first_ticket = first.start().unwrap();
        second.start().unwrap();

        assert_eq!(second.on_load_complete(first_ticket, Ok(registry())), LoadOutcome::Discarded);
        assert_eq!(second.state().name(), "loading");
    }

    #[test]
    fn test_start_only_once() {
        let (mut picker, _) = ready_controller();
        let err = picker.start().unwrap_err();
        assert_eq!(
            err,
            PickerError::InvalidState {
                operation: "start",
                state: "ready"
            }
        );
    }

    #[test]
    fn test_events_rejected_outside_ready() {
        let host = Arc::new(RecordingHost::default());
        let mut picker = PickerController::new(PickerContext::default(), host.clone());
        picker.start().unwrap();

        assert!(picker.on_source_added(BibliographySource::new("a")).is_err());
        assert!(picker.select_key(&NodeKey::new("bib")).is_err());

        picker.stop();
        let err = picker.on_source_deleted("@a").unwrap_err();
        assert_eq!(
            err,
            PickerError::InvalidState {
                operation: "delete a source",
                state: "closed"
            }
        );
        assert!(host.changes().is_empty());
    }

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        // YYYYMMDD-HHMMSS-XXXX
        assert_eq!(id.len(), 20);
        assert_eq!(id.matches('-').count(), 2);
    }
}
