//! Async driver for a picker session
//!
//! Spawns the one bibliography load and feeds host events to the controller
//! in delivery order. Each event is handled to completion before the next is
//! read, so transitions never interleave.
//!
//! ```text
//! host ──PickerEvent──▶ mpsc ──▶ run_picker ──▶ PickerController
//!                                   ▲
//!        load task ──(ticket, result)──┘  (oneshot, dropped after Close)
//! ```

use super::{LoadOutcome, PickerController};
use crate::bibliography::{BibliographyLoader, BibliographySource};
use crate::error::{PickerError, Result};
use crate::panel::{PanelProvider, PanelRegistry};
use crate::tree::{NodeKey, TreeNode};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Host input delivered to a running picker
#[derive(Debug, Clone)]
pub enum PickerEvent {
    NodeSelected(TreeNode),
    /// Select by key; resolved against the tree when the node exists
    KeySelected(NodeKey),
    SourceAdded(BibliographySource),
    /// Add the active panel's entry with this source id or display key
    EntryChosen(String),
    SourceDeleted(String),
    SearchChanged(String),
    /// Ask for the current view through `PickerHost::on_view`
    Render,
    Close,
}

impl PickerController {
    /// Dispatch one host event
    pub fn handle(&mut self, event: PickerEvent) -> Result<()> {
        match event {
            PickerEvent::NodeSelected(node) => self.on_node_selected(node).map(|_| ()),
            PickerEvent::KeySelected(key) => self.select_key(&key).map(|_| ()),
            PickerEvent::SourceAdded(source) => self.on_source_added(source),
            PickerEvent::EntryChosen(id) => self.on_entry_chosen(&id).map(|_| ()),
            PickerEvent::SourceDeleted(key) => self.on_source_deleted(&key),
            PickerEvent::SearchChanged(text) => self.on_search_changed(&text),
            PickerEvent::Render => self.on_render_requested(),
            PickerEvent::Close => {
                self.stop();
                Ok(())
            }
        }
    }
}

/// Run a picker session until the host closes it
///
/// Returns the controller in its final (`Closed`) state. Events received
/// while the load is running are held and replayed in delivery order once it
/// completes. A `Close` with nothing held tears the session down at once and
/// the late load result is dropped; a `Close` behind held events waits for
/// them. Events the current state does not accept are logged and skipped. If
/// the event channel ends, the session is closed as if `Close` had been sent.
pub async fn run_picker(
    mut controller: PickerController,
    loader: Arc<dyn BibliographyLoader>,
    providers: Vec<Arc<dyn PanelProvider>>,
    mut events: mpsc::Receiver<PickerEvent>,
) -> Result<PickerController> {
    let ticket = controller.start()?;

    let (load_tx, mut load_rx) = oneshot::channel();
    let context = controller.context().clone();
    tokio::spawn(async move {
        let result = PanelRegistry::load(&context, loader.as_ref(), &providers).await;
        if load_tx.send(result).is_err() {
            tracing::debug!("Picker closed before the bibliography load finished");
        }
    });

    // Events that arrive before the load completes wait here, in order
    let mut pending: VecDeque<PickerEvent> = VecDeque::new();
    let mut load_pending = true;
    let mut closing = false;
    'session: loop {
        tokio::select! {
            // Prefer the load result so events queued behind it see Ready
            biased;

            result = &mut load_rx, if load_pending => {
                load_pending = false;
                let result = result.unwrap_or_else(|_| {
                    tracing::error!("Bibliography load task ended without a result");
                    Err(PickerError::LoadFailed(
                        "bibliography load task ended without a result".into(),
                    ))
                });
                if controller.on_load_complete(ticket, result) == LoadOutcome::Discarded {
                    tracing::debug!("Load result discarded");
                }
                if !pending.is_empty() {
                    tracing::debug!("Replaying {} events queued during load", pending.len());
                }
                while let Some(event) = pending.pop_front() {
                    if matches!(event, PickerEvent::Close) {
                        controller.stop();
                        break 'session;
                    }
                    dispatch(&mut controller, event);
                }
            }

            event = events.recv(), if !closing => {
                match event {
                    // Nothing queued: tear down without waiting for the load
                    Some(PickerEvent::Close) | None if pending.is_empty() => {
                        controller.stop();
                        break;
                    }
                    // Close after queued input waits for that input to be replayed
                    Some(PickerEvent::Close) | None => {
                        closing = true;
                        pending.push_back(PickerEvent::Close);
                    }
                    Some(event) if load_pending => pending.push_back(event),
                    Some(event) => dispatch(&mut controller, event),
                }
            }
        }
    }

    Ok(controller)
}

fn dispatch(controller: &mut PickerController, event: PickerEvent) {
    if let Err(e) = controller.handle(event) {
        tracing::warn!(session = %controller.session_id(), "Event ignored: {}", e);
    }
}
