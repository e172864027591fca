//! Citation picker controller
//!
//! The state behind an "insert citation" dialog: a catalog tree of citation
//! categories, one panel per category, and the running list of sources the
//! user has chosen to insert.
//!
//! Architecture:
//! - Tree: path-keyed catalog nodes with prefix containment
//! - Panels: category providers, each owning one root of the tree
//! - Registry: awaits the bibliography load, then builds panels in order
//! - Router: maps a selected node to the panel that owns it
//! - Accumulator: most-recent-first list of chosen sources
//! - Picker: the session state machine tying the above together

pub mod accumulator;
pub mod bibliography;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod panel;
pub mod picker;
pub mod router;
pub mod tree;

pub use accumulator::{add_source, delete_source, for_display, SourceAccumulator};
pub use bibliography::{Bibliography, BibliographyLoader, BibliographySource, JsonBibliography};
pub use context::{DocumentRef, EditorUi, PickerContext, PickerSize};
pub use error::PickerError;
pub use panel::{CitationPanel, CitationPanelProps, PanelKind, PanelProvider, PanelRegistry, PanelView};
pub use picker::{run_picker, PickerController, PickerEvent, PickerHost, PickerState, PickerView};
pub use router::{resolve, ActivePanel, PanelRouter, RouteChange};
pub use tree::{NodeKey, TreeNode};
