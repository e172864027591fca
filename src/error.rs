//! Picker error types
//!
//! Only the load step and misuse of the controller lifecycle can fail.
//! Routing misses and deletes that match nothing are ordinary outcomes.

use thiserror::Error;

/// Errors surfaced by the picker to its host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickerError {
    /// The external bibliography load rejected
    #[error("bibliography load failed: {0}")]
    LoadFailed(String),

    /// Providers produced no panels
    #[error("no citation panels are available")]
    NoPanels,

    /// Two providers used the same panel key
    #[error("duplicate panel key '{0}'")]
    DuplicatePanelKey(String),

    /// One panel's root lies inside another panel's subtree
    #[error("panel '{second}' overlaps panel '{first}'")]
    OverlappingPanels { first: String, second: String },

    /// A controller entry point was called in a state that does not accept it
    #[error("cannot {operation} while the picker is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

impl PickerError {
    /// Build a load failure keeping the loader's full context chain
    pub fn load_failed(error: &anyhow::Error) -> Self {
        Self::LoadFailed(format!("{:#}", error))
    }
}

pub type Result<T> = std::result::Result<T, PickerError>;
