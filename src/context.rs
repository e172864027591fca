//! Host-provided context handed to the picker at construction
//!
//! None of this is interpreted by the routing or accumulation logic; it is
//! passed through unchanged to the loader and to the panels.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// UI services offered by the hosting editor
///
/// Only text translation is needed by the built-in panels. Missing entries
/// fall back to the untranslated text.
#[derive(Debug, Clone, Default)]
pub struct EditorUi {
    translations: HashMap<String, String>,
}

impl EditorUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_translation(mut self, text: &str, translated: &str) -> Self {
        self.translations
            .insert(text.to_string(), translated.to_string());
        self
    }

    pub fn translate(&self, text: &str) -> String {
        self.translations
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_string())
    }
}

/// The document citations will be inserted into
#[derive(Debug, Clone, Default)]
pub struct DocumentRef {
    /// Location of the document on disk, if it has been saved
    pub path: Option<PathBuf>,
    /// Bibliography files declared by the document, relative to its directory
    pub bibliography: Vec<PathBuf>,
}

impl DocumentRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            bibliography: Vec::new(),
        }
    }

    pub fn with_bibliography(mut self, file: impl Into<PathBuf>) -> Self {
        self.bibliography.push(file.into());
        self
    }

    /// Declared bibliography files resolved against the document directory
    pub fn bibliography_paths(&self) -> Vec<PathBuf> {
        let base = self
            .path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);
        self.bibliography
            .iter()
            .map(|file| match &base {
                Some(dir) if file.is_relative() => dir.join(file),
                _ => file.clone(),
            })
            .collect()
    }
}

/// Presentational size requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PickerSize {
    pub width: u32,
    pub height: u32,
}

impl Default for PickerSize {
    fn default() -> Self {
        Self {
            width: 680,
            height: 400,
        }
    }
}

/// Everything the host supplies when mounting the picker
#[derive(Debug, Clone, Default)]
pub struct PickerContext {
    pub ui: EditorUi,
    pub document: DocumentRef,
    pub size: PickerSize,
}
