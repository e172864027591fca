//! Bibliography sources and the external loading dependency
//!
//! The picker never reads bibliography data itself. A [`BibliographyLoader`]
//! is awaited once per session and hands back an immutable [`Bibliography`]
//! snapshot that panels build their trees and views from.

use crate::context::{DocumentRef, EditorUi};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

mod json;

pub use json::JsonBibliography;

/// A citation record the user can insert
///
/// Only `id` is meaningful to the picker. Everything else is carried as-is
/// (CSL-JSON fields such as `title`, `author`, `issued`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibliographySource {
    pub id: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl BibliographySource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(name.to_string(), value.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").and_then(Value::as_str)
    }

    /// `DOI` field, if the record carries one
    pub fn doi(&self) -> Option<&str> {
        self.metadata.get("DOI").and_then(Value::as_str)
    }
}

/// Sources read from one bibliography file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BibliographyFile {
    /// Short name used as the tree segment (file stem)
    pub name: String,
    /// Label shown in the tree (file name)
    pub title: String,
    pub sources: Vec<BibliographySource>,
}

/// Loaded bibliography data, read-only for the rest of the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bibliography {
    pub files: Vec<BibliographyFile>,
}

impl Bibliography {
    /// File names are made unique (`refs`, `refs-2`, ...) since they become
    /// sibling tree keys
    pub fn new(mut files: Vec<BibliographyFile>) -> Self {
        let mut taken: HashSet<String> = HashSet::with_capacity(files.len());
        for file in &mut files {
            if !taken.insert(file.name.clone()) {
                let mut n = 2;
                while taken.contains(&format!("{}-{}", file.name, n)) {
                    n += 1;
                }
                file.name = format!("{}-{}", file.name, n);
                taken.insert(file.name.clone());
            }
        }
        Self { files }
    }

    pub fn file(&self, name: &str) -> Option<&BibliographyFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// All sources, in file order
    pub fn sources(&self) -> impl Iterator<Item = &BibliographySource> {
        self.files.iter().flat_map(|f| f.sources.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.files.iter().all(|f| f.sources.is_empty())
    }
}

/// External dependency that makes bibliography data available
///
/// Completes once every source backing the panels can be read. Failures
/// propagate to the picker, which surfaces them to the host.
#[async_trait]
pub trait BibliographyLoader: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &'static str;

    async fn load(&self, ui: &EditorUi, document: &DocumentRef) -> anyhow::Result<Bibliography>;
}
