//! CSL-JSON file loader
//!
//! Reads every bibliography file declared by the document, plus any extra
//! files configured by the host, as a JSON array of CSL items.

use super::{Bibliography, BibliographyFile, BibliographyLoader, BibliographySource};
use crate::context::{DocumentRef, EditorUi};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Loads CSL-JSON bibliography files from disk
#[derive(Debug, Clone, Default)]
pub struct JsonBibliography {
    extra_files: Vec<PathBuf>,
}

impl JsonBibliography {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files loaded in addition to the ones the document declares
    pub fn with_files(files: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            extra_files: files.into_iter().collect(),
        }
    }

    async fn read_file(path: &Path) -> Result<BibliographyFile> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read bibliography {}", path.display()))?;
        let sources: Vec<BibliographySource> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse CSL-JSON in {}", path.display()))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let title = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());

        Ok(BibliographyFile {
            name,
            title,
            sources,
        })
    }
}

#[async_trait]
impl BibliographyLoader for JsonBibliography {
    fn name(&self) -> &'static str {
        "csl-json"
    }

    async fn load(&self, _ui: &EditorUi, document: &DocumentRef) -> Result<Bibliography> {
        let mut paths = document.bibliography_paths();
        for extra in &self.extra_files {
            if !paths.contains(extra) {
                paths.push(extra.clone());
            }
        }

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            let file = Self::read_file(path).await?;
            tracing::debug!(
                "Loaded {} sources from {}",
                file.sources.len(),
                path.display()
            );
            files.push(file);
        }

        Ok(Bibliography::new(files))
    }
}
