//! Source accumulator
//!
//! The ordered list of sources the user has picked for insertion, most
//! recently added first. The transformations are pure functions over slices;
//! [`SourceAccumulator`] commits their results and reports whether anything
//! changed so the controller can notify the host.
//!
//! Sources are not deduplicated by id. Adding the same source twice yields
//! two entries, and deleting its display key removes both.

use crate::bibliography::BibliographySource;

/// Marker prefixed to a source id when shown to the user
pub const DISPLAY_MARKER: char = '@';

/// Display form of a source id: `smith2020` -> `@smith2020`
pub fn for_display(id: &str) -> String {
    format!("{}{}", DISPLAY_MARKER, id)
}

/// New sequence with `source` at the front
pub fn add_source(sources: &[BibliographySource], source: BibliographySource) -> Vec<BibliographySource> {
    let mut next = Vec::with_capacity(sources.len() + 1);
    next.push(source);
    next.extend_from_slice(sources);
    next
}

/// New sequence without any entry whose display key equals `display_key`
pub fn delete_source(sources: &[BibliographySource], display_key: &str) -> Vec<BibliographySource> {
    sources
        .iter()
        .filter(|source| for_display(&source.id) != display_key)
        .cloned()
        .collect()
}

/// The current accumulated sources
#[derive(Debug, Clone, Default)]
pub struct SourceAccumulator {
    sources: Vec<BibliographySource>,
}

impl SourceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sources(&self) -> &[BibliographySource] {
        &self.sources
    }

    /// Display keys in accumulation order (the tag list)
    pub fn display_keys(&self) -> Vec<String> {
        self.sources.iter().map(|s| for_display(&s.id)).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Whether any entry carries this source id
    pub fn contains_id(&self, id: &str) -> bool {
        self.sources.iter().any(|s| s.id == id)
    }

    /// Prepend a source. Always a mutation.
    pub fn add(&mut self, source: BibliographySource) -> &[BibliographySource] {
        self.sources = add_source(&self.sources, source);
        &self.sources
    }

    /// Remove every entry matching `display_key`
    ///
    /// The new sequence is committed even when nothing matched; callers that
    /// need to know can compare lengths.
    pub fn delete(&mut self, display_key: &str) -> &[BibliographySource] {
        self.sources = delete_source(&self.sources, display_key);
        &self.sources
    }
}
