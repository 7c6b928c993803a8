//! Candidate Index - Directory Scan Grouped By Tag
//!
//! Applies the name codec to every directory entry and keeps only the
//! survivors. Unparsable entries are skipped, not errors: layer export
//! directories routinely contain unrelated files.

use std::io;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::names::{parse_path, LayerIdentity};

/// An immutable snapshot of the parsable layers in one directory, grouped
/// by tag in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct LayerIndex {
    by_tag: IndexMap<String, Vec<LayerIdentity>>,
}

impl LayerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a directory (non-recursive) and index every parsable layer.
    ///
    /// Entries are sorted by file name before parsing so the same
    /// directory always yields the same index, whatever order the
    /// platform lists it in.
    pub fn scan(dir: &Path) -> io::Result<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut index = Self::new();
        let mut skipped = 0usize;
        for path in &paths {
            match parse_path(path) {
                Some(layer) => index.insert(layer),
                None => {
                    skipped += 1;
                    debug!(path = %path.display(), "skipping unparsable entry");
                }
            }
        }

        debug!(
            dir = %dir.display(),
            layers = index.len(),
            skipped,
            "indexed layer directory"
        );
        Ok(index)
    }

    /// Add one identity, grouping it under its tag. Lets callers build an
    /// index from a document walk instead of a directory.
    pub fn insert(&mut self, layer: LayerIdentity) {
        self.by_tag.entry(layer.tag.clone()).or_default().push(layer);
    }

    /// Tags in first-seen order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }

    /// All candidates for a tag; empty slice for an unknown tag.
    pub fn candidates(&self, tag: &str) -> &[LayerIdentity] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every indexed layer, tag by tag.
    pub fn all(&self) -> impl Iterator<Item = &LayerIdentity> {
        self.by_tag.values().flatten()
    }

    /// Total number of indexed layers.
    pub fn len(&self) -> usize {
        self.by_tag.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}
