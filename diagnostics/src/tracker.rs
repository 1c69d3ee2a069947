//! Document tracker: which files each document's last compile published to.
//!
//! A compile of `a.m` can report diagnostics in `b.h`; those messages belong
//! to `a.m` and must be cleared when `a.m` recompiles or closes.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use clarion_types::{DocumentId, MessageInvalidation};

#[derive(Debug, Default)]
pub(crate) struct DocumentTracker {
    /// Paths carrying messages from each document's last published compile.
    published_paths: HashMap<DocumentId, Vec<PathBuf>>,
    /// Documents with a destroy listener attached.
    subscribed: HashSet<DocumentId>,
}

impl DocumentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the document's recorded paths as a file-scoped invalidation.
    ///
    /// Returns `None` when nothing is recorded; calling it twice is harmless.
    pub fn invalidate(&mut self, document: DocumentId) -> Option<MessageInvalidation> {
        let paths = self.published_paths.remove(&document)?;
        if paths.is_empty() {
            return None;
        }
        Some(MessageInvalidation::for_files(paths))
    }

    /// Replace the recorded paths for `document`. Publishes nothing.
    pub fn record(&mut self, document: DocumentId, paths: Vec<PathBuf>) {
        let mut seen = HashSet::new();
        let paths: Vec<PathBuf> = paths
            .into_iter()
            .filter(|path| seen.insert(path.clone()))
            .collect();
        if paths.is_empty() {
            self.published_paths.remove(&document);
        } else {
            self.published_paths.insert(document, paths);
        }
    }

    /// Invalidate, then forget the document entirely.
    pub fn on_document_destroyed(&mut self, document: DocumentId) -> Option<MessageInvalidation> {
        let invalidation = self.invalidate(document);
        self.subscribed.remove(&document);
        invalidation
    }

    /// Mark the document as having a destroy listener.
    ///
    /// Returns `true` the first time, `false` if it was already marked.
    pub fn mark_subscribed(&mut self, document: DocumentId) -> bool {
        self.subscribed.insert(document)
    }

    pub fn is_subscribed(&self, document: DocumentId) -> bool {
        self.subscribed.contains(&document)
    }

    pub fn recorded_paths(&self, document: DocumentId) -> Option<&[PathBuf]> {
        self.published_paths.get(&document).map(Vec::as_slice)
    }

    /// Forget everything. Used on provider disposal.
    pub fn clear(&mut self) {
        self.published_paths.clear();
        self.subscribed.clear();
    }
}
