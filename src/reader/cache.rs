// src/reader/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::reader::descriptor::Document;

/// Explicit parsed-descriptor cache owned by the reader.
///
/// Keyed by path and modification time: a descriptor whose mtime is unchanged
/// since the last parse is served from memory. Callers that need to force a
/// reparse (e.g. after clock skew on a network filesystem) use
/// [`DocumentCache::invalidate`].
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: HashMap<PathBuf, (SystemTime, Document)>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, path: &Path, mtime: SystemTime) -> Option<&Document> {
        match self.entries.get(path) {
            Some((cached_mtime, doc)) if *cached_mtime == mtime => Some(doc),
            _ => None,
        }
    }

    pub fn store(&mut self, path: &Path, mtime: SystemTime, doc: Document) {
        self.entries.insert(path.to_path_buf(), (mtime, doc));
    }

    pub fn invalidate(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        debug!(dropped, "invalidated descriptor document cache");
    }
}
