use crate::error::Result;
use crate::io;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Native ids a connector has already handed to the scheduler.
///
/// Seeded from disk once, append-only afterwards. `flush` persists the set
/// as a sorted JSON array of strings.
#[derive(Debug)]
pub struct ProcessedIds {
    path: PathBuf,
    ids: BTreeSet<String>,
    dirty: bool,
}

impl ProcessedIds {
    /// Load the set stored at `path`. A missing file is an empty set; an
    /// unreadable or corrupt one is logged and also treated as empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match io::read_optional(&path) {
            Ok(Some(text)) => match serde_json::from_str::<Vec<String>>(&text) {
                Ok(list) => {
                    tracing::info!(count = list.len(), "loaded previously processed ids");
                    list.into_iter().collect()
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "could not load processed ids: {e}");
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "could not load processed ids: {e}");
                BTreeSet::new()
            }
        };
        Self {
            path,
            ids,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn should_process(&self, id: &str) -> bool {
        !self.ids.contains(id)
    }

    /// Record `id`. Returns true when it was not already present.
    pub fn mark_processed(&mut self, id: impl Into<String>) -> bool {
        let added = self.ids.insert(id.into());
        self.dirty |= added;
        added
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persist the set if anything was added since the last flush.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let list: Vec<&String> = self.ids.iter().collect();
        let data = serde_json::to_string(&list)?;
        io::atomic_write(&self.path, data.as_bytes())?;
        self.dirty = false;
        Ok(())
    }
}
