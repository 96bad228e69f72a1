use crate::error::{Result, VigilError};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Upstream of a connector: whatever fetches raw items from the outside
/// world (a mail API, a browser session, an export job).
pub trait Source<T> {
    fn poll(&mut self) -> Result<Vec<T>>;
}

/// Reads items from a spool directory: one JSON document per `*.json` file,
/// returned in file-name order. An external fetcher drops files here; the
/// spool never deletes them, deduplication happens downstream.
#[derive(Debug)]
pub struct SpoolSource<T> {
    dir: PathBuf,
    _item: PhantomData<fn() -> T>,
}

impl<T> SpoolSource<T> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _item: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl<T: DeserializeOwned> Source<T> for SpoolSource<T> {
    fn poll(&mut self) -> Result<Vec<T>> {
        if !self.dir.is_dir() {
            return Err(VigilError::SpoolMissing(self.dir.clone()));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut items = Vec::with_capacity(files.len());
        for path in files {
            let parsed = std::fs::read_to_string(&path)
                .map_err(VigilError::from)
                .and_then(|text| serde_json::from_str(&text).map_err(VigilError::from));
            match parsed {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping unreadable spool file: {e}");
                }
            }
        }
        Ok(items)
    }
}
