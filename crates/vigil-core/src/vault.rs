use crate::error::{Result, VigilError};
use crate::paths;
use std::path::{Path, PathBuf};

/// The fixed folder tree every watcher writes into.
#[derive(Debug, Clone)]
pub struct VaultLayout {
    root: PathBuf,
}

impl VaultLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn needs_action(&self) -> PathBuf {
        paths::needs_action_dir(&self.root)
    }

    pub fn plans(&self) -> PathBuf {
        self.root.join(paths::PLANS_DIR)
    }

    pub fn done(&self) -> PathBuf {
        self.root.join(paths::DONE_DIR)
    }

    pub fn pending_approval(&self) -> PathBuf {
        self.root.join(paths::PENDING_APPROVAL_DIR)
    }

    pub fn logs(&self) -> PathBuf {
        paths::logs_dir(&self.root)
    }

    pub fn processed_file(&self, source_key: &str) -> PathBuf {
        paths::processed_path(&self.root, source_key)
    }

    pub fn folders(&self) -> [PathBuf; 5] {
        [
            self.needs_action(),
            self.plans(),
            self.done(),
            self.pending_approval(),
            self.logs(),
        ]
    }

    /// Create every folder (and missing parents). Idempotent. A failure here
    /// means the vault is unusable, so callers abort startup on error.
    pub fn ensure(&self) -> Result<()> {
        for folder in self.folders() {
            std::fs::create_dir_all(&folder).map_err(|source| VigilError::VaultLayout {
                path: folder.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
