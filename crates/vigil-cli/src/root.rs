use std::path::{Path, PathBuf};

/// Resolve the vault root.
///
/// Priority:
/// 1. `--vault` flag / `VIGIL_VAULT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for a directory containing `Needs_Action/`
/// 3. Fall back to `cwd`
pub fn resolve_vault(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_vault_from(&cwd).unwrap_or(cwd)
}

fn find_vault_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(vigil_core::paths::NEEDS_ACTION_DIR).is_dir())
        .map(Path::to_path_buf)
}
