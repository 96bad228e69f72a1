use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const NEEDS_ACTION_DIR: &str = "Needs_Action";
pub const PLANS_DIR: &str = "Plans";
pub const DONE_DIR: &str = "Done";
pub const PENDING_APPROVAL_DIR: &str = "Pending_Approval";
pub const LOGS_DIR: &str = "Logs";

pub const CONFIG_FILE: &str = ".vigil.yaml";
pub const PROCESSED_PREFIX: &str = ".processed_";

pub const RECORD_EXT: &str = "md";
pub const AUDIT_EXT: &str = "json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn needs_action_dir(vault: &Path) -> PathBuf {
    vault.join(NEEDS_ACTION_DIR)
}

pub fn logs_dir(vault: &Path) -> PathBuf {
    vault.join(LOGS_DIR)
}

pub fn config_path(vault: &Path) -> PathBuf {
    vault.join(CONFIG_FILE)
}

/// Dedup state for one connector, e.g. `<vault>/.processed_emails`.
pub fn processed_path(vault: &Path, source_key: &str) -> PathBuf {
    vault.join(format!("{PROCESSED_PREFIX}{source_key}"))
}

pub fn audit_file(logs: &Path, date: NaiveDate) -> PathBuf {
    logs.join(format!("{}.{AUDIT_EXT}", date.format("%Y-%m-%d")))
}

pub fn record_path(dir: &Path, filename: &str) -> PathBuf {
    dir.join(format!("{filename}.{RECORD_EXT}"))
}

// ---------------------------------------------------------------------------
// Filename sanitising
// ---------------------------------------------------------------------------

static UNSAFE_RE: OnceLock<Regex> = OnceLock::new();

fn unsafe_re() -> &'static Regex {
    UNSAFE_RE.get_or_init(|| Regex::new(r#"[\s/\\:*?"<>|]"#).unwrap())
}

/// Replace whitespace, path separators and characters that are invalid on
/// common filesystems with `_`. One input character maps to one `_`, so the
/// result is stable for a given input.
pub fn safe_filename(raw: &str) -> String {
    unsafe_re().replace_all(raw, "_").into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_filename_replaces_spaces_and_separators() {
        assert_eq!(safe_filename("my report.pdf"), "my_report.pdf");
        assert_eq!(safe_filename("a/b\\c"), "a_b_c");
        assert_eq!(safe_filename("re: hi?"), "re__hi_");
    }

    #[test]
    fn safe_filename_is_stable() {
        let raw = "Quarterly Report / Final.xlsx";
        assert_eq!(safe_filename(raw), safe_filename(raw));
    }

    #[test]
    fn path_helpers() {
        let vault = Path::new("/tmp/vault");
        assert_eq!(
            processed_path(vault, "emails"),
            PathBuf::from("/tmp/vault/.processed_emails")
        );
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(
            audit_file(&logs_dir(vault), date),
            PathBuf::from("/tmp/vault/Logs/2026-03-09.json")
        );
        assert_eq!(
            record_path(&needs_action_dir(vault), "FILE_x"),
            PathBuf::from("/tmp/vault/Needs_Action/FILE_x.md")
        );
    }
}
