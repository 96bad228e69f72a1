use super::iso;
use crate::dedup::ProcessedIds;
use crate::error::{Result, VigilError};
use crate::io;
use crate::record::{ActionRecord, RecordBody, RecordHandle};
use crate::watcher::{Connector, Detection};
use chrono::Utc;
use std::path::PathBuf;

pub const DEFAULT_EXCLUDES: [&str; 3] = [".DS_Store", "thumbs.db", "~$"];

/// A regular file found in the watch folder.
#[derive(Debug, Clone)]
pub struct FileDrop {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    /// Lowercased extension with its dot, or empty.
    pub extension: String,
}

/// Scans a drop folder (non-recursive) and turns each file into a record.
/// The file name is the native id.
#[derive(Debug)]
pub struct FilesystemConnector {
    watch: PathBuf,
    exclude: Vec<String>,
}

impl FilesystemConnector {
    pub fn new(watch: impl Into<PathBuf>, exclude: Vec<String>) -> Result<Self> {
        let watch = watch.into();
        if !watch.is_dir() {
            return Err(VigilError::WatchTargetMissing(watch));
        }
        tracing::info!(watch = %watch.display(), ?exclude, "filesystem connector ready");
        Ok(Self { watch, exclude })
    }

    fn should_ignore(&self, name: &str) -> bool {
        self.exclude.iter().any(|pattern| name.contains(pattern.as_str()))
    }
}

impl Connector for FilesystemConnector {
    type Item = FileDrop;

    fn name(&self) -> &str {
        "FileSystemWatcher"
    }

    fn source_key(&self) -> &str {
        "files"
    }

    fn fetch(&mut self, _seen: &ProcessedIds) -> Result<Vec<FileDrop>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.watch)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.should_ignore(&name) {
                continue;
            }
            let path = entry.path();
            // Follows symlinks. A file renamed or removed mid-scan is skipped.
            let meta = match std::fs::metadata(&path) {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping entry: {e}");
                    continue;
                }
            };
            if !meta.is_file() {
                continue;
            }
            let extension = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_default();
            files.push(FileDrop {
                name,
                path,
                size: meta.len(),
                extension,
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn native_id(&self, item: &FileDrop) -> String {
        item.name.clone()
    }

    fn to_record(&self, item: &FileDrop) -> Result<ActionRecord> {
        let now = Utc::now();
        let file_type = if item.extension.is_empty() {
            "No extension"
        } else {
            item.extension.as_str()
        };

        let body = RecordBody::new(format!("File Detected: {}", item.name))
            .section(
                "Details",
                format!(
                    "- **Size:** {}\n- **Type:** {}\n- **Detected:** {}",
                    format_size(item.size),
                    file_type,
                    now.format("%Y-%m-%d %H:%M:%S UTC")
                ),
            )
            .section(
                "File Location",
                format!("File stored temporarily in: `{}`", item.path.display()),
            )
            .section(
                "Next Steps",
                "1. Review the file content\n2. Move to appropriate project folder\n3. Create detailed task if processing needed",
            )
            .actions(["Review file", "Move to appropriate folder", "Process/Archive"])
            .footer("Automatically detected by FileSystem Watcher");

        Ok(ActionRecord::new("file_drop", &format!("FILE_{}", item.name))
            .field("original_name", item.name.as_str())
            .field("size_bytes", item.size)
            .field("file_type", item.extension.as_str())
            .field("detected", iso(now))
            .body(body.render()))
    }

    fn detection(&self, item: &FileDrop) -> Detection {
        Detection::new("file_detected", format!("New file: {}", item.name))
            .detail("size", item.size)
            .detail("type", item.extension.as_str())
    }

    /// Keep a copy of the dropped file next to its record.
    fn after_record(&mut self, item: &FileDrop, handle: &RecordHandle) -> Result<()> {
        let Some(dir) = handle.path.parent() else {
            return Ok(());
        };
        let dest = dir.join(&item.name);
        if io::copy_if_missing(&item.path, &dest)? {
            tracing::info!(dest = %dest.display(), "copied file to vault");
        }
        Ok(())
    }

    fn describe(&self, item: &FileDrop) -> String {
        format!("{} ({})", item.name, format_size(item.size))
    }
}

/// Human-readable size, e.g. `2.0 KB`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}
