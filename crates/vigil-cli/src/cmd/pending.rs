use crate::output::{print_json, print_table};
use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use vigil_core::{paths, record};

#[derive(Serialize)]
struct PendingRecord {
    file: String,
    kind: Option<String>,
    priority: Option<String>,
    status: Option<String>,
}

pub fn run(vault: &Path, json: bool) -> anyhow::Result<()> {
    let dir = paths::needs_action_dir(vault);
    let records = if dir.is_dir() { scan(&dir)? } else { Vec::new() };

    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("Nothing waiting in {}.", paths::NEEDS_ACTION_DIR);
        return Ok(());
    }

    let rows = records
        .into_iter()
        .map(|r| {
            vec![
                r.file,
                r.kind.unwrap_or_else(|| "-".to_string()),
                r.priority.unwrap_or_else(|| "-".to_string()),
                r.status.unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["FILE", "TYPE", "PRIORITY", "STATUS"], rows);
    Ok(())
}

fn scan(dir: &Path) -> anyhow::Result<Vec<PendingRecord>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("cannot read {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file() && p.extension().and_then(|x| x.to_str()) == Some(paths::RECORD_EXT)
        })
        .collect();
    paths.sort();

    let mut records = Vec::new();
    for path in paths {
        let parsed = match record::read(&path) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
                continue;
            }
        };
        records.push(PendingRecord {
            file: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            kind: parsed.kind().map(str::to_string),
            priority: parsed.header.get_str("priority").map(str::to_string),
            status: parsed.status().map(str::to_string),
        });
    }
    Ok(records)
}
