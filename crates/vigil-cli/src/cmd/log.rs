use crate::output::{print_json, print_table};
use chrono::{NaiveDate, SecondsFormat, Utc};
use std::path::Path;
use vigil_core::{audit::AuditLog, paths};

pub fn run(vault: &Path, date: Option<NaiveDate>, json: bool) -> anyhow::Result<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let entries = AuditLog::new(paths::logs_dir(vault)).read_day(date);

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No audit entries for {date}.");
        return Ok(());
    }

    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                e.watcher.clone(),
                e.action_type.clone(),
                e.status.to_string(),
                e.description.clone(),
            ]
        })
        .collect();
    print_table(&["TIME", "WATCHER", "ACTION", "STATUS", "DESCRIPTION"], rows);
    Ok(())
}
