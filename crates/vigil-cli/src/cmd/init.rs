use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use vigil_core::{config::Config, paths, vault::VaultLayout};

pub fn run(vault: &Path, json: bool) -> anyhow::Result<()> {
    let layout = VaultLayout::new(vault);
    layout
        .ensure()
        .with_context(|| format!("failed to prepare vault at {}", vault.display()))?;
    let config_written =
        Config::write_default_if_missing(vault).context("failed to write .vigil.yaml")?;

    if json {
        let folders: Vec<String> = layout
            .folders()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        return print_json(&serde_json::json!({
            "vault": vault.display().to_string(),
            "folders": folders,
            "config_written": config_written,
        }));
    }

    println!("Initializing vault in: {}", vault.display());
    for folder in layout.folders() {
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("  ready:   {name}/");
    }
    if config_written {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }
    Ok(())
}
