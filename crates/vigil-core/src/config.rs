use crate::connectors::{chat, files, inbox};
use crate::error::{Result, VigilError};
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Per-connector sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_files_interval")]
    pub interval_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch: Option<PathBuf>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_files_interval() -> u64 {
    60
}

fn default_exclude() -> Vec<String> {
    files::DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_files_interval(),
            watch: None,
            exclude: default_exclude(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxConfig {
    #[serde(default = "default_inbox_interval")]
    pub interval_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spool: Option<PathBuf>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_inbox_interval() -> u64 {
    120
}

fn default_max_results() -> usize {
    inbox::DEFAULT_MAX_RESULTS
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_inbox_interval(),
            spool: None,
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_interval")]
    pub interval_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spool: Option<PathBuf>,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_warmup")]
    pub warmup: usize,
}

fn default_chat_interval() -> u64 {
    30
}

fn default_keywords() -> Vec<String> {
    chat::DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

fn default_warmup() -> usize {
    chat::DEFAULT_WARMUP
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_chat_interval(),
            spool: None,
            keywords: default_keywords(),
            warmup: default_warmup(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_network_interval")]
    pub interval_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spool: Option<PathBuf>,
}

fn default_network_interval() -> u64 {
    300
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_network_interval(),
            spool: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Optional `<vault>/.vigil.yaml`. Every field has a default, so an absent
/// file and an empty file mean the same thing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub inbox: InboxConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl Config {
    pub fn load(vault: &Path) -> Result<Self> {
        let path = paths::config_path(vault);
        let Some(data) = io::read_optional(&path)? else {
            return Ok(Self::default());
        };
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&data)
            .map_err(|e| VigilError::InvalidConfig(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, vault: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(&paths::config_path(vault), data.as_bytes())
    }

    /// Write the default config unless one exists. Returns true if written.
    pub fn write_default_if_missing(vault: &Path) -> Result<bool> {
        if paths::config_path(vault).exists() {
            return Ok(false);
        }
        Self::default().save(vault)?;
        Ok(true)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let intervals = [
            ("files", self.files.interval_secs),
            ("inbox", self.inbox.interval_secs),
            ("chat", self.chat.interval_secs),
            ("network", self.network.interval_secs),
        ];
        for (section, secs) in intervals {
            if secs == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{section}.interval_secs must be greater than zero"),
                });
            }
        }
        if self.inbox.max_results == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "inbox.max_results must be greater than zero".to_string(),
            });
        }
        if self.chat.keywords.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "chat.keywords is empty: only the first {} messages will be recorded",
                    self.chat.warmup
                ),
            });
        }
        if let Some(watch) = &self.files.watch {
            if !watch.is_dir() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("files.watch does not exist: {}", watch.display()),
                });
            }
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.files.interval_secs, 60);
        assert_eq!(config.inbox.interval_secs, 120);
        assert_eq!(config.chat.interval_secs, 30);
        assert_eq!(config.inbox.max_results, 10);
        assert_eq!(config.chat.keywords.len(), 7);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".vigil.yaml"),
            "chat:\n  interval_secs: 10\n  keywords: [deadline]\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.chat.interval_secs, 10);
        assert_eq!(config.chat.keywords, vec!["deadline".to_string()]);
        assert_eq!(config.chat.warmup, 5);
        assert_eq!(config.files.exclude, default_exclude());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".vigil.yaml"), "files: [unclosed").unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(VigilError::InvalidConfig(_))
        ));
    }

    #[test]
    fn default_roundtrip() {
        let dir = TempDir::new().unwrap();
        assert!(Config::write_default_if_missing(dir.path()).unwrap());
        assert!(!Config::write_default_if_missing(dir.path()).unwrap());
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.network.interval_secs, 300);
        assert!(loaded.validate().is_empty());
    }

    #[test]
    fn zero_interval_is_an_error() {
        let mut config = Config::default();
        config.files.interval_secs = 0;
        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Error);
    }

    #[test]
    fn empty_keywords_is_a_warning() {
        let mut config = Config::default();
        config.chat.keywords.clear();
        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
    }
}
