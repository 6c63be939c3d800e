use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5698/webhook";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub user_name: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            user_name: String::new(),
        }
    }
}

impl Settings {
    /// Apply a per-run `--base-url` / `LEDGERLENS_BASE_URL` override.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        self
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ledgerlens")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| LedgerError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

/// Check that a base URL is usable before it is written to disk.
pub fn validate_base_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(LedgerError::Settings(format!(
            "Base URL must start with http:// or https:// (got '{url}')"
        )));
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            base_url: "https://example.ngrok-free.app/webhook".to_string(),
            request_timeout_secs: 5,
            user_name: "Asha".to_string(),
        };
        save_settings_to(&settings, &path).unwrap();
        let loaded = load_settings_from(&path);
        assert_eq!(loaded.base_url, "https://example.ngrok-free.app/webhook");
        assert_eq!(loaded.request_timeout_secs, 5);
        assert_eq!(loaded.user_name, "Asha");
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("absent.json"));
        assert_eq!(s.base_url, DEFAULT_BASE_URL);
        assert_eq!(s.request_timeout_secs, 30);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"user_name": "Ravi"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.base_url, DEFAULT_BASE_URL);
        assert_eq!(s.user_name, "Ravi");
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_settings_from(&path).base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_override_ignores_blank() {
        let s = Settings::default().with_base_url(Some("  ".to_string()));
        assert_eq!(s.base_url, DEFAULT_BASE_URL);
        let s = Settings::default().with_base_url(Some("http://10.0.0.2:5698/webhook".into()));
        assert_eq!(s.base_url, "http://10.0.0.2:5698/webhook");
    }

    #[test]
    fn test_validate_base_url() {
        assert_eq!(
            validate_base_url("https://host/webhook/").unwrap(),
            "https://host/webhook"
        );
        assert!(validate_base_url("host/webhook").is_err());
    }
}
