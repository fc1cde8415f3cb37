use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Where the dashboard looks when nothing is configured: the proxy's local
/// development address.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Base URL of the dashboard backend.
    ///
    /// Example TOML:
    /// backend_url = "http://weather.example.net"
    pub backend_url: Option<String>,
}

impl Config {
    /// Effective backend URL: the configured one, or the compiled-in default.
    pub fn backend_url(&self) -> &str {
        self.backend_url.as_deref().unwrap_or(DEFAULT_BACKEND_URL)
    }

    pub fn set_backend_url(&mut self, url: String) {
        self.backend_url = Some(url);
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skydash", "skydash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_falls_back_to_default_url() {
        let cfg = Config::default();
        assert_eq!(cfg.backend_url(), DEFAULT_BACKEND_URL);
    }

    #[test]
    fn configured_url_wins() {
        let mut cfg = Config::default();
        cfg.set_backend_url("http://weather.example.net".to_string());
        assert_eq!(cfg.backend_url(), "http://weather.example.net");
    }

    #[test]
    fn parses_backend_url_from_toml() {
        let cfg: Config =
            toml::from_str(r#"backend_url = "http://10.0.0.2:5000""#).expect("valid toml");
        assert_eq!(cfg.backend_url(), "http://10.0.0.2:5000");
    }

    #[test]
    fn empty_toml_is_a_valid_config() {
        let cfg: Config = toml::from_str("").expect("valid toml");
        assert!(cfg.backend_url.is_none());
    }
}
