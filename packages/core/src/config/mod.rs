//! Configuration management for labhost
//!
//! Handles loading, saving, and validating the JSONC configuration file.
//! Creates a default config if missing.

pub mod paths;
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jsonc_parser::parse_to_serde_value;

pub use paths::{get_config_dir, get_config_path, get_nodes_path};
pub use schema::Config;

/// Ensure the config directory exists
///
/// Creates `~/.config/labhost/` if it doesn't exist.
pub fn ensure_config_dir() -> Result<PathBuf> {
    let config_dir =
        get_config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;
        tracing::info!("Created config directory: {}", config_dir.display());
    }

    Ok(config_dir)
}

/// Load `~/.config/labhost/config.json`, creating it with defaults if missing
pub fn load_config() -> Result<Config> {
    let config_path =
        get_config_path().ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;
    ensure_config_dir()?;
    load_config_from(&config_path)
}

/// Save to `~/.config/labhost/config.json`
pub fn save_config(config: &Config) -> Result<()> {
    ensure_config_dir()?;
    let config_path =
        get_config_path().ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;
    save_config_to(config, &config_path)
}

/// Load configuration from `path`
///
/// Supports JSONC (JSON with comments). Unknown fields are rejected. A
/// missing file is created with default values.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::info!(
            "Config file not found, creating default at: {}",
            path.display()
        );
        let config = Config::default();
        save_config_to(&config, path)?;
        return Ok(config);
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let parsed_value = parse_to_serde_value(&contents, &Default::default())
        .map_err(|e| anyhow::anyhow!("Invalid JSONC in config file: {}", e))?
        .ok_or_else(|| anyhow::anyhow!("Config file is empty"))?;

    let config: Config = serde_json::from_value(parsed_value).with_context(|| {
        format!(
            "Invalid configuration in {}. Check for unknown fields or invalid values.",
            path.display()
        )
    })?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration in {}: {}", path.display(), e))?;

    Ok(config)
}

/// Save configuration to `path`
///
/// Copies an existing file to `config.json.bak` before overwriting.
pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if path.exists() {
        let backup_path = path.with_extension("json.bak");
        fs::copy(path, &backup_path)
            .with_context(|| format!("Failed to create backup at: {}", backup_path.display()))?;
        tracing::debug!("Created config backup: {}", backup_path.display());
    }

    let json = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    tracing::debug!("Saved config to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = load_config_from(&path).unwrap();

        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn jsonc_comments_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                // lab nodes boot slowly
                "version": 1,
                "ssh_user": "root",
                "boot_attempts": 4, // trailing comment
            }"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.ssh_user, "root");
        assert_eq!(config.boot_attempts, 4);
    }

    #[test]
    fn unknown_field_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"version": 1, "bogus": true}"#).unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.json"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"version": 1, "boot_attempts": 0}"#).unwrap();

        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn save_writes_backup_of_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config_to(&Config::default(), &path).unwrap();
        let changed = Config {
            ssh_user: "admin".to_string(),
            ..Config::default()
        };
        save_config_to(&changed, &path).unwrap();

        let backup = dir.path().join("config.json.bak");
        assert!(backup.exists());
        assert_eq!(load_config_from(&path).unwrap().ssh_user, "admin");
        assert_eq!(load_config_from(&backup).unwrap().ssh_user, "core");
    }
}
