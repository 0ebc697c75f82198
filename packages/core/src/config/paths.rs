//! XDG-style path resolution for labhost
//!
//! - Linux/macOS: `~/.config/labhost/`
//! - Windows: `%APPDATA%\labhost\`

use std::path::PathBuf;

const APP_DIR: &str = "labhost";

/// Directory holding config.json and nodes.json
pub fn get_config_dir() -> Option<PathBuf> {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".config").join(APP_DIR))
    }
    #[cfg(target_os = "windows")]
    {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().to_path_buf())
            .map(|d| d.join(APP_DIR))
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        None
    }
}

/// `{config_dir}/config.json`
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join("config.json"))
}

/// `{config_dir}/nodes.json`
pub fn get_nodes_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join("nodes.json"))
}
