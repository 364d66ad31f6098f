use anyhow::{Context, Result};
use std::path::PathBuf;

pub mod config;
pub mod confirm;
pub mod credentials;
pub mod executor;
pub mod prompt;
pub mod providers;
pub mod spinner;

pub fn get_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Failed to find home directory")?;
    Ok(home_dir.join(".how").join("config.json"))
}

/// Shell the generated command should target, taken from `$SHELL`.
pub fn detect_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_shell().to_string())
}

fn default_shell() -> &'static str {
    if cfg!(target_os = "windows") {
        "powershell"
    } else {
        "sh"
    }
}

pub fn detect_platform() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else {
        "linux"
    }
}
