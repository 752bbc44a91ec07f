//! Configuration file management
//!
//! Loads TOML configuration files and provides input settings.
//! Default config path: ~/.config/evmux/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_CMDLINE_PATH, DEFAULT_DEVICE_DIR, DEFAULT_RES_REMAP_DIR, DEFAULT_SDCARD_DIR,
    DEFAULT_USER_REMAP_DIR,
};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device discovery settings
    pub input: InputConfig,
    /// Key remap settings
    pub remap: RemapConfig,
}

/// Device discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory scanned for event<N> nodes
    pub device_dir: PathBuf,
    /// Boot command line holding the DEVICE= parameter
    pub cmdline_path: PathBuf,
    /// Device tag (overrides DEVICE= from the command line when set)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_tag: Option<String>,
}

/// Key remap settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemapConfig {
    /// Look up .keys files for each descriptor
    pub enabled: bool,
    /// External storage root; tagged files live in {sdcard_dir}/devices/{tag}/
    pub sdcard_dir: PathBuf,
    /// Directories searched in order (writable first, bundled last)
    pub search_dirs: Vec<PathBuf>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_dir: PathBuf::from(DEFAULT_DEVICE_DIR),
            cmdline_path: PathBuf::from(DEFAULT_CMDLINE_PATH),
            device_tag: None,
        }
    }
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sdcard_dir: PathBuf::from(DEFAULT_SDCARD_DIR),
            search_dirs: vec![
                PathBuf::from(DEFAULT_USER_REMAP_DIR),
                PathBuf::from(DEFAULT_RES_REMAP_DIR),
            ],
        }
    }
}

impl Config {
    const SYSTEM_CONFIG_PATH: &'static str = "/etc/evmux/config.toml";

    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. EVMUX_CONFIG environment variable
        if let Ok(path) = std::env::var("EVMUX_CONFIG") {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/evmux/config.toml
        if let Some(config_path) = default_config_path() {
            if config_path.exists() {
                return Some(config_path);
            }
        }

        // 3. System config: /etc/evmux/config.toml
        let system_config = Path::new(Self::SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Some(system_config.to_path_buf());
        }

        None
    }

    /// Load configuration with priority:
    /// 1. EVMUX_CONFIG environment variable
    /// 2. ~/.config/evmux/config.toml (user config)
    /// 3. /etc/evmux/config.toml (system config)
    /// 4. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse settings from TOML text; missing keys take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Write the built-in defaults to `path` (for template generation)
    pub fn write_default_config(path: &Path) -> Result<PathBuf> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let content = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        info!("Config written: {}", path.display());
        Ok(path.to_path_buf())
    }
}

/// Get default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("evmux").join("config.toml"))
}
