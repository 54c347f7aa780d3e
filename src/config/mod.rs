// SPDX-License-Identifier: MPL-2.0
//! This module handles the viewer's configuration, loaded from a
//! `settings.toml` file.
//!
//! # Configuration Sections
//!
//! - `[server]` - Base URL, user, credentials and user agent
//! - `[preview]` - Screen geometry previews are sized for
//! - `[navigation]` - Looping and local sort order
//! - `[media]` - Blob store size and extra mime aliases
//!
//! # Path Resolution
//!
//! 1. Use `load_from_path()`/`save_to_path()` with explicit path
//! 2. Set `VIEWER_CORE_CONFIG_DIR` environment variable
//! 3. Falls back to platform-specific config directory
//!
//! # Examples
//!
//! ```no_run
//! use viewer_core::config;
//!
//! // Load existing configuration (returns tuple with optional warning)
//! let (mut config, _warning) = config::load();
//!
//! config.navigation.can_loop = Some(false);
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;
pub mod paths;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::media::source::Viewport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";

const MB: usize = 1024 * 1024;

// =============================================================================
// Enums (shared between sections)
// =============================================================================

/// Order of records produced by the local file-info source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Alphabetical,
    ModifiedDate,
    CreatedDate,
}

// =============================================================================
// Section Structs
// =============================================================================

/// Server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User whose WebDAV tree the file paths live in.
    #[serde(default = "default_user")]
    pub user: String,

    /// Bearer token; takes precedence over `password`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Password (or app password) for basic auth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user: default_user(),
            token: None,
            password: None,
            user_agent: None,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

/// Screen geometry used to size server previews.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewConfig {
    #[serde(default = "default_screen_width", skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<u32>,

    #[serde(default = "default_screen_height", skip_serializing_if = "Option::is_none")]
    pub screen_height: Option<u32>,

    #[serde(
        default = "default_device_pixel_ratio",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_pixel_ratio: Option<f64>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            device_pixel_ratio: default_device_pixel_ratio(),
        }
    }
}

impl PreviewConfig {
    /// Viewport with defaults filled in and the pixel ratio clamped.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        let ratio = self
            .device_pixel_ratio
            .filter(|ratio| ratio.is_finite())
            .unwrap_or(DEFAULT_DEVICE_PIXEL_RATIO)
            .clamp(MIN_DEVICE_PIXEL_RATIO, MAX_DEVICE_PIXEL_RATIO);
        Viewport {
            width: self.screen_width.unwrap_or(DEFAULT_SCREEN_WIDTH),
            height: self.screen_height.unwrap_or(DEFAULT_SCREEN_HEIGHT),
            device_pixel_ratio: ratio,
        }
    }
}

/// Navigation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavigationConfig {
    /// Wrap from the last file to the first and back.
    #[serde(default = "default_can_loop", skip_serializing_if = "Option::is_none")]
    pub can_loop: Option<bool>,

    /// Sort order of local folder listings.
    #[serde(default = "default_sort_order", skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            can_loop: default_can_loop(),
            sort_order: default_sort_order(),
        }
    }
}

impl NavigationConfig {
    #[must_use]
    pub fn can_loop(&self) -> bool {
        self.can_loop.unwrap_or(true)
    }

    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or_default()
    }
}

/// Media handling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaConfig {
    /// Blob store size in megabytes.
    #[serde(default = "default_blob_cache_mb", skip_serializing_if = "Option::is_none")]
    pub blob_cache_mb: Option<u32>,

    /// Extra mime aliases merged over the built-in table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mime_aliases: BTreeMap<String, String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            blob_cache_mb: default_blob_cache_mb(),
            mime_aliases: BTreeMap::new(),
        }
    }
}

impl MediaConfig {
    /// Blob store size in bytes, clamped to the supported range.
    #[must_use]
    pub fn blob_cache_bytes(&self) -> usize {
        let mb = self
            .blob_cache_mb
            .unwrap_or(DEFAULT_BLOB_CACHE_MB)
            .clamp(MIN_BLOB_CACHE_MB, MAX_BLOB_CACHE_MB);
        mb as usize * MB
    }
}

/// Root configuration, one field per section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub preview: PreviewConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,

    #[serde(default)]
    pub media: MediaConfig,
}

// =============================================================================
// Default Value Functions
// =============================================================================

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_screen_width() -> Option<u32> {
    Some(DEFAULT_SCREEN_WIDTH)
}

fn default_screen_height() -> Option<u32> {
    Some(DEFAULT_SCREEN_HEIGHT)
}

fn default_device_pixel_ratio() -> Option<f64> {
    Some(DEFAULT_DEVICE_PIXEL_RATIO)
}

fn default_can_loop() -> Option<bool> {
    Some(true)
}

fn default_sort_order() -> Option<SortOrder> {
    Some(SortOrder::default())
}

fn default_blob_cache_mb() -> Option<u32> {
    Some(DEFAULT_BLOB_CACHE_MB)
}

// =============================================================================
// Config Path Resolution
// =============================================================================

/// Returns the config file path with an optional directory override.
fn get_config_path_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
    paths::config_dir(base_dir).map(|mut path| {
        path.push(CONFIG_FILE);
        path
    })
}

// =============================================================================
// Load Functions
// =============================================================================

/// Loads the configuration from the default path.
///
/// Returns a tuple of (config, optional_warning). If loading fails, returns
/// default config with a warning message explaining what went wrong.
pub fn load() -> (Config, Option<String>) {
    load_with_override(None)
}

/// Loads the configuration from a custom directory.
pub fn load_with_override(base_dir: Option<PathBuf>) -> (Config, Option<String>) {
    if let Some(path) = get_config_path_with_override(base_dir) {
        if path.exists() {
            match load_from_path(&path) {
                Ok(config) => return (config, None),
                Err(err) => {
                    tracing::warn!("Ignoring invalid config {}: {err}", path.display());
                    return (
                        Config::default(),
                        Some(format!("invalid settings file {}: {err}", path.display())),
                    );
                }
            }
        }
    }
    (Config::default(), None)
}

/// Loads configuration from a specific path.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`] if
/// it is not valid TOML for [`Config`].
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

// =============================================================================
// Save Functions
// =============================================================================

/// Saves the configuration to the default path.
///
/// # Errors
///
/// See [`save_to_path`].
pub fn save(config: &Config) -> Result<()> {
    save_with_override(config, None)
}

/// Saves the configuration to a custom directory.
///
/// # Errors
///
/// See [`save_to_path`].
pub fn save_with_override(config: &Config, base_dir: Option<PathBuf>) -> Result<()> {
    if let Some(path) = get_config_path_with_override(base_dir) {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Saves configuration to a specific path, creating parent directories.
///
/// # Errors
///
/// Returns [`Error::Io`] on filesystem failure.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config).map_err(Error::from)?;
    fs::write(path, content)?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
