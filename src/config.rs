// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{self, naming, selection};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::orientation::Viewport;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// One entry of the fixed overlay set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayAsset {
    /// Key stored in the persistence mirror
    pub id: String,
    /// Human readable label (also used in photo names)
    pub label: String,
    /// Image file composited onto captures
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Single vs double activation window in milliseconds (200-300)
    pub debounce_window_ms: u64,
    /// Re-acquire the camera after deleting photos
    pub restart_camera_after_delete: bool,
    /// Known overlays
    pub overlays: Vec<OverlayAsset>,
    /// Overlay selected when nothing is persisted yet
    pub default_overlay: Option<String>,
    /// Archive name used when the requested one is blank
    pub archive_fallback_name: String,
    /// AI/OCR endpoint, processing is disabled when unset
    pub remote_endpoint: Option<String>,
    /// Viewport assumed by front-ends without a real one
    pub viewport: Viewport,
    /// Override for the persistence mirror file
    pub storage_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_window_ms: selection::DEFAULT_DEBOUNCE_MS,
            restart_camera_after_delete: true,
            overlays: Vec::new(),
            default_overlay: None,
            archive_fallback_name: naming::ARCHIVE_FALLBACK_NAME.to_string(),
            remote_endpoint: None,
            viewport: Viewport::new(constants::DEFAULT_VIEWPORT.0, constants::DEFAULT_VIEWPORT.1),
            storage_path: None,
        }
    }
}

impl Config {
    /// Default location: `<config_dir>/boardscan/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(constants::APP_DIR_NAME).join("config.json"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`; a missing or invalid file yields defaults
    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Debounce window clamped into the accepted range
    pub fn debounce_window(&self) -> Duration {
        selection::debounce_window(self.debounce_window_ms)
    }

    /// Find an overlay by id
    pub fn overlay(&self, id: &str) -> Option<&OverlayAsset> {
        self.overlays.iter().find(|o| o.id == id)
    }

    /// Mirror file, either the override or `<data_dir>/boardscan/storage.json`
    pub fn storage_file(&self) -> Option<PathBuf> {
        self.storage_path.clone().or_else(|| {
            dirs::data_dir().map(|dir| dir.join(constants::APP_DIR_NAME).join("storage.json"))
        })
    }
}
