// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Persistence mirror keys
pub mod storage_keys {
    /// JSON array of photo records
    pub const CAPTURED_PHOTOS: &str = "capturedPhotos";
    /// Currently selected overlay id (empty string = none)
    pub const SELECTED_OVERLAY: &str = "selectedOverlay";
}

/// Single/double activation disambiguation
pub mod selection {
    use super::Duration;

    /// Default window in which a second activation means "view fullscreen"
    pub const DEFAULT_DEBOUNCE_MS: u64 = 250;
    /// Shortest accepted window
    pub const MIN_DEBOUNCE_MS: u64 = 200;
    /// Longest accepted window
    pub const MAX_DEBOUNCE_MS: u64 = 300;

    /// Clamp a configured window into the accepted range
    pub fn debounce_window(ms: u64) -> Duration {
        Duration::from_millis(ms.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS))
    }
}

/// Photo and archive naming
pub mod naming {
    /// Prefix of every captured photo name
    pub const PHOTO_PREFIX: &str = "photo";
    /// Extension of captured photos (lossless PNG)
    pub const PHOTO_EXTENSION: &str = "png";
    /// Label used in photo names when no overlay is selected
    pub const NO_OVERLAY_LABEL: &str = "none";
    /// Archive name used when the requested one is blank
    pub const ARCHIVE_FALLBACK_NAME: &str = "selected_photos";
    /// Extension appended to archive names
    pub const ARCHIVE_EXTENSION: &str = "zip";
    /// MIME type of captured photos inside data URIs
    pub const PHOTO_MIME: &str = "image/png";

    /// Whether a character may appear in a stored file name
    pub fn is_filename_safe(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
    }
}

/// Default viewport used when the front-end has no real one (portrait phone)
pub const DEFAULT_VIEWPORT: (u32, u32) = (400, 800);

/// Application directory name under the platform config/data dirs
pub const APP_DIR_NAME: &str = "boardscan";

/// Version string stamped by build.rs
pub fn app_version() -> &'static str {
    env!("GIT_VERSION")
}
