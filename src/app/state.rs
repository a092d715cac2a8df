// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::app::gallery::{GalleryStore, PhotoNamer};
use crate::app::overlay::OverlayCatalog;
use crate::app::prompt::UserPrompt;
use crate::app::selection::{ActivationDebouncer, Clock};
use crate::backends::camera::CameraSessionManager;
use crate::config::Config;
use crate::pipelines::export::{ArchiveSaver, ExportPackager};
use crate::pipelines::photo::Viewport;
use crate::remote::RemoteProcessor;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Result of the last AI/OCR request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Name of the processed photo
    pub photo: String,
    pub message: Option<String>,
    /// Field name → recognized text
    pub fields: BTreeMap<String, String>,
    /// Text carried by the returned QR code, when it could be decoded
    pub qr_payload: Option<String>,
}

/// Which gallery buttons are usable right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GalleryControls {
    pub can_delete_selected: bool,
    pub can_delete_all: bool,
    pub can_export: bool,
    pub can_process: bool,
}

/// The session context
///
/// Owns every component of the capture pipeline. Created by the composition
/// root and driven exclusively through [`Message`]s.
pub struct AppModel {
    /// Configuration loaded at startup
    pub config: Config,
    /// The single live camera stream and its orientation
    pub camera: CameraSessionManager,
    /// Captured photos with selection flags
    pub gallery: GalleryStore,
    /// Known overlays and the active one
    pub overlays: OverlayCatalog,
    /// Single vs double activation state per thumbnail
    pub selection: ActivationDebouncer,
    /// Unique photo names
    pub namer: PhotoNamer,
    /// Archive builder
    pub packager: ExportPackager,
    pub clock: Arc<dyn Clock>,
    pub prompt: Arc<dyn UserPrompt>,
    pub saver: Arc<dyn ArchiveSaver>,
    /// AI/OCR collaborator, absent when no endpoint is configured
    pub remote: Option<Arc<dyn RemoteProcessor>>,
    /// Index of the photo shown fullscreen
    pub fullscreen: Option<usize>,
    /// Last user-visible status line
    pub status: Option<String>,
    /// Where the last archive was saved
    pub last_export: Option<PathBuf>,
    /// Last AI/OCR result
    pub last_extraction: Option<Extraction>,
}

/// Messages that drive the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // ===== Camera =====
    /// Acquire (or re-acquire) the camera
    StartCamera,
    /// Release the camera
    StopCamera,
    /// Viewport geometry changed (device rotation, window resize)
    ViewportChanged(Viewport),
    /// Stream metadata (geometry, facing) became available or changed
    StreamMetadataChanged,

    // ===== Capture =====
    /// Switch overlay, `None` removes it
    SelectOverlay(Option<String>),
    /// Capture one photo into the gallery
    Capture,

    // ===== Gallery Interaction =====
    /// Ambiguous activation of a thumbnail (tap / click)
    ThumbnailActivated(usize),
    /// A pending single-activation window may have elapsed
    SelectionTimerElapsed,
    /// Dedicated select checkbox
    ToggleSelection(usize),
    /// Dedicated view button
    ViewPhoto(usize),
    CloseFullscreen,

    // ===== Gallery Management =====
    DeleteSelected,
    DeleteAll,

    // ===== Export =====
    /// Package the selected photos; a blank name uses the fallback
    ExportSelected { archive_name: String },

    // ===== Remote Processing =====
    /// Send the single selected photo to the AI/OCR service
    ProcessSelected,
}
