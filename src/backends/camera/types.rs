// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Camera facing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera, facing the user
    User,
    /// Rear camera, facing away from the user
    Environment,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::User => write!(f, "user"),
            FacingMode::Environment => write!(f, "environment"),
        }
    }
}

impl std::str::FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "front" => Ok(FacingMode::User),
            "environment" | "rear" | "back" => Ok(FacingMode::Environment),
            other => Err(format!("unknown facing mode: {}", other)),
        }
    }
}

/// Video constraints for stream acquisition
///
/// `facing_mode: None` is the relaxed "any camera" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoConstraints {
    pub facing_mode: Option<FacingMode>,
}

impl VideoConstraints {
    /// Preferred request: rear (environment) camera
    pub fn preferred() -> Self {
        Self {
            facing_mode: Some(FacingMode::Environment),
        }
    }

    /// Relaxed request: any camera
    pub fn relaxed() -> Self {
        Self { facing_mode: None }
    }
}

/// Geometry reported by a stream once its metadata has loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    pub width: u32,
    pub height: u32,
    pub facing_mode: Option<FacingMode>,
}

/// One RGBA video frame
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub image: Arc<RgbaImage>,
    pub captured_at: Instant,
}

impl CameraFrame {
    pub fn new(image: Arc<RgbaImage>) -> Self {
        Self {
            image,
            captured_at: Instant::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Time elapsed since the frame was grabbed
    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }
}

/// Producer of frames behind a live stream
pub trait FrameSource: Send + Sync {
    /// Current stream geometry, `None` until metadata has loaded
    fn settings(&self) -> Option<StreamSettings>;

    /// Copy out the current frame
    fn grab_frame(&self) -> BackendResult<CameraFrame>;
}

/// A single video track of a stream
///
/// Live tracks are counted in a shared counter so leaked hardware access is
/// observable. Stopping is idempotent.
#[derive(Debug)]
pub struct MediaTrack {
    label: String,
    live: AtomicBool,
    live_counter: Arc<AtomicUsize>,
}

impl MediaTrack {
    pub fn new(label: impl Into<String>, live_counter: Arc<AtomicUsize>) -> Self {
        live_counter.fetch_add(1, Ordering::SeqCst);
        Self {
            label: label.into(),
            live: AtomicBool::new(true),
            live_counter,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.live_counter.fetch_sub(1, Ordering::SeqCst);
            debug!(track = %self.label, "Track stopped");
        }
    }
}

impl Drop for MediaTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A live camera stream
pub struct MediaStream {
    id: uuid::Uuid,
    tracks: Vec<MediaTrack>,
    source: Arc<dyn FrameSource>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>, source: Arc<dyn FrameSource>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            tracks,
            source,
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// True while at least one track is live
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }

    /// Stop every track of this stream
    pub fn stop_all_tracks(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    pub fn settings(&self) -> Option<StreamSettings> {
        self.source.settings()
    }

    pub fn grab_frame(&self) -> BackendResult<CameraFrame> {
        if !self.is_active() {
            return Err(BackendError::NotReadable("stream has ended".into()));
        }
        self.source.grab_frame()
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Acquisition and streaming failures reported by a backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Access refused by the user or platform
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// No matching device exists at all
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Device exists but cannot be read (in use elsewhere)
    #[error("Device not readable: {0}")]
    NotReadable(String),
    /// No device satisfies the named constraint
    #[error("Constraint cannot be satisfied: {0}")]
    Overconstrained(String),
    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}
