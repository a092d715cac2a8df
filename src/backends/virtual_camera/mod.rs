// SPDX-License-Identifier: GPL-3.0-only

//! Image-backed virtual camera
//!
//! Serves a still image as a live stream. Used by the command-line front-end
//! (the "camera" is a picture on disk) and by tests, which can swap the frame
//! mid-session to simulate device rotation or deny access.

use crate::backends::camera::types::{
    BackendError, BackendResult, CameraFrame, FacingMode, FrameSource, MediaStream, MediaTrack,
    StreamSettings, VideoConstraints,
};
use crate::backends::camera::CameraBackend;
use futures::future::BoxFuture;
use image::RgbaImage;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<RgbaImage> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;
    let rgba = img.to_rgba8();

    info!(width = rgba.width(), height = rgba.height(), "Image loaded successfully");
    Ok(rgba)
}

/// Frame source returning the same still image on every grab
pub struct StillFrameSource {
    frame: RwLock<Arc<RgbaImage>>,
    facing: Option<FacingMode>,
    metadata_loaded: AtomicBool,
}

impl StillFrameSource {
    pub fn new(image: RgbaImage, facing: Option<FacingMode>) -> Self {
        Self {
            frame: RwLock::new(Arc::new(image)),
            facing,
            metadata_loaded: AtomicBool::new(true),
        }
    }

    /// Open an image file as a frame source
    pub fn open(path: &Path, facing: Option<FacingMode>) -> BackendResult<Self> {
        Ok(Self::new(load_image_as_frame(path)?, facing))
    }

    /// Replace the frame (changes stream geometry if dimensions differ)
    pub fn set_frame(&self, image: RgbaImage) {
        if let Ok(mut frame) = self.frame.write() {
            *frame = Arc::new(image);
        }
    }

    /// Control whether settings are reported yet
    pub fn set_metadata_loaded(&self, loaded: bool) {
        self.metadata_loaded.store(loaded, Ordering::SeqCst);
    }

    pub fn facing(&self) -> Option<FacingMode> {
        self.facing
    }

    fn current(&self) -> BackendResult<Arc<RgbaImage>> {
        self.frame
            .read()
            .map(|frame| Arc::clone(&frame))
            .map_err(|_| BackendError::Other("frame lock poisoned".into()))
    }
}

impl FrameSource for StillFrameSource {
    fn settings(&self) -> Option<StreamSettings> {
        if !self.metadata_loaded.load(Ordering::SeqCst) {
            return None;
        }
        let frame = self.current().ok()?;
        Some(StreamSettings {
            width: frame.width(),
            height: frame.height(),
            facing_mode: self.facing,
        })
    }

    fn grab_frame(&self) -> BackendResult<CameraFrame> {
        Ok(CameraFrame::new(self.current()?))
    }
}

/// A named virtual device
#[derive(Clone)]
pub struct VirtualDevice {
    pub name: String,
    pub source: Arc<StillFrameSource>,
}

impl VirtualDevice {
    pub fn new(name: impl Into<String>, source: Arc<StillFrameSource>) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// Camera backend over a fixed list of virtual devices
#[derive(Default)]
pub struct VirtualCameraBackend {
    devices: Vec<VirtualDevice>,
    permission_denied: AtomicBool,
    busy: AtomicBool,
    live_tracks: Arc<AtomicUsize>,
    requests: AtomicUsize,
}

impl VirtualCameraBackend {
    pub fn new(devices: Vec<VirtualDevice>) -> Self {
        Self {
            devices,
            ..Self::default()
        }
    }

    /// Backend with no devices at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Simulate the user refusing camera access
    pub fn set_permission_denied(&self, denied: bool) {
        self.permission_denied.store(denied, Ordering::SeqCst);
    }

    /// Simulate the camera being held by another application
    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    /// Tracks created by this backend that have not been stopped
    pub fn live_tracks(&self) -> usize {
        self.live_tracks.load(Ordering::SeqCst)
    }

    /// Number of acquisition requests received
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn devices(&self) -> &[VirtualDevice] {
        &self.devices
    }

    fn open_stream(&self, constraints: VideoConstraints) -> BackendResult<MediaStream> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if self.permission_denied.load(Ordering::SeqCst) {
            return Err(BackendError::PermissionDenied(
                "camera access was not granted".into(),
            ));
        }
        if self.devices.is_empty() {
            return Err(BackendError::DeviceNotFound("no virtual devices".into()));
        }
        if self.busy.load(Ordering::SeqCst) {
            return Err(BackendError::NotReadable("device is in use".into()));
        }

        let device = self
            .devices
            .iter()
            .find(|d| match constraints.facing_mode {
                Some(wanted) => d.source.facing() == Some(wanted),
                None => true,
            })
            .ok_or_else(|| BackendError::Overconstrained("facingMode".into()))?;

        debug!(device = %device.name, ?constraints, "Opening virtual stream");
        let track = MediaTrack::new(device.name.clone(), Arc::clone(&self.live_tracks));
        let source: Arc<dyn FrameSource> = device.source.clone();
        Ok(MediaStream::new(vec![track], source))
    }
}

impl CameraBackend for VirtualCameraBackend {
    fn acquire(&self, constraints: VideoConstraints) -> BoxFuture<'_, BackendResult<MediaStream>> {
        Box::pin(async move { self.open_stream(constraints) })
    }

    fn name(&self) -> &str {
        "virtual"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(facing: Option<FacingMode>) -> VirtualDevice {
        VirtualDevice::new(
            "test",
            Arc::new(StillFrameSource::new(RgbaImage::new(4, 2), facing)),
        )
    }

    #[tokio::test]
    async fn test_facing_constraint_is_enforced() {
        let backend = VirtualCameraBackend::new(vec![device(Some(FacingMode::User))]);
        let err = backend
            .acquire(VideoConstraints::preferred())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Overconstrained(_)));

        let stream = backend.acquire(VideoConstraints::relaxed()).await.unwrap();
        assert_eq!(backend.live_tracks(), 1);
        drop(stream);
        assert_eq!(backend.live_tracks(), 0);
    }

    #[test]
    fn test_settings_hidden_until_metadata_loads() {
        let source = StillFrameSource::new(RgbaImage::new(6, 3), None);
        source.set_metadata_loaded(false);
        assert!(source.settings().is_none());
        source.set_metadata_loaded(true);
        assert_eq!(source.settings().map(|s| (s.width, s.height)), Some((6, 3)));
    }
}
