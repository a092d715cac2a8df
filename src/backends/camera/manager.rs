// SPDX-License-Identifier: GPL-3.0-only

//! Camera session lifecycle
//!
//! The manager provides:
//! - The only place a live stream is created or destroyed
//! - At most one live stream at any time (prior tracks stop before acquiring)
//! - A single relaxed-constraint retry when the preferred camera is missing
//! - Orientation re-resolution whenever stream or viewport geometry changes

use super::CameraBackend;
use super::types::*;
use crate::errors::CameraError;
use crate::pipelines::photo::orientation::{self, StreamOrientation, Viewport};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Session lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Never started, or stopped
    #[default]
    Idle,
    /// Acquisition in flight
    Requesting,
    /// A live stream is available
    Active,
    /// Last acquisition failed; no automatic retry
    Error(CameraError),
}

/// Owner of the single live camera stream
pub struct CameraSessionManager {
    backend: Arc<dyn CameraBackend>,
    state: SessionState,
    stream: Option<MediaStream>,
    viewport: Viewport,
    settings: Option<StreamSettings>,
    orientation: StreamOrientation,
}

impl CameraSessionManager {
    pub fn new(backend: Arc<dyn CameraBackend>, viewport: Viewport) -> Self {
        info!(backend = backend.name(), "Creating camera session manager");
        Self {
            backend,
            state: SessionState::Idle,
            stream: None,
            viewport,
            settings: None,
            orientation: StreamOrientation::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// True once `start` has been called at least once and not stopped
    pub fn has_started(&self) -> bool {
        self.state != SessionState::Idle
    }

    /// The live stream, if the session is active and its tracks are live
    pub fn stream(&self) -> Option<&MediaStream> {
        match self.state {
            SessionState::Active => self.stream.as_ref().filter(|s| s.is_active()),
            _ => None,
        }
    }

    pub fn orientation(&self) -> StreamOrientation {
        self.orientation
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Geometry of the active stream as last observed
    pub fn settings(&self) -> Option<StreamSettings> {
        self.settings
    }

    /// Acquire a stream, releasing any previous one first
    ///
    /// Tries the rear camera, then once more with any camera when the rear
    /// one cannot be satisfied. Other failures move the session to `Error`.
    pub async fn start(&mut self) -> Result<(), CameraError> {
        self.release_stream();
        self.state = SessionState::Requesting;
        info!("Requesting camera access");

        let result = match self.backend.acquire(VideoConstraints::preferred()).await {
            Err(BackendError::Overconstrained(constraint)) => {
                info!(%constraint, "Preferred camera unavailable, retrying with any camera");
                self.backend.acquire(VideoConstraints::relaxed()).await
            }
            other => other,
        };

        match result {
            Ok(stream) => {
                info!(stream = %stream.id(), tracks = stream.tracks().len(), "Camera active");
                self.stream = Some(stream);
                self.state = SessionState::Active;
                self.refresh_metadata();
                Ok(())
            }
            Err(e) => {
                let err = classify(e);
                warn!(error = %err, "Camera acquisition failed");
                self.state = SessionState::Error(err.clone());
                Err(err)
            }
        }
    }

    /// Stop the stream and return to `Idle`
    pub fn stop(&mut self) {
        self.release_stream();
        self.state = SessionState::Idle;
    }

    /// Re-read stream geometry and re-resolve orientation
    ///
    /// Returns true when the orientation changed. Streams whose metadata has
    /// not loaded yet keep the unrotated, unmirrored orientation they start
    /// with.
    pub fn refresh_metadata(&mut self) -> bool {
        let Some(settings) = self.stream.as_ref().and_then(MediaStream::settings) else {
            debug!("Stream metadata not available yet");
            return false;
        };
        self.settings = Some(settings);
        self.resolve_orientation()
    }

    /// Update viewport geometry (e.g. device rotation)
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        self.viewport = viewport;
        self.refresh_metadata()
    }

    fn resolve_orientation(&mut self) -> bool {
        let Some(settings) = self.settings else {
            return false;
        };
        let resolved = orientation::resolve(
            settings.width,
            settings.height,
            settings.facing_mode,
            self.viewport,
        );
        let changed = resolved != self.orientation;
        if changed {
            debug!(
                width = settings.width,
                height = settings.height,
                rotation = %resolved.rotation,
                mirrored = resolved.mirrored,
                "Orientation resolved"
            );
        }
        self.orientation = resolved;
        changed
    }

    fn release_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!(stream = %stream.id(), "Stopping previous stream");
            stream.stop_all_tracks();
        }
        self.settings = None;
        self.orientation = StreamOrientation::default();
    }
}

impl Drop for CameraSessionManager {
    fn drop(&mut self) {
        self.release_stream();
    }
}

/// Map backend failures onto the user-facing camera taxonomy
fn classify(err: BackendError) -> CameraError {
    match err {
        BackendError::PermissionDenied(_) => CameraError::PermissionDenied,
        BackendError::DeviceNotFound(_) => CameraError::NotFound,
        BackendError::NotReadable(msg) => CameraError::Unavailable(msg),
        BackendError::Overconstrained(constraint) => {
            CameraError::Unavailable(format!("no camera satisfies '{}'", constraint))
        }
        BackendError::Other(msg) => CameraError::Other(msg),
    }
}
