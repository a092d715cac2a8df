// SPDX-License-Identifier: GPL-3.0-only

//! Async photo capture pipeline
//!
//! ```text
//! Live stream → Grab frame → Orient + overlay → PNG encode → data URI
//!       ↓
//! Preview continues uninterrupted
//! ```
//!
//! Compositing and encoding are CPU-bound and run on the blocking pool.

pub mod compositor;
pub mod encoding;
pub mod orientation;

pub use compositor::{OverlayImage, compose};
pub use encoding::{EncodedImage, decode_data_uri, encode_png};
pub use orientation::{Rotation, StreamOrientation, Viewport};

use crate::backends::camera::types::MediaStream;
use crate::errors::PhotoError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Capture → composite → encode
pub struct PhotoPipeline;

impl PhotoPipeline {
    /// Capture one still from `stream`
    ///
    /// Fails with [`PhotoError::CameraInactive`] when there is no live stream.
    /// A selected overlay that has not finished decoding is skipped for this
    /// capture only.
    pub async fn capture(
        stream: Option<&MediaStream>,
        orientation: StreamOrientation,
        overlay: Option<&OverlayImage>,
    ) -> Result<EncodedImage, PhotoError> {
        let stream = stream.ok_or(PhotoError::CameraInactive)?;

        let frame = stream
            .grab_frame()
            .map_err(|e| PhotoError::CaptureFailed(e.to_string()))?;

        let overlay = match overlay {
            None => None,
            Some(state) => match state.decoded() {
                Some(image) => Some(Arc::clone(image)),
                None => {
                    warn!(
                        state = overlay_state_name(state),
                        "Overlay not decoded, capturing without it"
                    );
                    None
                }
            },
        };

        info!(
            width = frame.width(),
            height = frame.height(),
            rotation = %orientation.rotation,
            mirrored = orientation.mirrored,
            overlay = overlay.is_some(),
            "Capturing photo"
        );

        let image = Arc::clone(&frame.image);
        let encoded = tokio::task::spawn_blocking(move || {
            let composed = compose(&image, orientation, overlay.as_deref());
            encode_png(&composed)
        })
        .await
        .map_err(|e| PhotoError::EncodingFailed(format!("Encoding task error: {}", e)))??;

        debug!(
            bytes = encoded.data.len(),
            elapsed_ms = frame.age().as_millis() as u64,
            "Photo encoded"
        );
        Ok(encoded)
    }
}

fn overlay_state_name(state: &OverlayImage) -> &'static str {
    match state {
        OverlayImage::Loading => "loading",
        OverlayImage::Ready(_) => "empty",
        OverlayImage::Failed(_) => "failed",
    }
}
