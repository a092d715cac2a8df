// SPDX-License-Identifier: GPL-3.0-only

//! Camera control handlers
//!
//! Handles camera start/stop, viewport changes and stream metadata updates,
//! plus the restart policy applied after destructive gallery commands.

use super::HandlerResult;
use crate::app::state::AppModel;
use crate::pipelines::photo::Viewport;
use tracing::{debug, info, warn};

impl AppModel {
    // =========================================================================
    // Camera Control Handlers
    // =========================================================================

    pub(crate) async fn handle_start_camera(&mut self) -> HandlerResult {
        self.camera.start().await?;
        let orientation = self.camera.orientation();
        Ok(Some(format!(
            "Camera ready (rotation {}, {})",
            orientation.rotation,
            if orientation.mirrored {
                "mirrored"
            } else {
                "not mirrored"
            }
        )))
    }

    pub(crate) fn handle_stop_camera(&mut self) -> HandlerResult {
        self.camera.stop();
        Ok(Some("Camera stopped".to_string()))
    }

    pub(crate) fn handle_viewport_changed(&mut self, viewport: Viewport) -> HandlerResult {
        debug!(width = viewport.width, height = viewport.height, "Viewport changed");
        if self.camera.set_viewport(viewport) {
            info!(rotation = %self.camera.orientation().rotation, "Orientation updated for new viewport");
        }
        Ok(None)
    }

    pub(crate) fn handle_stream_metadata_changed(&mut self) -> HandlerResult {
        if self.camera.refresh_metadata() {
            info!(rotation = %self.camera.orientation().rotation, "Orientation updated for new stream geometry");
        }
        Ok(None)
    }

    // =========================================================================
    // Restart Policy
    // =========================================================================

    /// Re-acquire the camera after a destructive gallery command
    ///
    /// Only applies when enabled in config and the session was started
    /// before. Returns a suffix for the status line.
    pub(crate) async fn restart_camera_after_delete(&mut self) -> Option<String> {
        if !self.config.restart_camera_after_delete || !self.camera.has_started() {
            return None;
        }

        info!("Restarting camera after delete");
        match self.camera.start().await {
            Ok(()) => Some("camera restarted".to_string()),
            Err(e) => {
                warn!(error = %e, "Camera restart after delete failed");
                Some(format!("camera restart failed: {}", e))
            }
        }
    }
}
