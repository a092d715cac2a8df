// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` routes each message to a focused handler method in the
//! `handlers` submodules. Handlers return the status line to show; failures
//! are recovered here and turned into a status line too, so no message ends
//! the session.
//!
//! # Handler Modules
//!
//! - `handlers::camera`: Camera start/stop, viewport and stream metadata
//! - `handlers::capture`: Overlay selection and photo capture
//! - `handlers::gallery`: Thumbnail activation, selection, fullscreen, deletes
//! - `handlers::export`: Archive export
//! - `handlers::remote`: AI/OCR processing

use crate::app::state::{AppModel, Message};
use crate::errors::{AppError, AppResult};
use tracing::{debug, error, warn};

impl AppModel {
    /// Main message handler - routes messages to appropriate handler methods.
    ///
    /// The returned result mirrors the handler outcome; the status line has
    /// already been updated either way.
    pub async fn update(&mut self, message: Message) -> AppResult<()> {
        debug!(?message, "Handling message");

        let result = match message {
            // ===== Camera =====
            Message::StartCamera => self.handle_start_camera().await,
            Message::StopCamera => self.handle_stop_camera(),
            Message::ViewportChanged(viewport) => self.handle_viewport_changed(viewport),
            Message::StreamMetadataChanged => self.handle_stream_metadata_changed(),

            // ===== Capture =====
            Message::SelectOverlay(id) => self.handle_select_overlay(id),
            Message::Capture => self.handle_capture().await,

            // ===== Gallery Interaction =====
            Message::ThumbnailActivated(index) => self.handle_thumbnail_activated(index),
            Message::SelectionTimerElapsed => self.handle_selection_timer_elapsed(),
            Message::ToggleSelection(index) => self.handle_toggle_selection(index),
            Message::ViewPhoto(index) => self.handle_view_photo(index),
            Message::CloseFullscreen => {
                self.fullscreen = None;
                Ok(None)
            }

            // ===== Gallery Management =====
            Message::DeleteSelected => self.handle_delete_selected().await,
            Message::DeleteAll => self.handle_delete_all().await,

            // ===== Export =====
            Message::ExportSelected { archive_name } => {
                self.handle_export_selected(archive_name).await
            }

            // ===== Remote Processing =====
            Message::ProcessSelected => self.handle_process_selected().await,
        };

        match result {
            Ok(Some(status)) => {
                self.status = Some(status);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                if err.is_consistency_bug() {
                    error!(error = %err, "Gallery consistency error");
                } else {
                    warn!(error = %err, "Command failed");
                }
                self.status = Some(status_for_error(&err));
                Err(err)
            }
        }
    }
}

/// User-visible wording for a failed command
pub(crate) fn status_for_error(err: &AppError) -> String {
    match err {
        AppError::IndexOutOfRange { .. } => "Photo not found".to_string(),
        other => other.to_string(),
    }
}
