// SPDX-License-Identifier: GPL-3.0-only

//! Gallery handlers
//!
//! Handles thumbnail activation (debounced single vs double), the explicit
//! select and view controls, fullscreen, and both delete commands.

use super::HandlerResult;
use crate::app::selection::Activation;
use crate::app::state::AppModel;
use crate::errors::{AppError, AppResult};
use std::time::Instant;
use tracing::{debug, info};

impl AppModel {
    // =========================================================================
    // Thumbnail Activation Handlers
    // =========================================================================

    pub(crate) fn handle_thumbnail_activated(&mut self, index: usize) -> HandlerResult {
        let now = self.clock.now();
        self.fire_due_toggles(now)?;

        let len = self.gallery.len();
        if index >= len {
            return Err(AppError::IndexOutOfRange { index, len });
        }

        match self.selection.activate(index, now) {
            Activation::PendingToggle => Ok(None),
            Activation::ViewFullscreen => {
                debug!(index, "Double activation");
                self.show_fullscreen(index)
            }
        }
    }

    pub(crate) fn handle_selection_timer_elapsed(&mut self) -> HandlerResult {
        let now = self.clock.now();
        if self.fire_due_toggles(now)? == 0 {
            return Ok(None);
        }
        Ok(Some(self.selection_summary()))
    }

    /// Apply every toggle whose window has elapsed
    fn fire_due_toggles(&mut self, now: Instant) -> AppResult<usize> {
        let due = self.selection.poll(now);
        let mut first_error = None;
        let mut fired = 0;

        for index in due {
            match self.gallery.toggle_selection(index) {
                Ok(_) => fired += 1,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(fired),
        }
    }

    // =========================================================================
    // Explicit Control Handlers
    // =========================================================================

    pub(crate) fn handle_toggle_selection(&mut self, index: usize) -> HandlerResult {
        if self.selection.cancel(index) {
            debug!(index, "Explicit toggle cancelled pending activation");
        }
        self.gallery.toggle_selection(index)?;
        Ok(Some(self.selection_summary()))
    }

    pub(crate) fn handle_view_photo(&mut self, index: usize) -> HandlerResult {
        self.selection.cancel(index);
        self.show_fullscreen(index)
    }

    fn show_fullscreen(&mut self, index: usize) -> HandlerResult {
        let Some(record) = self.gallery.get(index) else {
            return Err(AppError::IndexOutOfRange {
                index,
                len: self.gallery.len(),
            });
        };
        let status = format!("Viewing {}", record.name);
        self.fullscreen = Some(index);
        Ok(Some(status))
    }

    fn selection_summary(&self) -> String {
        match self.gallery.selected_count() {
            0 => "No photos selected".to_string(),
            1 => "1 photo selected".to_string(),
            n => format!("{} photos selected", n),
        }
    }

    // =========================================================================
    // Delete Handlers
    // =========================================================================

    pub(crate) async fn handle_delete_selected(&mut self) -> HandlerResult {
        let count = self.gallery.selected_count();
        if count == 0 {
            return Err(AppError::NothingSelected);
        }

        let question = format!("Delete {} selected photo(s)?", count);
        if !self.prompt.confirm(&question).await {
            info!("Delete selected declined");
            return Ok(Some("Deletion cancelled".to_string()));
        }

        let removed = self.gallery.delete_selected()?;
        self.reset_gallery_view();
        let status = format!("{} photo(s) deleted", removed);
        Ok(Some(self.with_restart_note(status).await))
    }

    pub(crate) async fn handle_delete_all(&mut self) -> HandlerResult {
        if self.gallery.is_empty() {
            return Ok(Some("No photos to delete".to_string()));
        }

        let question = format!("Delete all {} photos?", self.gallery.len());
        if !self.prompt.confirm(&question).await {
            info!("Delete all declined");
            return Ok(Some("Deletion cancelled".to_string()));
        }

        let removed = self.gallery.delete_all();
        self.reset_gallery_view();
        let status = format!("All {} photo(s) deleted", removed);
        Ok(Some(self.with_restart_note(status).await))
    }

    /// Indices are stale after a delete
    fn reset_gallery_view(&mut self) {
        self.selection.clear();
        self.fullscreen = None;
    }

    async fn with_restart_note(&mut self, status: String) -> String {
        match self.restart_camera_after_delete().await {
            Some(note) => format!("{}, {}", status, note),
            None => status,
        }
    }
}
