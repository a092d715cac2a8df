// SPDX-License-Identifier: GPL-3.0-only

//! Capture handlers
//!
//! Handles overlay selection and photo capture into the gallery.

use super::HandlerResult;
use crate::app::gallery::{AddOutcome, PhotoRecord};
use crate::app::state::AppModel;
use crate::pipelines::photo::PhotoPipeline;
use tracing::{debug, info};

impl AppModel {
    // =========================================================================
    // Overlay Handlers
    // =========================================================================

    pub(crate) fn handle_select_overlay(&mut self, id: Option<String>) -> HandlerResult {
        self.overlays.select(id.as_deref())?;
        let status = match self.overlays.selected() {
            Some(asset) => format!("Overlay: {}", asset.label),
            None => "Overlay removed".to_string(),
        };
        Ok(Some(status))
    }

    // =========================================================================
    // Photo Capture Handlers
    // =========================================================================

    pub(crate) async fn handle_capture(&mut self) -> HandlerResult {
        let overlay = self.overlays.image().cloned();
        let encoded = PhotoPipeline::capture(
            self.camera.stream(),
            self.camera.orientation(),
            overlay.as_ref(),
        )
        .await?;

        let label = self.overlays.selected().map(|asset| asset.label.clone());
        let gallery = &self.gallery;
        let name = self.namer.next_name(label.as_deref(), chrono::Utc::now(), |candidate| {
            gallery.contains_name(candidate)
        });
        debug!(%name, width = encoded.width, height = encoded.height, "Photo named");

        match self.gallery.add(PhotoRecord::new(encoded.to_data_uri(), name)) {
            AddOutcome::Added(index) => {
                info!(index, "Photo captured");
                Ok(Some(format!("Photo {} added to the gallery", index + 1)))
            }
            AddOutcome::Duplicate(index) => {
                Ok(Some(format!("Photo {} is already in the gallery", index + 1)))
            }
        }
    }
}
