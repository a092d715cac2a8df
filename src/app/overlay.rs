// SPDX-License-Identifier: GPL-3.0-only

//! Overlay selection
//!
//! One overlay out of a fixed configured set (or none) is active at a time.
//! The selection is persisted on its own key; the image decodes in the
//! background and captures taken before it is ready go without it.

use crate::config::OverlayAsset;
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::OverlayImage;
use crate::storage::PersistenceMirror;
use futures::FutureExt;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type LoadTask = JoinHandle<Result<RgbaImage, String>>;

pub struct OverlayCatalog {
    assets: Vec<OverlayAsset>,
    selected: Option<String>,
    image: Option<OverlayImage>,
    loading: Option<LoadTask>,
    mirror: PersistenceMirror,
}

impl OverlayCatalog {
    /// Restore the persisted selection, falling back to `default`
    pub fn rehydrate(
        assets: Vec<OverlayAsset>,
        default: Option<&str>,
        mirror: PersistenceMirror,
    ) -> Self {
        let stored = match mirror.load_overlay() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to load overlay selection");
                None
            }
        };
        let wanted = match stored {
            Some(choice) => choice,
            None => default.map(str::to_string),
        };

        let mut catalog = Self {
            assets,
            selected: None,
            image: None,
            loading: None,
            mirror,
        };
        match wanted {
            Some(id) if catalog.asset(&id).is_some() => {
                catalog.selected = Some(id);
                catalog.start_loading();
            }
            Some(id) => warn!(overlay = %id, "Stored overlay is no longer configured"),
            None => {}
        }
        catalog
    }

    pub fn assets(&self) -> &[OverlayAsset] {
        &self.assets
    }

    fn asset(&self, id: &str) -> Option<&OverlayAsset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// The active overlay, if any
    pub fn selected(&self) -> Option<&OverlayAsset> {
        self.selected.as_deref().and_then(|id| self.asset(id))
    }

    /// Switch overlay (`None` = no overlay) and persist the choice
    pub fn select(&mut self, id: Option<&str>) -> AppResult<()> {
        if let Some(id) = id {
            if self.asset(id).is_none() {
                return Err(AppError::UnknownOverlay(id.to_string()));
            }
        }

        if let Some(task) = self.loading.take() {
            task.abort();
        }
        self.selected = id.map(str::to_string);
        self.image = None;
        self.mirror.save_overlay(id);
        info!(overlay = ?id, "Overlay selected");

        if self.selected.is_some() {
            self.start_loading();
        }
        Ok(())
    }

    /// Decoding state of the active overlay, collecting a finished load
    pub fn image(&mut self) -> Option<&OverlayImage> {
        if let Some(task) = self.loading.as_mut() {
            if let Some(result) = task.now_or_never() {
                self.loading = None;
                self.image = Some(into_overlay_image(result));
            }
        }
        self.image.as_ref()
    }

    /// Wait for the active overlay to finish decoding
    pub async fn wait_until_loaded(&mut self) -> Option<&OverlayImage> {
        if let Some(task) = self.loading.take() {
            self.image = Some(into_overlay_image(task.await));
        }
        self.image.as_ref()
    }

    fn start_loading(&mut self) {
        let Some(asset) = self.selected() else {
            return;
        };
        let path = asset.path.clone();
        debug!(path = %path.display(), "Decoding overlay");

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                self.image = Some(OverlayImage::Loading);
                self.loading = Some(runtime.spawn_blocking(move || load_overlay(path)));
            }
            Err(_) => {
                self.image = Some(match load_overlay(path) {
                    Ok(image) => OverlayImage::Ready(Arc::new(image)),
                    Err(e) => OverlayImage::Failed(e),
                });
            }
        }
    }
}

fn load_overlay(path: PathBuf) -> Result<RgbaImage, String> {
    image::open(&path)
        .map(|img| img.to_rgba8())
        .map_err(|e| format!("Failed to load overlay '{}': {}", path.display(), e))
}

fn into_overlay_image(
    result: Result<Result<RgbaImage, String>, tokio::task::JoinError>,
) -> OverlayImage {
    match result {
        Ok(Ok(image)) => {
            debug!(width = image.width(), height = image.height(), "Overlay decoded");
            OverlayImage::Ready(Arc::new(image))
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Overlay decoding failed");
            OverlayImage::Failed(e)
        }
        Err(e) => OverlayImage::Failed(format!("Overlay task error: {}", e)),
    }
}
