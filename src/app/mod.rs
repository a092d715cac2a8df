// SPDX-License-Identifier: GPL-3.0-only

//! Session context and command handling
//!
//! # Architecture
//!
//! - `state`: Session context ([`AppModel`]) and the [`Message`] commands
//! - `update`: Message dispatcher
//! - `handlers`: Message handlers grouped by domain
//! - `gallery`: Gallery store and photo naming
//! - `selection`: Single vs double activation state machine
//! - `overlay`: Overlay catalog and background decoding
//! - `prompt`: Yes/no confirmation collaborator
//!
//! ```text
//!   front-end ──Message──▶ AppModel::update ──▶ handlers::{camera, capture,
//!                                                gallery, export, remote}
//!                                │
//!            ┌───────────────────┼────────────────────┐
//!            ▼                   ▼                    ▼
//!   CameraSessionManager    GalleryStore       ExportPackager
//!            │                   │                    │
//!            ▼                   ▼                    ▼
//!      CameraBackend     PersistenceMirror       ArchiveSaver
//! ```

pub mod gallery;
mod handlers;
pub mod overlay;
pub mod prompt;
pub mod selection;
mod state;
mod update;

pub use gallery::{AddOutcome, GalleryStore, PhotoNamer, PhotoRecord};
pub use overlay::OverlayCatalog;
pub use prompt::{FixedAnswer, TerminalPrompt, UserPrompt};
pub use selection::{Activation, ActivationDebouncer, Clock, ManualClock, SystemClock};
pub use state::{AppModel, Extraction, GalleryControls, Message};

use crate::backends::camera::{CameraBackend, CameraSessionManager};
use crate::config::Config;
use crate::pipelines::export::{ArchiveSaver, ExportPackager};
use crate::pipelines::photo::OverlayImage;
use crate::remote::RemoteProcessor;
use crate::storage::{KeyValueStore, PersistenceMirror};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// External collaborators injected by the composition root
pub struct Collaborators {
    pub camera: Arc<dyn CameraBackend>,
    pub store: Arc<dyn KeyValueStore>,
    pub prompt: Arc<dyn UserPrompt>,
    pub saver: Arc<dyn ArchiveSaver>,
    pub remote: Option<Arc<dyn RemoteProcessor>>,
    pub clock: Arc<dyn Clock>,
}

impl AppModel {
    /// Build the session, rehydrating the gallery and overlay selection
    ///
    /// The camera is not started; send [`Message::StartCamera`].
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let mirror = PersistenceMirror::new(collaborators.store);
        let gallery = GalleryStore::rehydrate(mirror.clone());
        let overlays = OverlayCatalog::rehydrate(
            config.overlays.clone(),
            config.default_overlay.as_deref(),
            mirror,
        );

        info!(
            photos = gallery.len(),
            overlay = ?overlays.selected().map(|o| o.id.as_str()),
            debounce_ms = config.debounce_window().as_millis() as u64,
            "Session created"
        );

        Self {
            camera: CameraSessionManager::new(collaborators.camera, config.viewport),
            selection: ActivationDebouncer::new(config.debounce_window()),
            packager: ExportPackager::new(config.archive_fallback_name.clone()),
            namer: PhotoNamer::new(),
            gallery,
            overlays,
            clock: collaborators.clock,
            prompt: collaborators.prompt,
            saver: collaborators.saver,
            remote: collaborators.remote,
            fullscreen: None,
            status: None,
            last_export: None,
            last_extraction: None,
            config,
        }
    }

    /// Last user-visible status line
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn gallery_controls(&self) -> GalleryControls {
        let selected = self.gallery.selected_count();
        GalleryControls {
            can_delete_selected: selected > 0,
            can_delete_all: !self.gallery.is_empty(),
            can_export: selected > 0,
            can_process: selected == 1 && self.remote.is_some(),
        }
    }

    /// When the front-end should send [`Message::SelectionTimerElapsed`]
    pub fn next_selection_deadline(&self) -> Option<Instant> {
        self.selection.next_deadline()
    }

    /// Wait for the selected overlay to finish decoding
    pub async fn wait_for_overlay(&mut self) -> Option<&OverlayImage> {
        self.overlays.wait_until_loaded().await
    }
}
