// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for gallery operations
//!
//! Each command builds a session over the on-disk persistence mirror, sends
//! one or more messages and prints the resulting status line. The camera is
//! an image file served by the virtual camera backend.

use boardscan::app::{
    AppModel, Collaborators, FixedAnswer, Message, SystemClock, TerminalPrompt, UserPrompt,
};
use boardscan::backends::camera::{CameraBackend, FacingMode};
use boardscan::backends::virtual_camera::{StillFrameSource, VirtualCameraBackend, VirtualDevice};
use boardscan::config::Config;
use boardscan::pipelines::export::{ArchiveSaver, DialogSaver, DirectorySaver};
use boardscan::pipelines::photo::{Viewport, decode_data_uri};
use boardscan::remote::{CurlProcessor, RemoteProcessor};
use boardscan::storage::JsonFileStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Load the config from `path` or the default location
pub fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Collaborators for commands that never touch the camera or the network
fn offline(prompt: Arc<dyn UserPrompt>) -> SessionParts {
    SessionParts {
        camera: Arc::new(VirtualCameraBackend::empty()),
        prompt,
        saver: Arc::new(DirectorySaver::downloads()),
        remote: None,
    }
}

struct SessionParts {
    camera: Arc<dyn CameraBackend>,
    prompt: Arc<dyn UserPrompt>,
    saver: Arc<dyn ArchiveSaver>,
    remote: Option<Arc<dyn RemoteProcessor>>,
}

fn open_session(config: Config, parts: SessionParts) -> Result<AppModel, Box<dyn std::error::Error>> {
    let storage = config
        .storage_file()
        .ok_or("No data directory available for the gallery")?;
    debug!(path = %storage.display(), "Opening gallery storage");
    let store = JsonFileStore::open(storage)?;

    Ok(AppModel::new(
        config,
        Collaborators {
            camera: parts.camera,
            store: Arc::new(store),
            prompt: parts.prompt,
            saver: parts.saver,
            remote: parts.remote,
            clock: Arc::new(SystemClock),
        },
    ))
}

/// Send one message and print the status line it produced
async fn dispatch(app: &mut AppModel, message: Message) -> CliResult {
    let result = app.update(message).await;
    match (result, app.status()) {
        (Ok(()), Some(status)) => {
            println!("{}", status);
            Ok(())
        }
        (Ok(()), None) => Ok(()),
        (Err(e), status) => Err(status.map(str::to_string).unwrap_or_else(|| e.to_string()).into()),
    }
}

fn overlay_arg(id: &str) -> Option<String> {
    if id.eq_ignore_ascii_case("none") || id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Capture one photo from `source`
pub async fn capture(
    config: Config,
    source: &Path,
    facing: FacingMode,
    overlay: Option<String>,
    viewport: Option<Viewport>,
) -> CliResult {
    let frame = StillFrameSource::open(source, Some(facing))?;
    let device = VirtualDevice::new(source.display().to_string(), Arc::new(frame));
    let parts = SessionParts {
        camera: Arc::new(VirtualCameraBackend::new(vec![device])),
        ..offline(Arc::new(TerminalPrompt))
    };
    let mut app = open_session(config, parts)?;

    if let Some(id) = overlay {
        dispatch(&mut app, Message::SelectOverlay(overlay_arg(&id))).await?;
    }
    if let Some(viewport) = viewport {
        dispatch(&mut app, Message::ViewportChanged(viewport)).await?;
    }
    dispatch(&mut app, Message::StartCamera).await?;
    app.wait_for_overlay().await;
    dispatch(&mut app, Message::Capture).await
}

/// Print the gallery
pub fn list_photos(config: Config) -> CliResult {
    let app = open_session(config, offline(Arc::new(TerminalPrompt)))?;

    if app.gallery.is_empty() {
        println!("Gallery is empty.");
        return Ok(());
    }

    for (index, photo) in app.gallery.photos().iter().enumerate() {
        let mark = if photo.is_selected { "x" } else { " " };
        println!("  [{}] {:>3}  {}", mark, index, photo.name);
    }

    let controls = app.gallery_controls();
    println!();
    println!(
        "{} photo(s), {} selected{}",
        app.gallery.len(),
        app.gallery.selected_count(),
        if controls.can_export {
            " (ready to export)"
        } else {
            ""
        }
    );
    Ok(())
}

/// Print the configured overlays, marking the active one
pub fn list_overlays(config: Config) -> CliResult {
    let app = open_session(config, offline(Arc::new(TerminalPrompt)))?;

    if app.overlays.assets().is_empty() {
        println!("No overlays configured.");
        return Ok(());
    }

    let active = app.overlays.selected().map(|o| o.id.clone());
    for asset in app.overlays.assets() {
        let mark = if active.as_deref() == Some(asset.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("  {} {:<16} {}", mark, asset.id, asset.label);
    }
    Ok(())
}

pub async fn select_overlay(config: Config, id: &str) -> CliResult {
    let mut app = open_session(config, offline(Arc::new(TerminalPrompt)))?;
    dispatch(&mut app, Message::SelectOverlay(overlay_arg(id))).await
}

pub async fn toggle_selection(config: Config, indices: &[usize]) -> CliResult {
    let mut app = open_session(config, offline(Arc::new(TerminalPrompt)))?;
    for &index in indices {
        dispatch(&mut app, Message::ToggleSelection(index)).await?;
    }
    Ok(())
}

/// Debounced activation on the real clock
pub async fn tap(config: Config, index: usize, double: bool) -> CliResult {
    let mut app = open_session(config, offline(Arc::new(TerminalPrompt)))?;

    dispatch(&mut app, Message::ThumbnailActivated(index)).await?;
    if double {
        return dispatch(&mut app, Message::ThumbnailActivated(index)).await;
    }

    if let Some(deadline) = app.next_selection_deadline() {
        tokio::time::sleep_until(deadline.into()).await;
    }
    dispatch(&mut app, Message::SelectionTimerElapsed).await
}

/// Write the photo at `index` to `output`
pub async fn view(config: Config, index: usize, output: &Path) -> CliResult {
    let mut app = open_session(config, offline(Arc::new(TerminalPrompt)))?;
    dispatch(&mut app, Message::ViewPhoto(index)).await?;

    let Some(photo) = app.fullscreen.and_then(|i| app.gallery.get(i)) else {
        return Err("Photo not found".into());
    };
    let bytes = decode_data_uri(&photo.url)?;
    tokio::fs::write(output, bytes).await?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn prompt_for(yes: bool) -> Arc<dyn UserPrompt> {
    if yes {
        Arc::new(FixedAnswer(true))
    } else {
        Arc::new(TerminalPrompt)
    }
}

pub async fn delete_selected(config: Config, yes: bool) -> CliResult {
    let mut app = open_session(config, offline(prompt_for(yes)))?;
    dispatch(&mut app, Message::DeleteSelected).await
}

pub async fn delete_all(config: Config, yes: bool) -> CliResult {
    let mut app = open_session(config, offline(prompt_for(yes)))?;
    dispatch(&mut app, Message::DeleteAll).await
}

pub async fn export(config: Config, name: String, output: Option<PathBuf>, pick: bool) -> CliResult {
    let saver: Arc<dyn ArchiveSaver> = match (output, pick) {
        (_, true) => Arc::new(DialogSaver),
        (Some(dir), false) => Arc::new(DirectorySaver::new(dir)),
        (None, false) => Arc::new(DirectorySaver::downloads()),
    };
    let parts = SessionParts {
        saver,
        ..offline(Arc::new(TerminalPrompt))
    };
    let mut app = open_session(config, parts)?;

    dispatch(&mut app, Message::ExportSelected { archive_name: name }).await?;
    if let Some(path) = &app.last_export {
        println!("Saved to {}", path.display());
    }
    Ok(())
}

pub async fn process(config: Config, endpoint: Option<String>) -> CliResult {
    let endpoint = endpoint
        .or_else(|| config.remote_endpoint.clone())
        .ok_or("No AI service endpoint configured (use --endpoint)")?;
    let parts = SessionParts {
        remote: Some(Arc::new(CurlProcessor::new(endpoint))),
        ..offline(Arc::new(TerminalPrompt))
    };
    let mut app = open_session(config, parts)?;

    dispatch(&mut app, Message::ProcessSelected).await?;
    let Some(extraction) = &app.last_extraction else {
        return Ok(());
    };

    if let Some(message) = &extraction.message {
        println!("{}", message);
    }
    for (field, value) in &extraction.fields {
        println!("  {:<20} {}", field, value);
    }
    if let Some(payload) = &extraction.qr_payload {
        println!();
        println!("QR code: {}", payload);
    }
    Ok(())
}
