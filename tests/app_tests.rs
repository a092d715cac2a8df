// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the session context: capture, gallery, selection,
//! deletes, export and remote processing driven through messages

use boardscan::app::{
    AppModel, Collaborators, FixedAnswer, GalleryControls, ManualClock, Message, PhotoRecord,
};
use boardscan::backends::camera::FacingMode;
use boardscan::backends::virtual_camera::{StillFrameSource, VirtualCameraBackend, VirtualDevice};
use boardscan::config::{Config, OverlayAsset};
use boardscan::errors::{AppError, PhotoError, RemoteError};
use boardscan::pipelines::export::DirectorySaver;
use boardscan::pipelines::photo::{
    OverlayImage, Rotation, compose, decode_data_uri, encode_png,
};
use boardscan::remote::{ProcessRequest, ProcessResponse, RemoteProcessor};
use boardscan::storage::MemoryStore;
use futures::future::BoxFuture;
use image::{Rgba, RgbaImage};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct Harness {
    backend: Arc<VirtualCameraBackend>,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    exports: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        Self::with_camera(
            RgbaImage::from_pixel(8, 4, Rgba([0, 128, 255, 255])),
            FacingMode::Environment,
        )
    }

    fn with_camera(frame: RgbaImage, facing: FacingMode) -> Self {
        let source = StillFrameSource::new(frame, Some(facing));
        Self {
            backend: Arc::new(VirtualCameraBackend::new(vec![VirtualDevice::new(
                format!("{:?}", facing),
                Arc::new(source),
            )])),
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(ManualClock::new()),
            exports: tempfile::tempdir().unwrap(),
        }
    }

    fn app(&self, config: Config, confirm: bool) -> AppModel {
        self.app_with_remote(config, confirm, None)
    }

    fn app_with_remote(
        &self,
        config: Config,
        confirm: bool,
        remote: Option<Arc<dyn RemoteProcessor>>,
    ) -> AppModel {
        AppModel::new(
            config,
            Collaborators {
                camera: self.backend.clone(),
                store: self.store.clone(),
                prompt: Arc::new(FixedAnswer(confirm)),
                saver: Arc::new(DirectorySaver::new(self.exports.path())),
                remote,
                clock: self.clock.clone(),
            },
        )
    }
}

fn record(i: u8) -> PhotoRecord {
    let encoded = encode_png(&RgbaImage::from_pixel(2, 2, Rgba([i, i, i, 255]))).unwrap();
    PhotoRecord::new(encoded.to_data_uri(), format!("photo_{}.png", i))
}

fn seeded(harness: &Harness, count: u8) -> AppModel {
    let mut app = harness.app(Config::default(), true);
    for i in 0..count {
        app.gallery.add(record(i));
    }
    app
}

/// 8x4 landscape frame whose pixels encode their own coordinates
fn coordinate_frame() -> RgbaImage {
    RgbaImage::from_fn(8, 4, |x, y| Rgba([x as u8 * 30, y as u8 * 60, 100, 255]))
}

const MARKER: Rgba<u8> = Rgba([255, 255, 0, 255]);

fn overlay_config(harness: &Harness, file: &str) -> Config {
    let mut config = Config::default();
    config.overlays.push(OverlayAsset {
        id: "grid".into(),
        label: "--- Board Grid ---".into(),
        path: harness.exports.path().join(file),
    });
    config
}

/// Transparent overlay with a single opaque marker at (2, 0)
fn write_marker_overlay(harness: &Harness, file: &str) {
    let mut overlay = RgbaImage::new(8, 4);
    overlay.put_pixel(2, 0, MARKER);
    overlay.save(harness.exports.path().join(file)).unwrap();
}

fn captured_image(app: &AppModel, index: usize) -> RgbaImage {
    let bytes = decode_data_uri(&app.gallery.photos()[index].url).unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgba8()
}

fn selected_flags(app: &AppModel) -> Vec<bool> {
    app.gallery.photos().iter().map(|p| p.is_selected).collect()
}

// ===== Capture =====

#[tokio::test]
async fn test_capture_adds_named_photo() {
    let harness = Harness::new();
    let mut app = harness.app(Config::default(), true);

    app.update(Message::StartCamera).await.unwrap();
    app.update(Message::Capture).await.unwrap();

    assert_eq!(app.gallery.len(), 1);
    let photo = &app.gallery.photos()[0];
    assert!(photo.name.starts_with("photo_none_"));
    assert!(photo.name.ends_with(".png"));
    assert!(photo.url.starts_with("data:image/png;base64,"));
    assert!(!photo.is_selected);
    assert_eq!(app.status(), Some("Photo 1 added to the gallery"));
}

#[tokio::test]
async fn test_capture_without_camera_reports_inactive() {
    let harness = Harness::new();
    let mut app = harness.app(Config::default(), true);

    let err = app.update(Message::Capture).await.unwrap_err();

    assert_eq!(err, AppError::Photo(PhotoError::CameraInactive));
    assert!(app.gallery.is_empty());
    assert!(app.status().is_some());
}

#[tokio::test]
async fn test_identical_capture_is_deduplicated() {
    // The still image never changes, so the second capture has the same url
    let harness = Harness::new();
    let mut app = harness.app(Config::default(), true);
    app.update(Message::StartCamera).await.unwrap();

    app.update(Message::Capture).await.unwrap();
    app.update(Message::Capture).await.unwrap();

    assert_eq!(app.gallery.len(), 1);
    assert_eq!(app.status(), Some("Photo 1 is already in the gallery"));
}

#[tokio::test]
async fn test_capture_with_overlay_uses_overlay_label() {
    let harness = Harness::new();
    let overlay_path = harness.exports.path().join("grid.png");
    RgbaImage::from_pixel(8, 4, Rgba([255, 255, 255, 128]))
        .save(&overlay_path)
        .unwrap();

    let mut config = Config::default();
    config.overlays.push(OverlayAsset {
        id: "grid".into(),
        label: "--- Board Grid ---".into(),
        path: overlay_path,
    });
    let mut app = harness.app(config.clone(), true);

    app.update(Message::SelectOverlay(Some("grid".into())))
        .await
        .unwrap();
    assert!(matches!(
        app.wait_for_overlay().await,
        Some(OverlayImage::Ready(_))
    ));
    app.update(Message::StartCamera).await.unwrap();
    app.update(Message::Capture).await.unwrap();

    assert!(app.gallery.photos()[0].name.starts_with("photo_board_grid_"));
    assert_eq!(
        harness.store.raw("selectedOverlay").as_deref(),
        Some("grid")
    );

    // Selection survives a restart
    let reloaded = harness.app(config, true);
    assert_eq!(reloaded.overlays.selected().map(|o| o.id.as_str()), Some("grid"));
}

#[tokio::test]
async fn test_capture_applies_rotation_and_overlay() {
    // Landscape stream in the default portrait viewport: rotated +90°
    let harness = Harness::with_camera(coordinate_frame(), FacingMode::Environment);
    write_marker_overlay(&harness, "grid.png");
    let mut app = harness.app(overlay_config(&harness, "grid.png"), true);

    app.update(Message::SelectOverlay(Some("grid".into())))
        .await
        .unwrap();
    app.wait_for_overlay().await;
    app.update(Message::StartCamera).await.unwrap();
    assert_eq!(app.camera.orientation().rotation, Rotation::Clockwise);
    assert!(!app.camera.orientation().mirrored);
    app.update(Message::Capture).await.unwrap();

    let photo = captured_image(&app, 0);
    let frame = coordinate_frame();
    assert_eq!(photo.dimensions(), (8, 4), "Native stream size");
    // The bottom-left of the frame rotates to the top-left of the drawn area
    assert_eq!(photo.get_pixel(2, 0), frame.get_pixel(2, 3));
    assert_eq!(photo.get_pixel(5, 3), frame.get_pixel(5, 0));
    // Outside the rotated frame nothing is drawn
    assert_eq!(photo.get_pixel(0, 0)[3], 0);
    // The overlay marker follows the frame transform
    assert_eq!(photo.get_pixel(5, 0), &MARKER);
}

#[tokio::test]
async fn test_front_camera_capture_is_mirrored() {
    // Only a front camera: the relaxed retry picks it
    let harness = Harness::with_camera(coordinate_frame(), FacingMode::User);
    write_marker_overlay(&harness, "grid.png");
    let mut app = harness.app(overlay_config(&harness, "grid.png"), true);

    app.update(Message::SelectOverlay(Some("grid".into())))
        .await
        .unwrap();
    app.wait_for_overlay().await;
    app.update(Message::StartCamera).await.unwrap();
    assert!(app.camera.orientation().mirrored);
    app.update(Message::Capture).await.unwrap();

    let photo = captured_image(&app, 0);
    let frame = coordinate_frame();
    assert_eq!(photo.dimensions(), (8, 4));
    assert_eq!(photo.get_pixel(2, 0), frame.get_pixel(5, 3));
    assert_eq!(photo.get_pixel(5, 0), frame.get_pixel(5, 0));
    assert_eq!(photo.get_pixel(5, 3), &MARKER);
}

#[tokio::test]
async fn test_capture_with_broken_overlay_uses_plain_frame() {
    let harness = Harness::with_camera(coordinate_frame(), FacingMode::Environment);
    let mut app = harness.app(overlay_config(&harness, "missing.png"), true);

    app.update(Message::SelectOverlay(Some("grid".into())))
        .await
        .unwrap();
    assert!(matches!(
        app.wait_for_overlay().await,
        Some(OverlayImage::Failed(_))
    ));
    app.update(Message::StartCamera).await.unwrap();
    app.update(Message::Capture).await.unwrap();

    assert_eq!(app.gallery.len(), 1);
    let plain = compose(&coordinate_frame(), app.camera.orientation(), None);
    assert_eq!(captured_image(&app, 0), plain);
}

#[tokio::test]
async fn test_capture_right_after_overlay_selection() {
    // The overlay may still be decoding; the capture goes ahead either way
    let harness = Harness::with_camera(coordinate_frame(), FacingMode::Environment);
    write_marker_overlay(&harness, "grid.png");
    let mut app = harness.app(overlay_config(&harness, "grid.png"), true);
    app.update(Message::StartCamera).await.unwrap();

    app.update(Message::SelectOverlay(Some("grid".into())))
        .await
        .unwrap();
    app.update(Message::Capture).await.unwrap();

    assert_eq!(app.gallery.len(), 1);
    assert_eq!(captured_image(&app, 0).dimensions(), (8, 4));
}

#[tokio::test]
async fn test_unknown_overlay_is_rejected() {
    let harness = Harness::new();
    let mut app = harness.app(Config::default(), true);

    let err = app
        .update(Message::SelectOverlay(Some("missing".into())))
        .await
        .unwrap_err();

    assert_eq!(err, AppError::UnknownOverlay("missing".into()));
    assert!(app.overlays.selected().is_none());
    assert_eq!(harness.store.raw("selectedOverlay"), None);
}

// ===== Gallery =====

#[tokio::test]
async fn test_persisted_gallery_reloads_equal() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 4);
    app.update(Message::ToggleSelection(1)).await.unwrap();
    app.update(Message::ToggleSelection(2)).await.unwrap();
    app.update(Message::DeleteSelected).await.unwrap();
    app.update(Message::ToggleSelection(0)).await.unwrap();

    let reloaded = harness.app(Config::default(), true);
    assert_eq!(reloaded.gallery.photos(), app.gallery.photos());
}

#[tokio::test]
async fn test_legacy_records_without_selection_flag_load() {
    let harness = Harness::new();
    let legacy = r#"[{"url":"data:image/png;base64,AA==","name":"old.png"}]"#;
    boardscan::storage::KeyValueStore::set(harness.store.as_ref(), "capturedPhotos", legacy)
        .unwrap();

    let app = harness.app(Config::default(), true);

    assert_eq!(app.gallery.len(), 1);
    assert!(!app.gallery.photos()[0].is_selected);
}

#[tokio::test]
async fn test_toggle_selection_is_an_involution() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 3);
    let before = selected_flags(&app);

    app.update(Message::ToggleSelection(1)).await.unwrap();
    assert_eq!(selected_flags(&app), [false, true, false]);
    app.update(Message::ToggleSelection(1)).await.unwrap();

    assert_eq!(selected_flags(&app), before);
}

#[tokio::test]
async fn test_toggle_out_of_range_is_reported() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 2);

    let err = app.update(Message::ToggleSelection(9)).await.unwrap_err();

    assert_eq!(err, AppError::IndexOutOfRange { index: 9, len: 2 });
    assert!(err.is_consistency_bug());
    assert_eq!(app.status(), Some("Photo not found"));
}

#[tokio::test]
async fn test_persistence_failure_keeps_memory_authoritative() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 1);
    harness.store.set_fail_writes(true);

    assert!(app.gallery.add(record(42)) == boardscan::app::AddOutcome::Added(1));
    app.update(Message::ToggleSelection(1)).await.unwrap();

    assert_eq!(app.gallery.len(), 2);
    assert!(app.gallery.photos()[1].is_selected);
    // The mirror still holds the last successful write
    let reloaded = harness.app(Config::default(), true);
    assert_eq!(reloaded.gallery.len(), 1);
}

// ===== Selection Debounce =====

#[tokio::test]
async fn test_single_activation_toggles_after_window() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 2);

    app.update(Message::ThumbnailActivated(0)).await.unwrap();
    harness.clock.advance(Duration::from_millis(100));
    app.update(Message::SelectionTimerElapsed).await.unwrap();
    assert_eq!(selected_flags(&app), [false, false], "Still inside the window");

    harness.clock.advance(Duration::from_millis(200));
    app.update(Message::SelectionTimerElapsed).await.unwrap();

    assert_eq!(selected_flags(&app), [true, false]);
    assert_eq!(app.fullscreen, None);
    assert_eq!(app.next_selection_deadline(), None);
}

#[tokio::test]
async fn test_double_activation_views_without_toggling() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 2);

    app.update(Message::ThumbnailActivated(1)).await.unwrap();
    harness.clock.advance(Duration::from_millis(120));
    app.update(Message::ThumbnailActivated(1)).await.unwrap();
    harness.clock.advance(Duration::from_secs(1));
    app.update(Message::SelectionTimerElapsed).await.unwrap();

    assert_eq!(selected_flags(&app), [false, false]);
    assert_eq!(app.fullscreen, Some(1));

    app.update(Message::CloseFullscreen).await.unwrap();
    assert_eq!(app.fullscreen, None);
}

#[tokio::test]
async fn test_explicit_controls_bypass_debounce() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 2);

    // Checkbox after a tap: one toggle, the pending one is dropped
    app.update(Message::ThumbnailActivated(0)).await.unwrap();
    app.update(Message::ToggleSelection(0)).await.unwrap();
    harness.clock.advance(Duration::from_secs(1));
    app.update(Message::SelectionTimerElapsed).await.unwrap();
    assert_eq!(selected_flags(&app), [true, false]);

    // View button after a tap: no toggle at all
    app.update(Message::ThumbnailActivated(1)).await.unwrap();
    app.update(Message::ViewPhoto(1)).await.unwrap();
    harness.clock.advance(Duration::from_secs(1));
    app.update(Message::SelectionTimerElapsed).await.unwrap();
    assert_eq!(selected_flags(&app), [true, false]);
    assert_eq!(app.fullscreen, Some(1));
}

#[tokio::test]
async fn test_view_invalid_index_leaves_state() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 1);

    assert!(app.update(Message::ViewPhoto(3)).await.is_err());
    assert_eq!(app.fullscreen, None);
    assert_eq!(app.status(), Some("Photo not found"));
}

// ===== Deletes =====

#[tokio::test]
async fn test_delete_selected_with_nothing_selected() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 3);
    let before = app.gallery.photos().to_vec();

    let err = app.update(Message::DeleteSelected).await.unwrap_err();

    assert_eq!(err, AppError::NothingSelected);
    assert_eq!(app.gallery.photos(), before.as_slice());
}

#[tokio::test]
async fn test_declined_confirmation_keeps_gallery() {
    let harness = Harness::new();
    let mut app = harness.app(Config::default(), false);
    app.gallery.add(record(1));
    app.update(Message::ToggleSelection(0)).await.unwrap();

    app.update(Message::DeleteSelected).await.unwrap();
    assert_eq!(app.gallery.len(), 1);
    app.update(Message::DeleteAll).await.unwrap();
    assert_eq!(app.gallery.len(), 1);
    assert_eq!(app.status(), Some("Deletion cancelled"));
}

#[tokio::test]
async fn test_delete_all_on_empty_gallery() {
    let harness = Harness::new();
    let mut app = harness.app(Config::default(), true);

    app.update(Message::DeleteAll).await.unwrap();

    assert_eq!(app.status(), Some("No photos to delete"));
}

#[tokio::test]
async fn test_delete_restarts_started_camera() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 3);
    app.update(Message::StartCamera).await.unwrap();
    assert_eq!(harness.backend.requests(), 1);

    app.update(Message::ToggleSelection(0)).await.unwrap();
    app.update(Message::DeleteSelected).await.unwrap();
    assert_eq!(harness.backend.requests(), 2);

    app.update(Message::DeleteAll).await.unwrap();
    assert_eq!(harness.backend.requests(), 3);
    assert_eq!(harness.backend.live_tracks(), 1, "Restart never leaks tracks");
    assert!(app.gallery.is_empty());
    assert_eq!(app.status(), Some("All 2 photo(s) deleted, camera restarted"));
}

#[tokio::test]
async fn test_delete_restart_policy_is_configurable() {
    let harness = Harness::new();
    let config = Config {
        restart_camera_after_delete: false,
        ..Config::default()
    };
    let mut app = harness.app(config, true);
    app.gallery.add(record(1));
    app.update(Message::StartCamera).await.unwrap();

    app.update(Message::DeleteAll).await.unwrap();

    assert_eq!(harness.backend.requests(), 1);
}

#[tokio::test]
async fn test_delete_does_not_start_idle_camera() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 1);

    app.update(Message::DeleteAll).await.unwrap();

    assert_eq!(harness.backend.requests(), 0);
}

#[tokio::test]
async fn test_delete_drops_stale_pending_toggles() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 3);
    app.update(Message::ToggleSelection(0)).await.unwrap();
    app.update(Message::ThumbnailActivated(2)).await.unwrap();

    app.update(Message::DeleteSelected).await.unwrap();
    harness.clock.advance(Duration::from_secs(1));
    app.update(Message::SelectionTimerElapsed).await.unwrap();

    assert_eq!(selected_flags(&app), [false, false]);
}

// ===== Controls, Export, Remote =====

#[tokio::test]
async fn test_gallery_controls() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 0);
    assert_eq!(app.gallery_controls(), GalleryControls::default());

    app.gallery.add(record(1));
    app.gallery.add(record(2));
    let controls = app.gallery_controls();
    assert!(controls.can_delete_all);
    assert!(!controls.can_delete_selected);
    assert!(!controls.can_export);

    app.update(Message::ToggleSelection(0)).await.unwrap();
    let controls = app.gallery_controls();
    assert!(controls.can_delete_selected);
    assert!(controls.can_export);
    assert!(!controls.can_process, "No remote service configured");
}

#[tokio::test]
async fn test_export_selected_saves_archive() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 3);
    app.update(Message::ToggleSelection(0)).await.unwrap();
    app.update(Message::ToggleSelection(2)).await.unwrap();

    app.update(Message::ExportSelected {
        archive_name: "board photos".into(),
    })
    .await
    .unwrap();

    let path = harness.exports.path().join("board_photos.zip");
    assert_eq!(app.last_export.as_deref(), Some(path.as_path()));
    assert!(path.exists());
    assert_eq!(app.status(), Some("2 photo(s) saved as \"board_photos.zip\""));
    // Export never mutates the gallery
    assert_eq!(selected_flags(&app), [true, false, true]);
}

#[tokio::test]
async fn test_export_requires_selection() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 2);

    let err = app
        .update(Message::ExportSelected {
            archive_name: String::new(),
        })
        .await
        .unwrap_err();

    assert_eq!(err, AppError::NothingSelected);
}

struct CannedRemote {
    calls: AtomicUsize,
}

impl RemoteProcessor for CannedRemote {
    fn process<'a>(
        &'a self,
        request: &'a ProcessRequest,
    ) -> BoxFuture<'a, Result<ProcessResponse, RemoteError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ok = request.image.starts_with("data:image/png;base64,");
        Box::pin(async move {
            if !ok {
                return Err(RemoteError::Server {
                    status: 400,
                    message: "no image".into(),
                });
            }
            let mut fields = BTreeMap::new();
            fields.insert("modelo".to_string(), "X1".to_string());
            Ok(ProcessResponse {
                message: Some("ok".into()),
                extracted_data: fields,
                qr_image_b64: None,
            })
        })
    }
}

#[tokio::test]
async fn test_process_needs_exactly_one_selected_photo() {
    let harness = Harness::new();
    let remote = Arc::new(CannedRemote {
        calls: AtomicUsize::new(0),
    });
    let processor: Arc<dyn RemoteProcessor> = remote.clone();
    let mut app = harness.app_with_remote(Config::default(), true, Some(processor));
    app.gallery.add(record(1));
    app.gallery.add(record(2));

    let err = app.update(Message::ProcessSelected).await.unwrap_err();
    assert_eq!(err, AppError::SingleSelectionRequired { selected: 0 });

    app.update(Message::ToggleSelection(1)).await.unwrap();
    assert!(app.gallery_controls().can_process);
    app.update(Message::ProcessSelected).await.unwrap();

    assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    let extraction = app.last_extraction.as_ref().unwrap();
    assert_eq!(extraction.photo, "photo_2.png");
    assert_eq!(extraction.fields["modelo"], "X1");
    assert_eq!(extraction.qr_payload, None);
}

#[tokio::test]
async fn test_process_without_service() {
    let harness = Harness::new();
    let mut app = seeded(&harness, 1);
    app.update(Message::ToggleSelection(0)).await.unwrap();

    let err = app.update(Message::ProcessSelected).await.unwrap_err();

    assert_eq!(err, AppError::Remote(RemoteError::NotConfigured));
}
