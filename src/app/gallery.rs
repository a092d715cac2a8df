// SPDX-License-Identifier: GPL-3.0-only

//! Gallery store
//!
//! The ordered list of captured photos with their selection flags. The store
//! is the single source of truth; every mutation is written through to the
//! persistence mirror before it returns.

use crate::constants::naming;
use crate::errors::{AppError, AppResult};
use crate::storage::PersistenceMirror;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// One captured still
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Encoded image reference (a `data:` URI)
    pub url: String,
    /// File-system safe, unique name
    pub name: String,
    /// Selection flag; legacy records without it load as unselected
    #[serde(rename = "isSelected", default)]
    pub is_selected: bool,
}

impl PhotoRecord {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            is_selected: false,
        }
    }
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if naming::is_filename_safe(c) { c } else { '_' })
        .collect()
}

/// Turn an overlay label into a name component
///
/// Decorative `---` markers go, whitespace runs become `_`, remaining unsafe
/// characters are dropped and the result is lower-cased.
pub fn overlay_slug(label: &str) -> String {
    let cleaned = label.replace("---", " ");
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    let slug: String = joined
        .chars()
        .filter(|c| naming::is_filename_safe(*c))
        .collect::<String>()
        .to_lowercase();
    if slug.is_empty() {
        naming::NO_OVERLAY_LABEL.to_string()
    } else {
        slug
    }
}

/// Issues unique photo names with strictly increasing millisecond stamps
#[derive(Debug, Default)]
pub struct PhotoNamer {
    last_millis: Option<i64>,
}

impl PhotoNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for a photo taken at `now` with the given overlay label
    ///
    /// Never returns the same timestamp twice and skips names for which
    /// `is_taken` returns true.
    pub fn next_name(
        &mut self,
        overlay_label: Option<&str>,
        now: DateTime<Utc>,
        is_taken: impl Fn(&str) -> bool,
    ) -> String {
        let slug = overlay_label
            .map(overlay_slug)
            .unwrap_or_else(|| naming::NO_OVERLAY_LABEL.to_string());

        let mut millis = now.timestamp_millis();
        if let Some(last) = self.last_millis {
            millis = millis.max(last + 1);
        }

        loop {
            let stamp = DateTime::<Utc>::from_timestamp_millis(millis)
                .unwrap_or(now)
                .format("%Y%m%dT%H%M%S%3f");
            let name = format!(
                "{}_{}_{}.{}",
                naming::PHOTO_PREFIX,
                slug,
                stamp,
                naming::PHOTO_EXTENSION
            );
            if !is_taken(&name) {
                self.last_millis = Some(millis);
                return name;
            }
            millis += 1;
        }
    }
}

/// Outcome of [`GalleryStore::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Appended at this index
    Added(usize),
    /// A record with the same url already exists at this index
    Duplicate(usize),
}

/// Ordered, persisted collection of photo records
pub struct GalleryStore {
    photos: Vec<PhotoRecord>,
    mirror: PersistenceMirror,
}

impl GalleryStore {
    /// Empty store bound to `mirror` (nothing is read)
    pub fn new(mirror: PersistenceMirror) -> Self {
        Self {
            photos: Vec::new(),
            mirror,
        }
    }

    /// Load the persisted gallery once at startup
    ///
    /// An unreadable mirror yields an empty gallery. Records repeating an
    /// earlier url are dropped so the url uniqueness invariant holds.
    pub fn rehydrate(mirror: PersistenceMirror) -> Self {
        let loaded = match mirror.load_photos() {
            Ok(photos) => photos,
            Err(e) => {
                warn!(error = %e, "Failed to load persisted gallery, starting empty");
                Vec::new()
            }
        };

        let mut photos: Vec<PhotoRecord> = Vec::with_capacity(loaded.len());
        for record in loaded {
            if photos.iter().any(|p| p.url == record.url) {
                warn!(name = %record.name, "Dropping persisted duplicate photo");
                continue;
            }
            photos.push(record);
        }

        info!(count = photos.len(), "Gallery rehydrated");
        Self { photos, mirror }
    }

    pub fn photos(&self) -> &[PhotoRecord] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PhotoRecord> {
        self.photos.get(index)
    }

    /// Selected records in display order
    pub fn selected(&self) -> Vec<PhotoRecord> {
        self.photos.iter().filter(|p| p.is_selected).cloned().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.photos.iter().filter(|p| p.is_selected).count()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.photos.iter().any(|p| p.name == name)
    }

    /// Append a record unless one with the same url exists
    pub fn add(&mut self, mut record: PhotoRecord) -> AddOutcome {
        if let Some(existing) = self.photos.iter().position(|p| p.url == record.url) {
            debug!(index = existing, "Ignoring duplicate photo");
            return AddOutcome::Duplicate(existing);
        }

        record.is_selected = false;
        info!(name = %record.name, "Adding photo to gallery");
        self.photos.push(record);
        self.persist();
        AddOutcome::Added(self.photos.len() - 1)
    }

    /// Flip the selection flag of one record, returning the new value
    pub fn toggle_selection(&mut self, index: usize) -> AppResult<bool> {
        let len = self.photos.len();
        let Some(record) = self.photos.get_mut(index) else {
            error!(index, len, "Gallery consistency: selection index out of range");
            return Err(AppError::IndexOutOfRange { index, len });
        };

        record.is_selected = !record.is_selected;
        let selected = record.is_selected;
        debug!(index, selected, "Selection toggled");
        self.persist();
        Ok(selected)
    }

    /// Remove every selected record, keeping survivors in order
    ///
    /// Returns the number of removed records.
    pub fn delete_selected(&mut self) -> AppResult<usize> {
        let before = self.photos.len();
        if self.selected_count() == 0 {
            return Err(AppError::NothingSelected);
        }

        self.photos.retain(|p| !p.is_selected);
        let removed = before - self.photos.len();
        info!(removed, remaining = self.photos.len(), "Deleted selected photos");
        self.persist();
        Ok(removed)
    }

    /// Remove every record (confirmation is the caller's job)
    pub fn delete_all(&mut self) -> usize {
        let removed = self.photos.len();
        self.photos.clear();
        info!(removed, "Deleted all photos");
        self.persist();
        removed
    }

    fn persist(&self) {
        self.mirror.save_photos(&self.photos);
    }
}
