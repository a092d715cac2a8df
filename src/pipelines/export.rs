// SPDX-License-Identifier: GPL-3.0-only

//! Archive export of selected photos
//!
//! Packs photo records into a single ZIP (stored, PNG is already
//! compressed) and hands the bytes to a save-to-disk collaborator. Export
//! never mutates the gallery, and a record that fails to decode aborts the
//! whole archive instead of producing a partial one.

use crate::app::gallery::{PhotoRecord, sanitize_file_name};
use crate::constants::naming;
use crate::errors::ExportError;
use crate::pipelines::photo::decode_data_uri;
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// A finished archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// Sanitized file name including the extension
    pub file_name: String,
    /// Entry names in insertion order
    pub entries: Vec<String>,
    /// ZIP bytes
    pub bytes: Vec<u8>,
}

/// Sanitize a user-supplied archive name
///
/// Trims whitespace, falls back to `fallback` when blank, replaces every
/// character outside `[A-Za-z0-9._-]` with `_` and appends `.zip` unless
/// already present.
pub fn sanitize_archive_name(requested: &str, fallback: &str) -> String {
    let trimmed = requested.trim();
    let base = if trimmed.is_empty() {
        fallback.trim()
    } else {
        trimmed
    };
    let base = if base.is_empty() {
        naming::ARCHIVE_FALLBACK_NAME
    } else {
        base
    };

    let mut name = sanitize_file_name(base);
    let suffix = format!(".{}", naming::ARCHIVE_EXTENSION);
    if !name.to_ascii_lowercase().ends_with(&suffix) {
        name.push_str(&suffix);
    }
    name
}

/// Make `name` unique among `taken` by inserting `_N` before the extension
fn unique_entry_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    let mut n = 2;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{}_{}.{}", stem, n, ext),
            None => format!("{}_{}", stem, n),
        };
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Builds archives from selected records
#[derive(Debug, Clone)]
pub struct ExportPackager {
    fallback_name: String,
}

impl ExportPackager {
    pub fn new(fallback_name: impl Into<String>) -> Self {
        Self {
            fallback_name: fallback_name.into(),
        }
    }

    /// Build an archive with one entry per record
    pub fn build_archive(
        &self,
        records: &[PhotoRecord],
        archive_name: &str,
    ) -> Result<Archive, ExportError> {
        if records.is_empty() {
            return Err(ExportError::EmptySelection);
        }
        let file_name = sanitize_archive_name(archive_name, &self.fallback_name);
        info!(archive = %file_name, photos = records.len(), "Building archive");

        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let mut taken = HashSet::new();
        let mut entries = Vec::with_capacity(records.len());

        for record in records {
            let encoding_error = |reason: String| ExportError::ArchiveEncoding {
                name: record.name.clone(),
                reason,
            };

            let bytes = decode_data_uri(&record.url).map_err(encoding_error)?;
            let entry = unique_entry_name(&sanitize_file_name(&record.name), &mut taken);

            writer
                .start_file(entry.as_str(), options)
                .map_err(|e| encoding_error(e.to_string()))?;
            writer
                .write_all(&bytes)
                .map_err(|e| encoding_error(e.to_string()))?;

            debug!(entry = %entry, bytes = bytes.len(), "Added archive entry");
            entries.push(entry);
        }

        let bytes = writer
            .finish()
            .map_err(|e| ExportError::ArchiveEncoding {
                name: file_name.clone(),
                reason: e.to_string(),
            })?
            .into_inner();

        Ok(Archive {
            file_name,
            entries,
            bytes,
        })
    }

    /// Same as [`Self::build_archive`], on the blocking pool
    pub async fn build_archive_async(
        &self,
        records: Vec<PhotoRecord>,
        archive_name: String,
    ) -> Result<Archive, ExportError> {
        let packager = self.clone();
        tokio::task::spawn_blocking(move || packager.build_archive(&records, &archive_name))
            .await
            .map_err(|e| ExportError::ArchiveEncoding {
                name: "archive".to_string(),
                reason: format!("Archive task error: {}", e),
            })?
    }
}

/// Save-to-disk collaborator
pub trait ArchiveSaver: Send + Sync {
    /// Persist the archive, returning where it ended up
    fn save<'a>(&'a self, archive: &'a Archive) -> BoxFuture<'a, Result<PathBuf, ExportError>>;
}

/// Writes archives into a fixed directory
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The user's download directory, or the current directory
    pub fn downloads() -> Self {
        Self::new(dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")))
    }
}

impl ArchiveSaver for DirectorySaver {
    fn save<'a>(&'a self, archive: &'a Archive) -> BoxFuture<'a, Result<PathBuf, ExportError>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| ExportError::SaveFailed(e.to_string()))?;
            let path = self.dir.join(&archive.file_name);
            tokio::fs::write(&path, &archive.bytes)
                .await
                .map_err(|e| ExportError::SaveFailed(e.to_string()))?;
            info!(path = %path.display(), "Archive saved");
            Ok(path)
        })
    }
}

/// Asks for the destination with a native save dialog
#[derive(Default)]
pub struct DialogSaver;

impl ArchiveSaver for DialogSaver {
    fn save<'a>(&'a self, archive: &'a Archive) -> BoxFuture<'a, Result<PathBuf, ExportError>> {
        Box::pin(async move {
            let mut dialog = rfd::AsyncFileDialog::new()
                .set_title("Save photos")
                .set_file_name(archive.file_name.as_str())
                .add_filter("ZIP archive", &[naming::ARCHIVE_EXTENSION]);
            if let Some(dir) = dirs::download_dir() {
                dialog = dialog.set_directory(dir);
            }

            let handle = dialog
                .save_file()
                .await
                .ok_or_else(|| ExportError::SaveFailed("save was cancelled".to_string()))?;
            let path = handle.path().to_path_buf();
            tokio::fs::write(&path, &archive.bytes)
                .await
                .map_err(|e| ExportError::SaveFailed(e.to_string()))?;
            info!(path = %path.display(), "Archive saved");
            Ok(path)
        })
    }
}
