// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture, gallery and export pipeline
//!
//! Every error here is recovered at the boundary where it occurs and turned
//! into a status message; none of them end the session.

use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Camera-related errors
    #[error(transparent)]
    Camera(#[from] CameraError),
    /// Photo capture errors
    #[error(transparent)]
    Photo(#[from] PhotoError),
    /// Archive export errors
    #[error(transparent)]
    Export(#[from] ExportError),
    /// Remote AI/OCR processing errors
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// Delete or export attempted with no photo selected
    #[error("No photos are selected")]
    NothingSelected,
    /// Gallery index no longer refers to a photo
    #[error("Photo index {index} is out of range (gallery has {len} photos)")]
    IndexOutOfRange { index: usize, len: usize },
    /// Operation needs exactly one selected photo
    #[error("Exactly one photo must be selected ({selected} selected)")]
    SingleSelectionRequired { selected: usize },
    /// Overlay id is not part of the configured set
    #[error("Unknown overlay: {0}")]
    UnknownOverlay(String),
    /// Persistence mirror errors
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Internal consistency errors are logged apart from user-facing ones
    pub fn is_consistency_bug(&self) -> bool {
        matches!(self, AppError::IndexOutOfRange { .. })
    }
}

/// Camera session errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The user or platform refused camera access
    #[error("Camera access was denied")]
    PermissionDenied,
    /// No camera device exists
    #[error("No camera was found")]
    NotFound,
    /// Camera is in use elsewhere or cannot satisfy the request
    #[error("Camera is unavailable: {0}")]
    Unavailable(String),
    /// Any other acquisition failure
    #[error("Camera failed to start: {0}")]
    Other(String),
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhotoError {
    /// Capture attempted with no live stream
    #[error("The camera is not active")]
    CameraInactive,
    /// The stream did not deliver a frame
    #[error("Capture failed: {0}")]
    CaptureFailed(String),
    /// The composited frame could not be encoded
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Archive export errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// No records were handed to the packager
    #[error("No photos to export")]
    EmptySelection,
    /// A record's payload could not be decoded or written
    #[error("Could not add '{name}' to the archive: {reason}")]
    ArchiveEncoding { name: String, reason: String },
    /// The save-to-disk collaborator failed
    #[error("Failed to save archive: {0}")]
    SaveFailed(String),
}

/// Persistence mirror errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed
    #[error("Storage I/O error: {0}")]
    Io(String),
    /// A stored value is not valid JSON for its key
    #[error("Stored value for '{key}' is malformed: {reason}")]
    Malformed { key: String, reason: String },
}

/// Remote AI/OCR collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// No endpoint configured
    #[error("No processing endpoint is configured")]
    NotConfigured,
    /// The request never produced an HTTP response
    #[error("Could not reach the processing server: {0}")]
    Network(String),
    /// The server answered with a non-2xx status
    #[error("Processing failed (HTTP {status}): {message}")]
    Server { status: u16, message: String },
    /// The response body was not the expected JSON
    #[error("Unexpected response from the processing server: {0}")]
    InvalidResponse(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.into())
    }
}
