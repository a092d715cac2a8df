// SPDX-License-Identifier: GPL-3.0-only

//! Boardscan - camera capture and photo gallery
//!
//! Captures oriented stills from a camera stream, composites a selectable
//! overlay onto them, keeps them in a persisted gallery with selection
//! state, and exports selections as ZIP archives.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Session context, command dispatch, gallery and selection
//! - [`backends`]: Camera abstraction and the file-backed virtual camera
//! - [`pipelines`]: Photo capture and archive export pipelines
//! - [`storage`]: Persistence mirror over a key-value store
//! - [`remote`]: Optional AI/OCR processing collaborator
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let mut app = AppModel::new(Config::load(), collaborators);
//! app.update(Message::StartCamera).await?;
//! app.update(Message::Capture).await?;
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod remote;
pub mod storage;

// Re-export commonly used types
pub use app::{AppModel, Collaborators, GalleryControls, Message, PhotoRecord};
pub use config::Config;
pub use errors::{AppError, AppResult};
