// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for photo capture and archive export
//!
//! Heavy work (composition, PNG encoding, ZIP building) runs on the blocking
//! pool so the session keeps handling messages while it completes.
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │ PNG data URI │
//! │   (RGBA)     │     │  - Orientation    │     │ (gallery)    │
//! │              │     │  - Overlay        │     │              │
//! │              │     │  - Encoding       │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │  Selected    │ ──▶ │  Export Packager  │ ──▶ │  ZIP file    │
//! │  records     │     │  - Name sanitize  │     │ (saver)      │
//! │              │     │  - Decode + pack  │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: Orientation, composition and encoding of stills
//! - [`export`]: ZIP packaging of selected photos

pub mod export;
pub mod photo;
