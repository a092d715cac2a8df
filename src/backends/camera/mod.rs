// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌───────────────────────┐
//! │   AppModel (session)  │
//! └───────────┬───────────┘
//!             │
//!             ▼
//! ┌───────────────────────┐
//! │ CameraSessionManager  │  ← single live stream, fallback, orientation
//! └───────────┬───────────┘
//!             │
//!             ▼
//! ┌───────────────────────┐
//! │  CameraBackend trait  │  ← stream acquisition
//! └───────────┬───────────┘
//!             │
//!             ▼
//!      ┌──────────────┐
//!      │ VirtualCamera│  ← image-backed implementation
//!      └──────────────┘
//! ```

pub mod manager;
pub mod types;

pub use manager::{CameraSessionManager, SessionState};
pub use types::*;

use futures::future::BoxFuture;

/// Stream acquisition interface
///
/// Implementations create streams; only [`CameraSessionManager`] calls them
/// and it is the only owner of a live stream.
pub trait CameraBackend: Send + Sync {
    /// Request a stream satisfying `constraints`
    ///
    /// Must fail with [`BackendError::Overconstrained`] when devices exist but
    /// none satisfies the constraints, so the caller can relax them.
    fn acquire(&self, constraints: VideoConstraints) -> BoxFuture<'_, BackendResult<MediaStream>>;

    /// Human readable backend name for logs
    fn name(&self) -> &str;
}
