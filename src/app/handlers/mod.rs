// SPDX-License-Identifier: GPL-3.0-only

//! Message handler modules
//!
//! Handlers are grouped by functional domain. Each returns the status line to
//! show after the message, or `None` to leave the current one.

pub mod camera;
pub mod capture;
pub mod export;
pub mod gallery;
pub mod remote;

use crate::errors::AppResult;

/// Outcome of one handler
pub(crate) type HandlerResult = AppResult<Option<String>>;
