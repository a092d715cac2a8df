// SPDX-License-Identifier: GPL-3.0-only

//! Stream orientation resolution
//!
//! Decides how the preview (and every captured still) must be rotated and
//! flipped so it appears upright for the current viewport. The result is
//! carried as a value from the session manager to the compositor.

use crate::backends::camera::types::FacingMode;
use serde::{Deserialize, Serialize};

/// Viewport geometry in CSS/logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Rotation applied about the buffer center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    /// +90 degrees
    Clockwise,
    /// -90 degrees
    CounterClockwise,
}

impl Rotation {
    /// Signed rotation in degrees (0, 90 or -90)
    pub fn degrees(&self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise => 90,
            Rotation::CounterClockwise => -90,
        }
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Rotation plus horizontal mirroring for one stream/viewport pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamOrientation {
    pub rotation: Rotation,
    pub mirrored: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Landscape,
    Portrait,
    Square,
}

impl Shape {
    fn of(width: u32, height: u32) -> Self {
        if width > height {
            Shape::Landscape
        } else if height > width {
            Shape::Portrait
        } else {
            Shape::Square
        }
    }
}

/// Resolve the orientation for a stream shown in a viewport
///
/// A landscape stream in a portrait viewport is rotated +90°, a portrait
/// stream in a landscape viewport -90°. Square streams or viewports never
/// rotate. Front-facing (`user`) cameras are mirrored regardless of rotation.
pub fn resolve(
    stream_width: u32,
    stream_height: u32,
    facing: Option<FacingMode>,
    viewport: Viewport,
) -> StreamOrientation {
    let rotation = match (
        Shape::of(stream_width, stream_height),
        Shape::of(viewport.width, viewport.height),
    ) {
        (Shape::Landscape, Shape::Portrait) => Rotation::Clockwise,
        (Shape::Portrait, Shape::Landscape) => Rotation::CounterClockwise,
        _ => Rotation::None,
    };

    StreamOrientation {
        rotation,
        mirrored: facing == Some(FacingMode::User),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_stream_never_rotates() {
        let o = resolve(720, 720, None, Viewport::new(400, 800));
        assert_eq!(o.rotation, Rotation::None);
        let o = resolve(720, 720, None, Viewport::new(800, 400));
        assert_eq!(o.rotation, Rotation::None);
    }

    #[test]
    fn test_square_viewport_never_rotates() {
        let o = resolve(1920, 1080, None, Viewport::new(500, 500));
        assert_eq!(o.rotation, Rotation::None);
    }

    #[test]
    fn test_unknown_facing_is_not_mirrored() {
        assert!(!resolve(640, 480, None, Viewport::new(800, 600)).mirrored);
    }

    #[test]
    fn test_degrees() {
        assert_eq!(Rotation::None.degrees(), 0);
        assert_eq!(Rotation::Clockwise.degrees(), 90);
        assert_eq!(Rotation::CounterClockwise.degrees(), -90);
    }
}
