// SPDX-License-Identifier: GPL-3.0-only

//! Frame compositing
//!
//! Renders a video frame into a raster with the sensor's native dimensions,
//! applying the stream orientation as a drawing transform, then draws the
//! overlay on top through the very same transform so both stay aligned.
//!
//! Transform order matches a 2D canvas: rotate about the buffer center
//! (translate, rotate, translate back), then mirror horizontally
//! (translate by the width, scale by -1 on x).

use super::orientation::{Rotation, StreamOrientation};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// Decoding state of the selected overlay image
#[derive(Debug, Clone)]
pub enum OverlayImage {
    /// Still decoding; captures taken now skip the overlay
    Loading,
    /// Decoded pixels
    Ready(Arc<RgbaImage>),
    /// Decoding failed
    Failed(String),
}

impl OverlayImage {
    /// Pixels, if fully decoded with non-zero dimensions
    pub fn decoded(&self) -> Option<&Arc<RgbaImage>> {
        match self {
            OverlayImage::Ready(image) if image.width() > 0 && image.height() > 0 => Some(image),
            _ => None,
        }
    }
}

/// Composite `frame` and an optional overlay into a new raster
pub fn compose(
    frame: &RgbaImage,
    orientation: StreamOrientation,
    overlay: Option<&RgbaImage>,
) -> RgbaImage {
    let mut target = RgbaImage::new(frame.width(), frame.height());
    draw_transformed(&mut target, frame, orientation);
    if let Some(overlay) = overlay {
        draw_transformed(&mut target, overlay, orientation);
    }
    target
}

/// Draw `source` full-bleed at (0, 0, width, height) under `orientation`
fn draw_transformed(target: &mut RgbaImage, source: &RgbaImage, orientation: StreamOrientation) {
    let (w, h) = (target.width() as f64, target.height() as f64);
    if source.width() == 0 || source.height() == 0 || w == 0.0 || h == 0.0 {
        return;
    }
    let scale_x = source.width() as f64 / w;
    let scale_y = source.height() as f64 / h;

    for (x, y, pixel) in target.enumerate_pixels_mut() {
        let (qx, qy) = to_drawing_space(x as f64 + 0.5, y as f64 + 0.5, w, h, orientation);
        if qx < 0.0 || qy < 0.0 || qx >= w || qy >= h {
            continue;
        }
        let sx = ((qx * scale_x) as u32).min(source.width() - 1);
        let sy = ((qy * scale_y) as u32).min(source.height() - 1);
        blend_over(pixel, source.get_pixel(sx, sy));
    }
}

/// Inverse of the drawing transform: target point -> drawing-space point
fn to_drawing_space(
    px: f64,
    py: f64,
    w: f64,
    h: f64,
    orientation: StreamOrientation,
) -> (f64, f64) {
    let (cx, cy) = (w / 2.0, h / 2.0);
    let (ux, uy) = (px - cx, py - cy);
    let (vx, vy) = match orientation.rotation {
        Rotation::None => (ux, uy),
        Rotation::Clockwise => (uy, -ux),
        Rotation::CounterClockwise => (-uy, ux),
    };
    let (qx, qy) = (vx + cx, vy + cy);
    if orientation.mirrored {
        (w - qx, qy)
    } else {
        (qx, qy)
    }
}

/// Source-over alpha compositing
fn blend_over(dst: &mut Rgba<u8>, src: &Rgba<u8>) {
    let sa = src[3] as u32;
    if sa == 255 {
        *dst = *src;
        return;
    }
    if sa == 0 {
        return;
    }
    let da = dst[3] as u32;
    let out_a = sa * 255 + da * (255 - sa);
    if out_a == 0 {
        return;
    }
    for c in 0..3 {
        let value = (src[c] as u32 * sa * 255 + dst[c] as u32 * da * (255 - sa)) / out_a;
        dst[c] = value.min(255) as u8;
    }
    dst[3] = (out_a / 255).min(255) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> RgbaImage {
        // 2x2: top-left red, top-right green, bottom-left blue, bottom-right white
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        img
    }

    #[test]
    fn test_identity_copies_frame() {
        let frame = quad();
        let out = compose(&frame, StreamOrientation::default(), None);
        assert_eq!(out, frame);
    }

    #[test]
    fn test_mirror_flips_horizontally() {
        let frame = quad();
        let orientation = StreamOrientation {
            rotation: Rotation::None,
            mirrored: true,
        };
        let out = compose(&frame, orientation, None);
        assert_eq!(out.get_pixel(0, 0), frame.get_pixel(1, 0));
        assert_eq!(out.get_pixel(1, 1), frame.get_pixel(0, 1));
    }

    #[test]
    fn test_clockwise_rotation() {
        let frame = quad();
        let orientation = StreamOrientation {
            rotation: Rotation::Clockwise,
            mirrored: false,
        };
        let out = compose(&frame, orientation, None);
        // Rotating clockwise brings the bottom-left corner to the top-left
        assert_eq!(out.get_pixel(0, 0), frame.get_pixel(0, 1));
        assert_eq!(out.get_pixel(1, 0), frame.get_pixel(0, 0));
        assert_eq!(out.get_pixel(1, 1), frame.get_pixel(1, 0));
    }

    #[test]
    fn test_counter_clockwise_rotation() {
        let frame = quad();
        let orientation = StreamOrientation {
            rotation: Rotation::CounterClockwise,
            mirrored: false,
        };
        let out = compose(&frame, orientation, None);
        assert_eq!(out.get_pixel(0, 0), frame.get_pixel(1, 0));
        assert_eq!(out.get_pixel(0, 1), frame.get_pixel(0, 0));
    }

    #[test]
    fn test_overlay_shares_frame_transform() {
        let frame = RgbaImage::from_pixel(4, 4, Rgba([10, 10, 10, 255]));
        // Overlay marks only its own top-left pixel, at a different resolution
        let mut overlay = RgbaImage::new(2, 2);
        overlay.put_pixel(0, 0, Rgba([200, 0, 0, 255]));

        let orientation = StreamOrientation {
            rotation: Rotation::None,
            mirrored: true,
        };
        let out = compose(&frame, orientation, Some(&overlay));

        // Mirrored: overlay's top-left lands in the top-right 2x2 block
        assert_eq!(out.get_pixel(3, 0), &Rgba([200, 0, 0, 255]));
        assert_eq!(out.get_pixel(2, 1), &Rgba([200, 0, 0, 255]));
        assert_eq!(out.get_pixel(0, 0), &Rgba([10, 10, 10, 255]));
    }

    #[test]
    fn test_translucent_overlay_blends() {
        let frame = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let overlay = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 128]));
        let out = compose(&frame, StreamOrientation::default(), Some(&overlay));
        let px = out.get_pixel(0, 0);
        assert!(px[0] > 120 && px[0] < 136, "got {:?}", px);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_output_keeps_native_dimensions_when_rotated() {
        let frame = RgbaImage::new(8, 4);
        let orientation = StreamOrientation {
            rotation: Rotation::Clockwise,
            mirrored: false,
        };
        let out = compose(&frame, orientation, None);
        assert_eq!(out.dimensions(), (8, 4));
    }

    #[test]
    fn test_overlay_readiness() {
        assert!(OverlayImage::Loading.decoded().is_none());
        assert!(OverlayImage::Failed("x".into()).decoded().is_none());
        assert!(OverlayImage::Ready(Arc::new(RgbaImage::new(0, 0))).decoded().is_none());
        assert!(OverlayImage::Ready(Arc::new(RgbaImage::new(1, 1))).decoded().is_some());
    }
}
