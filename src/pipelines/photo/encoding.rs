// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! Captured stills are encoded losslessly as PNG and carried around as
//! self-contained `data:` URIs, which is also how they are persisted.

use crate::constants::naming;
use crate::errors::PhotoError;
use base64::Engine as _;
use base64::engine::general_purpose;
use image::RgbaImage;
use tracing::debug;

/// Encoded image data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// Self-contained `data:image/png;base64,...` reference
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            naming::PHOTO_MIME,
            general_purpose::STANDARD.encode(&self.data)
        )
    }
}

/// Encode an RGBA raster as PNG
pub fn encode_png(image: &RgbaImage) -> Result<EncodedImage, PhotoError> {
    let mut buffer = Vec::new();

    image
        .write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )
        .map_err(|e| PhotoError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;

    debug!(size = buffer.len(), "Encoding complete");
    Ok(EncodedImage {
        data: buffer,
        width: image.width(),
        height: image.height(),
    })
}

/// Decode the payload of a base64 `data:` URI into raw bytes
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, String> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| "not a data URI".to_string())?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "data URI has no payload".to_string())?;
    if !header.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        return Err("data URI is not base64 encoded".to_string());
    }

    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64 payload: {}", e))
}
