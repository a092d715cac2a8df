// SPDX-License-Identifier: GPL-3.0-only

//! Remote AI/OCR processing
//!
//! Sends one photo to an external service that extracts labelled text
//! fields and returns them together with a QR code encoding the same data.
//! The transport is the system `curl`, so no HTTP stack is linked in.

use crate::errors::RemoteError;
use base64::Engine as _;
use base64::engine::general_purpose;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Photo as a `data:` URI
    pub image: String,
}

/// Successful response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub message: Option<String>,
    /// Field name → recognized text
    pub extracted_data: BTreeMap<String, String>,
    /// PNG of a QR code summarizing the fields, base64 without a data prefix
    #[serde(default)]
    pub qr_image_b64: Option<String>,
}

/// Failure response body
#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Remote processing collaborator
pub trait RemoteProcessor: Send + Sync {
    fn process<'a>(
        &'a self,
        request: &'a ProcessRequest,
    ) -> BoxFuture<'a, Result<ProcessResponse, RemoteError>>;
}

/// Classify an HTTP status and body into a response or an error
pub fn parse_response(status: u16, body: &str) -> Result<ProcessResponse, RemoteError> {
    if (200..300).contains(&status) {
        return serde_json::from_str(body).map_err(|e| RemoteError::InvalidResponse(e.to_string()));
    }

    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => err.error,
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    };
    Err(RemoteError::Server { status, message })
}

/// Decode the text carried by a base64 PNG QR code
pub fn decode_qr_payload(qr_image_b64: &str) -> Result<String, String> {
    let bytes = general_purpose::STANDARD
        .decode(qr_image_b64.trim())
        .map_err(|e| format!("invalid base64: {}", e))?;
    let luma = image::load_from_memory(&bytes)
        .map_err(|e| format!("invalid image: {}", e))?
        .to_luma8();

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        luma.width() as usize,
        luma.height() as usize,
        |x, y| luma.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    let grid = grids.first().ok_or_else(|| "no QR code found".to_string())?;
    let (_meta, content) = grid.decode().map_err(|e| format!("QR decode failed: {}", e))?;
    Ok(content)
}

/// Posts requests with the system `curl`
pub struct CurlProcessor {
    endpoint: String,
    program: String,
}

impl CurlProcessor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            program: "curl".to_string(),
        }
    }

    /// Use a different curl binary
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn post(&self, request: &ProcessRequest) -> Result<ProcessResponse, RemoteError> {
        let body =
            serde_json::to_vec(request).map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        info!(endpoint = %self.endpoint, bytes = body.len(), "Sending photo for processing");

        let mut child = tokio::process::Command::new(&self.program)
            .args([
                "-sS",
                "-X",
                "POST",
                "-H",
                "Content-Type: application/json",
                "--data-binary",
                "@-",
                "-w",
                "\n%{http_code}",
                self.endpoint.as_str(),
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RemoteError::Network(format!("failed to run {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&body)
                .await
                .map_err(|e| RemoteError::Network(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = ?output.status.code(), %stderr, "curl failed");
            return Err(RemoteError::Network(stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (body, code) = stdout
            .rsplit_once('\n')
            .ok_or_else(|| RemoteError::InvalidResponse("missing status line".into()))?;
        let status: u16 = code
            .trim()
            .parse()
            .map_err(|_| RemoteError::InvalidResponse(format!("bad status '{}'", code)))?;
        debug!(status, bytes = body.len(), "Processing response received");

        parse_response(status, body)
    }
}

impl RemoteProcessor for CurlProcessor {
    fn process<'a>(
        &'a self,
        request: &'a ProcessRequest,
    ) -> BoxFuture<'a, Result<ProcessResponse, RemoteError>> {
        Box::pin(self.post(request))
    }
}
