// SPDX-License-Identifier: GPL-3.0-only

//! AI/OCR processing handlers

use super::HandlerResult;
use crate::app::state::{AppModel, Extraction};
use crate::errors::{AppError, RemoteError};
use crate::remote::{ProcessRequest, decode_qr_payload};
use std::sync::Arc;
use tracing::{info, warn};

impl AppModel {
    pub(crate) async fn handle_process_selected(&mut self) -> HandlerResult {
        let remote = self
            .remote
            .as_ref()
            .map(Arc::clone)
            .ok_or(RemoteError::NotConfigured)?;

        let mut selected = self.gallery.selected();
        if selected.len() != 1 {
            return Err(AppError::SingleSelectionRequired {
                selected: selected.len(),
            });
        }
        let record = selected.remove(0);

        let request = ProcessRequest { image: record.url };
        let response = remote.process(&request).await?;

        let qr_payload = response
            .qr_image_b64
            .as_deref()
            .and_then(|b64| match decode_qr_payload(b64) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!(error = %e, "Could not read returned QR code");
                    None
                }
            });

        info!(
            photo = %record.name,
            fields = response.extracted_data.len(),
            qr = qr_payload.is_some(),
            "Photo processed"
        );
        let status = format!(
            "{} field(s) extracted from {}",
            response.extracted_data.len(),
            record.name
        );
        self.last_extraction = Some(Extraction {
            photo: record.name,
            message: response.message,
            fields: response.extracted_data,
            qr_payload,
        });
        Ok(Some(status))
    }
}
