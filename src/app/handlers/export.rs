// SPDX-License-Identifier: GPL-3.0-only

//! Export handlers

use super::HandlerResult;
use crate::app::state::AppModel;
use crate::errors::AppError;
use tracing::info;

impl AppModel {
    pub(crate) async fn handle_export_selected(&mut self, archive_name: String) -> HandlerResult {
        let selected = self.gallery.selected();
        if selected.is_empty() {
            return Err(AppError::NothingSelected);
        }

        let count = selected.len();
        let archive = self
            .packager
            .build_archive_async(selected, archive_name)
            .await?;
        let path = self.saver.save(&archive).await?;

        info!(path = %path.display(), photos = count, "Export finished");
        self.last_export = Some(path);
        Ok(Some(format!(
            "{} photo(s) saved as \"{}\"",
            count, archive.file_name
        )))
    }
}
