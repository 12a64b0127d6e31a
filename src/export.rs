//
// export.rs
// Dicom-Catalog-rs
//
// Turns the current selection plus an operator-entered target directory into one bulk export request.
//
// Thales Matheus Mendonça Santos - November 2025

use async_trait::async_trait;

use crate::error::{CatalogError, Result};
use crate::models::ExportOutcome;
use crate::selection::SelectionSet;

#[async_trait]
pub trait ExportBackend: Send + Sync {
    async fn export_series(&self, series_ids: &[String], target_dir: &str)
        -> Result<ExportOutcome>;
}

/// Coordinates a bulk export of the selected series.
pub struct ExportCoordinator<B> {
    backend: B,
}

impl<B: ExportBackend> ExportCoordinator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Export every selected series into `target_dir`.
    ///
    /// An empty selection or a blank target directory is a user-input error,
    /// rejected before any request is sent. On success the service's literal
    /// `exported_count` and `target_dir` are returned; the count may differ
    /// from the selection size when some identifiers no longer exist. The
    /// selection itself is never modified here, success or failure — clearing
    /// it after a successful export is the caller's decision.
    pub async fn export(
        &self,
        selection: &SelectionSet,
        target_dir: &str,
    ) -> Result<ExportOutcome> {
        if selection.is_empty() {
            return Err(CatalogError::invalid_input(
                "no series selected for export",
            ));
        }
        if target_dir.trim().is_empty() {
            return Err(CatalogError::invalid_input(
                "target directory must not be empty",
            ));
        }

        let ids = selection.export_ids();
        tracing::info!(count = ids.len(), target_dir, "requesting export");
        self.backend.export_series(&ids, target_dir).await
    }
}
