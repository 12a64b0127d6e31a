use async_trait::async_trait;

use crate::error::Result;
use crate::models::ScanRun;
use crate::query::PAGE_SIZE;

#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Scan runs, newest first as ordered by the service. 1-based pages.
    async fn list_scans(&self, page: u32, page_size: u32) -> Result<Vec<ScanRun>>;
}

/// Read-only projection of past scan runs. Runs are append-only on the
/// service; this view only re-fetches, it never mutates or re-sorts.
pub struct ScanHistory<B> {
    backend: B,
}

impl<B: HistoryBackend> ScanHistory<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub async fn page(&self, page: u32) -> Result<Vec<ScanRun>> {
        self.backend.list_scans(page.max(1), PAGE_SIZE).await
    }
}
