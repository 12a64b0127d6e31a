//
// catalog.rs
// Dicom-Catalog-rs
//
// Issues the paired list+count reads for the series table and applies responses in request-initiation order.
//
// Thales Matheus Mendonça Santos - November 2025

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::SeriesRecord;
use crate::query::{FilterState, PageState, QueryState};

/// Series read operations of the remote service.
#[async_trait]
pub trait SeriesBackend: Send + Sync {
    /// Bounded page read: offset `(page-1)*page_size`, limit `page_size`.
    async fn list_series(
        &self,
        filters: &FilterState,
        page: &PageState,
    ) -> Result<Vec<SeriesRecord>>;

    /// Unbounded count over the same filters.
    async fn count_series(&self, filters: &FilterState) -> Result<u64>;

    async fn get_series(&self, id: &str) -> Result<SeriesRecord>;
}

/// What the series table renders: the current page of entries plus the
/// best-effort total.
///
/// `total` comes from a separate request than `entries`, so the two can be
/// momentarily inconsistent; the view must tolerate that rather than assume a
/// shared snapshot.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    pub entries: Vec<SeriesRecord>,
    pub total: u64,
    pub loading: bool,
}

/// Whether a fetch's responses were applied or silently discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch started while this one was in flight; nothing was
    /// written and nothing is reported to the user.
    Stale,
}

/// Catalog reader with a last-initiated-request-wins policy.
///
/// Every fetch takes a sequence number when it starts; on completion the
/// responses are applied only if no later fetch has been initiated since.
/// That replaces a cancellation protocol: in-flight requests are never
/// aborted, their results are just dropped.
pub struct CatalogBrowser<B> {
    backend: B,
    seq: AtomicU64,
    view: Mutex<CatalogView>,
}

impl<B: SeriesBackend> CatalogBrowser<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            seq: AtomicU64::new(0),
            view: Mutex::new(CatalogView::default()),
        }
    }

    /// Run the paired list+count read for the given query state.
    ///
    /// Both requests use the identical filter snapshot captured here, so a
    /// filter change arriving mid-flight cannot pair a stale count with a
    /// fresh list. On failure the previous entries/total are left untouched
    /// and only the loading flag is dropped; there is no automatic retry.
    pub async fn fetch(&self, query: &QueryState) -> Result<FetchOutcome> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let filters = query.filters.clone();
        let page = query.page.clone();

        self.view.lock().await.loading = true;

        let result = tokio::try_join!(
            self.backend.list_series(&filters, &page),
            self.backend.count_series(&filters),
        );

        let mut view = self.view.lock().await;
        if seq != self.seq.load(Ordering::SeqCst) {
            // A newer fetch owns the view now; drop this response unseen.
            tracing::debug!(seq, "discarding stale catalog response");
            return Ok(FetchOutcome::Stale);
        }

        match result {
            Ok((entries, total)) => {
                view.entries = entries;
                view.total = total;
                view.loading = false;
                Ok(FetchOutcome::Applied)
            }
            Err(err) => {
                view.loading = false;
                Err(err)
            }
        }
    }

    /// Snapshot of the current table state.
    pub async fn view(&self) -> CatalogView {
        self.view.lock().await.clone()
    }

    /// Single-record read, used by the detail view.
    pub async fn get(&self, id: &str) -> Result<SeriesRecord> {
        self.backend.get_series(id).await
    }
}
