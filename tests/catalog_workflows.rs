//
// catalog_workflows.rs
// Dicom-Catalog-rs
//
// Integration-style tests covering the fetch/selection/export workflow, concurrent fetch ordering, config and rule management, and stats aggregation.
//
// Thales Matheus Mendonça Santos - November 2025

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use dicom_catalog::catalog::{CatalogBrowser, FetchOutcome, SeriesBackend};
use dicom_catalog::config::{ConfigBackend, ScanConfigManager};
use dicom_catalog::error::{CatalogError, Result};
use dicom_catalog::export::{ExportBackend, ExportCoordinator};
use dicom_catalog::history::{HistoryBackend, ScanHistory};
use dicom_catalog::models::{
    DateStat, ExportOutcome, FilterRule, ModalityStat, NewFilterRule, NewScanConfig, ScanConfig,
    ScanConfigPatch, ScanRun, ScanStatus, ScheduleType, SeriesRecord,
};
use dicom_catalog::query::{FilterPatch, FilterState, PageState, QueryState};
use dicom_catalog::rules::{FilterRuleManager, RuleBackend};
use dicom_catalog::selection::SelectionSet;
use dicom_catalog::stats::{StatsAggregator, StatsBackend};

fn series(id: &str, modality: &str) -> SeriesRecord {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "modality": modality,
        "patient_id": "PAT123",
        "patient_name": "Test^Patient",
        "file_count": 42,
    }))
    .expect("series record")
}

// ---------------------------------------------------------------------------
// Catalog fetch ordering
// ---------------------------------------------------------------------------

/// Series backend whose responses for modality "CT" stall until released,
/// so tests can force out-of-order completion.
#[derive(Clone)]
struct RacingSeriesBackend {
    release_ct: Arc<Notify>,
}

impl RacingSeriesBackend {
    fn new() -> Self {
        Self {
            release_ct: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl SeriesBackend for RacingSeriesBackend {
    async fn list_series(
        &self,
        filters: &FilterState,
        _page: &PageState,
    ) -> Result<Vec<SeriesRecord>> {
        if filters.modality == "CT" {
            self.release_ct.notified().await;
        }
        Ok(vec![series(
            &format!("{}-1", filters.modality),
            &filters.modality,
        )])
    }

    async fn count_series(&self, filters: &FilterState) -> Result<u64> {
        if filters.modality == "CT" {
            self.release_ct.notified().await;
        }
        Ok(if filters.modality == "CT" { 100 } else { 7 })
    }

    async fn get_series(&self, id: &str) -> Result<SeriesRecord> {
        Ok(series(id, "CT"))
    }
}

#[tokio::test]
async fn later_fetch_wins_regardless_of_arrival_order() {
    let backend = RacingSeriesBackend::new();
    let release = backend.release_ct.clone();
    let browser = CatalogBrowser::new(backend);

    let mut ct_query = QueryState::default();
    ct_query.set_filters(FilterPatch {
        modality: Some("CT".to_string()),
        ..Default::default()
    });
    let mut mr_query = QueryState::default();
    mr_query.set_filters(FilterPatch {
        modality: Some("MR".to_string()),
        ..Default::default()
    });

    // First fetch (CT) stalls inside the backend; the second (MR) completes
    // immediately and then lets the first one finish late.
    let (first, second) = tokio::join!(browser.fetch(&ct_query), async {
        let outcome = browser.fetch(&mr_query).await;
        release.notify_waiters();
        outcome
    });

    assert_eq!(first.expect("first fetch"), FetchOutcome::Stale);
    assert_eq!(second.expect("second fetch"), FetchOutcome::Applied);

    // Only the MR response is visible; the late CT response was discarded.
    let view = browser.view().await;
    assert_eq!(view.total, 7);
    assert_eq!(view.entries.len(), 1);
    assert_eq!(view.entries[0].id, "MR-1");
    assert!(!view.loading);
}

/// Backend that fails every request after a configurable number of successes.
#[derive(Clone)]
struct FlakySeriesBackend {
    calls: Arc<AtomicU64>,
    fail_after: u64,
}

#[async_trait]
impl SeriesBackend for FlakySeriesBackend {
    async fn list_series(
        &self,
        filters: &FilterState,
        _page: &PageState,
    ) -> Result<Vec<SeriesRecord>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
            return Err(CatalogError::Service {
                status: 500,
                message: "boom".to_string(),
            });
        }
        Ok(vec![series("s-1", &filters.modality)])
    }

    async fn count_series(&self, _filters: &FilterState) -> Result<u64> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
            return Err(CatalogError::Service {
                status: 500,
                message: "boom".to_string(),
            });
        }
        Ok(1)
    }

    async fn get_series(&self, id: &str) -> Result<SeriesRecord> {
        Ok(series(id, "CT"))
    }
}

#[tokio::test]
async fn failed_fetch_preserves_previous_view() {
    let backend = FlakySeriesBackend {
        calls: Arc::new(AtomicU64::new(0)),
        fail_after: 2,
    };
    let browser = CatalogBrowser::new(backend);
    let query = QueryState::default();

    browser.fetch(&query).await.expect("first fetch");
    let before = browser.view().await;
    assert_eq!(before.entries.len(), 1);

    let err = browser.fetch(&query).await.expect_err("second fetch fails");
    assert!(matches!(err, CatalogError::Service { status: 500, .. }));

    // Entries and total survive untouched; only the loading flag drops.
    let after = browser.view().await;
    assert_eq!(after.entries.len(), before.entries.len());
    assert_eq!(after.total, before.total);
    assert!(!after.loading);
}

// ---------------------------------------------------------------------------
// Selection + export workflow
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct RecordingExportBackend {
    requests: Arc<Mutex<Vec<(Vec<String>, String)>>>,
}

#[async_trait]
impl ExportBackend for RecordingExportBackend {
    async fn export_series(
        &self,
        series_ids: &[String],
        target_dir: &str,
    ) -> Result<ExportOutcome> {
        self.requests
            .lock()
            .unwrap()
            .push((series_ids.to_vec(), target_dir.to_string()));
        Ok(ExportOutcome {
            success: true,
            // The service may export fewer than requested.
            exported_count: series_ids.len() as u64 - 1,
            target_dir: target_dir.to_string(),
            message: String::new(),
        })
    }
}

#[tokio::test]
async fn selection_across_pages_exports_exactly_the_selected_ids() {
    let mut selection = SelectionSet::new();

    // Page 1 shows a and b; select both via the page toggle.
    selection.select_all_visible(&["a", "b"]);
    // Navigate to page 2 and pick c; a and b stay selected.
    selection.toggle("c");
    assert_eq!(selection.len(), 3);

    let backend = RecordingExportBackend::default();
    let coordinator = ExportCoordinator::new(backend.clone());
    let outcome = coordinator
        .export(&selection, "/data/exports")
        .await
        .expect("export");

    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (ids, target) = &requests[0];
    assert_eq!(ids, &["a", "b", "c"]);
    assert_eq!(target, "/data/exports");

    // The reported count is the service's literal answer, not the request size.
    assert_eq!(outcome.exported_count, 2);
    // Export does not clear the selection; that is the caller's decision.
    assert_eq!(selection.len(), 3);
}

#[tokio::test]
async fn export_preconditions_are_rejected_without_a_request() {
    let backend = RecordingExportBackend::default();
    let coordinator = ExportCoordinator::new(backend.clone());

    let empty = SelectionSet::new();
    let err = coordinator
        .export(&empty, "/x")
        .await
        .expect_err("empty selection");
    assert!(err.is_user_error());

    let mut selection = SelectionSet::new();
    selection.toggle("a");
    let err = coordinator
        .export(&selection, "   ")
        .await
        .expect_err("blank target");
    assert!(err.is_user_error());

    assert!(backend.requests.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Scan config management
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct RecordingConfigBackend {
    list_calls: Arc<AtomicU64>,
    updates: Arc<Mutex<Vec<(i64, NewScanConfig)>>>,
    hold_scan: Option<Arc<Notify>>,
}

impl RecordingConfigBackend {
    fn new() -> Self {
        Self {
            list_calls: Arc::new(AtomicU64::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
            hold_scan: None,
        }
    }

    fn config(id: i64) -> ScanConfig {
        ScanConfig {
            id,
            scan_path: "/data/dicom1".to_string(),
            description: Some("primary archive".to_string()),
            is_active: true,
            schedule_type: ScheduleType::Weekly,
            last_scan_at: None,
            filter_rules: None,
        }
    }
}

#[async_trait]
impl ConfigBackend for RecordingConfigBackend {
    async fn list_configs(&self) -> Result<Vec<ScanConfig>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Self::config(1)])
    }

    async fn create_config(&self, config: &NewScanConfig) -> Result<ScanConfig> {
        Ok(ScanConfig {
            id: 2,
            scan_path: config.scan_path.clone(),
            description: config.description.clone(),
            is_active: true,
            schedule_type: config.schedule_type,
            last_scan_at: None,
            filter_rules: config.filter_rules.clone(),
        })
    }

    async fn update_config(&self, id: i64, config: &NewScanConfig) -> Result<ScanConfig> {
        self.updates.lock().unwrap().push((id, config.clone()));
        Ok(Self::config(id))
    }

    async fn delete_config(&self, _id: i64) -> Result<()> {
        Ok(())
    }

    async fn run_scan(&self, config_id: i64) -> Result<ScanRun> {
        if let Some(hold) = &self.hold_scan {
            hold.notified().await;
        }
        Ok(ScanRun {
            id: "scan-1".to_string(),
            scan_path: format!("/data/dicom{config_id}"),
            scan_type: "manual".to_string(),
            started_at: None,
            finished_at: None,
            series_found: 10,
            series_new: 3,
            series_duplicated: 7,
            status: ScanStatus::Completed,
        })
    }
}

#[tokio::test]
async fn config_list_is_cached_until_a_mutation() {
    let backend = RecordingConfigBackend::new();
    let list_calls = backend.list_calls.clone();
    let manager = ScanConfigManager::new(backend);

    manager.list().await.expect("first list");
    manager.list().await.expect("second list");
    assert_eq!(list_calls.load(Ordering::SeqCst), 1);

    manager
        .create(NewScanConfig {
            scan_path: "/data/dicom2".to_string(),
            description: None,
            schedule_type: ScheduleType::Manual,
            filter_rules: None,
        })
        .await
        .expect("create");

    manager.list().await.expect("list after create");
    assert_eq!(list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn update_merges_partial_onto_cached_config() {
    let backend = RecordingConfigBackend::new();
    let updates = backend.updates.clone();
    let manager = ScanConfigManager::new(backend);

    manager
        .update(
            1,
            ScanConfigPatch {
                description: Some(Some("relabelled".to_string())),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    let updates = updates.lock().unwrap();
    let (id, sent) = &updates[0];
    assert_eq!(*id, 1);
    // Untouched fields carry the previously fetched values.
    assert_eq!(sent.scan_path, "/data/dicom1");
    assert_eq!(sent.schedule_type, ScheduleType::Weekly);
    assert_eq!(sent.description.as_deref(), Some("relabelled"));
}

#[tokio::test]
async fn empty_scan_path_is_rejected_locally() {
    let backend = RecordingConfigBackend::new();
    let manager = ScanConfigManager::new(backend);

    let err = manager
        .create(NewScanConfig {
            scan_path: "  ".to_string(),
            description: None,
            schedule_type: ScheduleType::Manual,
            filter_rules: None,
        })
        .await
        .expect_err("blank scan_path");
    assert!(err.is_user_error());
}

#[tokio::test]
async fn only_one_scan_trigger_may_be_in_flight() {
    let mut backend = RecordingConfigBackend::new();
    let hold = Arc::new(Notify::new());
    backend.hold_scan = Some(hold.clone());
    let manager = Arc::new(ScanConfigManager::new(backend));

    let first = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.run_scan(1).await })
    };
    // Let the first trigger reach the backend before testing the guard.
    while !manager.is_scanning() {
        tokio::task::yield_now().await;
    }

    let err = manager.run_scan(1).await.expect_err("second trigger");
    assert!(err.is_user_error());

    hold.notify_waiters();
    let run = first.await.expect("join").expect("first trigger");
    assert_eq!(run.status, ScanStatus::Completed);
    assert!(!manager.is_scanning());
}

// ---------------------------------------------------------------------------
// Filter rules
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct RecordingRuleBackend {
    created: Arc<Mutex<Vec<NewFilterRule>>>,
}

#[async_trait]
impl RuleBackend for RecordingRuleBackend {
    async fn list_rules(&self) -> Result<Vec<FilterRule>> {
        let created = self.created.lock().unwrap();
        Ok(created
            .iter()
            .enumerate()
            .map(|(idx, rule)| FilterRule {
                id: idx as i64 + 1,
                modality: rule.modality.clone(),
                min_slice_thickness: rule.min_slice_thickness,
                min_image_count: rule.min_image_count,
                is_active: true,
            })
            .collect())
    }

    async fn create_rule(&self, rule: &NewFilterRule) -> Result<FilterRule> {
        let mut created = self.created.lock().unwrap();
        created.push(rule.clone());
        Ok(FilterRule {
            id: created.len() as i64,
            modality: rule.modality.clone(),
            min_slice_thickness: rule.min_slice_thickness,
            min_image_count: rule.min_image_count,
            is_active: true,
        })
    }

    async fn delete_rule(&self, _id: i64) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn unset_thresholds_stay_absent_not_zero() {
    let backend = RecordingRuleBackend::default();
    let manager = FilterRuleManager::new(backend);

    manager
        .create(NewFilterRule {
            modality: "MR".to_string(),
            min_slice_thickness: None,
            min_image_count: Some(10),
        })
        .await
        .expect("create");

    let rules = manager.list().await.expect("list");
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].modality, "MR");
    assert_eq!(rules[0].min_image_count, Some(10));
    assert!(rules[0].min_slice_thickness.is_none());

    // The wire payload omits the unset threshold entirely.
    let body = serde_json::to_value(NewFilterRule {
        modality: "MR".to_string(),
        min_slice_thickness: None,
        min_image_count: Some(10),
    })
    .expect("serialize");
    assert!(body.get("min_slice_thickness").is_none());
    assert_eq!(body["min_image_count"], 10);
}

#[tokio::test]
async fn negative_threshold_is_rejected_locally() {
    let backend = RecordingRuleBackend::default();
    let created = backend.created.clone();
    let manager = FilterRuleManager::new(backend);

    let err = manager
        .create(NewFilterRule {
            modality: "CT".to_string(),
            min_slice_thickness: Some(-1.5),
            min_image_count: None,
        })
        .await
        .expect_err("negative threshold");
    assert!(err.is_user_error());
    assert!(created.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Scan history and stats
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct RecordingHistoryBackend {
    pages: Arc<Mutex<Vec<(u32, u32)>>>,
}

#[async_trait]
impl HistoryBackend for RecordingHistoryBackend {
    async fn list_scans(&self, page: u32, page_size: u32) -> Result<Vec<ScanRun>> {
        self.pages.lock().unwrap().push((page, page_size));
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn history_pages_are_one_based() {
    let backend = RecordingHistoryBackend::default();
    let pages = backend.pages.clone();
    let history = ScanHistory::new(backend);

    history.page(0).await.expect("page 0 clamps");
    history.page(3).await.expect("page 3");

    let pages = pages.lock().unwrap();
    assert_eq!(*pages, vec![(1, 20), (3, 20)]);
}

#[derive(Clone)]
struct FixedStatsBackend {
    total: u64,
}

#[async_trait]
impl StatsBackend for FixedStatsBackend {
    async fn modality_stats(&self) -> Result<Vec<ModalityStat>> {
        Ok(vec![
            ModalityStat {
                modality: Some("CT".to_string()),
                count: 30,
            },
            ModalityStat {
                modality: None,
                count: 15,
            },
        ])
    }

    async fn date_stats(&self) -> Result<Vec<DateStat>> {
        Ok(vec![DateStat {
            date: "20240101".to_string(),
            count: 5,
        }])
    }

    async fn total_series(&self) -> Result<u64> {
        Ok(self.total)
    }
}

#[tokio::test]
async fn dashboard_derives_percentages() {
    let aggregator = StatsAggregator::new(FixedStatsBackend { total: 60 });
    let dashboard = aggregator.dashboard().await.expect("dashboard");

    assert_eq!(dashboard.total, 60);
    assert_eq!(dashboard.modalities[0].modality, "CT");
    assert!((dashboard.modalities[0].percent - 50.0).abs() < f64::EPSILON);
    // A missing modality label renders as "unknown" rather than dropping the row.
    assert_eq!(dashboard.modalities[1].modality, "unknown");
    assert_eq!(dashboard.dates.len(), 1);
}

#[tokio::test]
async fn dashboard_with_no_series_reports_zero_percent() {
    let aggregator = StatsAggregator::new(FixedStatsBackend { total: 0 });
    let dashboard = aggregator.dashboard().await.expect("dashboard");

    for share in &dashboard.modalities {
        assert_eq!(share.percent, 0.0);
    }
}

// ---------------------------------------------------------------------------
// Wire model shapes
// ---------------------------------------------------------------------------

#[test]
fn scan_run_deserializes_from_service_payload() {
    let run: ScanRun = serde_json::from_value(serde_json::json!({
        "id": "scan-9",
        "scan_path": "/data/dicom1",
        "scan_type": "manual",
        "started_at": "2024-01-01T08:00:00Z",
        "finished_at": null,
        "series_found": 12,
        "series_new": 4,
        "series_duplicated": 8,
        "status": "running",
    }))
    .expect("scan run");

    assert_eq!(run.status, ScanStatus::Running);
    assert!(run.started_at.is_some());
    assert!(run.finished_at.is_none());
}

#[test]
fn scan_config_round_trips_schedule_type() {
    let config: ScanConfig = serde_json::from_value(serde_json::json!({
        "id": 1,
        "scan_path": "/data/dicom1",
        "description": null,
        "is_active": true,
        "schedule_type": "weekly",
        "last_scan_at": null,
    }))
    .expect("scan config");
    assert_eq!(config.schedule_type, ScheduleType::Weekly);

    let body = serde_json::to_value(&config).expect("serialize");
    assert_eq!(body["schedule_type"], "weekly");
}
