//
// models.rs
// Dicom-Catalog-rs
//
// Defines the serializable data structures exchanged with the catalog service: series records, scan configs, scan runs, filter rules, and stats.
//
// Thales Matheus Mendonça Santos - November 2025

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One imaging-series record as returned by the service.
///
/// The client treats this as an immutable snapshot: entries are replaced
/// wholesale on refetch and never mutated locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub id: String,
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub patient_sex: Option<String>,
    pub patient_birth_date: Option<String>,
    pub study_instance_uid: Option<String>,
    pub study_date: Option<String>,
    pub series_instance_uid: Option<String>,
    pub series_number: Option<i64>,
    pub series_description: Option<String>,
    pub modality: Option<String>,
    pub protocol_name: Option<String>,
    pub manufacturer: Option<String>,
    pub manufacturer_model: Option<String>,
    /// Modality-specific acquisition parameters, passed through untyped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ct_params: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mr_params: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dx_params: Option<BTreeMap<String, serde_json::Value>>,
    pub file_path: Option<String>,
    pub file_count: Option<u64>,
    pub file_size_total: Option<u64>,
    pub file_modified_date: Option<String>,
    pub created_at: Option<String>,
    pub is_active: Option<bool>,
}

/// How a scan source is scheduled on the service side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    Manual,
    Weekly,
}

/// A scan-source definition owned by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub id: i64,
    pub scan_path: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub schedule_type: ScheduleType,
    pub last_scan_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_rules: Option<BTreeMap<String, serde_json::Value>>,
}

/// Payload for creating a scan config.
#[derive(Debug, Clone, Serialize)]
pub struct NewScanConfig {
    pub scan_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schedule_type: ScheduleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_rules: Option<BTreeMap<String, serde_json::Value>>,
}

/// Partial update applied on top of a cached config before the PUT.
///
/// The service replaces the document wholesale, so unset fields keep the
/// previously fetched value rather than being cleared.
#[derive(Debug, Clone, Default)]
pub struct ScanConfigPatch {
    pub scan_path: Option<String>,
    pub description: Option<Option<String>>,
    pub schedule_type: Option<ScheduleType>,
    pub filter_rules: Option<Option<BTreeMap<String, serde_json::Value>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Completed,
    Failed,
}

/// One scan run as recorded by the service. Append-only from the client's
/// perspective: never mutated locally, only re-fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRun {
    pub id: String,
    pub scan_path: String,
    pub scan_type: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub series_found: u64,
    #[serde(default)]
    pub series_new: u64,
    #[serde(default)]
    pub series_duplicated: u64,
    pub status: ScanStatus,
}

/// Per-modality deduplication/quality rule consumed by the scan engine.
///
/// The service does not guarantee at most one rule per modality; the client
/// must not assume uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRule {
    pub id: i64,
    pub modality: String,
    pub min_slice_thickness: Option<f64>,
    pub min_image_count: Option<u64>,
    pub is_active: bool,
}

/// Payload for creating a filter rule. Thresholds left `None` are omitted
/// from the request entirely, never sent as zero.
#[derive(Debug, Clone, Serialize)]
pub struct NewFilterRule {
    pub modality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_slice_thickness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_image_count: Option<u64>,
}

/// Result of a bulk export as reported by the service.
///
/// `exported_count` is the service's literal answer and may differ from the
/// number of identifiers requested (some may no longer exist).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub success: bool,
    pub exported_count: u64,
    pub target_dir: String,
    #[serde(default)]
    pub message: String,
}

/// Series count grouped by modality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModalityStat {
    pub modality: Option<String>,
    pub count: u64,
}

/// Series count grouped by study date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateStat {
    pub date: String,
    pub count: u64,
}
