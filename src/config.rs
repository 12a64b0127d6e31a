//
// config.rs
// Dicom-Catalog-rs
//
// CRUD over scan-source definitions plus the ad-hoc scan trigger, with a refetch-on-demand cache.
//
// Thales Matheus Mendonça Santos - November 2025

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{CatalogError, Result};
use crate::models::{NewScanConfig, ScanConfig, ScanConfigPatch, ScanRun};

#[async_trait]
pub trait ConfigBackend: Send + Sync {
    async fn list_configs(&self) -> Result<Vec<ScanConfig>>;
    async fn create_config(&self, config: &NewScanConfig) -> Result<ScanConfig>;
    /// Full-document replace: the service overwrites every mutable field.
    async fn update_config(&self, id: i64, config: &NewScanConfig) -> Result<ScanConfig>;
    async fn delete_config(&self, id: i64) -> Result<()>;
    /// Triggers a scan run on the service side. Unbounded duration from the
    /// caller's perspective; resolves once the run record exists.
    async fn run_scan(&self, config_id: i64) -> Result<ScanRun>;
}

/// Manages scan-source definitions.
///
/// The remote service is the sole owner of the configs; this holds a
/// disposable cache that is invalidated after any create/update/delete/run so
/// the next `list` observes the service's state.
pub struct ScanConfigManager<B> {
    backend: B,
    cache: Mutex<Option<Vec<ScanConfig>>>,
    scanning: AtomicBool,
}

impl<B: ConfigBackend> ScanConfigManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: Mutex::new(None),
            scanning: AtomicBool::new(false),
        }
    }

    /// List configs, serving from cache when warm.
    pub async fn list(&self) -> Result<Vec<ScanConfig>> {
        let mut cache = self.cache.lock().await;
        if let Some(configs) = cache.as_ref() {
            return Ok(configs.clone());
        }
        let configs = self.backend.list_configs().await?;
        *cache = Some(configs.clone());
        Ok(configs)
    }

    pub async fn create(&self, config: NewScanConfig) -> Result<ScanConfig> {
        if config.scan_path.trim().is_empty() {
            return Err(CatalogError::invalid_input("scan_path must not be empty"));
        }
        let created = self.backend.create_config(&config).await?;
        self.invalidate().await;
        Ok(created)
    }

    /// Merge a partial update onto the current config and PUT the result.
    pub async fn update(&self, id: i64, patch: ScanConfigPatch) -> Result<ScanConfig> {
        let current = self
            .list()
            .await?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CatalogError::invalid_input(format!("unknown config id {id}")))?;

        let merged = NewScanConfig {
            scan_path: patch.scan_path.unwrap_or(current.scan_path),
            description: patch.description.unwrap_or(current.description),
            schedule_type: patch.schedule_type.unwrap_or(current.schedule_type),
            filter_rules: patch.filter_rules.unwrap_or(current.filter_rules),
        };
        if merged.scan_path.trim().is_empty() {
            return Err(CatalogError::invalid_input("scan_path must not be empty"));
        }

        let updated = self.backend.update_config(id, &merged).await?;
        self.invalidate().await;
        Ok(updated)
    }

    /// Delete a config. The service keeps the config's past scan runs.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.backend.delete_config(id).await?;
        self.invalidate().await;
        Ok(())
    }

    /// Trigger a scan for `config_id` and wait for the run record.
    ///
    /// Only one trigger may be in flight at a time; the UI is expected to
    /// disable the button while `is_scanning` is true, and a second call in
    /// that window is rejected locally.
    pub async fn run_scan(&self, config_id: i64) -> Result<ScanRun> {
        if self.scanning.swap(true, Ordering::SeqCst) {
            return Err(CatalogError::invalid_input("a scan is already in progress"));
        }
        tracing::info!(config_id, "triggering scan");
        let result = self.backend.run_scan(config_id).await;
        self.scanning.store(false, Ordering::SeqCst);

        // A run updates last_scan_at on its config.
        if result.is_ok() {
            self.invalidate().await;
        }
        result
    }

    /// True while a triggered scan has not yet resolved.
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}
