//
// rules.rs
// Dicom-Catalog-rs
//
// List/create/delete over the per-modality deduplication and quality rules consumed by the scan engine.
//
// Thales Matheus Mendonça Santos - November 2025

use async_trait::async_trait;

use crate::error::{CatalogError, Result};
use crate::models::{FilterRule, NewFilterRule};

#[async_trait]
pub trait RuleBackend: Send + Sync {
    async fn list_rules(&self) -> Result<Vec<FilterRule>>;
    async fn create_rule(&self, rule: &NewFilterRule) -> Result<FilterRule>;
    async fn delete_rule(&self, id: i64) -> Result<()>;
}

/// Manages filter rules.
///
/// No update-in-place exists on the wire: changing a rule's thresholds is
/// create-new + delete-old at the caller's discretion. Thresholds are only
/// checked for being non-negative; their meaning belongs to the scan engine.
pub struct FilterRuleManager<B> {
    backend: B,
}

impl<B: RuleBackend> FilterRuleManager<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub async fn list(&self) -> Result<Vec<FilterRule>> {
        self.backend.list_rules().await
    }

    pub async fn create(&self, rule: NewFilterRule) -> Result<FilterRule> {
        if rule.modality.trim().is_empty() {
            return Err(CatalogError::invalid_input("modality must not be empty"));
        }
        if let Some(thickness) = rule.min_slice_thickness {
            if thickness < 0.0 || !thickness.is_finite() {
                return Err(CatalogError::invalid_input(
                    "min_slice_thickness must be a non-negative number",
                ));
            }
        }
        self.backend.create_rule(&rule).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.backend.delete_rule(id).await
    }
}
