//
// api.rs
// Dicom-Catalog-rs
//
// Reqwest-based client for the catalog service; implements every backend trait consumed by the components.
//
// Thales Matheus Mendonça Santos - November 2025

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::catalog::SeriesBackend;
use crate::config::ConfigBackend;
use crate::error::{CatalogError, Result};
use crate::export::ExportBackend;
use crate::history::HistoryBackend;
use crate::models::{
    DateStat, ExportOutcome, FilterRule, ModalityStat, NewFilterRule, NewScanConfig, ScanConfig,
    ScanRun, SeriesRecord,
};
use crate::query::{FilterState, PageState};
use crate::rules::RuleBackend;
use crate::stats::StatsBackend;

/// The list endpoint wraps its rows; count answers a bare total.
#[derive(Deserialize)]
struct SeriesListResponse {
    #[serde(default)]
    data: Vec<SeriesRecord>,
}

#[derive(Deserialize)]
struct CountResponse {
    total: u64,
}

/// HTTP client for the remote catalog service.
///
/// Every endpoint lives under the service's `/api` prefix. The client adds no
/// retry and no authentication; a failed request surfaces as exactly one
/// `CatalogError`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(CatalogError::Service {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// For endpoints whose body carries nothing the client needs.
    async fn check(response: Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(CatalogError::Service {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self.client.get(&url).query(query).send().await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl SeriesBackend for ApiClient {
    async fn list_series(
        &self,
        filters: &FilterState,
        page: &PageState,
    ) -> Result<Vec<SeriesRecord>> {
        let mut query = vec![
            ("page", page.page.to_string()),
            ("page_size", page.page_size.to_string()),
        ];
        for (key, value) in filters.active_fields() {
            query.push((key, value.to_string()));
        }
        let body: SeriesListResponse = self.get_json("series", &query).await?;
        Ok(body.data)
    }

    async fn count_series(&self, filters: &FilterState) -> Result<u64> {
        // The count endpoint does not filter on protocol_name.
        let query: Vec<(&str, String)> = filters
            .active_fields()
            .into_iter()
            .filter(|(key, _)| *key != "protocol_name")
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        let body: CountResponse = self.get_json("series/count", &query).await?;
        Ok(body.total)
    }

    async fn get_series(&self, id: &str) -> Result<SeriesRecord> {
        self.get_json(&format!("series/{id}"), &[]).await
    }
}

#[async_trait]
impl ConfigBackend for ApiClient {
    async fn list_configs(&self) -> Result<Vec<ScanConfig>> {
        self.get_json("configs", &[]).await
    }

    async fn create_config(&self, config: &NewScanConfig) -> Result<ScanConfig> {
        let response = self
            .client
            .post(self.url("configs"))
            .json(config)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn update_config(&self, id: i64, config: &NewScanConfig) -> Result<ScanConfig> {
        let response = self
            .client
            .put(self.url(&format!("configs/{id}")))
            .json(config)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete_config(&self, id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("configs/{id}")))
            .send()
            .await?;
        Self::check(response).await
    }

    async fn run_scan(&self, config_id: i64) -> Result<ScanRun> {
        let response = self
            .client
            .post(self.url(&format!("scan/{config_id}")))
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl HistoryBackend for ApiClient {
    async fn list_scans(&self, page: u32, page_size: u32) -> Result<Vec<ScanRun>> {
        let query = [
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        self.get_json("scans", &query).await
    }
}

#[async_trait]
impl RuleBackend for ApiClient {
    async fn list_rules(&self) -> Result<Vec<FilterRule>> {
        self.get_json("filter-rules", &[]).await
    }

    async fn create_rule(&self, rule: &NewFilterRule) -> Result<FilterRule> {
        let response = self
            .client
            .post(self.url("filter-rules"))
            .json(rule)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete_rule(&self, id: i64) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("filter-rules/{id}")))
            .send()
            .await?;
        Self::check(response).await
    }
}

#[async_trait]
impl ExportBackend for ApiClient {
    async fn export_series(
        &self,
        series_ids: &[String],
        target_dir: &str,
    ) -> Result<ExportOutcome> {
        let response = self
            .client
            .post(self.url("export"))
            .json(&json!({
                "series_ids": series_ids,
                "target_dir": target_dir,
            }))
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl StatsBackend for ApiClient {
    async fn modality_stats(&self) -> Result<Vec<ModalityStat>> {
        self.get_json("stats/modality", &[]).await
    }

    async fn date_stats(&self) -> Result<Vec<DateStat>> {
        self.get_json("stats/date", &[]).await
    }

    async fn total_series(&self) -> Result<u64> {
        let body: CountResponse = self.get_json("series/count", &[]).await?;
        Ok(body.total)
    }
}
