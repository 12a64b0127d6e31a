//
// stats.rs
// Dicom-Catalog-rs
//
// Read-only modality/date aggregates for the dashboard, with zero-guarded percentage math.
//
// Thales Matheus Mendonça Santos - November 2025

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DateStat, ModalityStat};

#[async_trait]
pub trait StatsBackend: Send + Sync {
    async fn modality_stats(&self) -> Result<Vec<ModalityStat>>;
    async fn date_stats(&self) -> Result<Vec<DateStat>>;
    /// Unfiltered series count, used as the denominator for shares.
    async fn total_series(&self) -> Result<u64>;
}

/// One row of the modality breakdown table.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalityShare {
    pub modality: String,
    pub count: u64,
    /// Share of the overall total, 0.0–100.0. Zero when the total is zero.
    pub percent: f64,
}

/// A fetched dashboard snapshot.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub total: u64,
    pub modalities: Vec<ModalityShare>,
    pub dates: Vec<DateStat>,
}

/// Read-only aggregation for the dashboard.
pub struct StatsAggregator<B> {
    backend: B,
}

impl<B: StatsBackend> StatsAggregator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Fetch all three aggregates and derive percentages.
    pub async fn dashboard(&self) -> Result<Dashboard> {
        let (modalities, dates, total) = tokio::try_join!(
            self.backend.modality_stats(),
            self.backend.date_stats(),
            self.backend.total_series(),
        )?;

        let modalities = modalities
            .into_iter()
            .map(|stat| ModalityShare {
                modality: stat.modality.unwrap_or_else(|| "unknown".to_string()),
                count: stat.count,
                percent: percentage(stat.count, total),
            })
            .collect();

        Ok(Dashboard {
            total,
            modalities,
            dates,
        })
    }
}

/// `count / total` as a percentage, reporting 0% when the total is zero.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}
