//
// error.rs
// Dicom-Catalog-rs
//
// Error taxonomy for client operations: local input rejection, service-side failures, and transport errors.
//
// Thales Matheus Mendonça Santos - November 2025

use thiserror::Error;

/// Failure surface of every client operation.
///
/// `InvalidInput` is raised before any request leaves the process; the other
/// variants wrap a single failed request. Stale responses are not errors and
/// never appear here (they are discarded silently by the catalog browser).
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Rejected locally: empty required field, empty selection, negative
    /// threshold. No request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Service { status: u16, message: String },

    /// The request never completed (connect, timeout, decode).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl CatalogError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True when no request was sent for this failure.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
