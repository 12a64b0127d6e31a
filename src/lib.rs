//
// lib.rs
// Dicom-Catalog-rs
//
// Exposes the crate's modules and re-exports the CLI entry point for both binary and library consumers.
//
// Thales Matheus Mendonça Santos - November 2025

// Public surface of the library: each module mirrors a component of the
// catalog client or a shared utility.
pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod models;
pub mod query;
pub mod rules;
pub mod selection;
pub mod stats;

pub use cli::{run as run_cli, Cli, Commands};
pub use error::CatalogError;
