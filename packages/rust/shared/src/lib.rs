//! Shared types, error model, and configuration for pdfharvest.
//!
//! This crate is the foundation depended on by all other pdfharvest crates.
//! It provides:
//! - [`PdfHarvestError`]: the unified error type
//! - Domain types ([`Candidate`], [`DownloadedFile`], [`PhasePolicy`], [`RunId`])
//! - Configuration ([`AppConfig`], [`HarvestConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, HarvestConfig, HttpConfig, ScrapeConfig, SearchConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{PdfHarvestError, Result};
pub use types::{Candidate, DownloadedFile, PhasePolicy, MAX_REDIRECTS, RunId, SEARCH_DOWNLOAD_CAP};
