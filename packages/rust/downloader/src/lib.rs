//! PDF downloading and URL-to-filename normalization.
//!
//! This crate provides:
//! - [`naming`]: Deterministic, filesystem-safe filenames derived from URLs
//! - [`engine`]: The [`Downloader`], which writes each PDF to disk at most once

pub mod engine;
pub mod naming;

pub use engine::{Downloader, ensure_output_dir};
pub use naming::{base_name, file_extension, url_to_filename};
