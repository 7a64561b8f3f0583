//! Harvest orchestration for pdfharvest.
//!
//! This crate ties together candidate discovery and downloading into the
//! end-to-end `harvest` workflow: search API phase, then scraped-page phase.

pub mod candidates;
pub mod pipeline;
