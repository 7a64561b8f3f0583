//! Core domain types for pdfharvest runs.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Successful downloads after which the search API phase stops.
pub const SEARCH_DOWNLOAD_CAP: usize = 10;

/// Redirects followed by every HTTP client before giving up.
pub const MAX_REDIRECTS: usize = 10;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one harvest run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PhasePolicy
// ---------------------------------------------------------------------------

/// How a batch of candidate links is filtered and bounded.
///
/// The search API phase and the scraped-page phase use different policies;
/// neither affects the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePolicy {
    /// Stop after this many successful downloads. `None` means no cap.
    pub max_downloads: Option<usize>,
    /// Drop exact duplicate candidates, keeping first-seen order.
    pub dedupe: bool,
    /// Skip candidates whose extension is not exactly `.pdf`.
    pub require_pdf_extension: bool,
    /// Prepend the base domain to candidates without a host.
    pub resolve_relative: bool,
}

impl PhasePolicy {
    /// Policy for candidates returned by the search API.
    pub fn search_api() -> Self {
        Self {
            max_downloads: Some(SEARCH_DOWNLOAD_CAP),
            dedupe: true,
            require_pdf_extension: true,
            resolve_relative: false,
        }
    }

    /// Policy for links scraped from HTML pages.
    pub fn scraped_pages() -> Self {
        Self {
            max_downloads: None,
            dedupe: false,
            require_pdf_extension: false,
            resolve_relative: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A link accepted for download.
///
/// Local filenames derive from `source`, the link as discovered, so they do
/// not depend on how `url` re-serializes spaces or non-ASCII characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Trimmed link text, with the base domain prepended if it had no host.
    pub source: String,
    /// Parsed form used for the request.
    pub url: Url,
}

impl Candidate {
    /// Pair `source` with an already resolved `url`.
    pub fn new(source: impl Into<String>, url: Url) -> Self {
        Self {
            source: source.into(),
            url,
        }
    }

    /// Parse `source` as an absolute URL. `None` if it does not parse.
    pub fn parse(source: &str) -> Option<Self> {
        Url::parse(source).ok().map(|url| Self::new(source, url))
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

// ---------------------------------------------------------------------------
// DownloadedFile
// ---------------------------------------------------------------------------

/// A PDF written to disk during this run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadedFile {
    /// Source URL.
    pub url: Url,
    /// Destination path.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes: u64,
    /// SHA-256 of the written bytes, hex encoded.
    pub sha256: String,
    /// When the response was received.
    pub fetched_at: DateTime<Utc>,
}
