//! Candidate link extraction from search API JSON and raw HTML.
//!
//! The extractors are total: bad input produces an empty list, never an error.
//! [`parse_search_response`] is the strict form for callers that want to know
//! why a response was rejected.

use pdfharvest_shared::{PdfHarvestError, Result};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::warn;

// ---------------------------------------------------------------------------
// Search API response shape
// ---------------------------------------------------------------------------

/// Only the fields we read from the search response.
#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: SearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResult {
    #[serde(default, rename = "webPages")]
    web_pages: Vec<WebPage>,
}

#[derive(Debug, Default, Deserialize)]
struct WebPage {
    #[serde(default)]
    path: String,
}

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Matches `href="<anything without quotes>.pdf"`.
static PDF_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+\.pdf)""#).expect("pdf href regex"));

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Parse a search API body into its `result.webPages[].path` values.
pub fn parse_search_response(json: &str) -> Result<Vec<String>> {
    let parsed: SearchResponse = serde_json::from_str(json)
        .map_err(|e| PdfHarvestError::parse(format!("search response: {e}")))?;

    Ok(parsed
        .result
        .web_pages
        .into_iter()
        .map(|page| page.path)
        .collect())
}

/// Collect every `result.webPages[].path` value in document order.
///
/// Malformed JSON is logged and yields an empty list.
pub fn extract_json_paths(json: &str) -> Vec<String> {
    parse_search_response(json).unwrap_or_else(|e| {
        warn!(error = %e, "failed to parse search response JSON");
        Vec::new()
    })
}

/// Collect the target of every `href="...pdf"` attribute in order of appearance.
pub fn extract_pdf_links(html: &str) -> Vec<String> {
    PDF_HREF_RE
        .captures_iter(html)
        .map(|caps| caps[1].to_string())
        .collect()
}
