//! Candidate discovery: search API queries, page fetching, and link extraction.
//!
//! pdfharvest finds documents in two places: the vendor's search API, which
//! returns JSON records carrying a `path`, and public HTML pages, which are
//! scanned for `href="...pdf"` anchors. This crate fetches both and turns the
//! responses into ordered lists of candidate links.

mod parser;
mod query;

use std::time::Duration;

use pdfharvest_shared::{HttpConfig, MAX_REDIRECTS, PdfHarvestError, Result};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

pub use parser::{extract_json_paths, extract_pdf_links, parse_search_response};
pub use query::SearchQuery;

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Text fetcher for the search API and HTML pages.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher using the page timeout from `http`.
    pub fn new(http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&http.user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(http.page_timeout_secs))
            .build()
            .map_err(|e| PdfHarvestError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// GET `url` and return the body as text.
    ///
    /// Anything other than 200 OK is an error. No retries.
    #[instrument(skip(self))]
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PdfHarvestError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PdfHarvestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| PdfHarvestError::Network(format!("{url}: failed to read body: {e}")))?;

        debug!(bytes = body.len(), "fetched");
        Ok(body)
    }
}
