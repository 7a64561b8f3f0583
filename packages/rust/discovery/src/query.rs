//! Search API request builder.

use pdfharvest_shared::{PdfHarvestError, Result, SearchConfig};
use url::Url;

/// Builds the vendor search URL from a document type, a set of content
/// types and a result count.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    endpoint: String,
    doc_type: Option<String>,
    content_types: Vec<String>,
    count: Option<u32>,
}

impl SearchQuery {
    /// Start a query against `endpoint` with no parameters.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            doc_type: None,
            content_types: Vec::new(),
            count: None,
        }
    }

    /// Set the `type` parameter.
    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// Add a content type to the OR-ed filter expression.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_types.push(content_type.into());
        self
    }

    /// Set the `count` parameter.
    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// The `q` expression, e.g. `[search.contentType: "A" || "B"]`.
    fn filter_expression(&self) -> Option<String> {
        if self.content_types.is_empty() {
            return None;
        }
        let terms: Vec<String> = self
            .content_types
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect();
        Some(format!("[search.contentType: {}]", terms.join(" || ")))
    }

    /// Render the final request URL.
    pub fn build(&self) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            PdfHarvestError::config(format!("invalid search endpoint '{}': {e}", self.endpoint))
        })?;

        {
            let mut pairs = url.query_pairs_mut();
            if let Some(doc_type) = &self.doc_type {
                pairs.append_pair("type", doc_type);
            }
            if let Some(q) = self.filter_expression() {
                pairs.append_pair("q", &q);
            }
            if let Some(count) = self.count {
                pairs.append_pair("count", &count.to_string());
            }
        }

        Ok(url)
    }
}

impl From<&SearchConfig> for SearchQuery {
    fn from(config: &SearchConfig) -> Self {
        let query = SearchQuery::new(&config.endpoint)
            .doc_type(&config.doc_type)
            .count(config.count);
        config
            .content_types
            .iter()
            .fold(query, |q, t| q.content_type(t))
    }
}
