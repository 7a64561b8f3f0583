//! Application configuration for pdfharvest.
//!
//! User config lives at `~/.pdfharvest/pdfharvest.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PdfHarvestError, Result};
use crate::types::PhasePolicy;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pdfharvest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pdfharvest";

// ---------------------------------------------------------------------------
// Config structs (matching pdfharvest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Vendor search API request.
    #[serde(default)]
    pub search: SearchConfig,

    /// HTML pages scanned for PDF links.
    #[serde(default)]
    pub scrape: ScrapeConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory downloaded PDFs are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "PDFs".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for search API and HTML page fetches.
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,

    /// Timeout for PDF downloads.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            page_timeout_secs: default_page_timeout(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

fn default_user_agent() -> String {
    concat!("pdfharvest/", env!("CARGO_PKG_VERSION")).into()
}
fn default_page_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    180
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search API endpoint, without query string.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Value of the `type` query parameter.
    #[serde(default = "default_doc_type")]
    pub doc_type: String,

    /// Content types OR-ed together in the `q` expression.
    #[serde(default = "default_content_types")]
    pub content_types: Vec<String>,

    /// Maximum number of results requested.
    #[serde(default = "default_count")]
    pub count: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            doc_type: default_doc_type(),
            content_types: default_content_types(),
            count: default_count(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://www.haascnc.com/bin/haascnc/search.json".into()
}
fn default_doc_type() -> String {
    "diy".into()
}
fn default_content_types() -> Vec<String> {
    vec!["Instruction Manual".into(), "Reference".into()]
}
fn default_count() -> u32 {
    5000
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Prepended to scraped links that have no host.
    #[serde(default = "default_base_domain")]
    pub base_domain: String,

    /// HTML pages scanned for `href="...pdf"` anchors.
    #[serde(default = "default_pages")]
    pub pages: Vec<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_domain: default_base_domain(),
            pages: default_pages(),
        }
    }
}

fn default_base_domain() -> String {
    "https://www.haascnc.com".into()
}
fn default_pages() -> Vec<String> {
    vec!["https://www.haascnc.com/owners/Service/operators-manual.html".into()]
}

// ---------------------------------------------------------------------------
// Harvest config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime harvest configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Where PDFs are written.
    pub output_dir: PathBuf,
    /// HTTP client settings.
    pub http: HttpConfig,
    /// Search API request. `None` skips the API phase.
    pub search: Option<SearchConfig>,
    /// Base domain for host-less links.
    pub base_domain: String,
    /// HTML pages to scan. Empty skips the page phase.
    pub pages: Vec<String>,
    /// Policy for candidates from the search API.
    pub search_policy: PhasePolicy,
    /// Policy for links scraped from HTML pages.
    pub page_policy: PhasePolicy,
}

impl From<&AppConfig> for HarvestConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.defaults.output_dir),
            http: config.http.clone(),
            search: Some(config.search.clone()),
            base_domain: config.scrape.base_domain.clone(),
            pages: config.scrape.pages.clone(),
            search_policy: PhasePolicy::search_api(),
            page_policy: PhasePolicy::scraped_pages(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pdfharvest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PdfHarvestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pdfharvest/pdfharvest.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PdfHarvestError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PdfHarvestError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PdfHarvestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PdfHarvestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PdfHarvestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
