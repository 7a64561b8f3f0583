//! End-to-end `harvest` pipeline: search API → PDFs, then HTML pages → PDFs.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use pdfharvest_discovery::{Fetcher, SearchQuery, extract_json_paths, extract_pdf_links};
use pdfharvest_downloader::{Downloader, ensure_output_dir};
use pdfharvest_shared::{
    Candidate, DownloadedFile, HarvestConfig, PhasePolicy, Result, RunId, SearchConfig,
};

use crate::candidates::{dedupe_preserving_order, resolve_all, resolve_candidate};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Which batch of candidates is being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Candidates returned by the vendor search API.
    SearchApi,
    /// Links scraped from HTML pages.
    ScrapedPages,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SearchApi => write!(f, "search-api"),
            Self::ScrapedPages => write!(f, "scraped-pages"),
        }
    }
}

/// Outcome of one download phase.
#[derive(Debug, Default)]
pub struct PhaseReport {
    /// Candidates after deduplication (if the policy dedupes).
    pub candidates: usize,
    /// Candidates filtered out before any request.
    pub skipped: usize,
    /// Candidates handed to the downloader.
    pub attempted: usize,
    /// Attempts skipped because the file was already on disk.
    pub already_present: usize,
    /// Attempts that failed for any other reason.
    pub failed: usize,
    /// Files written in this phase.
    pub downloaded: Vec<DownloadedFile>,
    /// Whether the phase stopped early at its download cap.
    pub cap_reached: bool,
}

/// Result of the `harvest` pipeline.
#[derive(Debug)]
pub struct HarvestReport {
    /// Identifier of this run.
    pub run_id: RunId,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Search API phase.
    pub search: PhaseReport,
    /// Scraped-page phase.
    pub pages: PhaseReport,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl HarvestReport {
    /// Files written across both phases.
    pub fn total_downloaded(&self) -> usize {
        self.search.downloaded.len() + self.pages.downloaded.len()
    }
}

/// Resolved candidates of both phases, without downloading anything.
#[derive(Debug, Default)]
pub struct CandidateListing {
    /// From the search API.
    pub search: Vec<Candidate>,
    /// From the scraped pages.
    pub pages: Vec<Candidate>,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once a phase knows how many candidates it has.
    fn candidates_found(&self, phase: Phase, count: usize);
    /// Called before each download attempt.
    fn download_started(&self, url: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &HarvestReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn candidates_found(&self, _phase: Phase, _count: usize) {}
    fn download_started(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &HarvestReport) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full harvest.
///
/// 1. Ensure the output directory exists
/// 2. Search API phase (deduped, capped)
/// 3. Scraped-page phase (no dedupe, no cap)
///
/// Per-item failures are logged and counted, never returned. Only failing to
/// build the HTTP clients is an error.
#[instrument(skip_all, fields(output_dir = %config.output_dir.display()))]
pub async fn harvest(
    config: &HarvestConfig,
    progress: &dyn ProgressReporter,
) -> Result<HarvestReport> {
    let start = Instant::now();
    let started_at = Utc::now();
    let run_id = RunId::new();

    info!(%run_id, %started_at, "starting harvest");

    progress.phase("Preparing output directory");
    if let Err(e) = ensure_output_dir(&config.output_dir) {
        warn!(error = %e, "could not create output directory");
    }

    let fetcher = Fetcher::new(&config.http)?;
    let downloader = Downloader::new(&config.output_dir, &config.http)?;

    let search = match &config.search {
        Some(search_config) => {
            progress.phase("Querying search API");
            run_search_phase(
                &fetcher,
                &downloader,
                search_config,
                &config.base_domain,
                &config.search_policy,
                progress,
            )
            .await
        }
        None => PhaseReport::default(),
    };

    let pages = if config.pages.is_empty() {
        PhaseReport::default()
    } else {
        progress.phase("Scanning pages");
        run_page_phase(
            &fetcher,
            &downloader,
            &config.pages,
            &config.base_domain,
            &config.page_policy,
            progress,
        )
        .await
    };

    let report = HarvestReport {
        run_id,
        started_at,
        search,
        pages,
        elapsed: start.elapsed(),
    };

    info!(
        run_id = %report.run_id,
        downloaded = report.total_downloaded(),
        search_failed = report.search.failed,
        pages_failed = report.pages.failed,
        duration_ms = report.elapsed.as_millis(),
        "harvest completed"
    );

    progress.done(&report);
    Ok(report)
}

/// Fetch the search API and download the PDFs it lists.
#[instrument(skip_all, fields(endpoint = %search.endpoint))]
pub async fn run_search_phase(
    fetcher: &Fetcher,
    downloader: &Downloader,
    search: &SearchConfig,
    base_domain: &str,
    policy: &PhasePolicy,
    progress: &dyn ProgressReporter,
) -> PhaseReport {
    let candidates = fetch_search_candidates(fetcher, search).await;
    run_download_phase(
        downloader,
        Phase::SearchApi,
        candidates,
        base_domain,
        policy,
        progress,
    )
    .await
}

/// Scan `pages` for PDF links and download them.
#[instrument(skip_all, fields(pages = pages.len()))]
pub async fn run_page_phase(
    fetcher: &Fetcher,
    downloader: &Downloader,
    pages: &[String],
    base_domain: &str,
    policy: &PhasePolicy,
    progress: &dyn ProgressReporter,
) -> PhaseReport {
    let links = collect_page_links(fetcher, pages).await;
    run_download_phase(
        downloader,
        Phase::ScrapedPages,
        links,
        base_domain,
        policy,
        progress,
    )
    .await
}

/// Query the search API and return the raw `path` values.
///
/// A bad endpoint, a failed request, or malformed JSON all yield an empty list.
pub async fn fetch_search_candidates(fetcher: &Fetcher, search: &SearchConfig) -> Vec<String> {
    let url = match SearchQuery::from(search).build() {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "cannot build search request");
            return Vec::new();
        }
    };

    match fetcher.fetch_text(url.as_str()).await {
        Ok(body) => {
            let paths = extract_json_paths(&body);
            info!(count = paths.len(), "search API returned candidates");
            paths
        }
        Err(e) => {
            warn!(error = %e, "search API request failed");
            Vec::new()
        }
    }
}

/// Fetch every page and collect its `href="...pdf"` links in order.
///
/// Pages that fail to load contribute nothing.
pub async fn collect_page_links(fetcher: &Fetcher, pages: &[String]) -> Vec<String> {
    let mut links = Vec::new();

    for page in pages {
        match fetcher.fetch_text(page).await {
            Ok(body) => {
                let found = extract_pdf_links(&body);
                info!(page = %page, count = found.len(), "fetched page");
                links.extend(found);
            }
            Err(e) => {
                warn!(page = %page, error = %e, "failed to fetch page");
            }
        }
    }

    links
}

/// Filter `candidates` under `policy` and download them one at a time.
///
/// With a `max_downloads` cap, iteration stops right after the success that
/// reaches it.
#[instrument(skip_all, fields(phase = %phase))]
pub async fn run_download_phase(
    downloader: &Downloader,
    phase: Phase,
    candidates: Vec<String>,
    base_domain: &str,
    policy: &PhasePolicy,
    progress: &dyn ProgressReporter,
) -> PhaseReport {
    let candidates = if policy.dedupe {
        dedupe_preserving_order(candidates)
    } else {
        candidates
    };

    let total = candidates.len();
    let mut report = PhaseReport {
        candidates: total,
        ..PhaseReport::default()
    };
    progress.candidates_found(phase, total);

    if policy.max_downloads == Some(0) {
        report.cap_reached = true;
        return report;
    }

    for (i, raw) in candidates.iter().enumerate() {
        let Some(candidate) = resolve_candidate(raw, base_domain, policy) else {
            report.skipped += 1;
            continue;
        };

        report.attempted += 1;
        progress.download_started(candidate.url.as_str(), i + 1, total);

        match downloader.download(&candidate).await {
            Ok(file) => report.downloaded.push(file),
            Err(e) if e.is_already_exists() => {
                debug!(url = %candidate.url, "already downloaded");
                report.already_present += 1;
            }
            Err(e) => {
                warn!(url = %candidate.url, error = %e, "download failed");
                report.failed += 1;
            }
        }

        if let Some(cap) = policy.max_downloads {
            if report.downloaded.len() >= cap {
                info!(cap, "reached the maximum download limit, stopping phase");
                report.cap_reached = true;
                break;
            }
        }
    }

    info!(
        candidates = report.candidates,
        downloaded = report.downloaded.len(),
        already_present = report.already_present,
        failed = report.failed,
        skipped = report.skipped,
        "phase completed"
    );

    report
}

/// Resolve the candidates of both phases without downloading.
#[instrument(skip_all)]
pub async fn list_candidates(config: &HarvestConfig) -> Result<CandidateListing> {
    let fetcher = Fetcher::new(&config.http)?;

    let search_raw = match &config.search {
        Some(search) => fetch_search_candidates(&fetcher, search).await,
        None => Vec::new(),
    };
    let page_raw = collect_page_links(&fetcher, &config.pages).await;

    Ok(CandidateListing {
        search: resolve_all(search_raw, &config.base_domain, &config.search_policy),
        pages: resolve_all(page_raw, &config.base_domain, &config.page_policy),
    })
}
