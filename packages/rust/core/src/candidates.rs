//! Candidate link filtering: dedupe, trim, extension check, host resolution.

use std::collections::HashSet;

use pdfharvest_downloader::file_extension;
use pdfharvest_shared::{Candidate, PhasePolicy};
use tracing::debug;
use url::Url;

/// Remove exact duplicates, keeping the first occurrence of each.
pub fn dedupe_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// True if `raw` parses as an absolute URL with a host.
pub fn has_host(raw: &str) -> bool {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| !h.is_empty()))
        .unwrap_or(false)
}

/// Resolve a host-less link against `base_domain`.
///
/// `"/docs/x.pdf"` with `"https://example.com"` becomes
/// `https://example.com/docs/x.pdf`.
pub fn join_base(base_domain: &str, link: &str) -> Option<Url> {
    Url::parse(base_domain).ok()?.join(link).ok()
}

/// Turn one raw link into a download target under `policy`.
///
/// Returns `None` when the link is filtered out. A host-less link keeps
/// `base_domain` prepended as its source text.
pub fn resolve_candidate(
    raw: &str,
    base_domain: &str,
    policy: &PhasePolicy,
) -> Option<Candidate> {
    let trimmed = raw.trim();

    if policy.require_pdf_extension && file_extension(trimmed) != ".pdf" {
        debug!(candidate = trimmed, "not a .pdf link, skipping");
        return None;
    }

    let resolved = if policy.resolve_relative && !has_host(trimmed) {
        join_base(base_domain, trimmed)
            .map(|url| Candidate::new(format!("{base_domain}{trimmed}"), url))
    } else {
        Candidate::parse(trimmed)
    };

    if resolved.is_none() {
        debug!(candidate = trimmed, "not a valid URL, skipping");
    }
    resolved
}

/// Apply `policy` to a whole batch without any download cap.
pub fn resolve_all(
    candidates: Vec<String>,
    base_domain: &str,
    policy: &PhasePolicy,
) -> Vec<Candidate> {
    let candidates = if policy.dedupe {
        dedupe_preserving_order(candidates)
    } else {
        candidates
    };
    candidates
        .iter()
        .filter_map(|c| resolve_candidate(c, base_domain, policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let input = strings(&["a.pdf", "b.pdf", "a.pdf"]);
        assert_eq!(dedupe_preserving_order(input), strings(&["a.pdf", "b.pdf"]));
    }

    #[test]
    fn dedupe_is_exact_match_only() {
        let input = strings(&["a.pdf", " a.pdf", "A.pdf", "a.pdf"]);
        assert_eq!(
            dedupe_preserving_order(input),
            strings(&["a.pdf", " a.pdf", "A.pdf"])
        );
    }

    #[test]
    fn host_detection() {
        assert!(has_host("https://example.com/a.pdf"));
        assert!(!has_host("/docs/x.pdf"));
        assert!(!has_host("docs/x.pdf"));
        assert!(!has_host("mailto:someone@example.com"));
    }

    #[test]
    fn relative_link_joins_base_domain() {
        let url = join_base("https://example.com", "/docs/x.pdf").unwrap();
        assert_eq!(url.as_str(), "https://example.com/docs/x.pdf");
    }

    #[test]
    fn scraped_policy_resolves_relative_links() {
        let policy = PhasePolicy::scraped_pages();
        let relative =
            resolve_candidate("  /docs/x.pdf \n", "https://example.com", &policy).unwrap();
        assert_eq!(relative.url.as_str(), "https://example.com/docs/x.pdf");
        assert_eq!(relative.source, "https://example.com/docs/x.pdf");

        let absolute =
            resolve_candidate("https://cdn.other.com/y.pdf", "https://example.com", &policy)
                .unwrap();
        assert_eq!(absolute.url.host_str(), Some("cdn.other.com"));
    }

    #[test]
    fn source_keeps_unencoded_text() {
        let policy = PhasePolicy::scraped_pages();
        let candidate =
            resolve_candidate("/docs/Mill Manual.pdf", "https://example.com", &policy).unwrap();
        assert_eq!(candidate.source, "https://example.com/docs/Mill Manual.pdf");
        assert_eq!(candidate.url.path(), "/docs/Mill%20Manual.pdf");

        let search = PhasePolicy::search_api();
        let candidate =
            resolve_candidate(" https://x.com/Mill Manual.pdf ", "https://x.com", &search).unwrap();
        assert_eq!(candidate.source, "https://x.com/Mill Manual.pdf");
    }

    #[test]
    fn search_policy_requires_pdf_extension() {
        let policy = PhasePolicy::search_api();
        let base = "https://example.com";
        assert!(resolve_candidate("https://x.com/a.pdf", base, &policy).is_some());
        assert!(resolve_candidate(" https://x.com/a.pdf ", base, &policy).is_some());
        assert!(resolve_candidate("https://x.com/a.PDF", base, &policy).is_none());
        assert!(resolve_candidate("https://x.com/page.html", base, &policy).is_none());
        assert!(resolve_candidate("https://x.com/a.pdf?dl=1", base, &policy).is_none());
    }

    #[test]
    fn search_policy_does_not_resolve_relative() {
        let policy = PhasePolicy::search_api();
        assert!(resolve_candidate("/docs/x.pdf", "https://example.com", &policy).is_none());
    }

    #[test]
    fn resolve_all_applies_dedupe_per_policy() {
        let input = strings(&[
            "https://x.com/a.pdf",
            "https://x.com/a.pdf",
            "https://x.com/b.txt",
        ]);
        let search = resolve_all(input.clone(), "https://x.com", &PhasePolicy::search_api());
        assert_eq!(search.len(), 1);

        let pages = resolve_all(input, "https://x.com", &PhasePolicy::scraped_pages());
        assert_eq!(pages.len(), 3);
    }
}
