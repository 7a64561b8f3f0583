//! URL → local filename normalization.
//!
//! The stem keeps only `[a-z0-9_]`; the original extension is re-attached
//! verbatim. The `_pdf`/`_zip` removal is substring based, so a stem such as
//! `the_pdfs_guide` loses its `_pdf` too.

use regex::Regex;
use std::sync::LazyLock;

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("non-alphanumeric regex"));

static UNDERSCORES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("underscore run regex"));

/// Substrings stripped from the stem, in this order.
const STRIPPED_SUBSTRINGS: [&str; 2] = ["_pdf", "_zip"];

/// Extension of the last path segment, including the dot. Empty if none.
pub fn file_extension(path: &str) -> &str {
    let segment_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[segment_start..].rfind('.') {
        Some(dot) => &path[segment_start + dot..],
        None => "",
    }
}

/// Last path segment, ignoring trailing slashes.
///
/// An empty input yields `"."` and an all-slash input yields `"/"`.
pub fn base_name(path: &str) -> &str {
    if path.is_empty() {
        return ".";
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}

/// Derive a safe, lowercase filename from a URL.
pub fn url_to_filename(raw_url: &str) -> String {
    let lower = raw_url.to_lowercase();
    let extension = file_extension(&lower);

    let safe = NON_ALNUM_RE.replace_all(base_name(&lower), "_");
    let safe = UNDERSCORES_RE.replace_all(&safe, "_");
    let safe = safe.strip_prefix('_').unwrap_or(&safe);

    let stem = STRIPPED_SUBSTRINGS
        .iter()
        .fold(safe.to_string(), |acc, s| acc.replace(s, ""));

    format!("{stem}{extension}")
}
