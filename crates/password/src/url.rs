//! Host extraction and normalization for site matching.
//!
//! Import deduplication and favicon lookups key on the normalized host:
//! lowercase, leading `www.` stripped. Bare inputs like `example.com/login`
//! are retried with an `https://` prefix so exported CSVs without schemes
//! still resolve.

use url::Url;

/// Lowercase a host and strip a leading `www.`.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// Extract the normalized host from a URL-ish string, if it has one.
pub fn host_from_url(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = Url::parse(trimmed).ok().or_else(|| {
        if trimmed.contains('.') && !trimmed.contains("://") {
            Url::parse(&format!("https://{trimmed}")).ok()
        } else {
            None
        }
    })?;

    let host = normalize_host(parsed.host_str()?);
    if host.is_empty() { None } else { Some(host) }
}

/// Whether two host strings refer to the same site after normalization.
pub fn hosts_equal(a: &str, b: &str) -> bool {
    normalize_host(a) == normalize_host(b)
}
