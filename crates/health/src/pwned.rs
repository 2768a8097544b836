//! Pwned Passwords range API client and response parsing.
//!
//! Lookups are k-anonymous: only the first five characters of the SHA-1
//! hex ever go on the wire. `Add-Padding` asks the service to pad
//! responses so body sizes leak nothing either.

use std::{collections::HashMap, time::Duration};

use tracing::warn;

const RANGE_URL: &str = "https://api.pwnedpasswords.com/range";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
const USER_AGENT: &str = "ToolboxPassword/1.0";

#[derive(Debug, thiserror::Error)]
pub(crate) enum PwnedFetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error("empty response body")]
    EmptyBody,

    #[error("response body exceeds {MAX_BODY_BYTES} bytes")]
    BodyTooLarge,
}

pub(crate) struct PwnedClient {
    http: reqwest::Client,
}

impl PwnedClient {
    pub(crate) fn new() -> Result<Self, reqwest::Error> {
        // The range endpoint is a single fixed HTTPS host; refusing
        // redirects outright rules out any downgrade hop.
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { http })
    }

    /// Fetch the suffix list for a 5-character uppercase hex prefix.
    pub(crate) async fn fetch_range(&self, prefix: &str) -> Result<Vec<u8>, PwnedFetchError> {
        let response = self
            .http
            .get(format!("{RANGE_URL}/{prefix}"))
            .header("Add-Padding", "true")
            .header(reqwest::header::ACCEPT, "text/plain")
            .send()
            .await?;

        // Only a 2xx body is usable (or cacheable); with redirects
        // disabled a 3xx lands here too and is rejected the same way.
        if !response.status().is_success() {
            return Err(PwnedFetchError::UnexpectedStatus(response.status()));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(PwnedFetchError::EmptyBody);
        }
        if body.len() > MAX_BODY_BYTES {
            warn!(prefix, len = body.len(), "oversized range response dropped");
            return Err(PwnedFetchError::BodyTooLarge);
        }

        Ok(body.to_vec())
    }
}

/// Parse `SUFFIX:COUNT` lines into a suffix → count map. Malformed lines
/// are skipped; padding entries arrive with count 0 and are kept as such.
pub(crate) fn parse_range_body(body: &[u8]) -> HashMap<String, i64> {
    let text = String::from_utf8_lossy(body);
    let mut counts = HashMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((suffix, count)) = line.split_once(':') else {
            continue;
        };
        let suffix = suffix.trim().to_uppercase();
        if suffix.is_empty() {
            continue;
        }
        let Ok(count) = count.trim().parse::<i64>() else {
            continue;
        };
        counts.insert(suffix, count);
    }

    counts
}
