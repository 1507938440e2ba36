//! Reference-value enrichment for accepted detections.
//!
//! Given an accepted label, the client issues a single GET against the
//! reference endpoint (`base_url + normalized_label + "/"`) with a bounded
//! timeout and a browser-like User-Agent, then pulls one value field out of
//! the HTML body by a fixed selector.
//!
//! The lookup never raises: every outcome resolves to one of the four
//! `EnrichmentStatus` variants, each with a human-readable value that can go
//! straight to the rendering sink. No retries are performed — a coin that
//! stays in view reappears next frame, which gives a natural retry cadence.
//! A session cache keyed by normalized label short-circuits repeat lookups;
//! entries never expire within a session.

use std::collections::HashMap;
use std::time::Duration;

use scraper::{Html, Selector};

use crate::config::EnrichmentSettings;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

/// Selector contract with the reference source: the page carries the value in
/// this element.
const VALUE_SELECTOR: &str = "span.coin-value";

const NOT_FOUND_VALUE: &str = "Not found";
const TRANSIENT_ERROR_VALUE: &str = "Error during scraping";
const UNEXPECTED_ERROR_VALUE: &str = "Unexpected error";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnrichmentStatus {
    Found,
    NotFound,
    TransientError,
    UnexpectedError,
}

/// Outcome of one enrichment lookup. Always one of the four variants; the
/// value is displayable as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichmentResult {
    pub status: EnrichmentStatus,
    pub value: String,
}

impl EnrichmentResult {
    fn found(value: String) -> Self {
        Self {
            status: EnrichmentStatus::Found,
            value,
        }
    }

    fn not_found() -> Self {
        Self {
            status: EnrichmentStatus::NotFound,
            value: NOT_FOUND_VALUE.to_string(),
        }
    }

    fn transient_error() -> Self {
        Self {
            status: EnrichmentStatus::TransientError,
            value: TRANSIENT_ERROR_VALUE.to_string(),
        }
    }

    fn unexpected_error() -> Self {
        Self {
            status: EnrichmentStatus::UnexpectedError,
            value: UNEXPECTED_ERROR_VALUE.to_string(),
        }
    }
}

/// Transport-level failure modes, separated so the client can map them onto
/// the degraded-result variants.
#[derive(Debug)]
pub enum FetchError {
    /// Non-2xx response status.
    Status(u16),
    /// Timeout, connection failure, DNS failure.
    Transport(String),
    /// Body could not be decoded into text.
    Decode(String),
}

/// Page transport seam. The production implementation is `UreqFetcher`; tests
/// substitute canned pages and failures.
pub trait PageFetcher: Send {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// ureq-backed fetcher with a bounded per-request timeout.
pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl UreqFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl PageFetcher for UreqFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .agent
            .get(url)
            .set("User-Agent", BROWSER_USER_AGENT)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => FetchError::Status(code),
                ureq::Error::Transport(t) => FetchError::Transport(t.to_string()),
            })?;
        response
            .into_string()
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Enrichment client with a no-expiry session cache.
pub struct EnrichmentClient {
    base_url: String,
    fetcher: Box<dyn PageFetcher>,
    cache: HashMap<String, EnrichmentResult>,
    cache_hits: u64,
}

impl EnrichmentClient {
    pub fn new(settings: &EnrichmentSettings) -> Self {
        Self::with_fetcher(
            settings.base_url.clone(),
            Box::new(UreqFetcher::new(settings.request_timeout)),
        )
    }

    pub fn with_fetcher(base_url: String, fetcher: Box<dyn PageFetcher>) -> Self {
        Self {
            base_url,
            fetcher,
            cache: HashMap::new(),
            cache_hits: 0,
        }
    }

    /// Look up the reference value for a label. Never fails; degraded
    /// outcomes surface as `NotFound`/`TransientError`/`UnexpectedError`.
    pub fn lookup(&mut self, label: &str) -> EnrichmentResult {
        let key = normalize_key(label);
        if let Some(cached) = self.cache.get(&key) {
            self.cache_hits += 1;
            return cached.clone();
        }

        let url = format!("{}{}/", self.base_url, key);
        let result = match self.fetcher.fetch(&url) {
            Ok(body) => extract_value(&body),
            Err(FetchError::Status(code)) => {
                log::warn!("enrichment for '{}' got status {}", key, code);
                EnrichmentResult::transient_error()
            }
            Err(FetchError::Transport(reason)) => {
                log::warn!("enrichment for '{}' failed: {}", key, reason);
                EnrichmentResult::transient_error()
            }
            Err(FetchError::Decode(reason)) => {
                log::warn!("enrichment body for '{}' undecodable: {}", key, reason);
                EnrichmentResult::unexpected_error()
            }
        };

        self.cache.insert(key, result.clone());
        result
    }

    /// Lookups answered from the session cache.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }
}

/// Normalized query key: lower-case, spaces replaced by hyphens.
fn normalize_key(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "-")
}

fn extract_value(body: &str) -> EnrichmentResult {
    let selector = match Selector::parse(VALUE_SELECTOR) {
        Ok(selector) => selector,
        Err(_) => return EnrichmentResult::unexpected_error(),
    };
    let document = Html::parse_document(body);
    match document.select(&selector).next() {
        Some(element) => {
            let value = element.text().collect::<String>().trim().to_string();
            if value.is_empty() {
                EnrichmentResult::not_found()
            } else {
                EnrichmentResult::found(value)
            }
        }
        None => EnrichmentResult::not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    struct StaticPage(&'static str);

    impl PageFetcher for StaticPage {
        fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
    }

    struct FailWith(fn() -> FetchError);

    impl PageFetcher for FailWith {
        fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            Err((self.0)())
        }
    }

    struct CountingFetcher {
        calls: Arc<AtomicU64>,
        last_url: Arc<Mutex<String>>,
    }

    impl CountingFetcher {
        fn new() -> Self {
            Self {
                calls: Arc::new(AtomicU64::new(0)),
                last_url: Arc::new(Mutex::new(String::new())),
            }
        }
    }

    impl PageFetcher for CountingFetcher {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_url.lock().unwrap() = url.to_string();
            Ok(r#"<html><span class="coin-value">$1.20</span></html>"#.to_string())
        }
    }

    fn client(fetcher: impl PageFetcher + 'static) -> EnrichmentClient {
        EnrichmentClient::with_fetcher("https://coins.test/".to_string(), Box::new(fetcher))
    }

    #[test]
    fn present_field_resolves_found() {
        let page = r#"<html><body><span class="coin-value">$0.25</span></body></html>"#;
        let mut client = client(StaticPage(page));
        let result = client.lookup("Quarter");
        assert_eq!(result.status, EnrichmentStatus::Found);
        assert_eq!(result.value, "$0.25");
    }

    #[test]
    fn missing_field_resolves_not_found() {
        let mut client = client(StaticPage("<html><body><p>nothing here</p></body></html>"));
        let result = client.lookup("penny");
        assert_eq!(result.status, EnrichmentStatus::NotFound);
        assert_eq!(result.value, "Not found");
    }

    #[test]
    fn empty_field_resolves_not_found() {
        let mut client = client(StaticPage(r#"<span class="coin-value">  </span>"#));
        let result = client.lookup("penny");
        assert_eq!(result.status, EnrichmentStatus::NotFound);
    }

    #[test]
    fn non_2xx_resolves_transient_error() {
        let mut client = client(FailWith(|| FetchError::Status(503)));
        let result = client.lookup("penny");
        assert_eq!(result.status, EnrichmentStatus::TransientError);
        assert_eq!(result.value, "Error during scraping");
    }

    #[test]
    fn transport_failure_resolves_transient_error() {
        let mut client = client(FailWith(|| FetchError::Transport("timed out".into())));
        let result = client.lookup("penny");
        assert_eq!(result.status, EnrichmentStatus::TransientError);
        assert_eq!(result.value, "Error during scraping");
    }

    #[test]
    fn undecodable_body_resolves_unexpected_error() {
        let mut client = client(FailWith(|| FetchError::Decode("invalid utf-8".into())));
        let result = client.lookup("penny");
        assert_eq!(result.status, EnrichmentStatus::UnexpectedError);
        assert_eq!(result.value, "Unexpected error");
    }

    #[test]
    fn repeat_lookup_hits_cache_without_refetching() {
        let fetcher = CountingFetcher::new();
        let calls = fetcher.calls.clone();
        let mut client =
            EnrichmentClient::with_fetcher("https://coins.test/".to_string(), Box::new(fetcher));
        let first = client.lookup("penny");
        let second = client.lookup("penny");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.cache_hits(), 1);
    }

    #[test]
    fn query_key_is_normalized_into_url() {
        let fetcher = CountingFetcher::new();
        let last_url = fetcher.last_url.clone();
        let mut client =
            EnrichmentClient::with_fetcher("https://coins.test/".to_string(), Box::new(fetcher));
        client.lookup("Half Dollar");
        assert_eq!(*last_url.lock().unwrap(), "https://coins.test/half-dollar/");
    }

    #[test]
    fn degraded_results_are_cached_too() {
        let mut client = client(FailWith(|| FetchError::Status(500)));
        let first = client.lookup("penny");
        let second = client.lookup("penny");
        assert_eq!(first, second);
        assert_eq!(client.cache_hits(), 1);
    }
}
