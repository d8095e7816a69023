//! Fetch pages over HTTP(S)
//!
//! The [`HttpFetcher`] sends blocking requests, one per call, so it can be
//! shared by the workers of a pool. A session obtained by a manual login
//! can be reused by passing its cookie as an extra header.

use std::thread;
use std::time::Duration;

use log::{debug, error, trace};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::{BlockRule, FetchOutcome, FetchedPage, PageFetcher};
use crate::errors::{FetchError, StartupError};

/// The user agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("cvefold/", env!("CARGO_PKG_VERSION"));

/// A reader fetching pages with a blocking HTTP client.
pub struct HttpFetcher {
    /// The client, shared between the workers.
    client: Client,
    /// The rule deciding whether a response means we're blocked.
    block_rule: BlockRule,
    /// Time to wait after each request, to be polite with the publisher.
    delay: Duration,
}

impl HttpFetcher {
    /// Creates a new HttpFetcher.
    ///
    /// Headers are given as `Name: value` strings.
    pub fn new(
        block_rule: BlockRule,
        headers: &[String],
        timeout: Duration,
        delay: Duration,
    ) -> Result<Self, StartupError> {
        trace!("Running HttpFetcher::new()");
        let mut default_headers = HeaderMap::new();
        for header in headers {
            let (name, value) = parse_header(header)?;
            default_headers.insert(name, value);
        }

        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(default_headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| StartupError::HttpClient(e.to_string()))?;

        Ok(HttpFetcher {
            client,
            block_rule,
            delay,
        })
    }

    /// Sends one HTTP request and reads the response.
    fn http_request(&self, url: &str) -> Result<FetchedPage, FetchError> {
        debug!("Sending HTTP request for URL {}", url);
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/json")
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| FetchError::Body(e.to_string()))?;
        trace!("Got status {} and {} bytes for {}", status, body.len(), url);
        Ok(FetchedPage { status, body })
    }
}

impl PageFetcher for HttpFetcher {
    /// Fetches the page and classifies it with the block rule.
    fn fetch(&self, url: &str) -> FetchOutcome {
        trace!("Running HttpFetcher::fetch()");
        let result = self.http_request(url);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        match result {
            Ok(page) => self.block_rule.classify(page),
            Err(e) => {
                error!("Error while fetching {}: {}", url, e);
                FetchOutcome::Failed(e)
            }
        }
    }
}

/// Parses a `Name: value` header given on the command line.
fn parse_header(header: &str) -> Result<(HeaderName, HeaderValue), StartupError> {
    let invalid = || StartupError::InvalidHeader(header.to_string());
    let (name, value) = header.split_once(':').ok_or_else(invalid)?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_parsed() {
        let (name, value) = parse_header("Cookie: session=abc; lang=en").unwrap();
        assert_eq!("cookie", name.as_str());
        assert_eq!("session=abc; lang=en", value.to_str().unwrap());
    }

    #[test]
    fn invalid_headers_are_refused() {
        assert!(matches!(
            parse_header("no separator"),
            Err(StartupError::InvalidHeader(_))
        ));
        assert!(matches!(
            parse_header("bad name: value"),
            Err(StartupError::InvalidHeader(_))
        ));
    }

    #[test]
    fn fetcher_is_built_with_headers() {
        let fetcher = HttpFetcher::new(
            BlockRule::default(),
            &["X-Test: 1".to_string()],
            Duration::from_secs(5),
            Duration::ZERO,
        );
        assert!(fetcher.is_ok());
    }
}
