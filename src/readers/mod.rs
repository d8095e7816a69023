//! This module declares all readers.
//! A reader is used to fetch the page of an identifier over the network.
//! The objective is to hide the transport, so the workers only have to
//! know whether they got a page, got blocked, or failed.

pub mod http;

use std::sync::LazyLock;

use log::trace;
use regex::Regex;

use crate::errors::FetchError;

static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(?P<title>.*?)</title>").expect("Invalid title regex")
});

/// A page as returned by the publisher, before classification.
#[derive(Clone, Debug)]
pub struct FetchedPage {
    /// The HTTP status code.
    pub status: u16,
    /// The body, untouched.
    pub body: String,
}

/// The result of fetching one page.
/// The worker loop matches on it, a block is never raised as an error.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page has been fetched.
    Fetched(String),
    /// The publisher refuses to serve us anymore.
    RateLimited(String),
    /// Any other failure. The item is abandoned for this run.
    Failed(FetchError),
}

/// A common interface between all readers.
/// A reader is shared by all the workers of a pool.
pub trait PageFetcher: Send + Sync {
    /// Fetches one page and classifies the response.
    fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Tells whether a response means the publisher blocked us.
///
/// What marks a block is publisher-specific, so the rule is configuration:
/// a list of HTTP status codes and a list of substrings searched in the
/// page `<title>`.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockRule {
    /// Status codes meaning we are blocked.
    pub statuses: Vec<u16>,
    /// Substrings which, found in the title, mean we are blocked.
    pub title_markers: Vec<String>,
}

impl Default for BlockRule {
    /// By default only "429 Too Many Requests" is a block.
    fn default() -> Self {
        BlockRule {
            statuses: vec![429],
            title_markers: Vec::new(),
        }
    }
}

impl BlockRule {
    /// Adds a title marker to the rule.
    pub fn with_title_marker(mut self, marker: &str) -> Self {
        self.title_markers.push(marker.to_string());
        self
    }

    /// Classifies a fetched page.
    pub fn classify(&self, page: FetchedPage) -> FetchOutcome {
        trace!("Running BlockRule::classify()");
        if self.statuses.contains(&page.status) {
            return FetchOutcome::RateLimited(format!("HTTP status {}", page.status));
        }

        if !self.title_markers.is_empty() {
            if let Some(title) = page_title(&page.body) {
                if let Some(marker) = self.title_markers.iter().find(|m| title.contains(*m)) {
                    return FetchOutcome::RateLimited(format!(
                        "page title \"{}\" contains \"{}\"",
                        title, marker
                    ));
                }
            }
        }

        if !(200..300).contains(&page.status) {
            return FetchOutcome::Failed(FetchError::Status(page.status));
        }
        FetchOutcome::Fetched(page.body)
    }
}

/// Extracts the content of the `<title>` tag of a HTML page.
pub fn page_title(body: &str) -> Option<String> {
    TITLE_REGEX
        .captures(body)
        .map(|caps| caps["title"].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(status: u16, body: &str) -> FetchedPage {
        FetchedPage {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn title_is_extracted() {
        let body = "<html><head><TITLE>\n  Access Denied \n</TITLE></head></html>";
        assert_eq!(Some("Access Denied".to_string()), page_title(body));
        assert_eq!(None, page_title("<html><body>no title</body></html>"));
    }

    #[test]
    fn blocked_title_is_rate_limited() {
        let rule = BlockRule::default().with_title_marker("Access Denied");
        let outcome = rule.classify(page(200, "<title>Access Denied</title>"));
        assert!(matches!(outcome, FetchOutcome::RateLimited(_)));
    }

    #[test]
    fn blocked_status_is_rate_limited() {
        let rule = BlockRule::default();
        let outcome = rule.classify(page(429, "slow down"));
        assert!(matches!(outcome, FetchOutcome::RateLimited(_)));
    }

    #[test]
    fn other_errors_are_failures() {
        let rule = BlockRule::default().with_title_marker("Access Denied");
        let outcome = rule.classify(page(404, "<title>Not Found</title>"));
        assert!(matches!(outcome, FetchOutcome::Failed(FetchError::Status(404))));
    }

    #[test]
    fn normal_page_is_fetched() {
        let rule = BlockRule::default().with_title_marker("Access Denied");
        let body = "<title>CVE-2024-0001 | X-Force</title><p>ok</p>";
        match rule.classify(page(200, body)) {
            FetchOutcome::Fetched(b) => assert_eq!(body, b),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn markers_are_ignored_without_title() {
        let rule = BlockRule::default().with_title_marker("Access Denied");
        let outcome = rule.classify(page(200, "<p>Access Denied is discussed here</p>"));
        assert!(matches!(outcome, FetchOutcome::Fetched(_)));
    }
}
