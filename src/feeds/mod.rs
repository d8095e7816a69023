//! Reading the NVD JSON 1.1 yearly feeds.
//!
//! A feed is the list of every CVE published for a year. It is used twice:
//! to know which pages to collect for each publisher, and as the NVD
//! artifacts themselves during the aggregation.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde_json::Value;

use crate::errors::FeedParseError;
use crate::extractors::nvd::NvdExtractor;
use crate::models::{CollectorProfile, Identifier, RawArtifact, WorkItem};

/// The key of the array holding the entries of a feed.
pub const ENTRIES_KEY: &str = "CVE_Items";

/// The path of the feed of a year.
pub fn feed_path(feed_dir: &Path, year: &str) -> PathBuf {
    feed_dir.join(format!("nvdcve-1.1-{}.json", year))
}

/// The entries of a NVD feed.
#[derive(Debug)]
pub struct NvdFeed {
    entries: Vec<Value>,
}

/// The identifiers of a feed, mapped to the URL of their page.
#[derive(Debug, Default)]
pub struct ResolvedFeed {
    /// Identifier to URL, in feed order.
    pub urls: IndexMap<Identifier, String>,
    /// The number of entries skipped because they had no identifier.
    pub skipped: usize,
}

impl ResolvedFeed {
    /// Turns the mapping into work items, in feed order.
    pub fn into_work_items(self) -> Vec<WorkItem> {
        self.urls
            .into_iter()
            .map(|(identifier, url)| WorkItem { identifier, url })
            .collect()
    }
}

impl NvdFeed {
    /// Reads the feed file.
    pub fn load(path: &Path) -> Result<Self, FeedParseError> {
        trace!("Running NvdFeed::load()");
        let content = fs::read_to_string(path).map_err(|source| FeedParseError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parses the content of a feed.
    pub fn parse(content: &str) -> Result<Self, FeedParseError> {
        let mut document: Value = serde_json::from_str(content)?;
        match document.get_mut(ENTRIES_KEY).map(Value::take) {
            Some(Value::Array(entries)) => {
                debug!("The feed has {} entries", entries.len());
                Ok(NvdFeed { entries })
            }
            _ => Err(FeedParseError::MissingEntries(ENTRIES_KEY)),
        }
    }

    /// The number of entries in the feed, valid or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maps every identifier of the feed to its page URL.
    /// Entries without a usable identifier are skipped and counted.
    /// A repeated identifier keeps its first position.
    pub fn resolve(&self, profile: &CollectorProfile, year: &str) -> ResolvedFeed {
        trace!("Running NvdFeed::resolve()");
        let mut resolved = ResolvedFeed::default();
        for (index, entry) in self.entries.iter().enumerate() {
            let identifier = match NvdExtractor::entry_id(entry).and_then(Identifier::new) {
                Some(i) => i,
                None => {
                    warn!("Feed entry #{} has no usable identifier, skipped", index);
                    resolved.skipped += 1;
                    continue;
                }
            };
            if resolved.urls.contains_key(&identifier) {
                debug!("{} is listed twice in the feed", identifier);
                continue;
            }
            let url = profile.url_for(&identifier, year);
            resolved.urls.insert(identifier, url);
        }
        resolved
    }

    /// The entries of the feed as NVD artifacts.
    /// Entries without identifier are skipped, and their number returned.
    pub fn artifacts(&self) -> (Vec<RawArtifact>, usize) {
        let mut skipped = 0;
        let mut artifacts = Vec::new();
        for entry in &self.entries {
            match NvdExtractor::entry_id(entry).and_then(Identifier::new) {
                Some(identifier) => artifacts.push(RawArtifact {
                    identifier,
                    content: entry.to_string(),
                }),
                None => skipped += 1,
            }
        }
        (artifacts, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Publisher;
    use serde_json::json;

    fn entry(id: &str) -> Value {
        json!({"cve": {"CVE_data_meta": {"ID": id}}})
    }

    #[test]
    fn resolves_identifiers_in_feed_order() {
        let content = json!({
            "CVE_data_type": "CVE",
            "CVE_Items": [entry("CVE-2024-0002"), entry("CVE-2024-0001"), entry("CVE-2024-0002")]
        })
        .to_string();
        let feed = NvdFeed::parse(&content).unwrap();
        let resolved = feed.resolve(&Publisher::Aqua.profile().unwrap(), "2024");

        assert_eq!(0, resolved.skipped);
        let items = resolved.into_work_items();
        assert_eq!(2, items.len());
        assert_eq!("CVE-2024-0002", items[0].identifier.as_str());
        assert_eq!("https://avd.aquasec.com/nvd/2024/cve-2024-0002/", items[0].url);
        assert_eq!("CVE-2024-0001", items[1].identifier.as_str());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let content = json!({
            "CVE_Items": [
                entry("CVE-2024-0001"),
                {"cve": {}},
                entry(""),
                {"cve": {"CVE_data_meta": {"ID": 12}}},
                entry("CVE-2024-0003")
            ]
        })
        .to_string();
        let feed = NvdFeed::parse(&content).unwrap();
        let resolved = feed.resolve(&Publisher::Ibm.profile().unwrap(), "2024");
        assert_eq!(3, resolved.skipped);
        assert_eq!(2, resolved.urls.len());

        let (artifacts, skipped) = feed.artifacts();
        assert_eq!(3, skipped);
        assert_eq!(2, artifacts.len());
        assert_eq!(entry("CVE-2024-0003").to_string(), artifacts[1].content);
    }

    #[test]
    fn path_like_identifiers_are_skipped() {
        let content = json!({
            "CVE_Items": [
                entry("../../etc/passwd"),
                entry("CVE-2024-0001"),
                entry("CVE-2024-0002/../../x")
            ]
        })
        .to_string();
        let feed = NvdFeed::parse(&content).unwrap();
        let resolved = feed.resolve(&Publisher::Aqua.profile().unwrap(), "2024");
        assert_eq!(2, resolved.skipped);
        assert_eq!(1, resolved.urls.len());

        let (artifacts, skipped) = feed.artifacts();
        assert_eq!(2, skipped);
        assert_eq!("CVE-2024-0001", artifacts[0].identifier.as_str());
    }

    #[test]
    fn feed_without_entries_is_an_error() {
        assert!(matches!(
            NvdFeed::parse(r#"{"CVE_data_type": "CVE"}"#),
            Err(FeedParseError::MissingEntries(_))
        ));
        assert!(matches!(
            NvdFeed::parse(r#"{"CVE_Items": {}}"#),
            Err(FeedParseError::MissingEntries(_))
        ));
        assert!(matches!(
            NvdFeed::parse("not json"),
            Err(FeedParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn unreadable_feed_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = NvdFeed::load(&feed_path(dir.path(), "2024"));
        assert!(matches!(result, Err(FeedParseError::Unreadable { .. })));
    }
}
