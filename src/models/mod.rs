//! In this module are declared the entities manipulated by this program

pub mod publisher;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use publisher::{CollectorProfile, IdCase, Publisher};

/// The fields extracted from one artifact by one publisher extractor.
///
/// `serde_json::Map` is ordered by key, so two extractions of the same
/// artifact always serialize to the same bytes.
pub type ExtractedFields = Map<String, Value>;

/// A vulnerability identifier, such as `CVE-2024-0001`.
/// It is the join key between the raw artifacts and the records.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Creates a new identifier. Surrounding spaces are removed.
    /// An identifier names files, so an empty one, one containing a path
    /// separator, or one made of dots only is refused.
    pub fn new(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty()
            || value.contains(['/', '\\', '\0'])
            || value.chars().all(|c| c == '.')
        {
            None
        } else {
            Some(Identifier(value.to_string()))
        }
    }

    /// The identifier as written in the feed.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name of the file storing an artifact of this identifier.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.0, extension)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page to fetch: the identifier and the URL of its page.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkItem {
    pub identifier: Identifier,
    pub url: String,
}

impl WorkItem {
    /// Creates a new WorkItem
    pub fn new(identifier: Identifier, url: &str) -> Self {
        WorkItem {
            identifier,
            url: url.to_string(),
        }
    }
}

/// An unprocessed document of one publisher for one identifier.
#[derive(Clone, Debug)]
pub struct RawArtifact {
    pub identifier: Identifier,
    pub content: String,
}

/// The merged document of one identifier.
/// Top-level keys are publisher names, values are what the publisher's
/// extractor returned the last time it ran on this identifier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRecord {
    publishers: Map<String, Value>,
}

impl CanonicalRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces everything a publisher previously wrote in this record.
    /// Other publishers are left untouched.
    pub fn set(&mut self, publisher: &str, fields: ExtractedFields) {
        self.publishers
            .insert(publisher.to_string(), Value::Object(fields));
    }

    /// The fields of a publisher, if it already wrote in this record.
    pub fn get(&self, publisher: &str) -> Option<&Value> {
        self.publishers.get(publisher)
    }

    /// The names of the publishers present in the record.
    pub fn publishers(&self) -> impl Iterator<Item = &str> {
        self.publishers.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}
