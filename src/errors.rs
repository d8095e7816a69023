//! Errors raised while collecting and aggregating CVE documents.
//!
//! Each stage has its own error type, so a caller always knows which
//! part of the pipeline failed and whether the failure is fatal for the
//! whole run or only for one identifier.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Raised when a NVD feed cannot be turned into a list of identifiers.
#[derive(Debug, Error)]
pub enum FeedParseError {
    /// The feed file cannot be read.
    #[error("unable to read the feed {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The feed is not a JSON document.
    #[error("the feed is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The top-level list of entries is missing.
    #[error("the feed has no \"{0}\" array")]
    MissingEntries(&'static str),
}

/// A non rate-limit failure while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the connection dropped.
    #[error("transport error: {0}")]
    Transport(String),
    /// The publisher answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// The response body could not be read.
    #[error("unable to read the response body: {0}")]
    Body(String),
}

/// Raised when a fetched page cannot be written to disk.
#[derive(Debug, Error)]
#[error("unable to write the artifact {path}: {source}")]
pub struct PersistError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Raised when an artifact doesn't have the expected layout.
#[derive(Debug, Error, PartialEq)]
pub enum ExtractionError {
    /// An element expected exactly once is absent.
    #[error("missing element: {element}")]
    Missing { element: String },
    /// An element expected at most once is present several times.
    #[error("element {element} found {count} times")]
    Duplicated { element: String, count: usize },
    /// A JSON artifact cannot be parsed.
    #[error("invalid JSON artifact: {0}")]
    InvalidJson(String),
    /// A CSS selector used by an extractor doesn't compile.
    #[error("invalid selector {0}")]
    InvalidSelector(String),
}

impl ExtractionError {
    /// Shortcut to build a [`ExtractionError::Missing`].
    pub fn missing(element: &str) -> Self {
        ExtractionError::Missing {
            element: element.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExtractionError {
    fn from(e: serde_json::Error) -> Self {
        ExtractionError::InvalidJson(e.to_string())
    }
}

/// A read or write failure against the canonical record store.
#[derive(Debug, Error)]
pub enum MergeIoError {
    /// The existing record cannot be read.
    #[error("unable to read the record {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The existing record is not a JSON object.
    #[error("the record {path} is corrupted: {source}")]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The merged record cannot be written.
    #[error("unable to write the record {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A raw artifact couldn't be read before extraction.
#[derive(Debug, Error)]
#[error("unable to read the artifact {path}: {source}")]
pub struct ArtifactReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Conditions preventing a run from starting at all.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The operator never confirmed the manual login.
    #[error("the login precondition was not confirmed: {0}")]
    LoginNotConfirmed(String),
    /// The publisher is aggregated from its feed and has no pages to collect.
    #[error("{0} cannot be collected, it is read from the feed")]
    NotCollectable(String),
    /// The feed of a year is unusable.
    #[error(transparent)]
    Feed(#[from] FeedParseError),
    /// The HTTP client couldn't be built.
    #[error("unable to create the HTTP client: {0}")]
    HttpClient(String),
    /// A header given on the command line is invalid.
    #[error("invalid header {0:?}, expected \"Name: value\"")]
    InvalidHeader(String),
    /// A working directory couldn't be created or listed.
    #[error("unable to prepare the directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The logger couldn't be installed.
    #[error("unable to initialize the logger: {0}")]
    Logger(String),
}
