//! This module declares all the extractors.
//! An extractor reads one raw artifact of a publisher and returns the
//! normalized fields worth keeping in the canonical record.
//!
//! Publishers' layouts are assumed stable: an element expected once that
//! is missing or repeated is an error, never a silent degradation.

pub mod aqua;
pub mod ibm;
pub mod nvd;
pub mod redhat;
pub mod ubuntu;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::errors::ExtractionError;
use crate::models::{ExtractedFields, Publisher};

static WHITESPACES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespaces regex"));

/// A common interface between all extractors.
pub trait Extractor {
    /// The publisher whose artifacts are read.
    fn publisher(&self) -> Publisher;

    /// Extracts the fields of one artifact.
    fn extract(&self, content: &str) -> Result<ExtractedFields, ExtractionError>;

    /// Whether a freshly fetched artifact contains what makes it useful.
    /// Only used to warn about partial pages, which are kept anyway.
    fn has_expected_content(&self, content: &str) -> bool {
        self.extract(content).is_ok()
    }
}

/// Normalizes a text extracted from an artifact.
///
/// Non-ASCII characters are dropped, whitespace runs become a single
/// space, and the result is trimmed.
///
/// # Examples
///
/// ```rust
/// use cvefold::extractors::normalize_text;
///
/// assert_eq!("A flaw in caf", normalize_text("  A\tflaw\n\n in café "));
/// ```
pub fn normalize_text(text: &str) -> String {
    let ascii: String = text.chars().filter(|c| c.is_ascii()).collect();
    WHITESPACES_REGEX
        .replace_all(&ascii, " ")
        .trim()
        .to_string()
}

/// Compiles a CSS selector.
pub(crate) fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|_| ExtractionError::InvalidSelector(css.to_string()))
}

/// Selects the elements matching `selector` which must appear exactly once.
pub(crate) fn exactly_one<'a>(
    elements: Vec<ElementRef<'a>>,
    element: &str,
) -> Result<ElementRef<'a>, ExtractionError> {
    match elements.len() {
        0 => Err(ExtractionError::missing(element)),
        1 => Ok(elements[0]),
        count => Err(ExtractionError::Duplicated {
            element: element.to_string(),
            count,
        }),
    }
}

/// Selects the elements which may be absent, but not repeated.
pub(crate) fn at_most_one<'a>(
    elements: Vec<ElementRef<'a>>,
    element: &str,
) -> Result<Option<ElementRef<'a>>, ExtractionError> {
    match elements.len() {
        0 => Ok(None),
        1 => Ok(Some(elements[0])),
        count => Err(ExtractionError::Duplicated {
            element: element.to_string(),
            count,
        }),
    }
}

/// The whole text of an element, normalized.
pub(crate) fn element_text(element: &ElementRef) -> String {
    normalize_text(&element.text().collect::<String>())
}

/// Parses a HTML artifact.
pub(crate) fn parse_html(content: &str) -> Html {
    Html::parse_document(content)
}

/// Parses a JSON artifact, which must be an object.
pub(crate) fn parse_json_object(
    content: &str,
) -> Result<serde_json::Map<String, Value>, ExtractionError> {
    match serde_json::from_str::<Value>(content)? {
        Value::Object(map) => Ok(map),
        _ => Err(ExtractionError::InvalidJson(
            "the artifact is not a JSON object".to_string(),
        )),
    }
}

/// Reads a string field which must be present. `null` counts as empty.
pub(crate) fn required_string(value: Option<&Value>, element: &str) -> Result<String, ExtractionError> {
    match value {
        Some(Value::String(s)) => Ok(normalize_text(s)),
        Some(Value::Null) => Ok(String::new()),
        _ => Err(ExtractionError::missing(element)),
    }
}

/// Reads a string field which may be absent.
pub(crate) fn optional_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => normalize_text(s),
        _ => String::new(),
    }
}
