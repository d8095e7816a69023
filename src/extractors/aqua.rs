//! The Aqua Vulnerability Database extractor.
//! The pages have a header with an optional subtitle, and a content block
//! made of free text split in sections by `<h3>` headings.

use std::collections::BTreeMap;

use log::trace;
use scraper::{ElementRef, Html};
use serde_json::Value;

use super::{
    at_most_one, element_text, exactly_one, normalize_text, parse_html, selector, Extractor,
};
use crate::errors::ExtractionError;
use crate::models::{ExtractedFields, Publisher};

/// The name of the section before the first heading.
pub const FIRST_SECTION: &str = "Basic Description";

/// Reads the subtitle and the sections of an Aqua page.
pub struct AquaExtractor {}

impl AquaExtractor {
    /// Creates the extractor.
    pub fn new() -> Self {
        Self {}
    }

    /// The subtitle of the page header, empty when the page has none.
    fn subtitle(&self, html: &Html) -> Result<String, ExtractionError> {
        let headers_selector = selector("div.header_title_wrap")?;
        let subtitle_selector = selector("h2.subtitle.page_subtitle")?;

        let header = exactly_one(html.select(&headers_selector).collect(), "header_title_wrap")?;
        let subtitle = at_most_one(header.select(&subtitle_selector).collect(), "page_subtitle")?;
        Ok(subtitle.map(|s| element_text(&s)).unwrap_or_default())
    }

    /// The content block, as a map from section title to section text.
    /// A heading repeated in the page adds to the same section.
    fn sections(&self, html: &Html) -> Result<BTreeMap<String, String>, ExtractionError> {
        let content_selector = selector("div.content.vulnerability_content")?;
        let content = exactly_one(
            html.select(&content_selector).collect(),
            "vulnerability_content",
        )?;

        let mut sections: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut current = FIRST_SECTION.to_string();
        sections.insert(current.clone(), Vec::new());

        for child in content.children() {
            let text = if let Some(element) = ElementRef::wrap(child) {
                if element.value().name() == "h3" {
                    current = element_text(&element);
                    sections.entry(current.clone()).or_default();
                    continue;
                }
                element.text().collect::<String>()
            } else if let Some(text) = child.value().as_text() {
                (**text).to_string()
            } else {
                // Comments and processing instructions
                continue;
            };
            sections.entry(current.clone()).or_default().push(text);
        }

        Ok(sections
            .into_iter()
            .map(|(title, parts)| (title, normalize_text(&parts.join(" "))))
            .collect())
    }
}

impl Extractor for AquaExtractor {
    fn publisher(&self) -> Publisher {
        Publisher::Aqua
    }

    fn extract(&self, content: &str) -> Result<ExtractedFields, ExtractionError> {
        trace!("Running AquaExtractor::extract()");
        let html = parse_html(content);
        let subtitle = self.subtitle(&html)?;

        let mut fields = ExtractedFields::new();
        for (title, text) in self.sections(&html)? {
            fields.insert(title, Value::String(text));
        }
        fields.insert("subtitle".to_string(), Value::String(subtitle));
        Ok(fields)
    }

    fn has_expected_content(&self, content: &str) -> bool {
        self.sections(&parse_html(content)).is_ok()
    }
}
