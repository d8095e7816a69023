//! The IBM X-Force Exchange extractor.
//! The rendered pages contain the description in a `<p class="description">`
//! and, most of the time, the remedy in a
//! `<p class="detailsline description">`.

use log::trace;
use scraper::{ElementRef, Html};
use serde_json::Value;

use super::{at_most_one, element_text, exactly_one, parse_html, selector, Extractor};
use crate::errors::ExtractionError;
use crate::models::{ExtractedFields, Publisher};

/// Reads the description and the remedy of a X-Force page.
pub struct IbmExtractor {}

impl IbmExtractor {
    /// Creates the extractor.
    pub fn new() -> Self {
        Self {}
    }

    /// The paragraphs whose only class is `description`.
    fn description_paragraphs<'a>(
        &self,
        html: &'a Html,
    ) -> Result<Vec<ElementRef<'a>>, ExtractionError> {
        let description_selector = selector("p.description")?;
        Ok(html
            .select(&description_selector)
            .filter(|p| p.value().classes().count() == 1)
            .collect())
    }
}

impl Extractor for IbmExtractor {
    fn publisher(&self) -> Publisher {
        Publisher::Ibm
    }

    fn extract(&self, content: &str) -> Result<ExtractedFields, ExtractionError> {
        trace!("Running IbmExtractor::extract()");
        let html = parse_html(content);
        let remedy_selector = selector("p.detailsline.description")?;

        let description = exactly_one(self.description_paragraphs(&html)?, "description")?;
        let remedy = at_most_one(html.select(&remedy_selector).collect(), "remedy")?;

        let mut fields = ExtractedFields::new();
        fields.insert(
            "description".to_string(),
            Value::String(element_text(&description)),
        );
        fields.insert(
            "remedy".to_string(),
            Value::String(remedy.map(|r| element_text(&r)).unwrap_or_default()),
        );
        Ok(fields)
    }

    /// A page is useful when it has exactly one non-empty description.
    /// X-Force renders it with JavaScript, so a page saved too early has none.
    fn has_expected_content(&self, content: &str) -> bool {
        let html = parse_html(content);
        match self.description_paragraphs(&html) {
            Ok(paragraphs) => paragraphs.len() == 1 && !element_text(&paragraphs[0]).is_empty(),
            Err(_) => false,
        }
    }
}
