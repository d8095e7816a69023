//! The Ubuntu CVE tracker extractor.
//! Artifacts are the JSON documents served at
//! `https://ubuntu.com/security/cves/<id>.json`.

use log::trace;
use serde_json::Value;

use super::{parse_json_object, required_string, Extractor};
use crate::errors::ExtractionError;
use crate::models::{ExtractedFields, Publisher};

/// Keys read in the document, and the field they're stored in.
const FIELDS: [(&str, &str); 3] = [
    ("Description", "description"),
    ("UbuntuDescription", "ubuntu_description"),
    ("Priority", "priority"),
];

/// Reads the descriptions and the priority of an Ubuntu CVE.
pub struct UbuntuExtractor {}

impl UbuntuExtractor {
    /// Creates the extractor.
    pub fn new() -> Self {
        Self {}
    }
}

impl Extractor for UbuntuExtractor {
    fn publisher(&self) -> Publisher {
        Publisher::Ubuntu
    }

    fn extract(&self, content: &str) -> Result<ExtractedFields, ExtractionError> {
        trace!("Running UbuntuExtractor::extract()");
        let document = parse_json_object(content)?;
        let mut fields = ExtractedFields::new();
        for (key, field) in FIELDS {
            let value = required_string(document.get(key), key)?;
            fields.insert(field.to_string(), Value::String(value));
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_descriptions_and_priority() {
        let content = json!({
            "Candidate": "CVE-2024-0001",
            "Description": "A flaw\nin libfoo.",
            "UbuntuDescription": null,
            "Priority": " medium ",
            "Patches": {}
        })
        .to_string();
        let fields = UbuntuExtractor::new().extract(&content).unwrap();
        assert_eq!(
            json!({"description": "A flaw in libfoo.", "ubuntu_description": "", "priority": "medium"}),
            Value::Object(fields)
        );
    }

    #[test]
    fn missing_priority_is_an_error() {
        let content = json!({"Description": "x", "UbuntuDescription": "y"}).to_string();
        assert_eq!(
            Err(ExtractionError::missing("Priority")),
            UbuntuExtractor::new().extract(&content)
        );
    }

    #[test]
    fn html_is_not_a_valid_artifact() {
        let result = UbuntuExtractor::new().extract("<html>Not found</html>");
        assert!(matches!(result, Err(ExtractionError::InvalidJson(_))));
    }
}
