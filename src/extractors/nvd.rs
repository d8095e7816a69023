//! The NVD extractor.
//! An NVD artifact is one entry of the `CVE_Items` array of a JSON 1.1
//! yearly feed.

use log::trace;
use serde_json::{Map, Value};

use super::{normalize_text, parse_json_object, Extractor};
use crate::errors::ExtractionError;
use crate::models::{ExtractedFields, Publisher};

/// Reads the ID, the english description and the impact of a feed entry.
pub struct NvdExtractor {}

impl NvdExtractor {
    /// Creates the extractor.
    pub fn new() -> Self {
        Self {}
    }

    /// The identifier of a feed entry, at `cve.CVE_data_meta.ID`.
    pub fn entry_id(entry: &Value) -> Option<&str> {
        entry
            .pointer("/cve/CVE_data_meta/ID")
            .and_then(|id| id.as_str())
    }

    /// The first english description of the entry.
    fn english_description(entry: &Value) -> Option<&str> {
        entry
            .pointer("/cve/description/description_data")?
            .as_array()?
            .iter()
            .find(|d| d.get("lang").and_then(|l| l.as_str()) == Some("en"))?
            .get("value")?
            .as_str()
    }
}

impl Extractor for NvdExtractor {
    fn publisher(&self) -> Publisher {
        Publisher::Nvd
    }

    fn extract(&self, content: &str) -> Result<ExtractedFields, ExtractionError> {
        trace!("Running NvdExtractor::extract()");
        let entry = Value::Object(parse_json_object(content)?);

        let id = Self::entry_id(&entry).ok_or_else(|| ExtractionError::missing("CVE_data_meta.ID"))?;
        let description = Self::english_description(&entry)
            .ok_or_else(|| ExtractionError::missing("english description"))?;
        let impact = entry
            .get("impact")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        let mut fields = ExtractedFields::new();
        fields.insert("ID".to_string(), Value::String(id.to_string()));
        fields.insert(
            "description".to_string(),
            Value::String(normalize_text(description)),
        );
        fields.insert("impact".to_string(), impact);
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> Value {
        json!({
            "cve": {
                "CVE_data_meta": {"ID": "CVE-2024-0001", "ASSIGNER": "cve@mitre.org"},
                "description": {"description_data": [
                    {"lang": "es", "value": "Una falla"},
                    {"lang": "en", "value": "  A flaw\n in   the\u{a0}parser. "}
                ]}
            },
            "impact": {"baseMetricV3": {"cvssV3": {"baseScore": 7.5}}}
        })
    }

    #[test]
    fn extracts_id_description_and_impact() {
        let fields = NvdExtractor::new()
            .extract(&entry().to_string())
            .unwrap();
        assert_eq!(json!("CVE-2024-0001"), fields["ID"]);
        assert_eq!(json!("A flaw in theparser."), fields["description"]);
        assert_eq!(json!({"baseMetricV3": {"cvssV3": {"baseScore": 7.5}}}), fields["impact"]);
    }

    #[test]
    fn missing_english_description_is_an_error() {
        let mut e = entry();
        e["cve"]["description"]["description_data"] = json!([{"lang": "fr", "value": "x"}]);
        let result = NvdExtractor::new().extract(&e.to_string());
        assert_eq!(Err(ExtractionError::missing("english description")), result);
    }

    #[test]
    fn missing_impact_is_empty() {
        let mut e = entry();
        e.as_object_mut().unwrap().remove("impact");
        let fields = NvdExtractor::new().extract(&e.to_string()).unwrap();
        assert_eq!(json!({}), fields["impact"]);
    }

    #[test]
    fn extraction_is_deterministic() {
        let extractor = NvdExtractor::new();
        let content = entry().to_string();
        let first = serde_json::to_string(&extractor.extract(&content).unwrap()).unwrap();
        let second = serde_json::to_string(&extractor.extract(&content).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
