//! The Red Hat security data extractor.
//! Artifacts are the JSON documents of the Red Hat security data API.
//! https://access.redhat.com/documentation/en-us/red_hat_security_data_api

use log::{trace, warn};
use serde_json::Value;

use super::{optional_string, parse_json_object, required_string, Extractor};
use crate::errors::ExtractionError;
use crate::models::{ExtractedFields, Publisher};

/// Reads the severity, the descriptions and the CVSS data of a Red Hat CVE.
pub struct RedHatExtractor {}

impl RedHatExtractor {
    /// Creates the extractor.
    pub fn new() -> Self {
        Self {}
    }

    /// The mitigation is either a plain string or an object like
    /// `{"value": "...", "lang": "en:us"}` depending on the API version.
    fn mitigation(value: Option<&Value>) -> String {
        match value {
            Some(Value::Object(o)) => optional_string(o.get("value")),
            other => optional_string(other),
        }
    }
}

impl Extractor for RedHatExtractor {
    fn publisher(&self) -> Publisher {
        Publisher::RedHat
    }

    fn extract(&self, content: &str) -> Result<ExtractedFields, ExtractionError> {
        trace!("Running RedHatExtractor::extract()");
        let document = parse_json_object(content)?;

        let severity = required_string(document.get("threat_severity"), "threat_severity")?;
        let bugzilla_description = required_string(
            document.get("bugzilla").and_then(|b| b.get("description")),
            "bugzilla.description",
        )?;
        let details = document
            .get("details")
            .and_then(|d| d.as_array())
            .ok_or_else(|| ExtractionError::missing("details"))?;
        let first_description = required_string(details.first(), "details")?;
        let second_description = optional_string(details.get(1));
        if details.len() > 2 {
            let name = optional_string(document.get("name"));
            warn!("{} has {} details, only the first two are kept", name, details.len());
        }

        let mut fields = ExtractedFields::new();
        fields.insert(
            "mitigation".to_string(),
            Value::String(Self::mitigation(document.get("mitigation"))),
        );
        fields.insert("severity".to_string(), Value::String(severity));
        fields.insert(
            "bugzilla_description".to_string(),
            Value::String(bugzilla_description),
        );
        fields.insert(
            "cvss".to_string(),
            document.get("cvss").cloned().unwrap_or(Value::Null),
        );
        fields.insert(
            "cvss3".to_string(),
            document.get("cvss3").cloned().unwrap_or(Value::Null),
        );
        fields.insert(
            "first_description".to_string(),
            Value::String(first_description),
        );
        fields.insert(
            "second_description".to_string(),
            Value::String(second_description),
        );
        fields.insert(
            "redhat_statement".to_string(),
            Value::String(optional_string(document.get("statement"))),
        );
        fields.insert(
            "cwe".to_string(),
            Value::String(optional_string(document.get("cwe"))),
        );
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "name": "CVE-2024-0001",
            "threat_severity": "Important",
            "bugzilla": {"id": "1", "description": "libfoo:  heap overflow"},
            "cvss3": {"cvss3_base_score": "7.5", "status": "verified"},
            "cwe": "CWE-122",
            "details": ["A heap overflow\nin libfoo.", "  Second\u{a0}paragraph "],
            "statement": "Not affected in RHEL 7.",
            "mitigation": {"value": "Disable the  foo module.", "lang": "en:us"}
        })
    }

    #[test]
    fn extracts_all_fields() {
        let fields = RedHatExtractor::new()
            .extract(&document().to_string())
            .unwrap();
        assert_eq!(
            json!({
                "mitigation": "Disable the foo module.",
                "severity": "Important",
                "bugzilla_description": "libfoo: heap overflow",
                "cvss": null,
                "cvss3": {"cvss3_base_score": "7.5", "status": "verified"},
                "first_description": "A heap overflow in libfoo.",
                "second_description": "Secondparagraph",
                "redhat_statement": "Not affected in RHEL 7.",
                "cwe": "CWE-122"
            }),
            Value::Object(fields)
        );
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let mut d = document();
        let object = d.as_object_mut().unwrap();
        object.remove("mitigation");
        object.remove("statement");
        object.insert("details".to_string(), json!(["Only one."]));
        let fields = RedHatExtractor::new().extract(&d.to_string()).unwrap();
        assert_eq!(json!(""), fields["mitigation"]);
        assert_eq!(json!(""), fields["redhat_statement"]);
        assert_eq!(json!(""), fields["second_description"]);
    }

    #[test]
    fn plain_string_mitigation() {
        let mut d = document();
        d["mitigation"] = json!("Use a firewall.");
        let fields = RedHatExtractor::new().extract(&d.to_string()).unwrap();
        assert_eq!(json!("Use a firewall."), fields["mitigation"]);
    }

    #[test]
    fn missing_details_is_an_error() {
        let mut d = document();
        d["details"] = json!([]);
        assert_eq!(
            Err(ExtractionError::missing("details")),
            RedHatExtractor::new().extract(&d.to_string())
        );
    }

    #[test]
    fn missing_severity_is_an_error() {
        let mut d = document();
        d.as_object_mut().unwrap().remove("threat_severity");
        assert_eq!(
            Err(ExtractionError::missing("threat_severity")),
            RedHatExtractor::new().extract(&d.to_string())
        );
    }
}
