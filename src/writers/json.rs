//! Write the summaries as JSON
//! It presents the summaries in a JSON format and prints it on STDOUT.

use log::error;
use serde::Serialize;
use serde_json::value::Value;
use serde_json::Map;

use super::Writer;
use crate::aggregation::AggregationSummary;
use crate::collection::CollectionSummary;

/// A writer to print the summaries as JSON.
pub struct JsonWriter {}

impl JsonWriter {
    /// Create a new JsonWriter
    pub fn new() -> Self {
        Self {}
    }

    /// Wraps the summaries in an object telling which step produced them.
    pub fn to_value<T: Serialize>(step: &str, summaries: &[T]) -> Result<Value, serde_json::Error> {
        let mut map = Map::new();
        map.insert("step".to_string(), Value::String(step.to_string()));
        map.insert("summaries".to_string(), serde_json::to_value(summaries)?);
        Ok(Value::Object(map))
    }

    fn print<T: Serialize>(step: &str, summaries: &[T]) {
        match Self::to_value(step, summaries) {
            Ok(value) => println!("{:#}", value),
            Err(e) => error!("Unable to serialize the summaries: {}", e),
        }
    }
}

impl Writer for JsonWriter {
    fn write_collection(&self, summaries: &[CollectionSummary]) {
        Self::print("collect", summaries);
    }

    fn write_aggregation(&self, summaries: &[AggregationSummary]) {
        Self::print("aggregate", summaries);
    }
}
