//! Writing run summaries
//!
//! After a collection or an aggregation, it's up to a writer to present the
//! summaries. It provides a common interface, allowing to change the output
//! format without affecting the execution of the application.

pub mod json;
pub mod textstdout;

use clap::{builder::PossibleValue, ValueEnum};

use crate::aggregation::AggregationSummary;
use crate::collection::CollectionSummary;

/// A trait to have a common interface between writers.
/// A writer has the responsibility to present the summaries of a run, be
/// it on standard output or in another format.
pub trait Writer {
    /// Write the summaries of a collection, one per year.
    fn write_collection(&self, summaries: &[CollectionSummary]);

    /// Write the summaries of an aggregation, one per publisher and year.
    fn write_aggregation(&self, summaries: &[AggregationSummary]);
}

/// The writers available on the command line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Writers {
    TextStdout,
    Json,
}

impl Writers {
    /// Instantiates the writer.
    pub fn writer(&self) -> Box<dyn Writer> {
        match self {
            Writers::TextStdout => Box::new(textstdout::TextStdoutWriter::new()),
            Writers::Json => Box::new(json::JsonWriter::new()),
        }
    }
}

impl ValueEnum for Writers {
    /// Lists the variants available for clap
    fn value_variants<'a>() -> &'a [Self] {
        &[Writers::TextStdout, Writers::Json]
    }

    /// Map each value to a possible value in clap
    fn to_possible_value(&self) -> Option<PossibleValue> {
        match &self {
            Writers::TextStdout => Some(PossibleValue::new("textstdout")),
            Writers::Json => Some(PossibleValue::new("json")),
        }
    }
}
