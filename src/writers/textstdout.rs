//! Write the summaries to standard output
//! It is the default writer, it presents the summaries in a text
//! format and prints it on STDOUT.

use super::Writer;
use crate::aggregation::AggregationSummary;
use crate::collection::CollectionSummary;

/// A writer to print the summaries in the terminal.
pub struct TextStdoutWriter {}

impl TextStdoutWriter {
    /// Create a new TextStdoutWriter
    pub fn new() -> Self {
        Self {}
    }

    /// Formats the summary of a collected year.
    pub fn format_collection(summary: &CollectionSummary) -> String {
        let mut text = format!(
            "----------{} {}----------\n",
            summary.publisher, summary.year
        );
        text.push_str(&format!(
            "{} entries in the feed, {} without identifier\n",
            summary.feed_entries, summary.skipped_entries
        ));
        text.push_str(&format!(
            "{} already collected, {} queued\n",
            summary.already_present, summary.queued
        ));
        text.push_str(&format!(
            "{} fetched, {} failed\n",
            summary.fetched, summary.failed
        ));
        text.push_str(&format!(
            "{} of {} processed, {} remaining\n",
            summary.processed(),
            summary.queued,
            summary.abandoned
        ));
        if summary.rate_limited {
            text.push_str("Stopped: the publisher blocked the collection\n");
        }
        text
    }

    /// Formats the summary of an aggregated publisher and year.
    pub fn format_aggregation(summary: &AggregationSummary) -> String {
        format!(
            "[{}/{}] {} merged, {} extraction failures, {} I/O failures, {} skipped\n",
            summary.publisher,
            summary.year,
            summary.merged,
            summary.extraction_failures,
            summary.io_failures,
            summary.skipped
        )
    }
}

impl Writer for TextStdoutWriter {
    /// Prints the collection summaries on STDOUT
    fn write_collection(&self, summaries: &[CollectionSummary]) {
        for summary in summaries {
            println!("{}", Self::format_collection(summary));
        }
    }

    /// Prints the aggregation summaries on STDOUT
    fn write_aggregation(&self, summaries: &[AggregationSummary]) {
        for summary in summaries {
            print!("{}", Self::format_aggregation(summary));
        }
    }
}
