//! Collecting the pages of a publisher, one year at a time.
//!
//! The identifiers of a year come from the NVD feed. The ones already
//! collected by a previous run are skipped, the others are put in a queue
//! drained by a pool of workers. The first block by the publisher stops the
//! whole collection: the next run will resume where this one stopped.

pub mod barrier;
pub mod breaker;
pub mod completion;
pub mod pool;
pub mod progress;
pub mod queue;

use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info, trace};
use serde::Serialize;

use crate::errors::StartupError;
use crate::feeds::{feed_path, NvdFeed};
use crate::models::{CollectorProfile, Publisher};
use crate::readers::PageFetcher;
use breaker::CircuitBreaker;
use completion::{existing_file_names, pending_items};
use pool::{ArtifactSink, FetchWorkerPool};
use progress::ProgressReporter;
use queue::WorkQueue;

/// What happened during the collection of a year.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub publisher: String,
    pub year: String,
    /// Entries in the feed.
    pub feed_entries: usize,
    /// Entries without identifier.
    pub skipped_entries: usize,
    /// Identifiers collected by a previous run.
    pub already_present: usize,
    /// Identifiers put in the queue.
    pub queued: usize,
    pub fetched: usize,
    pub failed: usize,
    /// Identifiers left for the next run because of a block.
    pub abandoned: usize,
    pub rate_limited: bool,
}

impl CollectionSummary {
    /// Items processed by the workers, successfully or not.
    pub fn processed(&self) -> usize {
        self.fetched + self.failed
    }
}

/// Settings of a collection.
pub struct CollectorSettings {
    pub publisher: Publisher,
    pub profile: CollectorProfile,
    /// Where the NVD feeds are.
    pub feed_dir: PathBuf,
    /// Root of the artifacts directories.
    pub data_dir: PathBuf,
    /// Number of workers of the pool.
    pub workers: usize,
}

/// Runs the collection of one publisher, year by year.
pub struct Collector {
    settings: CollectorSettings,
    fetcher: Arc<dyn PageFetcher>,
    breaker: Arc<CircuitBreaker>,
}

impl Collector {
    /// Creates a collector. NVD has no pages to collect.
    pub fn new(
        settings: CollectorSettings,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self, StartupError> {
        if settings.publisher.profile().is_none() {
            return Err(StartupError::NotCollectable(
                settings.publisher.name().to_string(),
            ));
        }
        Ok(Collector {
            settings,
            fetcher,
            breaker: Arc::new(CircuitBreaker::new()),
        })
    }

    /// The breaker shared by all the years of this collector.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Collects the given years in order, pushing each year's summary to
    /// `summaries` as soon as it is finished.
    ///
    /// Once the breaker is tripped the remaining years are not started.
    /// A failing year stops the loop, the summaries of the years already
    /// collected stay in `summaries`.
    pub fn collect_years<F>(
        &self,
        years: &[String],
        progress_for: F,
        summaries: &mut Vec<CollectionSummary>,
    ) -> Result<(), StartupError>
    where
        F: Fn(&str) -> Arc<dyn ProgressReporter>,
    {
        trace!("Running Collector::collect_years()");
        for year in years {
            if self.breaker.is_tripped() {
                info!("Not starting year {}, the collection has been blocked", year);
                break;
            }
            summaries.push(self.collect_year(year, progress_for(year))?);
        }

        if let Some(reason) = self.breaker.reason() {
            error!("The collection has been stopped: {}", reason);
        }
        Ok(())
    }

    /// Collects the pages of a year.
    /// Fails only if the feed of the year is unusable or the output
    /// directory can't be listed.
    pub fn collect_year(
        &self,
        year: &str,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<CollectionSummary, StartupError> {
        trace!("Running Collector::collect_year()");
        let settings = &self.settings;
        let mut summary = CollectionSummary {
            publisher: settings.publisher.name().to_string(),
            year: year.to_string(),
            ..Default::default()
        };

        info!(
            "Starting collecting the {} information of CVEs for {}",
            summary.publisher, year
        );
        let feed = NvdFeed::load(&feed_path(&settings.feed_dir, year))?;
        summary.feed_entries = feed.len();
        let resolved = feed.resolve(&settings.profile, year);
        summary.skipped_entries = resolved.skipped;
        let items = resolved.into_work_items();
        let known = items.len();

        let output_dir = settings.publisher.artifact_dir(&settings.data_dir, year);
        let existing =
            existing_file_names(&output_dir).map_err(|source| StartupError::Directory {
                path: output_dir.clone(),
                source,
            })?;
        let pending = pending_items(items, existing, &settings.profile.extension);
        summary.queued = pending.len();
        summary.already_present = known - pending.len();
        info!(
            "{} identifiers known for {}, {} of them are in the queue",
            known, year, summary.queued
        );

        let sink = ArtifactSink {
            output_dir,
            extension: settings.profile.extension.clone(),
            extractor: settings.publisher.extractor(),
        };
        let pool = FetchWorkerPool::new(
            settings.workers,
            Arc::new(WorkQueue::new(pending)),
            Arc::clone(&self.breaker),
            Arc::clone(&self.fetcher),
            sink,
            progress,
        );
        let report = pool.run();

        summary.fetched = report.fetched;
        summary.failed = report.failed;
        summary.abandoned = report.abandoned;
        summary.rate_limited = report.rate_limited;
        info!(
            "Finished collecting the {} information of CVEs for {}",
            summary.publisher, year
        );
        Ok(summary)
    }
}
