//! This module contains the main structure and logic for the whole
//! application.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, trace, warn, LevelFilter};
use simple_logger::SimpleLogger;

use crate::aggregation::store::RecordStore;
use crate::aggregation::{AggregationSummary, Aggregator};
use crate::collection::barrier::{ConsoleConfirmation, NoBarrier, StartupBarrier};
use crate::collection::progress::{BarReporter, ProgressReporter, SilentReporter};
use crate::collection::{CollectionSummary, Collector, CollectorSettings};
use crate::errors::StartupError;
use crate::models::{CollectorProfile, Publisher};
use crate::readers::http::HttpFetcher;
use crate::readers::PageFetcher;
use crate::writers::Writers;

/// The years processed when none is given.
pub const DEFAULT_YEARS: [&str; 5] = ["2024", "2023", "2022", "2021", "2020"];

/// Represents the application
pub struct Application {
    /// The arguments given on the command line.
    argv: Option<Args>,
}

impl Application {
    /// Creates a new application
    pub fn new() -> Self {
        Application { argv: None }
    }

    /// Read argv to get the arguments, and starts the logger at the
    /// requested level.
    pub fn read_argv(&mut self) -> Result<(), StartupError> {
        let args = Args::parse();
        SimpleLogger::new()
            .with_level(args.log_level)
            .init()
            .map_err(|e| StartupError::Logger(e.to_string()))?;
        trace!("In Application::read_argv()");
        debug!("Arguments: {:?}", args);
        self.argv = Some(args);
        Ok(())
    }

    /// Runs the global application
    /// read_argv() MUST have been called before
    pub fn run(&self) -> Result<(), StartupError> {
        trace!("Running Application::run()");
        let args = self
            .argv
            .as_ref()
            .expect("CLI arguments haven't been read.");
        // The summaries gathered before a fatal error are written anyway
        let writer = args.writer.writer();
        match &args.command {
            Command::Collect(collect) => {
                let mut summaries = Vec::new();
                let result = self.collect(collect, &mut summaries);
                writer.write_collection(&summaries);
                result
            }
            Command::Aggregate(aggregate) => {
                let mut summaries = Vec::new();
                let result = self.aggregate(aggregate, &mut summaries);
                writer.write_aggregation(&summaries);
                result
            }
        }
    }

    /// Collects the pages of a publisher, year after year.
    /// The collection stops after the first year where the publisher
    /// blocked us.
    fn collect(
        &self,
        args: &CollectArgs,
        summaries: &mut Vec<CollectionSummary>,
    ) -> Result<(), StartupError> {
        trace!("Running Application::collect()");
        let publisher = args.publisher;
        let mut profile = publisher
            .profile()
            .ok_or_else(|| StartupError::NotCollectable(publisher.name().to_string()))?;
        args.apply_to(&mut profile);
        debug!("Collection profile: {:?}", profile);

        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(
            profile.block_rule.clone(),
            &args.header,
            Duration::from_secs(args.timeout_secs),
            Duration::from_millis(args.delay_ms),
        )?);

        let requires_login = profile.requires_login && !args.skip_login;
        let settings = CollectorSettings {
            publisher,
            profile,
            feed_dir: args.feed_dir.clone(),
            data_dir: args.data_dir.clone(),
            workers: args.workers,
        };
        let collector = Collector::new(settings, fetcher)?;

        let barrier: Box<dyn StartupBarrier> = if requires_login {
            Box::new(ConsoleConfirmation::stdin(&format!(
                "Log in to {} in your browser, then press Enter to start the collection.",
                publisher.name()
            )))
        } else {
            Box::new(NoBarrier)
        };
        barrier.wait()?;

        let no_progress = args.no_progress;
        collector.collect_years(
            &years_or_default(&args.year),
            |year| -> Arc<dyn ProgressReporter> {
                if no_progress {
                    Arc::new(SilentReporter)
                } else {
                    Arc::new(BarReporter::new(&format!("{} {}", publisher.name(), year)))
                }
            },
            summaries,
        )
    }

    /// Aggregates the artifacts of the publishers into the records.
    /// A publisher-year without artifacts is logged and skipped, an
    /// unusable feed stops the aggregation.
    fn aggregate(
        &self,
        args: &AggregateArgs,
        summaries: &mut Vec<AggregationSummary>,
    ) -> Result<(), StartupError> {
        trace!("Running Application::aggregate()");
        let store = RecordStore::new(&args.records_dir);
        let aggregator = Aggregator::new(&store);
        let publishers = if args.publisher.is_empty() {
            Publisher::value_variants().to_vec()
        } else {
            args.publisher.clone()
        };

        for year in years_or_default(&args.year) {
            for publisher in &publishers {
                let result =
                    aggregator.aggregate_publisher(*publisher, &year, &args.feed_dir, &args.data_dir);
                match result {
                    Ok(summary) => summaries.push(summary),
                    // Nothing collected for this publisher and year
                    Err(StartupError::Directory { path, source })
                        if source.kind() == io::ErrorKind::NotFound =>
                    {
                        warn!(
                            "Skipping {} for year {}, {} doesn't exist",
                            publisher.name(),
                            year,
                            path.display()
                        )
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }
}

/// The years given on the command line, or the default ones.
fn years_or_default(years: &[String]) -> Vec<String> {
    if years.is_empty() {
        DEFAULT_YEARS.iter().map(|y| y.to_string()).collect()
    } else {
        years.to_vec()
    }
}

/// Represents the CLI arguments accepted by cvefold
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
    /// The level of the logs
    #[arg(short, long, value_name = "LEVEL", default_value = "info", global = true)]
    pub log_level: LevelFilter,
    /// The writer to use for the summaries
    #[arg(short, long, value_name = "WRITER", default_value = "textstdout", global = true)]
    pub writer: Writers,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect the pages of a publisher
    Collect(CollectArgs),
    /// Merge the collected pages into the CVE records
    Aggregate(AggregateArgs),
}

#[derive(clap::Args, Debug)]
pub struct CollectArgs {
    /// The publisher to collect
    #[arg(short, long, value_name = "PUBLISHER")]
    pub publisher: Publisher,
    /// The years to collect, most recent first by default
    #[arg(short, long, value_name = "YEAR")]
    pub year: Vec<String>,
    /// Where the NVD feeds are
    #[arg(long, value_name = "DIR", default_value = "nvd")]
    pub feed_dir: PathBuf,
    /// Where the pages are saved
    #[arg(long, value_name = "DIR", default_value = "data")]
    pub data_dir: PathBuf,
    /// The number of workers
    #[arg(long, value_name = "N", default_value_t = 2)]
    pub workers: usize,
    /// Replaces the URL of the pages, `{id}` and `{year}` are replaced
    #[arg(long, value_name = "TEMPLATE")]
    pub url_template: Option<String>,
    /// A page whose title contains this text means we're blocked
    #[arg(long, value_name = "TEXT")]
    pub blocked_title: Vec<String>,
    /// A response with this status means we're blocked
    #[arg(long, value_name = "STATUS")]
    pub blocked_status: Vec<u16>,
    /// An extra header sent with each request, e.g. a session cookie
    #[arg(long, value_name = "NAME: VALUE")]
    pub header: Vec<String>,
    /// The timeout of a request
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub timeout_secs: u64,
    /// Time to wait after each request
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub delay_ms: u64,
    /// Don't wait for a manual login
    #[arg(long)]
    pub skip_login: bool,
    /// Don't show the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl CollectArgs {
    /// Overrides the publisher profile with the command line.
    fn apply_to(&self, profile: &mut CollectorProfile) {
        if let Some(template) = &self.url_template {
            profile.url_template = template.clone();
        }
        if !self.blocked_status.is_empty() {
            profile.block_rule.statuses = self.blocked_status.clone();
        }
        profile
            .block_rule
            .title_markers
            .extend(self.blocked_title.iter().cloned());
    }
}

#[derive(clap::Args, Debug)]
pub struct AggregateArgs {
    /// The publishers to aggregate, in this order. All of them by default
    #[arg(short, long, value_name = "PUBLISHER")]
    pub publisher: Vec<Publisher>,
    /// The years to aggregate, most recent first by default
    #[arg(short, long, value_name = "YEAR")]
    pub year: Vec<String>,
    /// Where the NVD feeds are
    #[arg(long, value_name = "DIR", default_value = "nvd")]
    pub feed_dir: PathBuf,
    /// Where the collected pages are
    #[arg(long, value_name = "DIR", default_value = "data")]
    pub data_dir: PathBuf,
    /// Where the records are written
    #[arg(long, value_name = "DIR", default_value = "CVES")]
    pub records_dir: PathBuf,
}
