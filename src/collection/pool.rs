//! The pool of workers fetching the pages of a queue.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, trace, warn};

use super::breaker::CircuitBreaker;
use super::progress::ProgressReporter;
use super::queue::WorkQueue;
use crate::errors::PersistError;
use crate::extractors::Extractor;
use crate::models::WorkItem;
use crate::readers::{FetchOutcome, PageFetcher};
use crate::storage::write_atomically;

/// How long a worker waits for an item before considering the queue drained.
pub const DEQUEUE_TIMEOUT: Duration = Duration::from_secs(1);

/// What the workers did, once they all stopped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoolReport {
    /// Items fetched and saved.
    pub fetched: usize,
    /// Items whose fetch or save failed for another reason than a block.
    pub failed: usize,
    /// Items not processed because of the block, including the items
    /// taken when it was detected.
    pub abandoned: usize,
    /// Whether the circuit breaker has been tripped.
    pub rate_limited: bool,
}

/// Where and how the fetched pages are saved.
pub struct ArtifactSink {
    /// The directory of the artifacts.
    pub output_dir: PathBuf,
    /// The extension of the artifacts, without the dot.
    pub extension: String,
    /// Checks the saved pages have the content we need.
    pub extractor: Box<dyn Extractor + Send + Sync>,
}

impl ArtifactSink {
    /// The path of the artifact of an item.
    pub fn path_for(&self, item: &WorkItem) -> PathBuf {
        self.output_dir
            .join(item.identifier.file_name(&self.extension))
    }

    /// Saves a page as fetched.
    /// A page without the expected content is kept, a later extraction
    /// will tell what's wrong with it.
    fn save(&self, item: &WorkItem, body: &str) -> Result<PathBuf, PersistError> {
        let path = self.path_for(item);
        write_atomically(&path, body.as_bytes()).map_err(|source| PersistError {
            path: path.clone(),
            source,
        })?;
        if !self.extractor.has_expected_content(body) {
            warn!(
                "The page of {} doesn't have the expected content",
                item.identifier
            );
        }
        Ok(path)
    }
}

/// Counters shared by the workers.
#[derive(Default)]
struct Counters {
    fetched: AtomicUsize,
    failed: AtomicUsize,
    blocked: AtomicUsize,
}

/// A fixed number of workers taking items from one queue, until the queue
/// is drained or a publisher blocks us.
pub struct FetchWorkerPool {
    workers: usize,
    queue: Arc<WorkQueue>,
    breaker: Arc<CircuitBreaker>,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<ArtifactSink>,
    progress: Arc<dyn ProgressReporter>,
    dequeue_timeout: Duration,
}

impl FetchWorkerPool {
    /// Creates a pool. At least one worker is always started.
    pub fn new(
        workers: usize,
        queue: Arc<WorkQueue>,
        breaker: Arc<CircuitBreaker>,
        fetcher: Arc<dyn PageFetcher>,
        sink: ArtifactSink,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        FetchWorkerPool {
            workers: workers.max(1),
            queue,
            breaker,
            fetcher,
            sink: Arc::new(sink),
            progress,
            dequeue_timeout: DEQUEUE_TIMEOUT,
        }
    }

    /// Changes how long a worker waits for an item.
    pub fn with_dequeue_timeout(mut self, timeout: Duration) -> Self {
        self.dequeue_timeout = timeout;
        self
    }

    /// Runs the workers and waits for all of them to stop.
    pub fn run(&self) -> PoolReport {
        trace!("Running FetchWorkerPool::run()");
        let total = self.queue.len();
        self.progress.start(total as u64);
        let counters = Arc::new(Counters::default());

        let mut handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let worker = Worker {
                id,
                queue: Arc::clone(&self.queue),
                breaker: Arc::clone(&self.breaker),
                fetcher: Arc::clone(&self.fetcher),
                sink: Arc::clone(&self.sink),
                progress: Arc::clone(&self.progress),
                counters: Arc::clone(&counters),
                dequeue_timeout: self.dequeue_timeout,
            };
            debug!("Starting worker {}", id);
            handles.push(thread::spawn(move || worker.run()));
        }

        for handle in handles {
            if handle.join().is_err() {
                error!("A worker panicked");
            }
        }

        let report = PoolReport {
            fetched: counters.fetched.load(Ordering::SeqCst),
            failed: counters.failed.load(Ordering::SeqCst),
            abandoned: counters.blocked.load(Ordering::SeqCst) + self.queue.len(),
            rate_limited: self.breaker.is_tripped(),
        };
        self.progress
            .finish((report.fetched + report.failed) as u64, report.abandoned as u64);
        report
    }
}

/// One worker of the pool.
struct Worker {
    id: usize,
    queue: Arc<WorkQueue>,
    breaker: Arc<CircuitBreaker>,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<ArtifactSink>,
    progress: Arc<dyn ProgressReporter>,
    counters: Arc<Counters>,
    dequeue_timeout: Duration,
}

impl Worker {
    /// Takes items until the queue is drained or the breaker is tripped.
    fn run(&self) {
        loop {
            if self.breaker.is_tripped() {
                debug!("Worker {} stops, the breaker is tripped", self.id);
                break;
            }
            let item = match self.queue.next(self.dequeue_timeout) {
                Some(item) => item,
                None => {
                    debug!("Worker {} stops, the queue is drained", self.id);
                    break;
                }
            };
            // Another worker may have been blocked while we were waiting
            if self.breaker.is_tripped() {
                debug!("Worker {} gives {} up, the breaker is tripped", self.id, item.identifier);
                self.counters.blocked.fetch_add(1, Ordering::SeqCst);
                break;
            }

            match self.fetcher.fetch(&item.url) {
                FetchOutcome::Fetched(body) => match self.sink.save(&item, &body) {
                    Ok(path) => {
                        info!("Saved {} to {}", item.identifier, path.display());
                        self.counters.fetched.fetch_add(1, Ordering::SeqCst);
                        self.progress.advance();
                    }
                    Err(e) => {
                        error!("{}: {}", item.identifier, e);
                        self.counters.failed.fetch_add(1, Ordering::SeqCst);
                        self.progress.advance();
                    }
                },
                FetchOutcome::RateLimited(reason) => {
                    warn!(
                        "Worker {} got blocked while fetching {}: {}",
                        self.id, item.identifier, reason
                    );
                    self.counters.blocked.fetch_add(1, Ordering::SeqCst);
                    self.breaker.trip(&reason);
                    break;
                }
                FetchOutcome::Failed(e) => {
                    error!("Error fetching {} at {}: {}", item.identifier, item.url, e);
                    self.counters.failed.fetch_add(1, Ordering::SeqCst);
                    self.progress.advance();
                }
            }
        }
    }
}
