//! Folding the artifacts of the publishers into the canonical records.
//!
//! For a publisher and a year, each artifact is read, given to the
//! publisher's extractor, and the result merged into the record of the
//! identifier. A bad artifact is logged and skipped, it never stops the
//! rest of the batch.

pub mod store;

use std::fs;
use std::path::Path;

use log::{debug, error, info, trace};
use serde::Serialize;

use crate::errors::{ArtifactReadError, StartupError};
use crate::extractors::Extractor;
use crate::feeds::{feed_path, NvdFeed};
use crate::models::{Identifier, Publisher, RawArtifact};
use store::RecordStore;

/// What happened during the aggregation of a publisher for a year.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AggregationSummary {
    pub publisher: String,
    pub year: String,
    /// Identifiers whose record has been updated.
    pub merged: usize,
    /// Artifacts the extractor refused.
    pub extraction_failures: usize,
    /// Artifacts or records that couldn't be read or written.
    pub io_failures: usize,
    /// Feed entries or files without a usable identifier.
    pub skipped: usize,
}

/// The identifier of an artifact file: its name up to the first dot.
pub fn identifier_from_file_name(file_name: &str) -> Option<Identifier> {
    file_name.split('.').next().and_then(Identifier::new)
}

/// Lists the artifacts of a directory, sorted by file name.
/// Subdirectories and files without an identifier are skipped, and
/// counted in the second element of the result.
pub fn list_artifacts(
    dir: &Path,
) -> Result<(Vec<(Identifier, std::path::PathBuf)>, usize), std::io::Error> {
    trace!("Running list_artifacts() on {}", dir.display());
    let mut files = Vec::new();
    let mut skipped = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            debug!("{} is not a file", entry.path().display());
            skipped += 1;
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        match identifier_from_file_name(&name) {
            Some(identifier) => files.push((name, identifier, entry.path())),
            None => skipped += 1,
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok((
        files.into_iter().map(|(_, id, path)| (id, path)).collect(),
        skipped,
    ))
}

/// Reads an artifact file.
fn read_artifact(identifier: Identifier, path: &Path) -> Result<RawArtifact, ArtifactReadError> {
    let content = fs::read_to_string(path).map_err(|source| ArtifactReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(RawArtifact {
        identifier,
        content,
    })
}

/// Merges the artifacts of publishers into a [`RecordStore`].
/// It is the only writer of the store.
pub struct Aggregator<'a> {
    store: &'a RecordStore,
}

impl<'a> Aggregator<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Aggregator { store }
    }

    /// Extracts and merges one artifact.
    /// Returns whether the record has been updated; failures are logged
    /// and counted in the summary.
    pub fn aggregate_one(
        &self,
        extractor: &dyn Extractor,
        year: &str,
        artifact: &RawArtifact,
        summary: &mut AggregationSummary,
    ) -> bool {
        let publisher = extractor.publisher();
        let fields = match extractor.extract(&artifact.content) {
            Ok(f) => f,
            Err(e) => {
                error!(
                    "Unable to extract the {} data of {}: {}",
                    publisher.name(),
                    artifact.identifier,
                    e
                );
                summary.extraction_failures += 1;
                return false;
            }
        };

        match self
            .store
            .merge(year, &artifact.identifier, publisher, fields)
        {
            Ok(_) => {
                info!("Merged the {} data of {}", publisher.name(), artifact.identifier);
                summary.merged += 1;
                true
            }
            Err(e) => {
                error!("Unable to merge {}: {}", artifact.identifier, e);
                summary.io_failures += 1;
                false
            }
        }
    }

    /// Aggregates a batch of artifacts of one publisher for a year.
    pub fn aggregate<I>(&self, extractor: &dyn Extractor, year: &str, artifacts: I) -> AggregationSummary
    where
        I: IntoIterator<Item = Result<RawArtifact, ArtifactReadError>>,
    {
        trace!("Running Aggregator::aggregate()");
        let mut summary = AggregationSummary {
            publisher: extractor.publisher().name().to_string(),
            year: year.to_string(),
            ..Default::default()
        };
        for artifact in artifacts {
            match artifact {
                Ok(artifact) => {
                    self.aggregate_one(extractor, year, &artifact, &mut summary);
                }
                Err(e) => {
                    error!("{}", e);
                    summary.io_failures += 1;
                }
            }
        }
        info!(
            "Finished {} records of {} for year {}",
            summary.merged, summary.publisher, year
        );
        summary
    }

    /// Aggregates a publisher for a year, reading its artifacts where the
    /// collection saved them. NVD is read from the yearly feed instead.
    pub fn aggregate_publisher(
        &self,
        publisher: Publisher,
        year: &str,
        feed_dir: &Path,
        data_dir: &Path,
    ) -> Result<AggregationSummary, StartupError> {
        info!("Starting {} data aggregation for year {}", publisher.name(), year);
        let extractor = publisher.extractor();

        if publisher == Publisher::Nvd {
            let feed = NvdFeed::load(&feed_path(feed_dir, year))?;
            let (artifacts, skipped) = feed.artifacts();
            let mut summary =
                self.aggregate(extractor.as_ref(), year, artifacts.into_iter().map(Ok));
            summary.skipped = skipped;
            return Ok(summary);
        }

        let dir = publisher.artifact_dir(data_dir, year);
        let (files, skipped) = list_artifacts(&dir).map_err(|source| StartupError::Directory {
            path: dir.clone(),
            source,
        })?;
        let artifacts = files
            .into_iter()
            .map(|(identifier, path)| read_artifact(identifier, &path));
        let mut summary = self.aggregate(extractor.as_ref(), year, artifacts);
        summary.skipped = skipped;
        Ok(summary)
    }
}
