//! Skipping what has already been collected.
//!
//! An artifact on disk is the only proof that an identifier has been
//! collected. Filtering the feed against the directory listing is what
//! makes a run resumable after a crash or a block.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use log::trace;

use crate::models::WorkItem;

/// Lists the names of the files in a directory.
/// A missing directory has no files.
pub fn existing_file_names(dir: &Path) -> io::Result<Vec<String>> {
    trace!("Running existing_file_names() on {}", dir.display());
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// Keeps the items whose artifact `<identifier>.<extension>` is not in
/// `existing`. The order of the items is preserved.
pub fn pending_items<I>(items: Vec<WorkItem>, existing: I, extension: &str) -> Vec<WorkItem>
where
    I: IntoIterator<Item = String>,
{
    let existing: HashSet<String> = existing.into_iter().collect();
    items
        .into_iter()
        .filter(|item| !existing.contains(&item.identifier.file_name(extension)))
        .collect()
}
