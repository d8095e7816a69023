//! The canonical record store.
//!
//! The records are stored in files, one per identifier:
//! ```text
//! <root>/
//!   \__<year>/
//!        \__<identifier>.json
//! ```
//! Each file is a JSON object whose keys are publisher names.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, trace};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::errors::MergeIoError;
use crate::models::{CanonicalRecord, ExtractedFields, Identifier, Publisher};
use crate::storage::write_atomically;

/// The number of locks identifiers are spread on.
const LOCK_STRIPES: usize = 64;

/// Stores the canonical records in a directory.
///
/// A merge (read, replace the publisher's part, write) holds the lock of the
/// identifier, so two merges of the same identifier in one process never
/// interleave. Merges of different identifiers mostly use different locks.
pub struct RecordStore {
    root: PathBuf,
    locks: Vec<Mutex<()>>,
}

impl RecordStore {
    /// Creates a store rooted at `root`. Nothing is created on disk
    /// before the first write.
    pub fn new(root: &Path) -> Self {
        RecordStore {
            root: root.to_path_buf(),
            locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    /// The path of the record of an identifier.
    pub fn path_for(&self, year: &str, identifier: &Identifier) -> PathBuf {
        self.root
            .join(year)
            .join(identifier.file_name("json"))
    }

    /// Reads a record. A record never written is empty.
    pub fn read(&self, year: &str, identifier: &Identifier) -> Result<CanonicalRecord, MergeIoError> {
        let path = self.path_for(year, identifier);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No record yet for {}", identifier);
                return Ok(CanonicalRecord::new());
            }
            Err(source) => return Err(MergeIoError::Read { path, source }),
        };
        serde_json::from_str(&content).map_err(|source| MergeIoError::Corrupted { path, source })
    }

    /// Writes a whole record, replacing the previous one.
    pub fn write(
        &self,
        year: &str,
        identifier: &Identifier,
        record: &CanonicalRecord,
    ) -> Result<(), MergeIoError> {
        let path = self.path_for(year, identifier);
        let content = to_pretty_json(record).map_err(|e| MergeIoError::Write {
            path: path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;
        write_atomically(&path, &content).map_err(|source| MergeIoError::Write { path, source })
    }

    /// Replaces what `publisher` previously wrote in the record of an
    /// identifier, keeping the other publishers. Returns the new record.
    pub fn merge(
        &self,
        year: &str,
        identifier: &Identifier,
        publisher: Publisher,
        fields: ExtractedFields,
    ) -> Result<CanonicalRecord, MergeIoError> {
        trace!("Running RecordStore::merge() for {}", identifier);
        let _guard = self.locks[self.stripe(identifier)]
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let mut record = self.read(year, identifier)?;
        record.set(publisher.name(), fields);
        self.write(year, identifier, &record)?;
        Ok(record)
    }

    /// The lock stripe of an identifier.
    fn stripe(&self, identifier: &Identifier) -> usize {
        let mut hasher = DefaultHasher::new();
        identifier.hash(&mut hasher);
        (hasher.finish() % self.locks.len() as u64) as usize
    }
}

/// Serializes a record as JSON indented with four spaces.
fn to_pretty_json(record: &CanonicalRecord) -> Result<Vec<u8>, serde_json::Error> {
    let mut content = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut content, formatter);
    record.serialize(&mut serializer)?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::thread;

    fn id(value: &str) -> Identifier {
        Identifier::new(value).unwrap()
    }

    fn fields(value: Value) -> ExtractedFields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn merges_are_additive_across_publishers() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let x = id("CVE-2024-0001");

        store
            .merge("2024", &x, Publisher::Aqua, fields(json!({"subtitle": "a"})))
            .unwrap();
        store
            .merge("2024", &x, Publisher::Ubuntu, fields(json!({"priority": "low"})))
            .unwrap();

        let record = store.read("2024", &x).unwrap();
        assert_eq!(Some(&json!({"subtitle": "a"})), record.get("aqua"));
        assert_eq!(Some(&json!({"priority": "low"})), record.get("ubuntu"));
    }

    #[test]
    fn merge_order_does_not_matter() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let (x, y) = (id("CVE-2024-0001"), id("CVE-2024-0002"));
        let a = fields(json!({"description": "from a"}));
        let b = fields(json!({"description": "from b"}));

        store.merge("2024", &x, Publisher::Aqua, a.clone()).unwrap();
        store.merge("2024", &x, Publisher::Ibm, b.clone()).unwrap();
        store.merge("2024", &y, Publisher::Ibm, b).unwrap();
        store.merge("2024", &y, Publisher::Aqua, a).unwrap();

        assert_eq!(store.read("2024", &x).unwrap(), store.read("2024", &y).unwrap());
    }

    #[test]
    fn same_publisher_last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let x = id("CVE-2024-0001");

        store
            .merge("2024", &x, Publisher::Aqua, fields(json!({"subtitle": "first", "old": "x"})))
            .unwrap();
        store
            .merge("2024", &x, Publisher::Ubuntu, fields(json!({"priority": "high"})))
            .unwrap();
        store
            .merge("2024", &x, Publisher::Aqua, fields(json!({"subtitle": "second"})))
            .unwrap();

        let record = store.read("2024", &x).unwrap();
        assert_eq!(Some(&json!({"subtitle": "second"})), record.get("aqua"));
        assert_eq!(Some(&json!({"priority": "high"})), record.get("ubuntu"));
    }

    #[test]
    fn records_are_pretty_printed_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let x = id("CVE-2021-44228");
        store
            .merge("2021", &x, Publisher::Nvd, fields(json!({"ID": "CVE-2021-44228"})))
            .unwrap();

        let path = dir.path().join("2021").join("CVE-2021-44228.json");
        let content = fs::read_to_string(path).unwrap();
        assert_eq!(
            "{\n    \"nvd\": {\n        \"ID\": \"CVE-2021-44228\"\n    }\n}",
            content
        );
    }

    #[test]
    fn missing_record_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        assert!(store.read("2024", &id("CVE-2024-9999")).unwrap().is_empty());
        // Reading doesn't create anything
        assert!(!dir.path().join("2024").exists());
    }

    #[test]
    fn corrupted_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let x = id("CVE-2024-0001");
        fs::create_dir_all(dir.path().join("2024")).unwrap();
        fs::write(store.path_for("2024", &x), "{\"nvd\": ").unwrap();

        let result = store.merge("2024", &x, Publisher::Aqua, ExtractedFields::new());
        assert!(matches!(result, Err(MergeIoError::Corrupted { .. })));
        // The corrupted file is left as is
        assert_eq!("{\"nvd\": ", fs::read_to_string(store.path_for("2024", &x)).unwrap());
    }

    #[test]
    fn concurrent_merges_of_one_identifier_are_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let x = id("CVE-2024-0001");
        let publishers = [Publisher::Aqua, Publisher::Ibm, Publisher::Ubuntu, Publisher::RedHat];

        thread::scope(|s| {
            for publisher in publishers {
                let store = &store;
                let x = &x;
                s.spawn(move || {
                    for round in 0..25 {
                        let f = fields(json!({"round": round}));
                        store.merge("2024", x, publisher, f).unwrap();
                    }
                });
            }
        });

        let record = store.read("2024", &x).unwrap();
        for publisher in publishers {
            assert_eq!(Some(&json!({"round": 24})), record.get(publisher.name()));
        }
    }
}
