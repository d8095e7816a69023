//! Writing files so that readers never see them half-written.
//!
//! The existence of an artifact is what marks it as collected, and a record
//! is read back at each aggregation, so a crash in the middle of a write
//! must leave either the old file or the new one.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::trace;
use tempfile::NamedTempFile;

/// Writes `content` to `path` through a temporary file of the same
/// directory, renamed once complete. Missing parent directories are created.
pub fn write_atomically(path: &Path, content: &[u8]) -> io::Result<()> {
    trace!("Running write_atomically() on {}", path.display());
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_and_replaces_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024").join("CVE-2024-0001.json");
        write_atomically(&path, b"{}").unwrap();
        assert_eq!("{}", fs::read_to_string(&path).unwrap());

        write_atomically(&path, b"{\"nvd\": {}}").unwrap();
        assert_eq!("{\"nvd\": {}}", fs::read_to_string(&path).unwrap());

        // No temporary file is left behind
        let names: Vec<_> = fs::read_dir(dir.path().join("2024"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(1, names.len());
    }
}
