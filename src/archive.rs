// Copyright 2026 TagSense Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Durable storage of exported record files.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::record::{self, Record};
use crate::store::RecordStore;

/// Base name for exported files; a numeric suffix is scanned until a free
/// name is found.
const EXPORT_BASE: &str = "test";
const EXPORT_EXTENSION: &str = ".csv";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O fault: {0}")]
    Io(#[from] std::io::Error),
}

/// Export directory manager.
pub struct FileArchive {
    dir: PathBuf,
}

impl FileArchive {
    /// Open (creating if needed) the archive directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        info!("archive directory: {:?}", dir);
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of the stored files. Sorted for stable display; callers must
    /// not read meaning into the order.
    pub fn list(&self) -> Result<Vec<String>, ArchiveError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// First free export name: `test1.csv`, then `test2.csv`, and so on.
    pub fn next_export_name(&self) -> String {
        let mut suffix = 1u32;
        loop {
            let name = format!("{EXPORT_BASE}{suffix}{EXPORT_EXTENSION}");
            if !self.dir.join(&name).exists() {
                return name;
            }
            suffix += 1;
        }
    }

    /// Write one blob under the given name, returning its path.
    pub fn write(&self, name: &str, contents: &[u8]) -> Result<PathBuf, ArchiveError> {
        let path = self.dir.join(name);
        fs::write(&path, contents)?;
        info!("saved {:?} ({} bytes)", path, contents.len());
        Ok(path)
    }

    /// Re-read one stored file. Header lines are skipped; a corrupt line is
    /// rejected and logged, sibling lines still come through.
    pub fn read_records(&self, name: &str) -> Result<Vec<Record>, ArchiveError> {
        let text = fs::read_to_string(self.dir.join(name))?;
        let mut records = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.contains("id") {
                continue;
            }
            match record::decode_stored_line(line) {
                Ok(decoded) => records.push(decoded),
                Err(err) => warn!("skipping line in {}: {}", name, err),
            }
        }
        Ok(records)
    }
}

/// Export workflow: collect the selected records in store order, clear every
/// selection flag, encode, and write under a collision-free name.
pub fn export_selected(
    store: &RecordStore,
    archive: &FileArchive,
) -> Result<PathBuf, ArchiveError> {
    let selected = store.take_selected();
    let blob = record::encode_records(&selected);
    let name = archive.next_export_name();
    let path = archive.write(&name, blob.as_bytes())?;
    info!("exported {} records to {:?}", selected.len(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::decode_line;
    use tempfile::tempdir;

    fn sample_record() -> Record {
        decode_line("V:1.0 R:5.0 adc_1[V]:0.1 adc_4[V]:0.2 VDS[V]:0.3 I[pA]:4 I native:5£")
            .unwrap()
    }

    #[test]
    fn test_export_name_collision() {
        let dir = tempdir().unwrap();
        let archive = FileArchive::new(dir.path()).unwrap();

        assert_eq!(archive.next_export_name(), "test1.csv");

        archive.write("test1.csv", b"x").unwrap();
        assert_eq!(archive.next_export_name(), "test2.csv");

        archive.write("test2.csv", b"x").unwrap();
        assert_eq!(archive.next_export_name(), "test3.csv");
    }

    #[test]
    fn test_export_selected_writes_and_clears() {
        let dir = tempdir().unwrap();
        let archive = FileArchive::new(dir.path()).unwrap();
        let store = RecordStore::new();

        store.append(sample_record());
        store.append(sample_record());
        store.set_selected(1, true);

        let path = export_selected(&store, &archive).unwrap();
        assert!(path.ends_with("test1.csv"));
        assert!(store.snapshot().iter().all(|record| !record.selected));

        let restored = archive.read_records("test1.csv").unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].ipa, 4);
    }

    #[test]
    fn test_read_records_skips_header_and_corrupt_lines() {
        let dir = tempdir().unwrap();
        let archive = FileArchive::new(dir.path()).unwrap();

        let contents = "id,CodVersion,r,v1,v2,vds,ipA,nativeValue\n\
                        2024-03-01 10:00:00,1.05,12.5,0.1,0.2,0.3,4,5\n\
                        garbage line\n\
                        2024-03-01 10:00:03,1.05,inf,0.1,0.2,0.3,4,5\n";
        archive.write("test1.csv", contents.as_bytes()).unwrap();

        let records = archive.read_records("test1.csv").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].resistance, 12.5);
        assert!(records[1].resistance.is_infinite());
    }

    #[test]
    fn test_list_names() {
        let dir = tempdir().unwrap();
        let archive = FileArchive::new(dir.path()).unwrap();
        archive.write("test2.csv", b"x").unwrap();
        archive.write("test1.csv", b"x").unwrap();
        assert_eq!(archive.list().unwrap(), vec!["test1.csv", "test2.csv"]);
    }
}
