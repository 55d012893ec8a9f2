use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use fxhash::FxHashMap;

use super::error::MetadataError;

/// # ExperimentMetadata
/// The settings of an experiment, as a flat key/value map. The metadata file is plain text with one
/// `key = value` pair per line; blank lines and lines starting with `#` are skipped.
/// A copy is written next to every acquired data file so each file documents its own conditions.
/// Entries are kept in no particular order; everything shown or written is sorted by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentMetadata {
    map: FxHashMap<String, String>
}

impl ExperimentMetadata {

    /// Read the metadata file at the given path
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        if !path.exists() {
            return Err(MetadataError::BadFilePath(path.to_path_buf()));
        }

        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let mut metadata = ExperimentMetadata::default();
        for (index, line) in contents.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match trimmed.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    metadata.set(key.trim(), value.trim());
                }
                _ => return Err(MetadataError::Malformed(index + 1, line.to_string()))
            }
        }

        Ok(metadata)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// One `key = value\n` string per entry, in no particular order
    pub fn lines(&self) -> Vec<String> {
        self.map.iter().map(|(k, v)| format!("{} = {}\n", k, v)).collect()
    }

    /// All entries, sorted by key
    pub fn sorted_lines(&self) -> Vec<String> {
        let mut lines = self.lines();
        lines.sort();
        lines
    }

    pub fn write(&self, path: &Path) -> Result<(), MetadataError> {
        let mut file = File::create(path)?;
        file.write_all(self.sorted_lines().concat().as_bytes())?;
        Ok(())
    }
}
