//! Append-only, numbered memory logs, one plain-text file per named registry.
//!
//! Each entry is wrapped in start/end markers carrying an incrementing
//! integer. The next number is one more than the highest marker found in the
//! existing log, so numbering is strictly increasing and gapless from 1, and
//! restarts at 1 after a registry is cleared.

use crate::error::MemoryError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const START_MARKER: &str = "--- START LOG #";
const END_MARKER: &str = "--- END LOG #";

/// Filesystem-backed store of memory registries.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    root: PathBuf,
}

impl MemoryStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn registry_path(&self, registry: &str) -> PathBuf {
        self.root.join(format!("memory_{registry}.txt"))
    }

    /// Appends one entry to the registry's log, numbering it max + 1.
    pub fn append(&self, registry: &str, text: &str) -> Result<(), MemoryError> {
        let path = self.registry_path(registry);
        let existing = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(MemoryError::Read {
                    registry: registry.to_string(),
                    message: e.to_string(),
                })
            }
        };
        let next = max_marker_number(&existing) + 1;

        let entry = format!("{START_MARKER}{next} ---\n{text}\n{END_MARKER}{next} ---\n\n");
        let write = |path: &Path| -> std::io::Result<()> {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(entry.as_bytes())
        };
        write(&path).map_err(|e| MemoryError::Write {
            registry: registry.to_string(),
            message: e.to_string(),
        })
    }

    /// Reconstructs the registry's history as human-readable text, one
    /// "History entry N: ..." block per logged entry in ascending order.
    /// A missing registry reads as empty history.
    pub fn read_history(&self, registry: &str) -> Result<String, MemoryError> {
        let path = self.registry_path(registry);
        let text = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(String::new()),
            Err(e) => {
                return Err(MemoryError::Read {
                    registry: registry.to_string(),
                    message: e.to_string(),
                })
            }
        };

        let mut entries = parse_entries(&text);
        entries.sort_by_key(|(num, _)| *num);

        let mut history = String::new();
        for (num, data) in entries {
            history.push_str(&format!("History entry {}: {}\n\n", num, data.trim()));
        }
        Ok(history)
    }

    /// Truncates the registry's log to empty. The registry name keeps its
    /// file association; numbering restarts at 1 on the next append.
    pub fn clear(&self, registry: &str) -> Result<(), MemoryError> {
        fs::write(self.registry_path(registry), "").map_err(|e| MemoryError::Write {
            registry: registry.to_string(),
            message: e.to_string(),
        })
    }

    /// Deletes every registry file under the store's root.
    pub fn clear_all(&self) -> Result<(), MemoryError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(MemoryError::Read {
                    registry: "*".to_string(),
                    message: e.to_string(),
                })
            }
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("memory_") && name.ends_with(".txt") {
                fs::remove_file(entry.path()).map_err(|e| MemoryError::Write {
                    registry: name.to_string(),
                    message: e.to_string(),
                })?;
            }
        }
        Ok(())
    }
}

/// Highest marker number present in a log, 0 for an empty or markerless log.
fn max_marker_number(log: &str) -> u64 {
    log.lines()
        .filter_map(|line| parse_marker(line, START_MARKER))
        .max()
        .unwrap_or(0)
}

fn parse_marker(line: &str, marker: &str) -> Option<u64> {
    let rest = line.strip_prefix(marker)?;
    let digits = rest.strip_suffix(" ---")?;
    digits.parse().ok()
}

/// Extracts (number, body) pairs from the marker-delimited log text.
fn parse_entries(log: &str) -> Vec<(u64, String)> {
    let mut entries = Vec::new();
    let mut current: Option<(u64, Vec<&str>)> = None;

    for line in log.lines() {
        if let Some(num) = parse_marker(line, START_MARKER) {
            current = Some((num, Vec::new()));
        } else if parse_marker(line, END_MARKER).is_some() {
            if let Some((num, body)) = current.take() {
                entries.push((num, body.join("\n")));
            }
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }
    entries
}
