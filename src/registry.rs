//! Durable record of processed files.
//!
//! A JSON map from corpus-relative path to the digest, timestamp, and chunk
//! count recorded at the last successful processing. Loaded once per run and
//! flushed after every mutation so a crash never loses more than the file in
//! flight. A missing or unparseable store is treated as an empty registry
//! (first run); an I/O error on an existing store aborts setup.
//!
//! Keys are paths, compared against content digests: a renamed-but-unchanged
//! file is treated as new content.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub digest: String,
    pub processed_at: String,
    pub chunk_count: usize,
}

#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    state: BTreeMap<String, RegistryEntry>,
}

impl Registry {
    /// Loads the registry from its backing file, or starts empty.
    pub fn load(path: &Path) -> Result<Self> {
        let state = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read registry store: {}", path.display()))?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    /// True iff an entry exists for `rel_path` and its digest matches.
    pub fn is_processed(&self, rel_path: &str, digest: &str) -> bool {
        self.state
            .get(rel_path)
            .map(|entry| entry.digest == digest)
            .unwrap_or(false)
    }

    pub fn entry(&self, rel_path: &str) -> Option<&RegistryEntry> {
        self.state.get(rel_path)
    }

    /// Inserts or overwrites the entry for `rel_path`, stamping the current
    /// time, and flushes to disk. On a write failure the caller should treat
    /// the file as unprocessed so the next run retries it.
    pub fn register_file(
        &mut self,
        rel_path: &str,
        digest: &str,
        chunk_count: usize,
    ) -> Result<(), IngestError> {
        self.state.insert(
            rel_path.to_string(),
            RegistryEntry {
                digest: digest.to_string(),
                processed_at: chrono::Utc::now().to_rfc3339(),
                chunk_count,
            },
        );
        self.flush()
            .map_err(|e| IngestError::Registry(e.to_string()))
    }

    /// Removes all entries and deletes the backing file. Explicit reset only,
    /// never called implicitly.
    pub fn clear(&mut self) -> Result<()> {
        self.state.clear();
        if self.path.exists() {
            std::fs::remove_file(&self.path).with_context(|| {
                format!("Failed to remove registry store: {}", self.path.display())
            })?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    fn flush(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(&self.path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_store_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let registry = Registry::load(&tmp.path().join("registry.json")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn malformed_store_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.json");
        std::fs::write(&path, "{ this is not json").unwrap();
        let registry = Registry::load(&path).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn register_persists_across_loads() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state/registry.json");

        let mut registry = Registry::load(&path).unwrap();
        registry.register_file("docs/a.txt", "deadbeef", 3).unwrap();

        let reloaded = Registry::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.is_processed("docs/a.txt", "deadbeef"));
        let entry = reloaded.entry("docs/a.txt").unwrap();
        assert_eq!(entry.chunk_count, 3);
        assert!(!entry.processed_at.is_empty());
    }

    #[test]
    fn digest_mismatch_reports_unprocessed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.json");

        let mut registry = Registry::load(&path).unwrap();
        registry.register_file("a.txt", "deadbeef", 1).unwrap();
        assert!(!registry.is_processed("a.txt", "cafebabe"));
        assert!(!registry.is_processed("b.txt", "deadbeef"));
    }

    #[test]
    fn overwrite_replaces_digest_and_count() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.json");

        let mut registry = Registry::load(&path).unwrap();
        registry.register_file("a.txt", "aaaa", 2).unwrap();
        registry.register_file("a.txt", "bbbb", 5).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(!registry.is_processed("a.txt", "aaaa"));
        assert!(registry.is_processed("a.txt", "bbbb"));
        assert_eq!(registry.entry("a.txt").unwrap().chunk_count, 5);
    }

    #[test]
    fn clear_removes_entries_and_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.json");

        let mut registry = Registry::load(&path).unwrap();
        registry.register_file("a.txt", "aaaa", 2).unwrap();
        assert!(path.exists());

        registry.clear().unwrap();
        assert!(registry.is_empty());
        assert!(!path.exists());
    }
}
