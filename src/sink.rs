//! Chunk sink: one JSON unit per chunk on disk.
//!
//! Names are `{source_id}-{doc_index}-{chunk_index}.json` — stable across
//! runs and collision-free across files and documents — so a downstream
//! embedding/indexing stage can consume units incrementally. When a file's
//! content changes, the units of its previous digest are removed after the
//! new ones are written.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

use crate::error::IngestError;
use crate::models::Chunk;

#[derive(Debug, Clone)]
pub struct ChunkSink {
    dir: PathBuf,
}

impl ChunkSink {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes every chunk of one file. Any failure leaves the file
    /// unregistered so the next run retries it.
    pub fn persist(&self, chunks: &[Chunk]) -> Result<(), IngestError> {
        if chunks.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir).map_err(|e| IngestError::Persist(e.to_string()))?;

        for chunk in chunks {
            let name = format!(
                "{}-{}-{}.json",
                chunk.meta.source_id, chunk.meta.doc_index, chunk.chunk_index
            );
            let body = json!({
                "content": chunk.content,
                "metadata": {
                    "source_id": chunk.meta.source_id,
                    "file_name": chunk.meta.file_name,
                    "file_type": chunk.meta.file_type,
                    "parent_folder": chunk.meta.parent_folder,
                    "category": chunk.meta.category,
                    "doc_index": chunk.meta.doc_index,
                    "chunk_index": chunk.chunk_index,
                }
            });
            let payload = serde_json::to_string_pretty(&body)
                .map_err(|e| IngestError::Persist(e.to_string()))?;
            std::fs::write(self.dir.join(&name), payload)
                .map_err(|e| IngestError::Persist(format!("{}: {}", name, e)))?;
        }
        Ok(())
    }

    /// Removes every unit belonging to `source_id` (an old digest being
    /// superseded).
    pub fn remove_source(&self, source_id: &str) -> Result<(), IngestError> {
        if !self.dir.exists() {
            return Ok(());
        }
        let prefix = format!("{}-", source_id);
        let entries =
            std::fs::read_dir(&self.dir).map_err(|e| IngestError::Persist(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| IngestError::Persist(e.to_string()))?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(&prefix) {
                std::fs::remove_file(entry.path())
                    .map_err(|e| IngestError::Persist(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Number of materialized units; zero when the directory is absent.
    pub fn count(&self) -> usize {
        std::fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().map(|x| x == "json").unwrap_or(false))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Deletes the whole sink directory. Used only by an explicit reset.
    pub fn purge(&self) -> Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)
                .with_context(|| format!("Failed to remove chunk sink: {}", self.dir.display()))?;
        }
        Ok(())
    }
}
