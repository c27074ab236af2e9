//! Per-file error taxonomy for the ingestion pipeline.
//!
//! Every failure while processing a single file maps onto one of these
//! variants. The orchestrator catches them at the per-file boundary,
//! records them in the run report, and keeps going; they never abort a run.
//! Setup-level failures (missing corpus root, unusable config) travel as
//! `anyhow` errors instead and do abort.

use std::fmt;

#[derive(Debug)]
pub enum IngestError {
    /// No parser is registered for the file's extension.
    UnsupportedFormat(String),
    /// The file could not be read from disk.
    Io(String),
    /// A parser rejected the file's content.
    Load(String),
    /// Invalid chunking parameters.
    Chunk(String),
    /// A chunk could not be written to the sink.
    Persist(String),
    /// The registry could not be updated.
    Registry(String),
}

impl IngestError {
    /// Stable machine-readable kind, used in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::UnsupportedFormat(_) => "unsupported_format",
            IngestError::Io(_) => "io_failure",
            IngestError::Load(_) => "load_failure",
            IngestError::Chunk(_) => "chunk_failure",
            IngestError::Persist(_) => "persist_failure",
            IngestError::Registry(_) => "registry_failure",
        }
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::UnsupportedFormat(ext) => {
                write!(f, "no parser registered for {}", ext)
            }
            IngestError::Io(e) => write!(f, "read failed: {}", e),
            IngestError::Load(e) => write!(f, "extraction failed: {}", e),
            IngestError::Chunk(e) => write!(f, "invalid chunking parameters: {}", e),
            IngestError::Persist(e) => write!(f, "chunk write failed: {}", e),
            IngestError::Registry(e) => write!(f, "registry write failed: {}", e),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<std::io::Error> for IngestError {
    fn from(e: std::io::Error) -> Self {
        IngestError::Io(e.to_string())
    }
}
