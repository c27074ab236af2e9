//! Core data types flowing through the ingestion pipeline.
//!
//! A discovered file is loaded into one or more [`Document`]s, each of which
//! is split into [`Chunk`]s. Metadata travels downward unchanged: every
//! chunk carries its parent document's [`DocMeta`] verbatim plus its own
//! `chunk_index`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A file found under the corpus root, before any processing.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the corpus root; the registry key.
    pub rel_path: String,
}

/// Derived classification of a source file, from a fixed table keyed by
/// extension. Source-code extensions classify as `CodeSnippet`; everything
/// else supported is `Documentation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CodeSnippet,
    Documentation,
}

/// Metadata attached to every document extracted from one source file.
///
/// `source_id` is the digest of the whole file's byte content and is
/// identical across all documents the file produces. `doc_index` is the
/// ordinal of the document within its file (page, cell) and makes sink
/// names collision-free under per-document chunk numbering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMeta {
    pub source_id: String,
    pub file_name: String,
    pub file_type: String,
    pub parent_folder: String,
    pub category: Category,
    pub doc_index: usize,
}

/// One logical text unit extracted from a source file. Immutable once
/// created; the loader owns it until it is handed to the chunker.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub meta: DocMeta,
}

/// A bounded slice of a document's text, the unit later embedded/indexed.
///
/// `chunk_index` is zero-based and contiguous within one document and
/// defines reassembly order.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: String,
    pub meta: DocMeta,
    pub chunk_index: usize,
}
