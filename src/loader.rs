//! Format-dispatched document loading and metadata enrichment.
//!
//! Each supported extension maps to a parser capability that turns raw file
//! bytes into text segments — one per logical document (whole file, or one
//! per notebook cell). Segments are then enriched into [`Document`]s
//! carrying the owning file's content digest and classification. New
//! formats are added by registering an entry in the dispatch table here,
//! never by branching in the orchestrator.

use std::path::Path;

use crate::error::IngestError;
use crate::extract;
use crate::identity;
use crate::models::{Category, DocMeta, Document};

/// A parser for one family of file formats.
trait SourceParser: Sync {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<String>, IngestError>;
}

struct PdfParser;
struct DocxParser;
struct NotebookParser;
struct TextParser;

impl SourceParser for PdfParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<String>, IngestError> {
        Ok(vec![extract::extract_pdf(bytes)?])
    }
}

impl SourceParser for DocxParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<String>, IngestError> {
        Ok(vec![extract::extract_docx(bytes)?])
    }
}

impl SourceParser for NotebookParser {
    /// One segment per notebook cell, joining the cell's source lines.
    fn parse(&self, bytes: &[u8]) -> Result<Vec<String>, IngestError> {
        let nb: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| IngestError::Load(format!("notebook: {}", e)))?;
        let cells = nb
            .get("cells")
            .and_then(|c| c.as_array())
            .ok_or_else(|| IngestError::Load("notebook: missing cells array".to_string()))?;

        let mut segments = Vec::new();
        for cell in cells {
            let source = match cell.get("source") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Array(lines)) => {
                    lines.iter().filter_map(|l| l.as_str()).collect::<String>()
                }
                _ => continue,
            };
            if !source.trim().is_empty() {
                segments.push(source);
            }
        }
        Ok(segments)
    }
}

impl SourceParser for TextParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<String>, IngestError> {
        // Lossy decoding so odd encodings degrade instead of failing the file.
        Ok(vec![String::from_utf8_lossy(bytes).into_owned()])
    }
}

/// Extensions classified as source code.
const CODE_EXTENSIONS: &[&str] = &[
    "py", "rs", "js", "ts", "java", "c", "h", "cpp", "go", "css", "scss",
];

/// Plain-text formats handled by the UTF-8 parser, classified as documentation.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "tex", "json", "xml", "yaml", "yml", "toml", "html", "properties", "http", "bib",
];

fn parser_for(ext: &str) -> Option<&'static dyn SourceParser> {
    match ext {
        "pdf" => Some(&PdfParser),
        "docx" => Some(&DocxParser),
        "ipynb" => Some(&NotebookParser),
        e if CODE_EXTENSIONS.contains(&e) || TEXT_EXTENSIONS.contains(&e) => Some(&TextParser),
        _ => None,
    }
}

/// Fixed classification table keyed by normalized extension.
pub fn classify(ext: &str) -> Category {
    if CODE_EXTENSIONS.contains(&ext) {
        Category::CodeSnippet
    } else {
        Category::Documentation
    }
}

/// Lowercased extension of a path, without the leading dot.
pub fn normalized_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Parses `bytes` according to the path's extension and enriches every
/// resulting segment into a [`Document`].
///
/// `source_id` is the digest of the whole file and is identical across all
/// documents one file produces. Reads nothing beyond the bytes it is given.
pub fn load_file(path: &Path, bytes: &[u8]) -> Result<Vec<Document>, IngestError> {
    let ext = normalized_extension(path);
    let parser = parser_for(&ext).ok_or_else(|| {
        let label = if ext.is_empty() {
            "(no extension)".to_string()
        } else {
            format!(".{}", ext)
        };
        IngestError::UnsupportedFormat(label)
    })?;

    let segments = parser.parse(bytes)?;
    let source_id = identity::digest_bytes(bytes);

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent_folder = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_type = format!(".{}", ext);
    let category = classify(&ext);

    Ok(segments
        .into_iter()
        .enumerate()
        .map(|(doc_index, content)| Document {
            content,
            meta: DocMeta {
                source_id: source_id.clone(),
                file_name: file_name.clone(),
                file_type: file_type.clone(),
                parent_folder: parent_folder.clone(),
                category,
                doc_index,
            },
        })
        .collect())
}
