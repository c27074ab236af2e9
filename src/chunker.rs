//! Recursive, boundary-preferring text chunker.
//!
//! Splits document text into [`Chunk`]s of at most `chunk_size` characters,
//! with consecutive chunks sharing up to `chunk_overlap` trailing characters.
//! Each document's splitting strategy is a ladder of separators tried in
//! priority order: source code prefers syntactic boundaries (class/function
//! headers, blank lines), prose prefers paragraphs, then lines, sentences,
//! whitespace, and finally raw characters.
//!
//! Separators are kept attached to the start of the following piece, so the
//! concatenation of all pieces reproduces the input text exactly; chunks
//! therefore reconstruct the original once the overlap is removed.
//!
//! All sizes are measured in characters and all slicing is char-boundary
//! safe, so multi-byte input never panics.

use crate::error::IngestError;
use crate::models::{Category, Chunk, DocMeta, Document};

const TEXT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];
const CODE_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

const PYTHON_SEPARATORS: &[&str] = &["\nclass ", "\ndef ", "\n\tdef ", "\n\n", "\n", " ", ""];
const RUST_SEPARATORS: &[&str] = &[
    "\nfn ", "\nconst ", "\nlet ", "\nif ", "\nwhile ", "\nfor ", "\nloop ", "\nmatch ", "\n\n",
    "\n", " ", "",
];
const JS_SEPARATORS: &[&str] = &[
    "\nfunction ", "\nconst ", "\nlet ", "\nvar ", "\nclass ", "\nif ", "\nfor ", "\nwhile ",
    "\nswitch ", "\ncase ", "\n\n", "\n", " ", "",
];
const JAVA_SEPARATORS: &[&str] = &[
    "\nclass ", "\npublic ", "\nprotected ", "\nprivate ", "\nstatic ", "\nif ", "\nfor ",
    "\nwhile ", "\nswitch ", "\ncase ", "\n\n", "\n", " ", "",
];
const C_SEPARATORS: &[&str] = &[
    "\nstruct ", "\ntypedef ", "\nvoid ", "\nint ", "\nif ", "\nfor ", "\nwhile ", "\nswitch ",
    "\ncase ", "\n\n", "\n", " ", "",
];
const GO_SEPARATORS: &[&str] = &[
    "\nfunc ", "\nvar ", "\nconst ", "\ntype ", "\nif ", "\nfor ", "\nswitch ", "\ncase ", "\n\n",
    "\n", " ", "",
];
const MARKDOWN_SEPARATORS: &[&str] = &["\n# ", "\n## ", "\n### ", "\n#### ", "\n\n", "\n", " ", ""];
const LATEX_SEPARATORS: &[&str] = &[
    "\n\\chapter{", "\n\\section{", "\n\\subsection{", "\n\\subsubsection{", "\n\n", "\n", " ", "",
];
const HTML_SEPARATORS: &[&str] = &[
    "<h1", "<h2", "<h3", "<div", "<section", "<p", "\n\n", "\n", " ", "",
];

/// Validated chunking parameters.
#[derive(Debug, Clone, Copy)]
pub struct SplitParams {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl SplitParams {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::Chunk("chunk_size must be > 0".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(IngestError::Chunk(format!(
                "chunk_overlap ({}) must be < chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

/// Separator ladder for one document, keyed by file type with a category
/// fallback.
fn separators_for(meta: &DocMeta) -> &'static [&'static str] {
    match meta.file_type.as_str() {
        ".py" => PYTHON_SEPARATORS,
        ".rs" => RUST_SEPARATORS,
        ".js" | ".ts" => JS_SEPARATORS,
        ".java" => JAVA_SEPARATORS,
        ".c" | ".h" | ".cpp" => C_SEPARATORS,
        ".go" => GO_SEPARATORS,
        ".md" => MARKDOWN_SEPARATORS,
        ".tex" => LATEX_SEPARATORS,
        ".html" => HTML_SEPARATORS,
        _ => match meta.category {
            Category::CodeSnippet => CODE_SEPARATORS,
            Category::Documentation => TEXT_SEPARATORS,
        },
    }
}

/// Splits every document into ordered chunks.
///
/// `chunk_index` restarts at 0 for each document and increases by 1; all
/// other metadata is copied unchanged from the parent. An empty document
/// yields no chunks; a document shorter than `chunk_size` yields exactly
/// one.
pub fn split_documents(documents: &[Document], params: &SplitParams) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for doc in documents {
        if doc.content.is_empty() {
            continue;
        }
        let pieces = split_text(&doc.content, separators_for(&doc.meta), params);
        for (chunk_index, content) in pieces.into_iter().enumerate() {
            chunks.push(Chunk {
                content,
                meta: doc.meta.clone(),
                chunk_index,
            });
        }
    }
    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_text(text: &str, separators: &[&str], params: &SplitParams) -> Vec<String> {
    if char_len(text) <= params.chunk_size {
        return vec![text.to_string()];
    }

    // First ladder separator present in the text; "" means character split.
    let (sep_idx, sep) = separators
        .iter()
        .enumerate()
        .find(|(_, s)| s.is_empty() || text.contains(*s))
        .map(|(i, s)| (i, *s))
        .unwrap_or((separators.len().saturating_sub(1), ""));

    if sep.is_empty() {
        return hard_split(text, params);
    }

    let rest = &separators[sep_idx + 1..];
    let mut atoms: Vec<String> = Vec::new();
    for piece in split_keep_separator(text, sep) {
        if char_len(piece) > params.chunk_size {
            atoms.extend(split_text(piece, rest, params));
        } else {
            atoms.push(piece.to_string());
        }
    }
    merge_atoms(atoms, params)
}

/// Splits before every occurrence of `sep`, keeping the separator attached
/// to the start of the following piece. Piece concatenation equals `text`.
fn split_keep_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let boundaries: Vec<usize> = text
        .match_indices(sep)
        .map(|(i, _)| i)
        .filter(|&i| i != 0)
        .collect();

    let mut pieces = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0;
    for b in boundaries {
        pieces.push(&text[start..b]);
        start = b;
    }
    pieces.push(&text[start..]);
    pieces
}

/// Greedily packs atoms into chunks of at most `chunk_size` characters,
/// carrying up to `chunk_overlap` trailing characters of each flushed chunk
/// into the next one. Every atom is already <= `chunk_size`.
fn merge_atoms(atoms: Vec<String>, params: &SplitParams) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: Vec<(String, usize)> = Vec::new();
    let mut total = 0usize;

    for atom in atoms {
        let alen = char_len(&atom);
        if total + alen > params.chunk_size && !window.is_empty() {
            chunks.push(window.iter().map(|(s, _)| s.as_str()).collect::<String>());
            while total > params.chunk_overlap
                || (total + alen > params.chunk_size && total > 0)
            {
                let (_, removed) = window.remove(0);
                total -= removed;
            }
        }
        total += alen;
        window.push((atom, alen));
    }

    if !window.is_empty() {
        chunks.push(window.iter().map(|(s, _)| s.as_str()).collect::<String>());
    }
    chunks
}

/// Last resort once the ladder is exhausted: fixed character windows of
/// `chunk_size`, advancing by `chunk_size - chunk_overlap`.
fn hard_split(text: &str, params: &SplitParams) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = params.chunk_size - params.chunk_overlap;
    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + params.chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}
