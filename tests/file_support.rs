//! End-to-end coverage for the binary document formats (PDF, DOCX) and
//! multi-document files (notebooks).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use sha2::{Digest, Sha256};

fn mill_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("mill");
    path
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Minimal valid PDF containing `phrase`, with body offsets and xref built
/// up so pdf-extract can parse it.
fn minimal_pdf_with_phrase(phrase: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET\n", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!("4 0 obj << /Length {} >> stream\n{}endstream endobj\n", stream.len(), stream)
            .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

/// Minimal docx (ZIP) whose word/document.xml holds one `w:t` run per
/// paragraph.
fn minimal_docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
            body
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

fn setup_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    fs::create_dir_all(root.join("config")).unwrap();
    fs::create_dir_all(root.join("raw")).unwrap();

    let config_content = format!(
        r#"[source]
root = "{}/raw"

[chunking]
chunk_size = 500
chunk_overlap = 50

[store]
registry_path = "{}/processed/registry.json"
chunks_dir = "{}/processed/chunks"
"#,
        root.display(),
        root.display(),
        root.display()
    );
    let config_path = root.join("config/mill.toml");
    fs::write(&config_path, config_content).unwrap();
    (tmp, config_path)
}

fn run_mill(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = mill_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run mill binary at {:?}: {}", binary, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn read_chunk(config_path: &Path, name: &str) -> serde_json::Value {
    let root = config_path.parent().unwrap().parent().unwrap();
    let payload = fs::read_to_string(root.join("processed/chunks").join(name)).unwrap();
    serde_json::from_str(&payload).unwrap()
}

#[test]
fn test_pdf_is_extracted_and_chunked() {
    let (_tmp, config_path) = setup_env();
    let root = config_path.parent().unwrap().parent().unwrap();
    let pdf = minimal_pdf_with_phrase("corpus kiln phrase");
    fs::write(root.join("raw/report.pdf"), &pdf).unwrap();

    let (stdout, stderr, success) = run_mill(&config_path, &["run"]);
    assert!(success, "stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("done: 1"));

    let digest = sha256_hex(&pdf);
    let chunk = read_chunk(&config_path, &format!("{}-0-0.json", digest));
    assert!(
        chunk["content"].as_str().unwrap().contains("corpus"),
        "extracted text: {:?}",
        chunk["content"]
    );
    assert_eq!(chunk["metadata"]["file_type"], ".pdf");
    assert_eq!(chunk["metadata"]["category"], "documentation");
    assert_eq!(chunk["metadata"]["file_name"], "report.pdf");
}

#[test]
fn test_docx_is_extracted_and_chunked() {
    let (_tmp, config_path) = setup_env();
    let root = config_path.parent().unwrap().parent().unwrap();
    let docx = minimal_docx_with_paragraphs(&["office ingest phrase", "second paragraph"]);
    fs::write(root.join("raw/notes.docx"), &docx).unwrap();

    let (stdout, _, success) = run_mill(&config_path, &["run"]);
    assert!(success);
    assert!(stdout.contains("done: 1"));

    let digest = sha256_hex(&docx);
    let chunk = read_chunk(&config_path, &format!("{}-0-0.json", digest));
    let content = chunk["content"].as_str().unwrap();
    assert!(content.contains("office ingest phrase"));
    assert!(content.contains("second paragraph"));
    assert_eq!(chunk["metadata"]["file_type"], ".docx");
}

#[test]
fn test_notebook_cells_become_separate_documents() {
    let (_tmp, config_path) = setup_env();
    let root = config_path.parent().unwrap().parent().unwrap();
    let nb = r##"{"cells": [
        {"cell_type": "markdown", "source": ["# Analysis\n", "Intro text.\n"]},
        {"cell_type": "code", "source": ["import numpy as np\n", "np.ones(3)\n"]}
    ], "nbformat": 4}"##;
    fs::write(root.join("raw/lab.ipynb"), nb).unwrap();

    let (stdout, _, success) = run_mill(&config_path, &["run"]);
    assert!(success);
    assert!(stdout.contains("done: 1"));

    let digest = sha256_hex(nb.as_bytes());

    // One unit per cell, each restarting chunk numbering at 0.
    let cell0 = read_chunk(&config_path, &format!("{}-0-0.json", digest));
    let cell1 = read_chunk(&config_path, &format!("{}-1-0.json", digest));
    assert!(cell0["content"].as_str().unwrap().contains("# Analysis"));
    assert!(cell1["content"].as_str().unwrap().contains("import numpy"));
    assert_eq!(cell0["metadata"]["doc_index"], 0);
    assert_eq!(cell1["metadata"]["doc_index"], 1);
    assert_eq!(cell0["metadata"]["source_id"], cell1["metadata"]["source_id"]);

    // Registry counts chunks across all of the file's documents.
    let registry: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(root.join("processed/registry.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(registry["lab.ipynb"]["chunk_count"], 2);
    assert_eq!(registry["lab.ipynb"]["digest"], digest.as_str());
}

#[test]
fn test_corrupt_docx_fails_without_registry_entry() {
    let (_tmp, config_path) = setup_env();
    let root = config_path.parent().unwrap().parent().unwrap();
    fs::write(root.join("raw/broken.docx"), b"definitely not a zip").unwrap();

    let (stdout, _, success) = run_mill(&config_path, &["run"]);
    assert!(success);
    assert!(stdout.contains("failed: 1"));
    assert!(stdout.contains("broken.docx [load_failure]"));
    assert!(!root.join("processed/registry.json").exists() || {
        let registry: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(root.join("processed/registry.json")).unwrap(),
        )
        .unwrap();
        registry.get("broken.docx").is_none()
    });
}
