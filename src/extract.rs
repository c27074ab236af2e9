//! Text extraction for binary document formats (PDF, DOCX).
//!
//! Loaders hand over raw file bytes; this module returns plain UTF-8 text.
//! Malformed input yields a `Load` error and the pipeline skips the file.

use std::io::Read;

use crate::error::IngestError;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extracts the text content of a PDF.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, IngestError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| IngestError::Load(format!("pdf: {}", e)))
}

/// Extracts the `w:t` text runs of a DOCX, one line per paragraph.
pub fn extract_docx(bytes: &[u8]) -> Result<String, IngestError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| IngestError::Load(format!("docx: {}", e)))?;
    let doc_xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    extract_text_runs(&doc_xml)
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, IngestError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| IngestError::Load(format!("docx: {}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| IngestError::Load(format!("docx: {}: {}", name, e)))?;
    if out.len() as u64 >= max_bytes {
        return Err(IngestError::Load(format!(
            "docx: ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn extract_text_runs(xml: &[u8]) -> Result<String, IngestError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_text_run => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(IngestError::Load(format!("docx: {}", e))),
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim_end().to_string())
}
