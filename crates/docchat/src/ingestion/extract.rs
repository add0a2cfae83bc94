//! Per-type content extractors producing raw text blocks

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::DocumentType;

/// External PDF text-extraction collaborator.
///
/// Kept behind a trait so tests can substitute a deterministic backend.
pub trait PdfTextExtractor: Send + Sync {
    /// Extract text blocks from raw PDF bytes
    fn extract_text(&self, filename: &str, data: &[u8]) -> Result<Vec<String>>;
}

/// PDF extraction via the `pdf-extract` crate
pub struct PdfExtractBackend;

impl PdfTextExtractor for PdfExtractBackend {
    fn extract_text(&self, filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let text = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::extraction(filename, e.to_string()))?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![text])
    }
}

/// Extract text blocks from raw bytes, dispatching on the document type.
///
/// The type was already selected at upload time; unsupported extensions never
/// reach this function.
pub fn extract_blocks(
    doc_type: DocumentType,
    filename: &str,
    data: &[u8],
    pdf: &dyn PdfTextExtractor,
) -> Result<Vec<String>> {
    match doc_type {
        DocumentType::Pdf => {
            let blocks = pdf.extract_text(filename, data)?;
            if blocks.is_empty() {
                return Err(Error::extraction(filename, "PDF contains no extractable text"));
            }
            Ok(blocks)
        }
        DocumentType::Text | DocumentType::Markdown => Ok(vec![decode_text(data)]),
        DocumentType::Csv => extract_csv(filename, data),
        DocumentType::Json => extract_json(filename, data),
    }
}

/// Decode as UTF-8, falling back to Latin-1. Latin-1 maps every byte to a
/// character, so decoding itself cannot fail; genuinely empty content is
/// caught downstream as "no extractable text".
fn decode_text(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(text) => text.to_string(),
        Err(_) => data.iter().map(|&b| b as char).collect(),
    }
}

/// One block for the header row, one per data row
fn extract_csv(filename: &str, data: &[u8]) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut blocks = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::extraction(filename, e.to_string()))?;
        let fields = record.iter().collect::<Vec<_>>().join(" | ");
        if i == 0 {
            blocks.push(format!("Headers: {}", fields));
        } else {
            blocks.push(format!("Row {}: {}", i, fields));
        }
    }

    if blocks.is_empty() {
        return Err(Error::extraction(filename, "CSV contains no rows"));
    }
    Ok(blocks)
}

/// Flatten JSON into `path.to.key: value` leaf blocks
fn extract_json(filename: &str, data: &[u8]) -> Result<Vec<String>> {
    let value: Value =
        serde_json::from_slice(data).map_err(|e| Error::extraction(filename, e.to_string()))?;

    let mut blocks = Vec::new();
    flatten_value("", &value, &mut blocks);
    Ok(blocks)
}

fn flatten_value(path: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                flatten_value(&child_path, child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_value(&format!("{}[{}]", path, index), child, out);
            }
        }
        Value::String(s) => out.push(leaf(path, s)),
        other => out.push(leaf(path, &other.to_string())),
    }
}

fn leaf(path: &str, rendered: &str) -> String {
    if path.is_empty() {
        rendered.to_string()
    } else {
        format!("{}: {}", path, rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubPdf(Vec<String>);

    impl PdfTextExtractor for StubPdf {
        fn extract_text(&self, _filename: &str, _data: &[u8]) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn utf8_text_is_one_block() {
        let blocks = extract_blocks(DocumentType::Text, "a.txt", "hello".as_bytes(), &StubPdf(vec![])).unwrap();
        assert_eq!(blocks, vec!["hello".to_string()]);
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        // 0xE9 is 'é' in Latin-1 but invalid as a standalone UTF-8 byte
        let data = vec![b'c', b'a', b'f', 0xE9];
        let blocks = extract_blocks(DocumentType::Text, "a.txt", &data, &StubPdf(vec![])).unwrap();
        assert_eq!(blocks, vec!["café".to_string()]);
    }

    #[test]
    fn csv_header_and_rows() {
        let data = "name,age\nAnn,30\n";
        let blocks = extract_blocks(DocumentType::Csv, "people.csv", data.as_bytes(), &StubPdf(vec![])).unwrap();
        assert_eq!(
            blocks,
            vec!["Headers: name | age".to_string(), "Row 1: Ann | 30".to_string()]
        );
    }

    #[test]
    fn empty_csv_fails() {
        let result = extract_blocks(DocumentType::Csv, "empty.csv", b"", &StubPdf(vec![]));
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }

    #[test]
    fn json_is_flattened_to_leaf_paths() {
        let data = r#"{"user": {"name": "Ann", "tags": ["a", "b"]}, "count": 2}"#;
        let blocks = extract_blocks(DocumentType::Json, "d.json", data.as_bytes(), &StubPdf(vec![])).unwrap();
        assert_eq!(
            blocks,
            vec![
                "count: 2".to_string(),
                "user.name: Ann".to_string(),
                "user.tags[0]: a".to_string(),
                "user.tags[1]: b".to_string(),
            ]
        );
    }

    #[test]
    fn malformed_json_fails() {
        let result = extract_blocks(DocumentType::Json, "bad.json", b"{not json", &StubPdf(vec![]));
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }

    #[test]
    fn pdf_with_no_text_fails() {
        let result = extract_blocks(DocumentType::Pdf, "scan.pdf", b"%PDF", &StubPdf(vec![]));
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }

    #[test]
    fn pdf_blocks_pass_through() {
        let stub = StubPdf(vec!["page one".to_string(), "page two".to_string()]);
        let blocks = extract_blocks(DocumentType::Pdf, "doc.pdf", b"%PDF", &stub).unwrap();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn pdf_backend_failure_is_a_single_extraction_error() {
        let err = extract_blocks(
            DocumentType::Pdf,
            "broken.pdf",
            b"not a pdf at all",
            &PdfExtractBackend,
        )
        .unwrap_err();

        match err {
            Error::Extraction { filename, message } => {
                assert_eq!(filename, "broken.pdf");
                // The cause is the parser's message, not a nested error chain
                assert!(!message.contains("Internal error"));
                assert!(!message.contains("Failed to extract"));
            }
            other => panic!("expected Extraction, got {:?}", other),
        }
    }
}
