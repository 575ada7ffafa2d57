//! Document text extraction
//!
//! The document type is decided from the file name's extension alone. Text
//! types are decoded as UTF-8 with lossy replacement; PDF and DOCX go
//! through their parsers, each behind a cargo feature.

use crate::error::ExtractionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Accepted file extensions, lower-case with the leading dot
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".txt", ".md", ".csv"];

/// Kind of document, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Portable Document Format
    Pdf,
    /// Office Open XML word processing document
    Docx,
    /// Plain text
    Txt,
    /// Markdown
    Md,
    /// Comma separated values
    Csv,
}

impl DocumentKind {
    /// Lower-case name without the dot
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
            DocumentKind::Txt => "txt",
            DocumentKind::Md => "md",
            DocumentKind::Csv => "csv",
        }
    }

    /// Upper-case label used in user-facing messages
    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }

    /// Whether the document is read as plain UTF-8 text
    pub fn is_text(&self) -> bool {
        matches!(self, DocumentKind::Txt | DocumentKind::Md | DocumentKind::Csv)
    }

    /// Classify a file name by its extension (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::UnsupportedType` for anything outside
    /// [`SUPPORTED_EXTENSIONS`], including names without an extension
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractionError> {
        let extension = Path::new(file_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        match extension.as_str() {
            ".pdf" => Ok(DocumentKind::Pdf),
            ".docx" => Ok(DocumentKind::Docx),
            ".txt" => Ok(DocumentKind::Txt),
            ".md" => Ok(DocumentKind::Md),
            ".csv" => Ok(DocumentKind::Csv),
            _ => Err(ExtractionError::UnsupportedType {
                extension,
                supported: SUPPORTED_EXTENSIONS.join(", "),
            }),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Text pulled out of an uploaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Extracted text, already cut to the configured limit
    pub text: String,
    /// Detected document kind
    pub kind: DocumentKind,
}

/// Converts uploaded bytes into plain text
pub trait DocumentExtractor: Send + Sync {
    /// Extract text from `bytes`, using `file_name` to pick the parser
    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError>;
}

/// Default extractor
#[derive(Debug, Clone)]
pub struct FileReader {
    max_chars: usize,
}

impl FileReader {
    /// Create an extractor that keeps at most `max_chars` characters
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Character limit applied to extracted text
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}

impl Default for FileReader {
    fn default() -> Self {
        Self::new(50_000)
    }
}

impl DocumentExtractor for FileReader {
    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
        let kind = DocumentKind::from_file_name(file_name)?;

        let text = match kind {
            DocumentKind::Pdf => extract_pdf(bytes)?,
            DocumentKind::Docx => extract_docx(bytes)?,
            DocumentKind::Txt | DocumentKind::Md | DocumentKind::Csv => {
                String::from_utf8_lossy(bytes).into_owned()
            }
        };

        tracing::debug!(
            "Extracted {} characters from {} ({})",
            text.chars().count(),
            file_name,
            kind
        );

        Ok(ExtractedDocument {
            text: truncate_chars(text, self.max_chars),
            kind,
        })
    }
}

/// Cut `text` to at most `max_chars` characters, never splitting a code point
pub fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text,
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Failed(e.to_string()))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_bytes: &[u8]) -> Result<String, ExtractionError> {
    Err(ExtractionError::BackendMissing("PDF".to_string()))
}

#[cfg(feature = "docx")]
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    use std::io::Read;

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractionError::Failed(format!("not a DOCX archive: {}", e)))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Failed(format!("missing word/document.xml: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Failed(e.to_string()))?;

    docx_paragraphs(&xml)
}

#[cfg(not(feature = "docx"))]
fn extract_docx(_bytes: &[u8]) -> Result<String, ExtractionError> {
    Err(ExtractionError::BackendMissing("DOCX".to_string()))
}

/// Join the non-blank paragraphs of a `word/document.xml` body with newlines
#[cfg_attr(not(feature = "docx"), allow(dead_code))]
fn docx_paragraphs(xml: &str) -> Result<String, ExtractionError> {
    let paragraph = regex::Regex::new(r"(?s)<w:p[ >].*?</w:p>")
        .map_err(|e| ExtractionError::Failed(e.to_string()))?;
    let run_text = regex::Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>")
        .map_err(|e| ExtractionError::Failed(e.to_string()))?;

    let paragraphs: Vec<String> = paragraph
        .find_iter(xml)
        .map(|p| {
            run_text
                .captures_iter(p.as_str())
                .filter_map(|c| c.get(1))
                .map(|m| unescape_xml(m.as_str()))
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    Ok(paragraphs.join("\n"))
}

fn unescape_xml(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
