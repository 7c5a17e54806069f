//! # RadImpress Extract
//!
//! Turns a reference document (`.docx`) into plain text suitable for
//! embedding in a system prompt.
//!
//! Extraction runs in two tiers:
//!
//! 1. **Fast**: all body text in document order with tabs and line breaks
//!    preserved. Used whenever it yields any non-whitespace text.
//! 2. **Structured**: a banner, headings marked with `#` and underlined,
//!    short emphatic paragraphs promoted to `###` pseudo-headings, and every
//!    table appended at the end as ` | ` separated rows.
//!
//! [`extract`] never fails: a missing file or an unreadable document yields
//! an empty string and a warning in the log.

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixture;
mod ooxml;
mod package;
mod structured;

use radimpress_core::error::ExtractError;
use std::path::Path;
use tracing::{debug, warn};

use package::Package;

/// Which tier produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Fast,
    Structured,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Fast => "fast",
            Method::Structured => "structured",
        }
    }
}

/// Extracted document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub method: Method,
}

/// Extract the text of the `.docx` at `path`.
///
/// Returns an empty string when the file is missing or cannot be read as a
/// document.
pub fn extract(path: &Path) -> String {
    if !path.exists() {
        debug!(path = %path.display(), "No reference document");
        return String::new();
    }

    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Error reading reference document");
            return String::new();
        }
    };

    match extract_bytes(&bytes) {
        Ok(extraction) => {
            debug!(
                path = %path.display(),
                method = extraction.method.as_str(),
                chars = extraction.text.chars().count(),
                "Reference document extracted"
            );
            extraction.text
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Error extracting reference document");
            String::new()
        }
    }
}

/// Extract text from in-memory `.docx` bytes.
pub fn extract_bytes(bytes: &[u8]) -> Result<Extraction, ExtractError> {
    let package = Package::open(bytes)?;

    match ooxml::flat_text(&package.document_xml) {
        Ok(text) if !text.trim().is_empty() => {
            return Ok(Extraction {
                text: text.trim().to_string(),
                method: Method::Fast,
            });
        }
        Ok(_) => debug!("Fast extraction found no text, using structured extraction"),
        Err(e) => warn!(error = %e, "Fast extraction failed, using structured extraction"),
    }

    let blocks = ooxml::parse_body(&package.document_xml)?;
    let styles = match package.styles_xml.as_deref().map(ooxml::style_names) {
        Some(Ok(names)) => names,
        Some(Err(e)) => {
            warn!(error = %e, "Unreadable styles part, headings fall back to style ids");
            Default::default()
        }
        None => Default::default(),
    };

    Ok(Extraction {
        text: structured::render(&blocks, &styles),
        method: Method::Structured,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_tier_used_when_text_present() {
        let body = format!(
            "{}{}",
            fixture::p("Fleischner guidance applies."),
            fixture::table(&[&["Size", "Follow-up"]])
        );
        let extraction = extract_bytes(&fixture::docx(&body)).unwrap();
        assert_eq!(extraction.method, Method::Fast);
        assert!(extraction.text.starts_with("Fleischner guidance applies."));
        assert!(extraction.text.contains("Size"));
        assert!(extraction.text.ends_with("Follow-up"));
    }

    #[test]
    fn structured_tier_when_fast_text_is_empty() {
        let body = format!(
            "{}{}",
            fixture::blank(),
            fixture::table(&[&["", ""]])
        );
        let extraction = extract_bytes(&fixture::docx(&body)).unwrap();
        assert_eq!(extraction.method, Method::Structured);
        assert!(extraction.text.starts_with(&"=".repeat(80)));
        assert!(extraction.text.contains("REFERENCE DOCUMENT - COMPLETE CONTENT"));
        assert!(extraction.text.contains("TABLES FROM DOCUMENT"));
        assert!(extraction.text.contains("[Table 1]"));
        // The only row is blank and skipped.
        assert!(extraction.text.ends_with("[Table 1]\n"));
    }

    #[test]
    fn invalid_bytes_are_an_error() {
        assert!(extract_bytes(b"not a zip").is_err());
    }

    #[test]
    fn missing_file_yields_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(extract(&dir.path().join("absent.docx")), "");
    }

    #[test]
    fn corrupt_file_yields_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"PK\x03\x04 truncated").unwrap();
        assert_eq!(extract(&path), "");
    }

    #[test]
    fn extracts_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.docx");
        let body = format!(
            "{}{}",
            fixture::styled("Heading1", "Lung-RADS"),
            fixture::p("Category 2: benign appearance.")
        );
        std::fs::write(&path, fixture::docx_with_styles(&body, fixture::HEADING_STYLES)).unwrap();
        assert_eq!(extract(&path), "Lung-RADS\n\nCategory 2: benign appearance.");
    }
}
