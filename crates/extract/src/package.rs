//! DOCX package access: a DOCX file is a zip archive whose main body lives
//! in `word/document.xml` and whose style definitions live in
//! `word/styles.xml`.

use radimpress_core::error::ExtractError;
use std::io::{Cursor, Read};
use zip::ZipArchive;
use zip::result::ZipError;

pub(crate) const DOCUMENT_PART: &str = "word/document.xml";
pub(crate) const STYLES_PART: &str = "word/styles.xml";

/// The XML parts needed for extraction.
pub(crate) struct Package {
    pub document_xml: String,
    pub styles_xml: Option<String>,
}

impl Package {
    pub fn open(bytes: &[u8]) -> Result<Self, ExtractError> {
        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Archive(e.to_string()))?;

        let document_xml = read_part(&mut archive, DOCUMENT_PART)?
            .ok_or_else(|| ExtractError::MissingPart(DOCUMENT_PART.into()))?;
        let styles_xml = read_part(&mut archive, STYLES_PART)?;

        Ok(Self {
            document_xml,
            styles_xml,
        })
    }
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>, ExtractError> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ExtractError::Archive(e.to_string())),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(Some(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;

    #[test]
    fn opens_document_and_styles() {
        let bytes = fixture::docx_with_styles(&fixture::p("Hello"), fixture::HEADING_STYLES);
        let package = Package::open(&bytes).unwrap();
        assert!(package.document_xml.contains("Hello"));
        assert!(package.styles_xml.unwrap().contains("heading 1"));
    }

    #[test]
    fn styles_are_optional() {
        let package = Package::open(&fixture::docx(&fixture::p("Hello"))).unwrap();
        assert!(package.styles_xml.is_none());
    }

    #[test]
    fn rejects_non_zip() {
        assert!(matches!(
            Package::open(b"plain text, not a docx"),
            Err(ExtractError::Archive(_))
        ));
    }

    #[test]
    fn rejects_zip_without_body() {
        let bytes = fixture::zip_with(&[("word/styles.xml", "<w:styles/>")]);
        assert!(matches!(
            Package::open(&bytes),
            Err(ExtractError::MissingPart(_))
        ));
    }
}
