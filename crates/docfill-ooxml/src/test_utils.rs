//! Shared test utilities for docfill crates
//!
//! Builds small but valid `.docx` packages in memory so tests can exercise
//! the body, table, header and footer paths without fixture files.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

use crate::archive::OoxmlArchive;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Builder for in-memory DOCX packages
///
/// # Example
/// ```ignore
/// use docfill_ooxml::test_utils::DocxBuilder;
/// let docx = DocxBuilder::new()
///     .paragraph("Hello [name]")
///     .header("<w:p><w:r><w:t>[title]</w:t></w:r></w:p>")
///     .build();
/// ```
#[derive(Debug, Default, Clone)]
pub struct DocxBuilder {
    body: String,
    header: Option<String>,
    footer: Option<String>,
    omitted: Vec<String>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw body XML (paragraphs, tables)
    pub fn body(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    /// Append a single-run paragraph with the given text
    pub fn paragraph(self, text: &str) -> Self {
        let xml = format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", xml_text(text));
        self.body(&xml)
    }

    /// Set the default header content (raw paragraph XML)
    pub fn header(mut self, xml: &str) -> Self {
        self.header = Some(xml.to_string());
        self
    }

    /// Set the default footer content (raw paragraph XML)
    pub fn footer(mut self, xml: &str) -> Self {
        self.footer = Some(xml.to_string());
        self
    }

    /// Leave a part out of the package while keeping its references
    pub fn omit_part(mut self, path: &str) -> Self {
        self.omitted.push(path.to_string());
        self
    }

    /// Build the package bytes
    pub fn build(&self) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(&mut buffer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for (path, contents) in self.parts() {
            if self.omitted.iter().any(|o| o == &path) {
                continue;
            }
            zip.start_file(path.as_str(), options).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }

        zip.finish().unwrap();
        buffer.into_inner()
    }

    fn parts(&self) -> Vec<(String, String)> {
        let mut overrides = String::from(
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        );
        let mut rels = String::new();
        let mut sect_refs = String::new();

        if self.header.is_some() {
            overrides.push_str(r#"<Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#);
            rels.push_str(r#"<Relationship Id="rIdH1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>"#);
            sect_refs.push_str(r#"<w:headerReference w:type="default" r:id="rIdH1"/>"#);
        }
        if self.footer.is_some() {
            overrides.push_str(r#"<Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#);
            rels.push_str(r#"<Relationship Id="rIdF1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>"#);
            sect_refs.push_str(r#"<w:footerReference w:type="default" r:id="rIdF1"/>"#);
        }

        let mut parts = vec![
            (
                "[Content_Types].xml".to_string(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{overrides}</Types>"#
                ),
            ),
            (
                "_rels/.rels".to_string(),
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#
                    .to_string(),
            ),
            (
                "word/_rels/document.xml.rels".to_string(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
                ),
            ),
            (
                "word/document.xml".to_string(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body>{body}<w:sectPr>{sect_refs}</w:sectPr></w:body></w:document>"#,
                    body = self.body
                ),
            ),
        ];

        if let Some(header) = &self.header {
            parts.push((
                "word/header1.xml".to_string(),
                format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:hdr xmlns:w="{W_NS}">{header}</w:hdr>"#),
            ));
        }
        if let Some(footer) = &self.footer {
            parts.push((
                "word/footer1.xml".to_string(),
                format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:ftr xmlns:w="{W_NS}">{footer}</w:ftr>"#),
            ));
        }

        parts
    }
}

fn xml_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Extract any part's content from a DOCX byte array
pub fn extract_file(docx: &[u8], path: &str) -> Option<String> {
    let cursor = Cursor::new(docx);
    let archive = OoxmlArchive::from_reader(cursor).unwrap();
    archive.get_string(path).unwrap()
}

/// Extract document.xml content from a DOCX byte array
pub fn extract_document_xml(docx: &[u8]) -> String {
    extract_file(docx, "word/document.xml").unwrap()
}
