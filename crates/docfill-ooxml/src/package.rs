//! Word package: open a `.docx`, edit its text regions, save it
//!
//! # Example
//!
//! ```no_run
//! use docfill_ooxml::WordPackage;
//!
//! let mut package = WordPackage::open("contract.docx")?;
//! let summary = package.substitute(&[("[client]", "ACME Ltd")])?;
//! println!("{} placeholders replaced", summary.occurrences);
//! package.save("contract_ACME.docx")?;
//! # Ok::<(), docfill_ooxml::OoxmlError>(())
//! ```

use std::io::Cursor;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::archive::{OoxmlArchive, DOCUMENT_PART};
use crate::error::{OoxmlError, Result};
use crate::relationships::{resolve_part_path, Relationships};
use crate::substitute::{paragraph_texts, substitute_part};

/// Kind of text-bearing part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// Main document body (paragraphs and tables)
    Body,
    /// A section header
    Header,
    /// A section footer
    Footer,
}

impl std::fmt::Display for PartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartKind::Body => write!(f, "body"),
            PartKind::Header => write!(f, "header"),
            PartKind::Footer => write!(f, "footer"),
        }
    }
}

/// A text-bearing part of the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPart {
    /// Part path inside the package (e.g. `word/header1.xml`)
    pub path: String,
    /// What the part holds
    pub kind: PartKind,
}

/// Text of one paragraph, tagged with the part it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionText {
    pub kind: PartKind,
    pub part: String,
    pub text: String,
}

/// Totals of a substitution pass over a whole package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionSummary {
    /// Parts that were rewritten
    pub parts_changed: Vec<String>,
    /// Paragraphs whose text changed
    pub paragraphs_changed: usize,
    /// Placeholder occurrences replaced
    pub occurrences: usize,
}

/// An opened Word document
#[derive(Debug)]
pub struct WordPackage {
    archive: OoxmlArchive,
}

impl WordPackage {
    /// Open a `.docx` from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_archive(OoxmlArchive::open(path)?)
    }

    /// Load a `.docx` from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_archive(OoxmlArchive::from_reader(Cursor::new(bytes))?)
    }

    /// Wrap an unpacked archive; fails when there is no main document part
    pub fn from_archive(archive: OoxmlArchive) -> Result<Self> {
        archive.document_xml()?;
        Ok(Self { archive })
    }

    /// Get a reference to the underlying archive
    pub fn archive(&self) -> &OoxmlArchive {
        &self.archive
    }

    /// Consume the package and return the underlying archive
    pub fn into_archive(self) -> OoxmlArchive {
        self.archive
    }

    /// List the body part followed by every header and footer part that a
    /// section references
    ///
    /// References that cannot be resolved (no rels part, unknown ID,
    /// missing part) are skipped. A part referenced by several sections is
    /// listed once.
    pub fn text_parts(&self) -> Result<Vec<TextPart>> {
        let mut parts = vec![TextPart {
            path: DOCUMENT_PART.to_string(),
            kind: PartKind::Body,
        }];

        let references = section_references(self.archive.document_xml()?)?;
        if references.is_empty() {
            return Ok(parts);
        }

        let rels = match self.archive.document_rels_xml() {
            Some(xml) => Relationships::parse(xml)?,
            None => {
                debug!("Document has section references but no relationships part");
                return Ok(parts);
            }
        };

        for (kind, id) in references {
            let Some(target) = rels.get_target(&id) else {
                debug!("Unresolved {} reference {}", kind, id);
                continue;
            };
            if target.is_external() {
                continue;
            }
            let path = resolve_part_path("word", &target.target);
            if !self.archive.contains(&path) {
                debug!("Skipping absent {} part {}", kind, path);
                continue;
            }
            if parts.iter().any(|p| p.path == path) {
                continue;
            }
            parts.push(TextPart { path, kind });
        }

        Ok(parts)
    }

    /// Text of every paragraph in every text part
    pub fn region_texts(&self) -> Result<Vec<RegionText>> {
        let mut regions = Vec::new();
        for part in self.text_parts()? {
            let xml = self.part_bytes(&part.path)?;
            for text in paragraph_texts(&part.path, xml)? {
                regions.push(RegionText {
                    kind: part.kind,
                    part: part.path.clone(),
                    text,
                });
            }
        }
        Ok(regions)
    }

    /// Replace placeholders in the body, headers and footers
    ///
    /// See [`substitute_part`] for the per-paragraph semantics. Parts without
    /// any match keep their original bytes.
    pub fn substitute<K, V>(&mut self, replacements: &[(K, V)]) -> Result<SubstitutionSummary>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut summary = SubstitutionSummary::default();

        for part in self.text_parts()? {
            let outcome = substitute_part(&part.path, self.part_bytes(&part.path)?, replacements)?;
            if let Some(xml) = outcome.xml {
                debug!(
                    part = %part.path,
                    occurrences = outcome.occurrences,
                    "Rewrote {} part",
                    part.kind
                );
                self.archive.set(part.path.clone(), xml);
                summary.parts_changed.push(part.path);
                summary.paragraphs_changed += outcome.paragraphs_changed;
                summary.occurrences += outcome.occurrences;
            }
        }

        Ok(summary)
    }

    /// Write the package to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.archive.write_to_file(path)
    }

    /// Serialize the package into bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.archive.to_bytes()
    }

    fn part_bytes(&self, path: &str) -> Result<&[u8]> {
        self.archive
            .get(path)
            .ok_or_else(|| OoxmlError::MissingPart(path.to_string()))
    }
}

/// Collect `w:headerReference` / `w:footerReference` IDs from section
/// properties, in document order
fn section_references(document_xml: &[u8]) -> Result<Vec<(PartKind, String)>> {
    let mut reader = Reader::from_reader(document_xml);
    reader.config_mut().trim_text(true);

    let mut references = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                let kind = match e.local_name().as_ref() {
                    b"headerReference" => Some(PartKind::Header),
                    b"footerReference" => Some(PartKind::Footer),
                    _ => None,
                };
                if let Some(kind) = kind {
                    let id = e
                        .attributes()
                        .filter_map(|a| a.ok())
                        .find(|a| a.key.local_name().as_ref() == b"id")
                        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()));
                    if let Some(id) = id {
                        references.push((kind, id));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(OoxmlError::xml(DOCUMENT_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::DocxBuilder;

    #[test]
    fn test_text_parts_include_headers_and_footers() {
        let docx = DocxBuilder::new()
            .body("<w:p><w:r><w:t>Body</w:t></w:r></w:p>")
            .header("<w:p><w:r><w:t>Head</w:t></w:r></w:p>")
            .footer("<w:p><w:r><w:t>Foot</w:t></w:r></w:p>")
            .build();
        let package = WordPackage::from_bytes(&docx).unwrap();

        let parts = package.text_parts().unwrap();
        let kinds: Vec<PartKind> = parts.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![PartKind::Body, PartKind::Header, PartKind::Footer]);
        assert_eq!(parts[1].path, "word/header1.xml");
        assert_eq!(parts[2].path, "word/footer1.xml");
    }

    #[test]
    fn test_absent_header_part_is_skipped() {
        let docx = DocxBuilder::new()
            .body("<w:p><w:r><w:t>Body</w:t></w:r></w:p>")
            .header("<w:p/>")
            .omit_part("word/header1.xml")
            .build();
        let package = WordPackage::from_bytes(&docx).unwrap();

        let parts = package.text_parts().unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].kind, PartKind::Body);
    }

    #[test]
    fn test_missing_document_part_is_error() {
        let mut archive = OoxmlArchive::default();
        archive.set_string("[Content_Types].xml", "<Types/>");
        let err = WordPackage::from_archive(archive).unwrap_err();
        assert!(matches!(err, OoxmlError::MissingPart(_)));
    }

    #[test]
    fn test_substitute_everywhere() {
        let docx = DocxBuilder::new()
            .body(
                "<w:p><w:r><w:t>Name: [n]</w:t></w:r></w:p>\
                 <w:tbl><w:tr><w:tc><w:p><w:r><w:t>[n]</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
            )
            .header("<w:p><w:r><w:t>Header [n]</w:t></w:r></w:p>")
            .footer("<w:p><w:r><w:t>Footer [n]</w:t></w:r></w:p>")
            .build();
        let mut package = WordPackage::from_bytes(&docx).unwrap();

        let summary = package.substitute(&[("[n]", "Ana")]).unwrap();
        assert_eq!(summary.occurrences, 4);
        assert_eq!(summary.parts_changed.len(), 3);

        let texts: Vec<String> = package
            .region_texts()
            .unwrap()
            .into_iter()
            .map(|r| r.text)
            .collect();
        assert_eq!(
            texts,
            vec!["Name: Ana", "Ana", "Header Ana", "Footer Ana"]
        );
    }

    #[test]
    fn test_no_match_keeps_every_part() {
        let docx = DocxBuilder::new()
            .body("<w:p><w:r><w:t>Static text</w:t></w:r></w:p>")
            .header("<w:p><w:r><w:t>Static header</w:t></w:r></w:p>")
            .build();
        let original = WordPackage::from_bytes(&docx).unwrap();
        let mut package = WordPackage::from_bytes(&docx).unwrap();

        let summary = package.substitute(&[("[missing]", "x")]).unwrap();
        assert_eq!(summary, SubstitutionSummary::default());

        for name in original.archive().file_list() {
            assert_eq!(original.archive().get(name), package.archive().get(name));
        }
    }

    #[test]
    fn test_shared_header_listed_once() {
        let docx = DocxBuilder::new()
            .body(
                r#"<w:p><w:pPr><w:sectPr><w:headerReference w:type="default" r:id="rIdH1"/></w:sectPr></w:pPr></w:p>"#,
            )
            .header("<w:p><w:r><w:t>[h]</w:t></w:r></w:p>")
            .build();
        let package = WordPackage::from_bytes(&docx).unwrap();

        let headers = package
            .text_parts()
            .unwrap()
            .into_iter()
            .filter(|p| p.kind == PartKind::Header)
            .count();
        assert_eq!(headers, 1);
    }
}
