//! Package round-trip tests
//!
//! Open a `.docx` from disk, substitute, save, and reopen the result.

use std::fs;
use std::io::{Cursor, Write};

use docfill_ooxml::test_utils::{extract_document_xml, extract_file, DocxBuilder};
use docfill_ooxml::{OoxmlArchive, OoxmlError, PartKind, WordPackage};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Rebuild `docx` with an extra binary entry appended
fn with_media(docx: &[u8]) -> Vec<u8> {
    let mut archive = OoxmlArchive::from_reader(Cursor::new(docx)).unwrap();
    archive.set("word/media/image1.png", vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3]);
    archive.to_bytes().unwrap()
}

#[test]
fn test_save_and_reopen() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("template.docx");
    let output = dir.path().join("filled.docx");
    let docx = with_media(
        &DocxBuilder::new()
            .paragraph("Dear [name],")
            .footer("<w:p><w:r><w:t>[name] / [date]</w:t></w:r></w:p>")
            .build(),
    );
    fs::write(&template, &docx).unwrap();

    let mut package = WordPackage::open(&template).unwrap();
    let summary = package
        .substitute(&[("[date]", "01/02/2025"), ("[name]", "Ana")])
        .unwrap();
    package.save(&output).unwrap();

    assert_eq!(summary.occurrences, 3);
    assert_eq!(
        summary.parts_changed,
        vec!["word/document.xml".to_string(), "word/footer1.xml".to_string()]
    );

    let written = fs::read(&output).unwrap();
    assert!(extract_document_xml(&written).contains("Dear Ana,"));
    assert!(extract_file(&written, "word/footer1.xml")
        .unwrap()
        .contains("Ana / 01/02/2025"));

    // Template on disk is unchanged
    assert_eq!(fs::read(&template).unwrap(), docx);

    // Binary parts and entry order survive
    let reopened = WordPackage::open(&output).unwrap();
    let original = OoxmlArchive::from_reader(Cursor::new(&docx)).unwrap();
    assert_eq!(
        reopened.archive().get("word/media/image1.png"),
        original.get("word/media/image1.png")
    );
    let before: Vec<&str> = original.file_list().collect();
    let after: Vec<&str> = reopened.archive().file_list().collect();
    assert_eq!(before, after);
}

#[test]
fn test_region_texts_by_part() {
    let docx = DocxBuilder::new()
        .paragraph("Body [a]")
        .header("<w:p><w:r><w:t>Head [b]</w:t></w:r></w:p>")
        .build();
    let package = WordPackage::from_bytes(&docx).unwrap();

    let regions = package.region_texts().unwrap();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].kind, PartKind::Body);
    assert_eq!(regions[0].text, "Body [a]");
    assert_eq!(regions[1].kind, PartKind::Header);
    assert_eq!(regions[1].part, "word/header1.xml");
}

#[test]
fn test_not_a_package() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.docx");
    fs::write(&path, b"plain text, not a zip").unwrap();

    assert!(matches!(
        WordPackage::open(&path),
        Err(OoxmlError::Archive(_))
    ));
    assert!(matches!(
        WordPackage::open(dir.path().join("absent.docx")),
        Err(OoxmlError::Io(_))
    ));
}

#[test]
fn test_zip_without_document_part() {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    zip.start_file("readme.txt", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"hello").unwrap();
    zip.finish().unwrap();

    let err = WordPackage::from_bytes(buffer.get_ref()).unwrap_err();
    assert!(err.to_string().contains("word/document.xml"));
}

#[test]
fn test_malformed_header_is_reported() {
    let docx = DocxBuilder::new()
        .paragraph("[x]")
        .header("<w:p><w:r><w:t>[x]</w:r></w:p>")
        .build();
    let mut package = WordPackage::from_bytes(&docx).unwrap();

    let err = package.substitute(&[("[x]", "1")]).unwrap_err();
    assert!(err.to_string().contains("word/header1.xml"));
}
