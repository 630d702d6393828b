//! Archive handling for DOCX files
//!
//! DOCX files are ZIP archives containing XML parts and resources.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use zip::read::ZipArchive;
use zip::write::ZipWriter;
use zip::CompressionMethod;

use crate::error::{OoxmlError, Result};

/// Path of the main document part
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Path of the main document relationships part
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

/// Represents an unpacked OOXML package
#[derive(Debug, Default)]
pub struct OoxmlArchive {
    /// All files in the archive, keyed by path
    files: HashMap<String, Vec<u8>>,
    /// Entry names in the order they appeared in the source archive
    order: Vec<String>,
}

impl OoxmlArchive {
    /// Open and unpack a DOCX file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut files = HashMap::new();
        let mut order = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            order.push(name.clone());
            files.insert(name, contents);
        }

        Ok(Self { files, order })
    }

    /// Get a file's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|v| v.as_slice())
    }

    /// Get a file's contents as a string
    pub fn get_string(&self, path: &str) -> Result<Option<String>> {
        match self.files.get(path) {
            Some(bytes) => {
                let s = std::str::from_utf8(bytes)
                    .map_err(|_| OoxmlError::Encoding(path.to_string()))?;
                Ok(Some(s.to_string()))
            }
            None => Ok(None),
        }
    }

    /// Get the main document content (word/document.xml)
    pub fn document_xml(&self) -> Result<&[u8]> {
        self.get(DOCUMENT_PART)
            .ok_or_else(|| OoxmlError::MissingPart(DOCUMENT_PART.to_string()))
    }

    /// Get the document relationships (word/_rels/document.xml.rels)
    pub fn document_rels_xml(&self) -> Option<&[u8]> {
        self.get(DOCUMENT_RELS_PART)
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// List all files in the archive, in archive order
    pub fn file_list(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Set or update a file's contents
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        let path = path.into();
        if !self.files.contains_key(&path) {
            self.order.push(path.clone());
        }
        self.files.insert(path, contents);
    }

    /// Set a file's contents from a string
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.set(path, contents.into().into_bytes());
    }

    /// Write the archive to a file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Write the archive to any writer
    ///
    /// Entries keep the order of the source archive; Word expects
    /// `[Content_Types].xml` first and some consumers rely on it.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated);

        for path in &self.order {
            let contents = &self.files[path];
            zip.start_file(path.as_str(), options)?;
            zip.write_all(contents)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Serialize the archive into an in-memory buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_file_operations() {
        let mut archive = OoxmlArchive::default();

        archive.set_string("test.xml", "<root/>");
        assert!(archive.contains("test.xml"));
        assert_eq!(
            archive.get_string("test.xml").unwrap(),
            Some("<root/>".to_string())
        );
        assert!(archive.get_string("missing.xml").unwrap().is_none());
    }

    #[test]
    fn test_missing_document_part() {
        let archive = OoxmlArchive::default();
        let err = archive.document_xml().unwrap_err();
        assert!(matches!(err, OoxmlError::MissingPart(ref p) if p == DOCUMENT_PART));
    }

    #[test]
    fn test_invalid_utf8_part() {
        let mut archive = OoxmlArchive::default();
        archive.set("bin.xml", vec![0xff, 0xfe, 0x00]);
        assert!(matches!(
            archive.get_string("bin.xml"),
            Err(OoxmlError::Encoding(_))
        ));
    }

    #[test]
    fn test_roundtrip_preserves_entry_order() {
        let mut archive = OoxmlArchive::default();
        archive.set_string("[Content_Types].xml", "<Types/>");
        archive.set_string("word/document.xml", "<w:document/>");
        archive.set_string("_rels/.rels", "<Relationships/>");

        let bytes = archive.to_bytes().unwrap();
        let restored = OoxmlArchive::from_reader(Cursor::new(bytes)).unwrap();

        let names: Vec<&str> = restored.file_list().collect();
        assert_eq!(
            names,
            vec!["[Content_Types].xml", "word/document.xml", "_rels/.rels"]
        );
        assert_eq!(restored.get("word/document.xml").unwrap(), b"<w:document/>");
    }

    #[test]
    fn test_set_existing_keeps_position() {
        let mut archive = OoxmlArchive::default();
        archive.set_string("a.xml", "1");
        archive.set_string("b.xml", "2");
        archive.set_string("a.xml", "3");

        let names: Vec<&str> = archive.file_list().collect();
        assert_eq!(names, vec!["a.xml", "b.xml"]);
        assert_eq!(archive.get("a.xml").unwrap(), b"3");
    }
}
