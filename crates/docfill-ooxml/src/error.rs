//! Error types for OOXML operations

use thiserror::Error;

/// Errors that can occur while reading, editing or writing a Word package
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing XML content
    #[error("XML parsing error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    /// Required part not found in archive
    #[error("Required part not found: {0}")]
    MissingPart(String),

    /// Part content is not valid UTF-8 text
    #[error("Part {0} is not valid UTF-8")]
    Encoding(String),
}

impl OoxmlError {
    /// Wrap a quick-xml error with the name of the part being processed
    pub fn xml(part: impl Into<String>, source: impl Into<quick_xml::Error>) -> Self {
        Self::Xml {
            part: part.into(),
            source: source.into(),
        }
    }
}

/// Result type for OOXML operations
pub type Result<T> = std::result::Result<T, OoxmlError>;
