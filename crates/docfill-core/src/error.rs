//! Error types for docfill

use std::fmt;
use std::path::PathBuf;

use docfill_ooxml::OoxmlError;
use thiserror::Error;

/// Result type for docfill operations
pub type Result<T> = std::result::Result<T, DocfillError>;

/// A selected template that cannot be used because of its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataProblem {
    /// Template file name
    pub template: String,
    /// Parse failure, or `None` when no metadata file exists
    pub reason: Option<String>,
}

impl fmt::Display for MetadataProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{} ({})", self.template, reason),
            None => write!(f, "{}", self.template),
        }
    }
}

fn bullet_list<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| format!("\n- {}", item))
        .collect::<String>()
}

/// Errors that can occur while discovering templates, collecting values
/// or generating documents
#[derive(Error, Debug)]
pub enum DocfillError {
    // Discovery
    /// Metadata file exists but cannot be parsed
    #[error("Invalid metadata file {}: {reason}", .path.display())]
    Metadata { path: PathBuf, reason: String },

    /// Selected templates without usable field metadata (aggregated)
    #[error("Field metadata not found for:{}", bullet_list(.templates))]
    MissingMetadata { templates: Vec<MetadataProblem> },

    /// Selection names a template the registry does not know
    #[error("Template not found: {0}")]
    UnknownTemplate(String),

    /// Empty selection
    #[error("Select at least one template to continue")]
    NoTemplatesSelected,

    // Validation
    /// A value was given for a field no selected template uses
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Required fields left blank, listed by label
    #[error("Please fill in the required fields:{}", bullet_list(.labels))]
    MissingRequired { labels: Vec<String> },

    /// Fields referenced by a template that have no resolved value
    #[error("No value for fields used by the selected templates:{}", bullet_list(.fields))]
    UnresolvedFields { fields: Vec<String> },

    // Generation
    /// Opening, editing or writing one template failed
    #[error("Failed to generate from {template}: {source}")]
    Document {
        template: String,
        #[source]
        source: OoxmlError,
    },

    // Data load
    /// Value file is unreadable or malformed; the form is left as it was
    #[error("Could not load values from {}: {reason}", .path.display())]
    DataLoad { path: PathBuf, reason: String },

    /// Value file could not be written
    #[error("Could not save values to {}: {reason}", .path.display())]
    DataSave { path: PathBuf, reason: String },

    // Configuration
    /// Settings file is unreadable or invalid
    #[error("Configuration error in {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocfillError {
    /// Whether the error stems from user input rather than the environment
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DocfillError::MissingRequired { .. }
                | DocfillError::UnknownField(_)
                | DocfillError::NoTemplatesSelected
                | DocfillError::UnknownTemplate(_)
        )
    }
}
