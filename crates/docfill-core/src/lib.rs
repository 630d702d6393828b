//! docfill-core - fill Word templates from a form
//!
//! Discovers `.docx` templates and their field metadata, merges the fields
//! of the selected templates into one form, validates and resolves the
//! values, and writes one filled document per template.
//!
//! # Example
//!
//! ```no_run
//! use docfill_core::{Session, Settings};
//! use std::path::Path;
//!
//! let cwd = Path::new(".");
//! let session = Session::discover(Settings::discover(cwd)?, cwd);
//! let mut selection = session.select(&["certificate"])?;
//! selection.form_mut().set("[student name]", "Ana Lima")?;
//!
//! let values = selection.proceed_to_generation()?;
//! let report = selection.generate(&values, &session.output_dir(), &mut ())?;
//! assert!(report.is_success());
//! # Ok::<(), docfill_core::DocfillError>(())
//! ```

pub mod check;
pub mod error;
pub mod field;
pub mod form;
pub mod generate;
pub mod metadata;
pub mod model;
pub mod output;
pub mod registry;
pub mod session;
pub mod settings;
pub mod values;

pub use check::{check_template, overlapping_identifiers, TemplateCheck};
pub use error::{DocfillError, MetadataProblem, Result};
pub use field::{FieldDefinition, FieldInput, FieldKind};
pub use form::{ApplyOutcome, FormRenderer, FormState};
pub use generate::{GenerationObserver, GenerationOutcome, GenerationReport, Generator};
pub use metadata::TemplateMetadata;
pub use model::FieldModel;
pub use output::{
    output_file_name, sanitize_key, unique_output_path, DEFAULT_KEY_FIELD, DEFAULT_TIMESTAMP_FORMAT,
};
pub use registry::{
    find_templates_directory, MetadataStatus, ScanNotice, TemplateDescriptor, TemplateRegistry,
};
pub use session::{Selection, Session};
pub use settings::Settings;
pub use values::{FieldValueSet, ValueFile};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
