//! # docfill-ooxml
//!
//! OOXML (Office Open XML) package access for docfill.
//!
//! This crate provides functionality to:
//! - Read and write DOCX packages
//! - Locate the text-bearing parts (body, headers, footers)
//! - Replace literal placeholder strings paragraph by paragraph
//!
//! ## Example: Filling a Template
//!
//! ```no_run
//! use docfill_ooxml::WordPackage;
//!
//! let mut package = WordPackage::open("letter.docx")?;
//! package.substitute(&[("[name]", "Ana Lima"), ("[date]", "01/02/2025")])?;
//! package.save("letter_Ana_Lima.docx")?;
//! # Ok::<(), docfill_ooxml::OoxmlError>(())
//! ```

pub mod archive;
pub mod error;
pub mod package;
pub mod relationships;
pub mod substitute;
pub mod test_utils;

pub use archive::OoxmlArchive;
pub use error::{OoxmlError, Result};
pub use package::{PartKind, RegionText, SubstitutionSummary, TextPart, WordPackage};
pub use relationships::Relationships;
pub use substitute::{paragraph_texts, substitute_part, PartSubstitution};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
