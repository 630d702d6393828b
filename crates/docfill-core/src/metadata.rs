//! Template metadata files
//!
//! A metadata file is a JSON record whose top-level `fields` collection maps
//! each placeholder identifier to its definition:
//!
//! ```json
//! {
//!   "fields": {
//!     "[student name]": { "label": "Student name", "type": "text", "required": true },
//!     "[shift]": { "label": "Shift", "type": "choice", "options": ["Morning", "Evening"] },
//!     "[date]": { "label": "Date", "type": "date" }
//!   }
//! }
//! ```
//!
//! Metadata written for the Portuguese edition of the tool uses `campos`,
//! `rotulo`, `tipo`, `obrigatorio` and `opcoes`, with type tags `texto`,
//! `radio` and `data`; both spellings are accepted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::{DocfillError, Result};
use crate::field::{FieldDefinition, FieldKind};

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(alias = "campos")]
    fields: BTreeMap<String, RawField>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    #[serde(default, alias = "rotulo")]
    label: Option<String>,
    #[serde(default, rename = "type", alias = "tipo")]
    kind: Option<String>,
    #[serde(default, alias = "obrigatorio")]
    required: bool,
    #[serde(default, alias = "opcoes")]
    options: Vec<String>,
    #[serde(default)]
    multiline: Option<bool>,
}

impl RawField {
    fn into_definition(self, id: String) -> FieldDefinition {
        let kind = match self.kind.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("text") | Some("texto") => FieldKind::Text {
                multiline: self.multiline.unwrap_or_else(|| is_long_text(&id)),
            },
            Some("choice") | Some("radio") | Some("select") => FieldKind::Choice {
                options: self.options,
            },
            Some("date") | Some("data") => FieldKind::Date,
            Some(other) => {
                warn!(field = %id, kind = other, "Unknown field type, treating as text");
                FieldKind::Text {
                    multiline: self.multiline.unwrap_or_else(|| is_long_text(&id)),
                }
            }
        };

        FieldDefinition {
            label: self.label.unwrap_or_else(|| id.clone()),
            id,
            kind,
            required: self.required,
        }
    }
}

/// Summary and abstract fields get a multi-line editor by default
fn is_long_text(id: &str) -> bool {
    id.contains("Resumo") || id.contains("abstract")
}

/// Field definitions loaded from one metadata file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMetadata {
    /// File the definitions came from
    pub source: PathBuf,
    /// Definitions, ordered by identifier
    pub fields: Vec<FieldDefinition>,
}

impl TemplateMetadata {
    /// Parse metadata from a JSON string
    pub fn from_json_str(source: impl Into<PathBuf>, json: &str) -> Result<Self> {
        let source = source.into();
        let raw: RawMetadata =
            serde_json::from_str(json).map_err(|e| DocfillError::Metadata {
                path: source.clone(),
                reason: e.to_string(),
            })?;

        let fields = raw
            .fields
            .into_iter()
            .map(|(id, field)| field.into_definition(id))
            .collect();

        Ok(Self { source, fields })
    }

    /// Read and parse a metadata file
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| DocfillError::Metadata {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(path, &json)
    }

    /// Identifiers of all fields
    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.id.as_str())
    }
}
