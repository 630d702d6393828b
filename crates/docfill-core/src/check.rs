//! Template authoring checks
//!
//! Reports metadata fields whose placeholder text never appears in the
//! document, usually a typo on one side, and identifiers that contain one
//! another: replacing the shorter one first mangles the longer one.

use docfill_ooxml::{OoxmlError, WordPackage};
use tracing::debug;

use crate::error::{DocfillError, Result};
use crate::registry::TemplateDescriptor;

/// Findings for one template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateCheck {
    /// Template file name
    pub template: String,
    /// Field identifiers not found in any paragraph
    pub missing_placeholders: Vec<String>,
    /// `(shorter, longer)` identifier pairs where `longer` contains `shorter`
    pub overlapping: Vec<(String, String)>,
}

impl TemplateCheck {
    pub fn is_clean(&self) -> bool {
        self.missing_placeholders.is_empty() && self.overlapping.is_empty()
    }
}

/// Check one template against its metadata
pub fn check_template(template: &TemplateDescriptor) -> Result<TemplateCheck> {
    let meta = template.metadata().ok_or_else(|| DocfillError::MissingMetadata {
        templates: template.metadata_problem().into_iter().collect(),
    })?;

    let document_error = |source: OoxmlError| DocfillError::Document {
        template: template.name.clone(),
        source,
    };
    let package = WordPackage::open(&template.path).map_err(document_error)?;
    let regions = package.region_texts().map_err(document_error)?;

    let missing_placeholders: Vec<String> = meta
        .field_ids()
        .filter(|id| !id.is_empty())
        .filter(|id| !regions.iter().any(|r| r.text.contains(*id)))
        .map(str::to_string)
        .collect();

    let overlapping = overlapping_identifiers(meta.field_ids());

    debug!(
        template = %template.name,
        regions = regions.len(),
        missing = missing_placeholders.len(),
        "Checked template"
    );

    Ok(TemplateCheck {
        template: template.name.clone(),
        missing_placeholders,
        overlapping,
    })
}

/// Pairs of distinct identifiers where the first is a substring of the second
pub fn overlapping_identifiers<'a>(
    ids: impl IntoIterator<Item = &'a str>,
) -> Vec<(String, String)> {
    let ids: Vec<&str> = ids.into_iter().filter(|id| !id.is_empty()).collect();
    let mut pairs = Vec::new();
    for short in &ids {
        for long in &ids {
            if short != long && long.contains(*short) {
                pairs.push((short.to_string(), long.to_string()));
            }
        }
    }
    pairs.sort();
    pairs.dedup();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDefinition, FieldKind};
    use crate::metadata::TemplateMetadata;
    use crate::registry::MetadataStatus;
    use docfill_ooxml::test_utils::DocxBuilder;
    use std::fs;
    use std::path::Path;

    fn template(dir: &Path, docx: &[u8], ids: &[&str]) -> TemplateDescriptor {
        let path = dir.join("t.docx");
        fs::write(&path, docx).unwrap();
        TemplateDescriptor {
            path,
            name: "t.docx".to_string(),
            base_name: "t".to_string(),
            metadata: MetadataStatus::Loaded(TemplateMetadata {
                source: dir.join("t.json"),
                fields: ids
                    .iter()
                    .map(|id| FieldDefinition {
                        id: id.to_string(),
                        label: id.to_string(),
                        kind: FieldKind::Text { multiline: false },
                        required: false,
                    })
                    .collect(),
            }),
        }
    }

    #[test]
    fn test_reports_missing_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let docx = DocxBuilder::new()
            .paragraph("Name: [name]")
            .header("<w:p><w:r><w:t>[course]</w:t></w:r></w:p>")
            .build();
        let t = template(dir.path(), &docx, &["[course]", "[name]", "[nmae]"]);

        let check = check_template(&t).unwrap();
        assert_eq!(check.missing_placeholders, vec!["[nmae]"]);
        assert!(check.overlapping.is_empty());
        assert!(!check.is_clean());
    }

    #[test]
    fn test_split_runs_still_count_as_present() {
        let dir = tempfile::tempdir().unwrap();
        let docx = DocxBuilder::new()
            .body("<w:p><w:r><w:t>[na</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>me]</w:t></w:r></w:p>")
            .build();
        let t = template(dir.path(), &docx, &["[name]"]);

        assert!(check_template(&t).unwrap().is_clean());
    }

    #[test]
    fn test_missing_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = template(dir.path(), &DocxBuilder::new().build(), &[]);
        t.metadata = MetadataStatus::Missing;

        assert!(matches!(
            check_template(&t),
            Err(DocfillError::MissingMetadata { ref templates }) if templates.len() == 1
        ));
    }

    #[test]
    fn test_overlapping_identifiers() {
        let pairs = overlapping_identifiers(["name", "[name]", "[name] [surname]", ""]);
        assert_eq!(
            pairs,
            vec![
                ("[name]".to_string(), "[name] [surname]".to_string()),
                ("name".to_string(), "[name]".to_string()),
                ("name".to_string(), "[name] [surname]".to_string()),
            ]
        );
        assert!(overlapping_identifiers(["[a]", "[b]"]).is_empty());
    }
}
