//! Document generation
//!
//! Every selected template is opened, its placeholders replaced across the
//! body, headers and footers, and the result saved under a derived name in
//! the output directory. Templates are processed one after the other; a
//! failing template is recorded in the [`GenerationReport`] and the rest
//! still run.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use docfill_ooxml::{OoxmlError, WordPackage};
use tracing::{debug, info, warn};

use crate::error::{DocfillError, Result};
use crate::output::{
    output_file_name, unique_output_path, DEFAULT_KEY_FIELD, DEFAULT_TIMESTAMP_FORMAT,
};
use crate::registry::TemplateDescriptor;
use crate::values::FieldValueSet;

/// Progress callbacks for a generation run
pub trait GenerationObserver {
    /// Called before template `index` (zero-based) of `total` is processed
    fn on_start(&mut self, index: usize, total: usize, template: &TemplateDescriptor) {
        let _ = (index, total, template);
    }

    /// Called once the template's outcome is known
    fn on_finish(&mut self, outcome: &GenerationOutcome) {
        let _ = outcome;
    }
}

/// Observer that ignores every event
impl GenerationObserver for () {}

/// What happened to one template
#[derive(Debug)]
pub enum GenerationOutcome {
    Generated {
        template: String,
        output: PathBuf,
        /// Placeholder occurrences replaced
        occurrences: usize,
    },
    Failed {
        template: String,
        error: DocfillError,
    },
}

impl GenerationOutcome {
    /// Template file name
    pub fn template(&self) -> &str {
        match self {
            GenerationOutcome::Generated { template, .. }
            | GenerationOutcome::Failed { template, .. } => template,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Generated { .. })
    }
}

/// Per-template outcomes, in processing order
#[derive(Debug, Default)]
pub struct GenerationReport {
    outcomes: Vec<GenerationOutcome>,
}

impl GenerationReport {
    pub fn outcomes(&self) -> &[GenerationOutcome] {
        &self.outcomes
    }

    /// Whether every template produced a document
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(GenerationOutcome::is_success)
    }

    /// Written files, as (template, output path)
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.outcomes.iter().filter_map(|o| match o {
            GenerationOutcome::Generated {
                template, output, ..
            } => Some((template.as_str(), output.as_path())),
            GenerationOutcome::Failed { .. } => None,
        })
    }

    /// Failures, as (template, error)
    pub fn failed(&self) -> impl Iterator<Item = (&str, &DocfillError)> {
        self.outcomes.iter().filter_map(|o| match o {
            GenerationOutcome::Failed { template, error } => Some((template.as_str(), error)),
            GenerationOutcome::Generated { .. } => None,
        })
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Generation options
#[derive(Debug, Clone)]
pub struct Generator {
    /// Field whose value names the output files
    pub key_field: Option<String>,
    /// Suffix format used when the key field is unset or blank
    pub timestamp_format: String,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            key_field: Some(DEFAULT_KEY_FIELD.to_string()),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl Generator {
    pub fn new(key_field: Option<String>, timestamp_format: impl Into<String>) -> Self {
        Self {
            key_field,
            timestamp_format: timestamp_format.into(),
        }
    }

    /// Generate one document per template into `output_dir`
    ///
    /// Fails without writing anything when a template lacks metadata or a
    /// field it uses has no value. After that, failures are per template.
    pub fn generate(
        &self,
        templates: &[TemplateDescriptor],
        values: &FieldValueSet,
        output_dir: &Path,
        observer: &mut dyn GenerationObserver,
    ) -> Result<GenerationReport> {
        check_ready(templates, values)?;
        fs::create_dir_all(output_dir)?;

        let replacements = values.replacements();
        let key = self
            .key_field
            .as_deref()
            .and_then(|field| values.get(field));
        if let (Some(field), None) = (self.key_field.as_deref(), key) {
            debug!(field = %field, "Key field not in values, using a timestamp");
        }

        let total = templates.len();
        let mut report = GenerationReport::default();

        for (index, template) in templates.iter().enumerate() {
            observer.on_start(index, total, template);

            let outcome = match self.generate_one(template, &replacements, key, output_dir) {
                Ok((output, occurrences)) => {
                    info!(
                        template = %template.name,
                        output = %output.display(),
                        occurrences,
                        "Generated document"
                    );
                    GenerationOutcome::Generated {
                        template: template.name.clone(),
                        output,
                        occurrences,
                    }
                }
                Err(error) => {
                    warn!(template = %template.name, "Generation failed: {}", error);
                    GenerationOutcome::Failed {
                        template: template.name.clone(),
                        error,
                    }
                }
            };

            observer.on_finish(&outcome);
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    fn generate_one(
        &self,
        template: &TemplateDescriptor,
        replacements: &[(&str, &str)],
        key: Option<&str>,
        output_dir: &Path,
    ) -> Result<(PathBuf, usize)> {
        let document_error = |source: OoxmlError| DocfillError::Document {
            template: template.name.clone(),
            source,
        };

        let mut package = WordPackage::open(&template.path).map_err(document_error)?;
        let summary = package.substitute(replacements).map_err(document_error)?;
        debug!(
            template = %template.name,
            parts = summary.parts_changed.len(),
            paragraphs = summary.paragraphs_changed,
            "Substitution complete"
        );

        let name = output_file_name(
            &template.base_name,
            key,
            &Local::now(),
            &self.timestamp_format,
        );
        let output = unique_output_path(output_dir, &name);
        package.save(&output).map_err(document_error)?;

        Ok((output, summary.occurrences))
    }
}

/// Every template has metadata and every field it uses has a value
fn check_ready(templates: &[TemplateDescriptor], values: &FieldValueSet) -> Result<()> {
    let problems: Vec<_> = templates
        .iter()
        .filter_map(TemplateDescriptor::metadata_problem)
        .collect();
    if !problems.is_empty() {
        return Err(DocfillError::MissingMetadata { templates: problems });
    }

    let unresolved: BTreeSet<&str> = templates
        .iter()
        .filter_map(TemplateDescriptor::metadata)
        .flat_map(|meta| meta.field_ids())
        .filter(|id| !values.contains(id))
        .collect();
    if !unresolved.is_empty() {
        return Err(DocfillError::UnresolvedFields {
            fields: unresolved.into_iter().map(str::to_string).collect(),
        });
    }

    Ok(())
}
