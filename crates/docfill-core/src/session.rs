//! Pipeline context
//!
//! A [`Session`] carries settings and the discovered templates; selecting
//! templates from it yields a [`Selection`] that owns the merged field model
//! and the form being filled. Each stage takes the previous one by
//! reference, so a front end drives the whole run without shared state:
//!
//! ```ignore
//! let session = Session::discover(settings, &cwd);
//! let mut selection = session.select(&["certificate"])?;
//! selection.load_values(Path::new("answers.json"))?;
//! selection.fill_form(&mut renderer)?;
//! let values = selection.proceed_to_generation()?;
//! let report = selection.generate(&values, &output_dir, &mut ())?;
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::form::{ApplyOutcome, FormRenderer, FormState};
use crate::generate::{GenerationObserver, GenerationReport, Generator};
use crate::model::FieldModel;
use crate::registry::{TemplateDescriptor, TemplateRegistry};
use crate::settings::Settings;
use crate::values::{FieldValueSet, ValueFile};

/// Settings plus discovered templates
#[derive(Debug, Clone)]
pub struct Session {
    settings: Settings,
    cwd: PathBuf,
    registry: TemplateRegistry,
}

impl Session {
    /// Scan for templates as configured by `settings`
    pub fn discover(settings: Settings, cwd: &Path) -> Self {
        let templates_dir = settings.templates_dir(cwd);
        let metadata_dirs = settings.metadata_dirs(templates_dir.as_deref());
        let registry = TemplateRegistry::scan(templates_dir.as_deref(), &metadata_dirs);

        info!(
            templates = registry.templates().len(),
            dir = %templates_dir.as_deref().map(|d| d.display().to_string()).unwrap_or_default(),
            "Discovered templates"
        );

        Self {
            settings,
            cwd: cwd.to_path_buf(),
            registry,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Default output directory for this session
    pub fn output_dir(&self) -> PathBuf {
        self.settings.output_dir(&self.cwd)
    }

    /// Select templates by file name or base name and build their form
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Selection> {
        let templates = self.registry.select(names)?;
        let model = FieldModel::merge(&templates)?;
        let form = FormState::from_model(&model);
        debug!(
            templates = templates.len(),
            fields = model.len(),
            "Selection ready"
        );

        Ok(Selection {
            templates,
            model,
            form,
            generator: Generator::new(
                self.settings.generation.key_field.clone(),
                self.settings.generation.timestamp_format.clone(),
            ),
        })
    }
}

/// Selected templates with their merged field model and form
#[derive(Debug, Clone)]
pub struct Selection {
    templates: Vec<TemplateDescriptor>,
    model: FieldModel,
    form: FormState,
    generator: Generator,
}

impl Selection {
    pub fn templates(&self) -> &[TemplateDescriptor] {
        &self.templates
    }

    pub fn model(&self) -> &FieldModel {
        &self.model
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Override the key field chosen by settings
    pub fn set_key_field(&mut self, key_field: Option<String>) {
        self.generator.key_field = key_field;
    }

    /// Pre-fill the form from a value file
    ///
    /// On error the form is left as it was.
    pub fn load_values(&mut self, path: &Path) -> Result<ApplyOutcome> {
        let file = ValueFile::load(path)?;
        Ok(self.form.apply(&file.values))
    }

    /// Hand the form to a renderer for editing
    pub fn fill_form(&mut self, renderer: &mut dyn FormRenderer) -> Result<()> {
        renderer.fill(&self.model, &mut self.form)
    }

    /// Check required fields and resolve the form
    pub fn proceed_to_generation(&self) -> Result<FieldValueSet> {
        self.form.validate(&self.model)?;
        Ok(self.form.resolve())
    }

    /// Save the current form values
    pub fn save_values(&self, path: &Path) -> Result<()> {
        ValueFile::save(path, &self.form.resolve())
    }

    /// Generate every selected template into `output_dir`
    pub fn generate(
        &self,
        values: &FieldValueSet,
        output_dir: &Path,
        observer: &mut dyn GenerationObserver,
    ) -> Result<GenerationReport> {
        self.generator
            .generate(&self.templates, values, output_dir, observer)
    }
}
