//! Configuration settings
//!
//! Read from `docfill.toml` (or `.docfill.toml`) in the working directory,
//! or from an explicit path:
//!
//! ```toml
//! [paths]
//! templates = "templates"
//! metadata = ["config"]
//! output = "out"
//!
//! [generation]
//! key_field = "[student name]"
//! timestamp_format = "%Y%m%d_%H%M%S"
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DocfillError, Result};
use crate::output::{DEFAULT_KEY_FIELD, DEFAULT_TIMESTAMP_FORMAT};
use crate::registry::find_templates_directory;

/// File names looked up in the working directory, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["docfill.toml", ".docfill.toml"];

/// Output directory used when none is configured
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub generation: GenerationSettings,
}

/// Where templates, metadata and output live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Templates directory; auto-discovered when unset
    pub templates: Option<PathBuf>,
    /// Metadata directories searched before the templates directory
    pub metadata: Vec<PathBuf>,
    /// Default output directory
    pub output: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            templates: None,
            metadata: vec![PathBuf::from("config")],
            output: None,
        }
    }
}

/// Output naming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Field whose value names generated files, `[nome do aluno]` by default
    pub key_field: Option<String>,
    /// chrono format for the fallback file name suffix
    pub timestamp_format: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            key_field: Some(DEFAULT_KEY_FIELD.to_string()),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load, validate and resolve a settings file
    pub fn load(path: &Path) -> Result<Self> {
        let config_error = |reason: String| DocfillError::Config {
            path: path.to_path_buf(),
            reason,
        };

        let text = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        let settings = Self::from_toml_str(&text).map_err(|e| config_error(e.to_string()))?;
        settings.validate().map_err(config_error)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        debug!(file = %path.display(), "Loaded settings");
        Ok(settings.resolve_paths(base))
    }

    /// Settings from the first config file found in `cwd`, or defaults
    /// resolved against `cwd`
    pub fn discover(cwd: &Path) -> Result<Self> {
        match Self::find_config_file(cwd) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default().resolve_paths(cwd)),
        }
    }

    /// First of [`CONFIG_FILE_NAMES`] present in `dir`
    pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Make relative paths relative to `base`
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };
        self.paths.templates = self.paths.templates.map(resolve);
        self.paths.metadata = self.paths.metadata.into_iter().map(resolve).collect();
        self.paths.output = self.paths.output.map(resolve);
        self
    }

    /// Reject settings that would fail later
    pub fn validate(&self) -> std::result::Result<(), String> {
        let format = &self.generation.timestamp_format;
        if format.trim().is_empty() {
            return Err("generation.timestamp_format must not be empty".to_string());
        }
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(format!(
                "generation.timestamp_format \"{}\" is not a valid date format",
                format
            ));
        }
        if let Some(key) = &self.generation.key_field {
            if key.is_empty() {
                return Err("generation.key_field must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Configured templates directory, else one found under `cwd`
    pub fn templates_dir(&self, cwd: &Path) -> Option<PathBuf> {
        self.paths
            .templates
            .clone()
            .or_else(|| find_templates_directory(cwd))
    }

    /// Metadata directories in lookup order, ending with the templates
    /// directory
    pub fn metadata_dirs(&self, templates_dir: Option<&Path>) -> Vec<PathBuf> {
        let mut dirs = self.paths.metadata.clone();
        if let Some(dir) = templates_dir {
            if !dirs.iter().any(|d| d == dir) {
                dirs.push(dir.to_path_buf());
            }
        }
        dirs
    }

    /// Configured output directory, else `cwd/output`
    pub fn output_dir(&self, cwd: &Path) -> PathBuf {
        self.paths
            .output
            .clone()
            .unwrap_or_else(|| cwd.join(DEFAULT_OUTPUT_DIR))
    }
}
