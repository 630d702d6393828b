//! Template discovery
//!
//! The registry lists the `.docx` templates of a directory and pairs each
//! one with its metadata file. Scanning never fails: problems become
//! [`ScanNotice`]s for the caller to show, and a template whose metadata is
//! missing or broken is still listed so the problem can be reported when
//! the user selects it.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{DocfillError, MetadataProblem, Result};
use crate::metadata::TemplateMetadata;

/// Name of the directory searched for templates
pub const TEMPLATES_DIR_NAME: &str = "templates";

/// Suffix of metadata files written for the Portuguese edition
pub const LEGACY_METADATA_SUFFIX: &str = "_modelo";

/// Find a `templates` directory in `cwd` or in one of its immediate children
///
/// Children are searched in name order.
pub fn find_templates_directory(cwd: &Path) -> Option<PathBuf> {
    let direct = cwd.join(TEMPLATES_DIR_NAME);
    if direct.is_dir() {
        return Some(direct);
    }

    let mut children: Vec<PathBuf> = fs::read_dir(cwd)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    children.sort();

    children
        .into_iter()
        .map(|child| child.join(TEMPLATES_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

/// State of a template's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataStatus {
    /// Definitions loaded
    Loaded(TemplateMetadata),
    /// No metadata file with a matching name
    Missing,
    /// A matching file exists but does not parse
    Invalid { path: PathBuf, reason: String },
}

/// A template file and its field metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDescriptor {
    /// Full path of the `.docx`
    pub path: PathBuf,
    /// File name, e.g. `certificate.docx`
    pub name: String,
    /// File stem, e.g. `certificate`
    pub base_name: String,
    pub metadata: MetadataStatus,
}

impl TemplateDescriptor {
    /// Loaded metadata, if any
    pub fn metadata(&self) -> Option<&TemplateMetadata> {
        match &self.metadata {
            MetadataStatus::Loaded(meta) => Some(meta),
            _ => None,
        }
    }

    /// Describe why this template cannot be used, if it cannot
    pub fn metadata_problem(&self) -> Option<MetadataProblem> {
        match &self.metadata {
            MetadataStatus::Loaded(_) => None,
            MetadataStatus::Missing => Some(MetadataProblem {
                template: self.name.clone(),
                reason: None,
            }),
            MetadataStatus::Invalid { path, reason } => Some(MetadataProblem {
                template: self.name.clone(),
                reason: Some(format!("{}: {}", file_name(path), reason)),
            }),
        }
    }

    /// Whether `name` designates this template (file name or base name)
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.base_name == name
    }
}

/// Something the user should know about a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanNotice {
    /// No templates directory configured or found
    NoTemplatesDirectory,
    /// The templates directory could not be listed
    Unreadable { dir: PathBuf, reason: String },
    /// The directory holds no `.docx` files
    NoTemplatesFound { dir: PathBuf },
}

impl fmt::Display for ScanNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanNotice::NoTemplatesDirectory => write!(
                f,
                "No templates directory found. Select the templates directory manually."
            ),
            ScanNotice::Unreadable { dir, reason } => {
                write!(f, "Could not read {}: {}", dir.display(), reason)
            }
            ScanNotice::NoTemplatesFound { dir } => {
                write!(f, "No .docx files found in {}", dir.display())
            }
        }
    }
}

/// Templates discovered in one directory
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates_dir: Option<PathBuf>,
    templates: Vec<TemplateDescriptor>,
    notices: Vec<ScanNotice>,
}

impl TemplateRegistry {
    /// Scan `templates_dir` for templates and `metadata_dirs` for metadata
    ///
    /// Metadata directories are read in order; on a file name clash the
    /// later directory wins. Missing metadata directories are skipped.
    pub fn scan(templates_dir: Option<&Path>, metadata_dirs: &[PathBuf]) -> Self {
        let Some(dir) = templates_dir else {
            return Self {
                notices: vec![ScanNotice::NoTemplatesDirectory],
                ..Self::default()
            };
        };

        let mut registry = Self {
            templates_dir: Some(dir.to_path_buf()),
            ..Self::default()
        };

        let files = match list_templates(dir) {
            Ok(files) => files,
            Err(e) => {
                warn!(dir = %dir.display(), "Could not list templates: {}", e);
                registry.notices.push(ScanNotice::Unreadable {
                    dir: dir.to_path_buf(),
                    reason: e.to_string(),
                });
                return registry;
            }
        };
        if files.is_empty() {
            registry.notices.push(ScanNotice::NoTemplatesFound {
                dir: dir.to_path_buf(),
            });
            return registry;
        }

        let index = MetadataIndex::load(metadata_dirs);
        registry.templates = files
            .into_iter()
            .map(|path| {
                let name = file_name(&path);
                let base_name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| name.clone());
                let metadata = index.status_for(&base_name);
                TemplateDescriptor {
                    path,
                    name,
                    base_name,
                    metadata,
                }
            })
            .collect();

        debug!(
            dir = %dir.display(),
            templates = registry.templates.len(),
            "Template scan complete"
        );
        registry
    }

    /// Directory that was scanned
    pub fn templates_dir(&self) -> Option<&Path> {
        self.templates_dir.as_deref()
    }

    /// All discovered templates, in file name order
    pub fn templates(&self) -> &[TemplateDescriptor] {
        &self.templates
    }

    /// Notices produced by the scan
    pub fn notices(&self) -> &[ScanNotice] {
        &self.notices
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Look up a template by file name or base name
    pub fn get(&self, name: &str) -> Option<&TemplateDescriptor> {
        self.templates.iter().find(|t| t.matches(name))
    }

    /// Resolve a user selection, keeping selection order and dropping
    /// repeated names
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<TemplateDescriptor>> {
        if names.is_empty() {
            return Err(DocfillError::NoTemplatesSelected);
        }

        let mut selected: Vec<TemplateDescriptor> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let template = self
                .get(name)
                .ok_or_else(|| DocfillError::UnknownTemplate(name.to_string()))?;
            if !selected.iter().any(|t| t.path == template.path) {
                selected.push(template.clone());
            }
        }
        Ok(selected)
    }
}

/// `.docx` files of a directory, sorted by name, without Word lock files
fn list_templates(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, "docx"))
        .filter(|path| !file_name(path).starts_with("~$"))
        .collect();
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Metadata files indexed by file name
#[derive(Debug, Default)]
struct MetadataIndex {
    entries: HashMap<String, MetadataStatus>,
}

impl MetadataIndex {
    fn load(dirs: &[PathBuf]) -> Self {
        let mut index = Self::default();

        for dir in dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(dir = %dir.display(), "Skipping metadata directory: {}", e);
                    continue;
                }
            };

            let mut paths: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && has_extension(path, "json"))
                .collect();
            paths.sort();

            for path in paths {
                let status = match TemplateMetadata::load(&path) {
                    Ok(meta) => MetadataStatus::Loaded(meta),
                    Err(DocfillError::Metadata { path, reason }) => {
                        warn!(file = %path.display(), "Ignoring metadata file: {}", reason);
                        MetadataStatus::Invalid { path, reason }
                    }
                    Err(e) => MetadataStatus::Invalid {
                        path: path.clone(),
                        reason: e.to_string(),
                    },
                };
                index.entries.insert(file_name(&path), status);
            }
        }

        index
    }

    /// Pair a template base name with `{base}.json`, then `{base}_modelo.json`
    fn status_for(&self, base_name: &str) -> MetadataStatus {
        let candidates = [
            format!("{}.json", base_name),
            format!("{}{}.json", base_name, LEGACY_METADATA_SUFFIX),
        ];

        // A loaded candidate beats an invalid one
        let found: Vec<&MetadataStatus> = candidates
            .iter()
            .filter_map(|c| self.entries.get(c))
            .collect();
        found
            .iter()
            .find(|s| matches!(s, MetadataStatus::Loaded(_)))
            .or_else(|| found.first())
            .map(|s| (*s).clone())
            .unwrap_or(MetadataStatus::Missing)
    }
}
