//! Resolved field values and value files
//!
//! A value file is a flat JSON object mapping field identifiers to strings,
//! so a filled form can be saved and reloaded later.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::error::{DocfillError, Result};

/// Resolved values, ordered by field identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldValueSet {
    values: BTreeMap<String, String>,
}

impl FieldValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.values.insert(id.into(), value.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.values.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pairs in identifier order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Identifier/value pairs in the order substitution applies them
    pub fn replacements(&self) -> Vec<(&str, &str)> {
        self.iter().collect()
    }
}

impl FromIterator<(String, String)> for FieldValueSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Contents of a value file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFile {
    pub path: PathBuf,
    pub values: BTreeMap<String, String>,
}

impl ValueFile {
    /// Read a value file
    ///
    /// Every value must be a JSON string.
    pub fn load(path: &Path) -> Result<Self> {
        let load_error = |reason: String| DocfillError::DataLoad {
            path: path.to_path_buf(),
            reason,
        };

        let json = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let object: serde_json::Map<String, Value> =
            serde_json::from_str(&json).map_err(|e| load_error(e.to_string()))?;

        let mut values = BTreeMap::new();
        for (id, value) in object {
            match value {
                Value::String(s) => {
                    values.insert(id, s);
                }
                other => {
                    return Err(load_error(format!(
                        "value for \"{}\" must be a string, found {}",
                        id, other
                    )))
                }
            }
        }

        debug!(file = %path.display(), values = values.len(), "Loaded value file");
        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    /// Write `values` as pretty-printed JSON with 4-space indentation
    pub fn save(path: &Path, values: &FieldValueSet) -> Result<()> {
        let save_error = |reason: String| DocfillError::DataSave {
            path: path.to_path_buf(),
            reason,
        };

        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        values
            .serialize(&mut ser)
            .map_err(|e| save_error(e.to_string()))?;
        buf.push(b'\n');

        fs::write(path, buf).map_err(|e| save_error(e.to_string()))?;
        debug!(file = %path.display(), values = values.len(), "Saved value file");
        Ok(())
    }
}
