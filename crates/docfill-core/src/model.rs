//! Unified field model for a template selection

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{DocfillError, Result};
use crate::field::FieldDefinition;
use crate::registry::TemplateDescriptor;

/// Union of the field definitions of every selected template
///
/// Identifiers shared by several templates collapse into one field; the
/// definition from the template selected last wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldModel {
    fields: BTreeMap<String, FieldDefinition>,
}

impl FieldModel {
    /// Merge the definitions of `selected`, in selection order
    ///
    /// Fails with every template that lacks usable metadata, not just the
    /// first one.
    pub fn merge(selected: &[TemplateDescriptor]) -> Result<Self> {
        let problems: Vec<_> = selected
            .iter()
            .filter_map(TemplateDescriptor::metadata_problem)
            .collect();
        if !problems.is_empty() {
            return Err(DocfillError::MissingMetadata { templates: problems });
        }

        let mut fields = BTreeMap::new();
        for template in selected {
            let Some(meta) = template.metadata() else {
                continue;
            };
            for def in &meta.fields {
                if fields.insert(def.id.clone(), def.clone()).is_some() {
                    debug!(field = %def.id, template = %template.name, "Field redefined");
                }
            }
        }

        Ok(Self { fields })
    }

    /// Build a model directly from definitions (later duplicates win)
    pub fn from_definitions(defs: impl IntoIterator<Item = FieldDefinition>) -> Self {
        Self {
            fields: defs.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fields.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Definitions in identifier order
    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values()
    }

    /// Definitions in the order shown to users: by label, then identifier
    pub fn sorted_by_label(&self) -> Vec<&FieldDefinition> {
        let mut defs: Vec<&FieldDefinition> = self.fields.values().collect();
        defs.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));
        defs
    }
}
