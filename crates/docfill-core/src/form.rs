//! Form state and the renderer seam
//!
//! [`FormState`] holds one [`FieldInput`] per field of a [`FieldModel`].
//! Front ends fill it through a [`FormRenderer`]; value files and
//! command-line assignments go through [`FormState::apply`] and
//! [`FormState::set`].

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{DocfillError, Result};
use crate::field::FieldInput;
use crate::model::FieldModel;
use crate::values::FieldValueSet;

/// Something that lets a user edit a form
pub trait FormRenderer {
    /// Let the user edit `form`, whose fields are described by `model`
    fn fill(&mut self, model: &FieldModel, form: &mut FormState) -> Result<()>;
}

/// Result of applying a batch of raw values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Identifiers that were assigned
    pub applied: Vec<String>,
    /// Identifiers with no field in the form, or with a value the field
    /// could not take
    pub ignored: Vec<String>,
}

/// Editable inputs, keyed by field identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    inputs: BTreeMap<String, FieldInput>,
}

impl FormState {
    /// Fresh inputs for every field of `model`
    pub fn from_model(model: &FieldModel) -> Self {
        Self {
            inputs: model
                .iter()
                .map(|def| (def.id.clone(), def.new_input()))
                .collect(),
        }
    }

    pub fn input(&self, id: &str) -> Option<&FieldInput> {
        self.inputs.get(id)
    }

    pub fn input_mut(&mut self, id: &str) -> Option<&mut FieldInput> {
        self.inputs.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Assign one raw value; the field must exist
    ///
    /// Returns whether the input accepted the value (dates need `D/M/Y`).
    pub fn set(&mut self, id: &str, raw: &str) -> Result<bool> {
        let input = self
            .inputs
            .get_mut(id)
            .ok_or_else(|| DocfillError::UnknownField(id.to_string()))?;
        Ok(input.assign(raw))
    }

    /// Assign every value whose identifier has a field in the form
    pub fn apply<'a, I>(&mut self, values: I) -> ApplyOutcome
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut outcome = ApplyOutcome::default();
        for (id, raw) in values {
            let accepted = self
                .inputs
                .get_mut(id.as_str())
                .is_some_and(|input| input.assign(raw));
            if accepted {
                outcome.applied.push(id.clone());
            } else {
                outcome.ignored.push(id.clone());
            }
        }
        debug!(
            applied = outcome.applied.len(),
            ignored = outcome.ignored.len(),
            "Applied values to form"
        );
        outcome
    }

    /// Labels of required fields left blank, in display order
    pub fn missing_required(&self, model: &FieldModel) -> Vec<String> {
        model
            .sorted_by_label()
            .into_iter()
            .filter(|def| def.required)
            .filter(|def| self.inputs.get(&def.id).map_or(true, FieldInput::is_blank))
            .map(|def| def.label.clone())
            .collect()
    }

    /// Check required fields
    pub fn validate(&self, model: &FieldModel) -> Result<()> {
        let labels = self.missing_required(model);
        if labels.is_empty() {
            Ok(())
        } else {
            Err(DocfillError::MissingRequired { labels })
        }
    }

    /// Resolve every input to its substitution string
    pub fn resolve(&self) -> FieldValueSet {
        self.inputs
            .iter()
            .map(|(id, input)| (id.clone(), input.resolve()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDefinition, FieldKind};

    fn model() -> FieldModel {
        FieldModel::from_definitions(vec![
            FieldDefinition {
                id: "[name]".to_string(),
                label: "Student name".to_string(),
                kind: FieldKind::Text { multiline: false },
                required: true,
            },
            FieldDefinition {
                id: "[date]".to_string(),
                label: "Date".to_string(),
                kind: FieldKind::Date,
                required: true,
            },
            FieldDefinition {
                id: "[notes]".to_string(),
                label: "Notes".to_string(),
                kind: FieldKind::Text { multiline: true },
                required: false,
            },
            FieldDefinition {
                id: "[shift]".to_string(),
                label: "Shift".to_string(),
                kind: FieldKind::Choice {
                    options: vec!["Morning".to_string(), "Evening".to_string()],
                },
                required: true,
            },
        ])
    }

    #[test]
    fn test_required_gating() {
        let model = model();
        let mut form = FormState::from_model(&model);

        match form.validate(&model) {
            Err(DocfillError::MissingRequired { labels }) => {
                assert_eq!(labels, vec!["Date", "Student name"]);
            }
            other => panic!("Expected missing required, got {:?}", other),
        }

        form.set("[date]", "1/2/2025").unwrap();
        match form.validate(&model) {
            Err(DocfillError::MissingRequired { labels }) => {
                assert_eq!(labels, vec!["Student name"]);
            }
            other => panic!("Expected missing required, got {:?}", other),
        }

        form.set("[name]", "Ana").unwrap();
        assert!(form.validate(&model).is_ok());
    }

    #[test]
    fn test_set_unknown_field() {
        let mut form = FormState::from_model(&model());
        assert!(matches!(
            form.set("[nope]", "x"),
            Err(DocfillError::UnknownField(ref id)) if id == "[nope]"
        ));
    }

    #[test]
    fn test_apply_ignores_unknown_keys() {
        let mut form = FormState::from_model(&model());
        let values: BTreeMap<String, String> = [
            ("[name]", "Ana"),
            ("[other]", "x"),
            ("[date]", "not a date"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let outcome = form.apply(&values);
        assert_eq!(outcome.applied, vec!["[name]"]);
        assert_eq!(outcome.ignored, vec!["[date]", "[other]"]);
        assert_eq!(form.input("[name]").unwrap().resolve(), "Ana");
    }

    #[test]
    fn test_resolve_covers_every_field() {
        let mut form = FormState::from_model(&model());
        form.set("[name]", "Ana").unwrap();
        form.set("[notes]", "  trimmed \n").unwrap();

        let values = form.resolve();
        assert_eq!(values.len(), 4);
        assert_eq!(values.get("[name]"), Some("Ana"));
        assert_eq!(values.get("[date]"), Some(""));
        assert_eq!(values.get("[notes]"), Some("trimmed"));
        assert_eq!(values.get("[shift]"), Some("Morning"));
    }

    struct Scripted(Vec<(&'static str, &'static str)>);

    impl FormRenderer for Scripted {
        fn fill(&mut self, _model: &FieldModel, form: &mut FormState) -> Result<()> {
            for (id, value) in self.0.drain(..) {
                form.set(id, value)?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_renderer_fills_form() {
        let model = model();
        let mut form = FormState::from_model(&model);
        let mut renderer = Scripted(vec![("[name]", "Ana"), ("[date]", "3/4/2025")]);

        renderer.fill(&model, &mut form).unwrap();

        assert!(form.validate(&model).is_ok());
        assert_eq!(form.resolve().get("[date]"), Some("03/04/2025"));
    }
}
