//! Field definitions and form inputs
//!
//! A [`FieldDefinition`] describes one placeholder as loaded from template
//! metadata. A [`FieldInput`] is the editable state of that field in a form;
//! every variant resolves to the string substituted into documents.

use tracing::warn;

/// Options offered when a choice field is defined without any
pub const FALLBACK_OPTIONS: [&str; 2] = ["Option 1", "Option 2"];

/// Field type, with the data each type needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text; `multiline` marks long answers such as abstracts
    Text { multiline: bool },
    /// Exactly one of an ordered list of options
    Choice { options: Vec<String> },
    /// Day, month and year, rendered as `DD/MM/YYYY`
    Date,
}

impl FieldKind {
    /// Short name used in listings
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "text",
            FieldKind::Choice { .. } => "choice",
            FieldKind::Date => "date",
        }
    }
}

/// One placeholder of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Identifier, also the literal placeholder text in the template
    pub id: String,
    /// Human-readable label
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldDefinition {
    /// Create a fresh, empty input for this field
    ///
    /// Choice fields start with their first option selected.
    pub fn new_input(&self) -> FieldInput {
        match &self.kind {
            FieldKind::Text { multiline } => FieldInput::Text {
                value: String::new(),
                multiline: *multiline,
            },
            FieldKind::Choice { options } => {
                let options = if options.is_empty() {
                    warn!(field = %self.id, "Choice field has no options, using placeholders");
                    FALLBACK_OPTIONS.iter().map(|o| o.to_string()).collect()
                } else {
                    options.clone()
                };
                FieldInput::Choice {
                    selected: options.first().cloned(),
                    options,
                }
            }
            FieldKind::Date => FieldInput::Date {
                day: String::new(),
                month: String::new(),
                year: String::new(),
            },
        }
    }
}

/// Editable value of one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Text {
        value: String,
        multiline: bool,
    },
    Choice {
        options: Vec<String>,
        selected: Option<String>,
    },
    Date {
        day: String,
        month: String,
        year: String,
    },
}

impl FieldInput {
    /// The string substituted into documents
    pub fn resolve(&self) -> String {
        match self {
            FieldInput::Text { value, multiline } => {
                if *multiline {
                    value.trim().to_string()
                } else {
                    value.clone()
                }
            }
            FieldInput::Choice { selected, .. } => selected.clone().unwrap_or_default(),
            FieldInput::Date { day, month, year } => {
                let (day, month, year) = (day.trim(), month.trim(), year.trim());
                if day.is_empty() && month.is_empty() && year.is_empty() {
                    return String::new();
                }
                format!("{}/{}/{}", pad2(day), pad2(month), year)
            }
        }
    }

    /// Whether the input counts as not filled in
    pub fn is_blank(&self) -> bool {
        match self {
            FieldInput::Text { value, .. } => value.trim().is_empty(),
            FieldInput::Choice { selected, .. } => {
                selected.as_deref().map_or(true, |s| s.trim().is_empty())
            }
            FieldInput::Date { day, month, year } => {
                day.trim().is_empty() || month.trim().is_empty() || year.trim().is_empty()
            }
        }
    }

    /// Assign a raw string value, as found in a value file
    ///
    /// Dates take `D/M/Y` and store day and month padded to two digits, so
    /// a resolved date assigns back to the same components. Anything else
    /// leaves a date input unchanged and returns `false`. Choice values are
    /// taken verbatim even when they are not among the options.
    pub fn assign(&mut self, raw: &str) -> bool {
        match self {
            FieldInput::Text { value, .. } => {
                *value = raw.to_string();
                true
            }
            FieldInput::Choice { selected, .. } => {
                *selected = Some(raw.to_string());
                true
            }
            FieldInput::Date { day, month, year } => {
                let parts: Vec<&str> = raw.split('/').collect();
                if let [d, m, y] = parts.as_slice() {
                    *day = pad2(d.trim());
                    *month = pad2(m.trim());
                    *year = y.trim().to_string();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Date components, if this is a date input
    pub fn date_components(&self) -> Option<(&str, &str, &str)> {
        match self {
            FieldInput::Date { day, month, year } => Some((day, month, year)),
            _ => None,
        }
    }
}

/// Left-pad a one-digit numeric component
fn pad2(component: &str) -> String {
    if component.len() == 1 && component.chars().all(|c| c.is_ascii_digit()) {
        format!("0{}", component)
    } else {
        component.to_string()
    }
}
