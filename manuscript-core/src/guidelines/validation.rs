//! Structural validation of the raw guideline payload.
//!
//! Failures are reported, never raised: a bad entry produces a detail line
//! and loading carries on with whatever data is usable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// JSON primitive kinds a schema property may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => JsonKind::String,
            Value::Number(_) => JsonKind::Number,
            Value::Bool(_) => JsonKind::Boolean,
            Value::Object(_) => JsonKind::Object,
            Value::Array(_) => JsonKind::Array,
            Value::Null => JsonKind::Null,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JsonKind::String => "string",
            JsonKind::Number => "number",
            JsonKind::Boolean => "boolean",
            JsonKind::Object => "object",
            JsonKind::Array => "array",
            JsonKind::Null => "null",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidelineSchema {
    pub required: Vec<String>,
    /// Accepted kinds per property name
    pub properties: BTreeMap<String, Vec<JsonKind>>,
    pub additional_properties: bool,
}

const TEXT_FIELDS: &[&str] = &[
    "journal",
    "article_type",
    "title_limit",
    "structure",
    "other_requirements",
    "last_accessed",
];

const LIMIT_FIELDS: &[&str] = &[
    "abstract_limit",
    "word_limit",
    "figure_limit",
    "reference_limit",
    "introduction_limit",
    "methods_limit",
    "results_limit",
    "discussion_limit",
    "conclusion_limit",
    "significance_statement_limit",
];

impl Default for GuidelineSchema {
    fn default() -> Self {
        let mut properties = BTreeMap::new();
        for field in TEXT_FIELDS {
            properties.insert(field.to_string(), vec![JsonKind::String]);
        }
        for field in LIMIT_FIELDS {
            properties.insert(field.to_string(), vec![JsonKind::String, JsonKind::Number]);
        }
        Self {
            required: vec!["journal".to_string(), "article_type".to_string()],
            properties,
            additional_properties: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    pub message: String,
    pub details: Vec<String>,
}

impl ValidationReport {
    pub fn is_success(&self) -> bool {
        self.status == ValidationStatus::Success
    }
}

fn describe_kinds(kinds: &[JsonKind]) -> String {
    kinds.iter().map(JsonKind::name).collect::<Vec<_>>().join(" or ")
}

fn entry_issues(index: usize, entry: &Map<String, Value>, schema: &GuidelineSchema) -> Vec<String> {
    let mut issues = Vec::new();

    for key in &schema.required {
        if !entry.contains_key(key) {
            issues.push(format!("Entry {index}: missing required property \"{key}\"."));
        }
    }

    for (key, value) in entry {
        match schema.properties.get(key) {
            Some(kinds) => {
                let actual = JsonKind::of(value);
                if !kinds.is_empty() && !kinds.contains(&actual) {
                    issues.push(format!(
                        "Entry {index}: property \"{key}\" should be {}, received {}.",
                        describe_kinds(kinds),
                        actual.name()
                    ));
                }
            }
            None if !schema.additional_properties => {
                issues.push(format!("Entry {index}: unexpected property \"{key}\"."));
            }
            None => {}
        }
    }

    issues
}

pub fn validate_guidelines(data: &Value, schema: &GuidelineSchema) -> ValidationReport {
    let Some(entries) = data.as_array() else {
        return ValidationReport {
            status: ValidationStatus::Error,
            message: "Guideline validation failed with 1 issue.".to_string(),
            details: vec!["Guidelines file should be an array of entries.".to_string()],
        };
    };

    let mut details = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        match entry.as_object() {
            Some(object) => details.extend(entry_issues(index, object, schema)),
            None => details.push(format!("Entry {index} should be an object.")),
        }
    }

    if details.is_empty() {
        ValidationReport {
            status: ValidationStatus::Success,
            message: format!("Guidelines validated ({} entries).", entries.len()),
            details,
        }
    } else {
        let plural = if details.len() == 1 { "" } else { "s" };
        ValidationReport {
            status: ValidationStatus::Error,
            message: format!("Guideline validation failed with {} issue{plural}.", details.len()),
            details,
        }
    }
}
