//! Declarative field rules and their compiled, checkable form.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::types::{DataType, Value};

/// A rule attached to one schema field.
///
/// In JSON, the variant is selected by a `"rule"` tag:
///
/// ```json
/// {"rule": "range", "min": 1, "max": 100}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Constraint {
    /// Value must be present (not null, not blank).
    Required,
    /// No two non-null values may be equal.
    Unique,
    /// [`Constraint::Required`] plus [`Constraint::Unique`].
    PrimaryKey,
    /// Numeric value must lie in `[min, max]`; either bound may be open.
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// Character count of the value's text must lie in `[min, max]`.
    Length {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    /// Value's text must match the regular expression (unanchored).
    Pattern { regex: String },
    /// Value must equal one of the listed values.
    OneOf { values: Vec<Value> },
    /// Value must convert to the given type.
    Convertible { to: DataType },
}

impl Constraint {
    /// Stable rule name, as used in reports and in the JSON tag.
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::Required => "required",
            Constraint::Unique => "unique",
            Constraint::PrimaryKey => "primary_key",
            Constraint::Range { .. } => "range",
            Constraint::Length { .. } => "length",
            Constraint::Pattern { .. } => "pattern",
            Constraint::OneOf { .. } => "one_of",
            Constraint::Convertible { .. } => "convertible",
        }
    }

    /// Whether the rule needs the whole column rather than one cell.
    pub fn is_column_wide(&self) -> bool {
        matches!(self, Constraint::Unique | Constraint::PrimaryKey)
    }

    /// Validate the declaration and prepare a per-cell check.
    ///
    /// Column-wide rules compile to `None`; the evaluator handles them in its column phase.
    pub(crate) fn compile(&self, field: &str) -> Result<Option<CellCheck<'_>>, SchemaError> {
        let check = match self {
            Constraint::Unique | Constraint::PrimaryKey => return Ok(None),
            Constraint::Required => CellCheck::Required,
            Constraint::Range { min, max } => {
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(invalid_bounds(field, "range", lo, hi));
                    }
                }
                CellCheck::Range {
                    min: *min,
                    max: *max,
                }
            }
            Constraint::Length { min, max } => {
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(invalid_bounds(field, "length", lo, hi));
                    }
                }
                CellCheck::Length {
                    min: *min,
                    max: *max,
                }
            }
            Constraint::Pattern { regex } => {
                let compiled = Regex::new(regex).map_err(|source| SchemaError::InvalidPattern {
                    field: field.to_string(),
                    pattern: regex.clone(),
                    source,
                })?;
                CellCheck::Pattern {
                    regex: compiled,
                    source: regex,
                }
            }
            Constraint::OneOf { values } => {
                if values.is_empty() {
                    return Err(SchemaError::EmptyAllowedSet {
                        field: field.to_string(),
                    });
                }
                CellCheck::OneOf(values)
            }
            Constraint::Convertible { to } => CellCheck::Convertible(*to),
        };
        Ok(Some(check))
    }
}

fn invalid_bounds(field: &str, rule: &'static str, min: impl fmt::Display, max: impl fmt::Display) -> SchemaError {
    SchemaError::InvalidBounds {
        field: field.to_string(),
        rule,
        min: min.to_string(),
        max: max.to_string(),
    }
}

/// How a violated rule is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    #[default]
    Error,
    Warning,
}

/// A [`Constraint`] with its reporting severity.
///
/// Serialized flat: `{"rule": "required", "severity": "warning"}`. Severity defaults to
/// [`RuleSeverity::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(flatten)]
    pub constraint: Constraint,
    #[serde(default)]
    pub severity: RuleSeverity,
}

impl Rule {
    /// Error-level rule.
    pub fn new(constraint: Constraint) -> Self {
        Self {
            constraint,
            severity: RuleSeverity::Error,
        }
    }
}

impl From<Constraint> for Rule {
    fn from(constraint: Constraint) -> Self {
        Self::new(constraint)
    }
}

/// Compiled per-cell rule.
#[derive(Debug)]
pub(crate) enum CellCheck<'a> {
    Required,
    Range { min: Option<f64>, max: Option<f64> },
    Length { min: Option<usize>, max: Option<usize> },
    Pattern { regex: Regex, source: &'a str },
    OneOf(&'a [Value]),
    Convertible(DataType),
}

impl CellCheck<'_> {
    /// Message describing why `value` violates the rule, or `None` if it passes.
    ///
    /// Only [`CellCheck::Required`] looks at null values. Range skips values with no numeric
    /// reading.
    pub(crate) fn violation(&self, value: &Value) -> Option<String> {
        if let CellCheck::Required = self {
            return value.is_empty().then(|| "value is required".to_string());
        }
        if value.is_null() {
            return None;
        }

        match self {
            CellCheck::Required => None,
            CellCheck::Range { min, max } => {
                let n = value.as_f64()?;
                if let Some(lo) = min {
                    if n < *lo {
                        return Some(format!("value {value} is below minimum {lo}"));
                    }
                }
                if let Some(hi) = max {
                    if n > *hi {
                        return Some(format!("value {value} is above maximum {hi}"));
                    }
                }
                None
            }
            CellCheck::Length { min, max } => {
                let len = value.to_string().chars().count();
                if let Some(lo) = min {
                    if len < *lo {
                        return Some(format!("length {len} is below minimum {lo}"));
                    }
                }
                if let Some(hi) = max {
                    if len > *hi {
                        return Some(format!("length {len} exceeds maximum {hi}"));
                    }
                }
                None
            }
            CellCheck::Pattern { regex, source } => {
                let text = value.to_string();
                (!regex.is_match(&text))
                    .then(|| format!("value '{text}' does not match pattern '{source}'"))
            }
            CellCheck::OneOf(allowed) => (!allowed.contains(value)).then(|| {
                let list: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                format!("value '{value}' is not one of [{}]", list.join(", "))
            }),
            CellCheck::Convertible(to) => {
                (!value.convertible_to(*to)).then(|| format!("value '{value}' cannot be converted to {to}"))
            }
        }
    }
}
