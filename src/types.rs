//! Core data model types for ingestion.
//!
//! Ingestion turns delimited text into a [`crate::store::TypedStore`] whose cells are typed
//! [`Value`]s, bound to columns by a user-provided [`Schema`] (an ordered list of [`Field`]s,
//! each optionally carrying validation [`Rule`]s).

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::validation::{Constraint, Rule, RuleSeverity};

/// Logical data type a [`Value`] can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::Bool => "bool",
            DataType::Utf8 => "utf8",
        };
        f.write_str(name)
    }
}

/// A single typed cell value.
///
/// Equality is "natural": numbers compare by value across `Int64`/`Float64` (so `Int64(2)`
/// equals `Float64(2.0)`), strings compare exactly, and `NaN` equals `NaN` so floats can key an
/// index. [`Hash`] agrees with that equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for null values and for strings that are empty after trimming.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Utf8(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The value's type, or `None` for null.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DataType::Bool),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::Utf8(_) => Some(DataType::Utf8),
        }
    }

    /// Borrow the string payload of a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value.
    ///
    /// Integers and floats convert directly; strings are parsed (locale-invariant). Booleans and
    /// nulls are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(i) => Some(*i as f64),
            Value::Float64(f) => Some(*f),
            Value::Utf8(s) => s.trim().parse::<f64>().ok(),
            Value::Null | Value::Bool(_) => None,
        }
    }

    /// Convert to a caller-chosen type, `None` when the conversion does not apply.
    pub fn extract<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }

    /// Whether a non-null value converts to `target`.
    pub fn convertible_to(&self, target: DataType) -> bool {
        match target {
            DataType::Int64 => i64::from_value(self).is_some(),
            DataType::Float64 => f64::from_value(self).is_some(),
            DataType::Bool => bool::from_value(self).is_some(),
            DataType::Utf8 => !self.is_null(),
        }
    }
}

/// Integral, in-range floats map to the integer they equal.
pub(crate) fn float_as_i64(f: f64) -> Option<i64> {
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f.fract() == 0.0 && (LOWER..UPPER).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Int64(i), Value::Float64(f)) | (Value::Float64(f), Value::Int64(i)) => {
                float_as_i64(*f) == Some(*i)
            }
            (Value::Utf8(a), Value::Utf8(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => 0u8.hash(state),
            Value::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            Value::Int64(i) => {
                2u8.hash(state);
                i.hash(state);
            }
            Value::Float64(f) => match float_as_i64(*f) {
                // Must hash like the Int64 it compares equal to.
                Some(i) => {
                    2u8.hash(state);
                    i.hash(state);
                }
                None if f.is_nan() => {
                    3u8.hash(state);
                    u64::MAX.hash(state);
                }
                None => {
                    3u8.hash(state);
                    f.to_bits().hash(state);
                }
            },
            Value::Utf8(s) => {
                4u8.hash(state);
                s.hash(state);
            }
        }
    }
}

/// String representation used by length/pattern rules and by CSV export.
///
/// Null renders as the empty string. Integral floats keep a trailing `.0` so that re-parsing
/// the text yields a float again.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Float64(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}

/// Typed extraction from a [`Value`].
///
/// Used by [`crate::store::TypedStore::column_as`] and [`crate::store::RowView::get_as`].
pub trait FromValue: Sized {
    /// Convert `value`, or `None` if it is null or does not convert.
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int64(i) => Some(*i),
            Value::Float64(f) => float_as_i64(*f),
            Value::Utf8(s) => s.trim().parse().ok(),
            Value::Null | Value::Bool(_) => None,
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        i64::from_value(value).and_then(|i| i32::try_from(i).ok())
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> Option<Self> {
        i64::from_value(value).and_then(|i| u32::try_from(i).ok())
    }
}

impl FromValue for usize {
    fn from_value(value: &Value) -> Option<Self> {
        i64::from_value(value).and_then(|i| usize::try_from(i).ok())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64().map(|f| f as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Utf8(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Identifier of a schema field: a header name, or a fixed source column ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldId {
    /// Matched against header text (case-insensitive, trimmed).
    Name(String),
    /// Bound to this 0-based source column regardless of headers.
    Ordinal(usize),
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldId::Name(name) => f.write_str(name),
            FieldId::Ordinal(i) => write!(f, "#{i}"),
        }
    }
}

impl From<&str> for FieldId {
    fn from(v: &str) -> Self {
        FieldId::Name(v.to_owned())
    }
}

impl From<String> for FieldId {
    fn from(v: String) -> Self {
        FieldId::Name(v)
    }
}

impl From<usize> for FieldId {
    fn from(v: usize) -> Self {
        FieldId::Ordinal(v)
    }
}

/// Header/field name equality: trimmed, case-insensitive over full Unicode.
pub(crate) fn names_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// A single schema field with its validation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field identifier.
    pub id: FieldId,
    /// Validation rules attached to this field.
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Value used by [`crate::ingestion::MissingFieldPolicy::SetDefault`].
    #[serde(default)]
    pub default: Option<Value>,
}

impl Field {
    /// Create a new field without rules.
    pub fn new(id: impl Into<FieldId>) -> Self {
        Self {
            id: id.into(),
            rules: Vec::new(),
            default: None,
        }
    }

    /// Attach an error-level rule.
    pub fn with_rule(mut self, constraint: Constraint) -> Self {
        self.rules.push(Rule::new(constraint));
        self
    }

    /// Attach a warning-level rule.
    pub fn with_warning(mut self, constraint: Constraint) -> Self {
        self.rules.push(Rule {
            constraint,
            severity: RuleSeverity::Warning,
        });
        self
    }

    pub fn required(self) -> Self {
        self.with_rule(Constraint::Required)
    }

    pub fn unique(self) -> Self {
        self.with_rule(Constraint::Unique)
    }

    pub fn primary_key(self) -> Self {
        self.with_rule(Constraint::PrimaryKey)
    }

    pub fn range(self, min: f64, max: f64) -> Self {
        self.with_rule(Constraint::Range {
            min: Some(min),
            max: Some(max),
        })
    }

    pub fn length(self, min: Option<usize>, max: Option<usize>) -> Self {
        self.with_rule(Constraint::Length { min, max })
    }

    pub fn pattern(self, regex: impl Into<String>) -> Self {
        self.with_rule(Constraint::Pattern {
            regex: regex.into(),
        })
    }

    pub fn one_of<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with_rule(Constraint::OneOf {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn convertible_to(self, to: DataType) -> Self {
        self.with_rule(Constraint::Convertible { to })
    }

    /// Set the value substituted for a missing column under `SetDefault`.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Human-readable label (header name, or `#n` for ordinals).
    pub fn label(&self) -> String {
        self.id.to_string()
    }

    /// Whether `name` refers to this field (case-insensitive, trimmed).
    pub fn matches_name(&self, name: &str) -> bool {
        match &self.id {
            FieldId::Name(own) => names_match(own, name),
            FieldId::Ordinal(_) => false,
        }
    }
}

/// Reference to a field of a known schema, used by store accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef<'a> {
    /// By name (case-insensitive, trimmed).
    Name(&'a str),
    /// By position in the schema.
    Position(usize),
    /// By identifier.
    Id(&'a FieldId),
}

impl fmt::Display for FieldRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Name(name) => f.write_str(name),
            FieldRef::Position(i) => write!(f, "position {i}"),
            FieldRef::Id(id) => write!(f, "{id}"),
        }
    }
}

impl<'a> From<&'a str> for FieldRef<'a> {
    fn from(v: &'a str) -> Self {
        FieldRef::Name(v)
    }
}

impl<'a> From<&'a String> for FieldRef<'a> {
    fn from(v: &'a String) -> Self {
        FieldRef::Name(v.as_str())
    }
}

impl From<usize> for FieldRef<'_> {
    fn from(v: usize) -> Self {
        FieldRef::Position(v)
    }
}

impl<'a> From<&'a FieldId> for FieldRef<'a> {
    fn from(v: &'a FieldId) -> Self {
        FieldRef::Id(v)
    }
}

/// An ordered list of fields describing the expected shape of incoming data.
///
/// Schemas are immutable once built; the pipeline never changes them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Schema of rule-less fields, e.g. derived from the variant names of an enumeration.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FieldId>,
    {
        Self::new(names.into_iter().map(Field::new).collect())
    }

    /// Decode a schema document such as
    /// `{"fields":[{"id":"ID","rules":[{"rule":"primary_key"}]}]}`.
    pub fn from_json_str(input: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate field labels in order.
    pub fn field_names(&self) -> impl Iterator<Item = String> + '_ {
        self.fields.iter().map(Field::label)
    }

    /// Returns the index of a named field, if present.
    ///
    /// Exact matches win over case-insensitive ones.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| matches!(&f.id, FieldId::Name(own) if own == name))
            .or_else(|| self.fields.iter().position(|f| f.matches_name(name)))
    }

    /// Resolve a [`FieldRef`] to a schema position.
    pub fn resolve(&self, field: FieldRef<'_>) -> Option<usize> {
        match field {
            FieldRef::Name(name) => self.index_of(name),
            FieldRef::Position(i) => (i < self.fields.len()).then_some(i),
            FieldRef::Id(id) => match id {
                FieldId::Name(name) => self.index_of(name),
                FieldId::Ordinal(_) => self.fields.iter().position(|f| &f.id == id),
            },
        }
    }

    /// Whether any field carries at least one rule.
    pub fn has_rules(&self) -> bool {
        self.fields.iter().any(|f| !f.rules.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use super::{DataType, Field, FieldId, FieldRef, Schema, Value};

    fn hash_of(v: &Value) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert_eq!(Value::Int64(2), Value::Float64(2.0));
        assert_eq!(hash_of(&Value::Int64(2)), hash_of(&Value::Float64(2.0)));
        assert_ne!(Value::Int64(2), Value::Float64(2.5));
        assert_eq!(Value::Float64(f64::NAN), Value::Float64(f64::NAN));
        assert_eq!(hash_of(&Value::Float64(0.0)), hash_of(&Value::Float64(-0.0)));
    }

    #[test]
    fn strings_compare_case_sensitively() {
        assert_ne!(Value::from("Bob"), Value::from("bob"));
        assert_ne!(Value::from("1"), Value::Int64(1));
    }

    #[test]
    fn display_keeps_decimal_point_for_integral_floats() {
        assert_eq!(Value::Float64(42.0).to_string(), "42.0");
        assert_eq!(Value::Float64(2.5).to_string(), "2.5");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }

    #[test]
    fn extract_converts_between_types() {
        assert_eq!(Value::Int64(7).extract::<f64>(), Some(7.0));
        assert_eq!(Value::Float64(7.0).extract::<i64>(), Some(7));
        assert_eq!(Value::Float64(7.5).extract::<i64>(), None);
        assert_eq!(Value::from(" 12 ").extract::<u32>(), Some(12));
        assert_eq!(Value::from("TRUE").extract::<bool>(), Some(true));
        assert_eq!(Value::Null.extract::<String>(), None);
        assert!(Value::from("3.5").convertible_to(DataType::Float64));
        assert!(!Value::from("abc").convertible_to(DataType::Int64));
    }

    #[test]
    fn schema_resolves_names_case_insensitively() {
        let schema = Schema::new(vec![
            Field::new("ID"),
            Field::new("Name"),
            Field::new(FieldId::Ordinal(5)),
        ]);
        assert_eq!(schema.index_of("ID"), Some(0));
        assert_eq!(schema.index_of(" name "), Some(1));
        assert_eq!(schema.index_of("missing"), None);
        assert_eq!(schema.resolve(FieldRef::Position(2)), Some(2));
        assert_eq!(schema.resolve(FieldRef::Position(3)), None);
        assert_eq!(schema.resolve(FieldRef::Id(&FieldId::Ordinal(5))), Some(2));
    }

    #[test]
    fn non_ascii_names_match_regardless_of_case() {
        let schema = Schema::from_names(["id", "état"]);
        assert_eq!(schema.index_of("ÉTAT"), Some(1));
        assert_eq!(schema.index_of(" État "), Some(1));
        assert_eq!(schema.index_of("etat"), None);
    }

    #[test]
    fn schema_decodes_from_json() {
        let schema = Schema::from_json_str(
            r#"{"fields":[
                {"id":"ID","rules":[{"rule":"primary_key"}]},
                {"id":"Level","rules":[{"rule":"range","min":1,"max":100,"severity":"warning"}]},
                {"id":3,"default":"n/a"}
            ]}"#,
        )
        .unwrap();

        let expected = Schema::new(vec![
            Field::new("ID").primary_key(),
            Field::new("Level").with_warning(crate::validation::Constraint::Range {
                min: Some(1.0),
                max: Some(100.0),
            }),
            Field::new(FieldId::Ordinal(3)).with_default("n/a"),
        ]);
        assert_eq!(schema, expected);
    }
}
