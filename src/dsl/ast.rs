//! Compiled query types for the search DSL.

use serde::Serialize;
use std::fmt;

/// Text-valued fields a string filter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StringField {
    Artist,
    Title,
    Album,
    Genre,
    Label,
    Key,
    Tag,
    /// Free text across every searchable attribute.
    Any,
}

/// Number-valued fields a numeric filter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericField {
    Bpm,
    Year,
}

/// A field prefix recognized in front of `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    String(StringField),
    Numeric(NumericField),
}

/// Every recognized `field:` prefix. `any` is implied and has no prefix.
const FIELDS: &[(&str, FieldName)] = &[
    ("artist", FieldName::String(StringField::Artist)),
    ("title", FieldName::String(StringField::Title)),
    ("album", FieldName::String(StringField::Album)),
    ("genre", FieldName::String(StringField::Genre)),
    ("label", FieldName::String(StringField::Label)),
    ("key", FieldName::String(StringField::Key)),
    ("tag", FieldName::String(StringField::Tag)),
    ("bpm", FieldName::Numeric(NumericField::Bpm)),
    ("year", FieldName::Numeric(NumericField::Year)),
];

impl FieldName {
    /// Look up a field prefix, ignoring ASCII case.
    pub fn lookup(name: &str) -> Option<FieldName> {
        FIELDS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, field)| *field)
    }

    fn name(self) -> &'static str {
        FIELDS
            .iter()
            .find(|(_, field)| *field == self)
            .map(|(name, _)| *name)
            .unwrap_or("any")
    }
}

impl fmt::Display for StringField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", FieldName::String(*self).name())
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", FieldName::Numeric(*self).name())
    }
}

/// Numeric comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumericOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    /// Inclusive `min-max`.
    #[serde(rename = "range")]
    Range,
}

impl fmt::Display for NumericOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericOp::Eq => write!(f, "="),
            NumericOp::Gt => write!(f, ">"),
            NumericOp::Lt => write!(f, "<"),
            NumericOp::Ge => write!(f, ">="),
            NumericOp::Le => write!(f, "<="),
            NumericOp::Range => write!(f, "range"),
        }
    }
}

/// Case-insensitive substring match against a text field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringFilter {
    pub field: StringField,
    pub value: String,
    pub negate: bool,
    /// The value came from a quoted phrase. Matching is the same either way.
    pub exact: bool,
}

/// Comparison against a numeric field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericFilter {
    pub field: NumericField,
    pub op: NumericOp,
    pub value: f64,
    /// Upper bound, set only for [`NumericOp::Range`]. Not reordered against `value`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    pub negate: bool,
}

/// A parsed query. Every filter must pass for a record to match.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchQuery {
    pub string_filters: Vec<StringFilter>,
    pub numeric_filters: Vec<NumericFilter>,
}

impl SearchQuery {
    /// An empty query matches everything.
    pub fn is_empty(&self) -> bool {
        self.string_filters.is_empty() && self.numeric_filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.string_filters.len() + self.numeric_filters.len()
    }

    pub(crate) fn uses_field(&self, field: StringField) -> bool {
        self.string_filters.iter().any(|f| f.field == field)
    }
}
