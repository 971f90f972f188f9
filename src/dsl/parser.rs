//! Token classification and filter building for the search DSL.
//!
//! Grammar (per whitespace-separated token):
//!
//! token   = ["-"] (field ":" value | value)
//! field   = "artist" | "title" | "album" | "genre" | "label" | "key" | "tag"
//!         | "bpm" | "year"
//! value   = text | '"' text '"' | '"' text
//!
//! Numeric values (bpm, year):
//!
//! numeric = NUMBER "-" NUMBER | (">=" | ">" | "<=" | "<") NUMBER | NUMBER
//!
//! Nothing here fails: unknown prefixes fall back to free text, numeric
//! values that do not parse are dropped.

use super::ast::{
    FieldName, NumericField, NumericFilter, NumericOp, SearchQuery, StringField, StringFilter,
};
use super::lexer::tokenize;

/// Comparison prefixes, longest first so `>` does not swallow `>=`.
const COMPARISON_PREFIXES: &[(&str, NumericOp)] = &[
    (">=", NumericOp::Ge),
    (">", NumericOp::Gt),
    ("<=", NumericOp::Le),
    ("<", NumericOp::Lt),
];

/// What a single token compiles to.
#[derive(Debug, Clone, PartialEq)]
enum Clause {
    String(StringFilter),
    Numeric(NumericFilter),
}

/// Parse a query string into a [`SearchQuery`].
pub fn parse_query(input: &str) -> SearchQuery {
    let mut query = SearchQuery::default();

    for token in tokenize(input) {
        match classify_token(token) {
            Some(Clause::String(filter)) => query.string_filters.push(filter),
            Some(Clause::Numeric(filter)) => query.numeric_filters.push(filter),
            None => tracing::debug!("Dropping token '{}'", token),
        }
    }

    query
}

/// Classify one token into at most one filter.
fn classify_token(token: &str) -> Option<Clause> {
    let (negate, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    if body.is_empty() {
        return None;
    }

    if let Some((prefix, rest)) = body.split_once(':') {
        match FieldName::lookup(prefix) {
            Some(FieldName::Numeric(field)) => {
                return build_numeric_filter(field, rest, negate).map(Clause::Numeric);
            }
            Some(FieldName::String(field)) => {
                return Some(Clause::String(build_string_filter(field, rest, negate)));
            }
            None => {}
        }
    }

    Some(Clause::String(build_string_filter(StringField::Any, body, negate)))
}

/// Strip surrounding quotes. Returns the value and whether it was fully quoted.
fn strip_quotes(value: &str) -> (&str, bool) {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        (&value[1..value.len() - 1], true)
    } else if let Some(rest) = value.strip_prefix('"') {
        (rest, false)
    } else {
        (value, false)
    }
}

/// An empty value is kept: it matches any record that has the field at all.
fn build_string_filter(field: StringField, raw: &str, negate: bool) -> StringFilter {
    let (value, exact) = strip_quotes(raw);
    StringFilter {
        field,
        value: value.to_string(),
        negate,
        exact,
    }
}

fn build_numeric_filter(field: NumericField, raw: &str, negate: bool) -> Option<NumericFilter> {
    let filter = |op, value, max_value| NumericFilter {
        field,
        op,
        value,
        max_value,
        negate,
    };

    if let Some((low, high)) = raw.split_once('-') {
        if let (Some(min), Some(max)) = (parse_number(low), parse_number(high)) {
            return Some(filter(NumericOp::Range, min, Some(max)));
        }
    }

    for (prefix, op) in COMPARISON_PREFIXES {
        if let Some(rest) = raw.strip_prefix(prefix) {
            return parse_number(rest).map(|n| filter(*op, n, None));
        }
    }

    parse_number(raw).map(|n| filter(NumericOp::Eq, n, None))
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
