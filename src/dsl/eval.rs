//! Evaluator for compiled search queries.

use super::ast::{NumericField, NumericFilter, NumericOp, SearchQuery, StringField, StringFilter};
use crate::tags::decode;

/// Separator between attributes in the free-text haystack.
const FULL_TEXT_SEPARATOR: &str = "\n";

/// A record the evaluator can read.
pub trait Searchable {
    /// Plain text attribute. Never called for [`StringField::Tag`] or [`StringField::Any`].
    fn text(&self, field: StringField) -> Option<&str>;

    fn number(&self, field: NumericField) -> Option<f64>;

    /// The encoded comment + tags field.
    fn comment_raw(&self) -> Option<&str>;

    /// Everything `any` searches: artist, title, album, raw comment,
    /// grouping and BPM.
    fn full_text(&self) -> String {
        let bpm = self.number(NumericField::Bpm).map(|n| n.to_string());
        [
            self.text(StringField::Artist),
            self.text(StringField::Title),
            self.text(StringField::Album),
            self.comment_raw(),
            self.text(StringField::Label),
            bpm.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(FULL_TEXT_SEPARATOR)
    }
}

/// Per-record values shared by every filter, computed once.
struct Resolved {
    full_text: Option<String>,
    tags: Option<Vec<String>>,
}

impl Resolved {
    fn new<R: Searchable + ?Sized>(query: &SearchQuery, record: &R) -> Self {
        Resolved {
            full_text: query
                .uses_field(StringField::Any)
                .then(|| record.full_text().to_lowercase()),
            tags: query.uses_field(StringField::Tag).then(|| {
                decode(record.comment_raw().unwrap_or_default())
                    .tags
                    .iter()
                    .map(|t| t.to_lowercase())
                    .collect()
            }),
        }
    }
}

/// Evaluate a query against a record. An empty query matches everything.
pub fn evaluate_query<R: Searchable + ?Sized>(query: &SearchQuery, record: &R) -> bool {
    if query.is_empty() {
        return true;
    }

    let resolved = Resolved::new(query, record);

    query
        .numeric_filters
        .iter()
        .all(|f| evaluate_numeric(f, record))
        && query
            .string_filters
            .iter()
            .all(|f| evaluate_string(f, record, &resolved))
}

/// Keep the records that match, in their original order.
pub fn filter_records<'a, R: Searchable>(query: &SearchQuery, records: &'a [R]) -> Vec<&'a R> {
    records
        .iter()
        .filter(|record| evaluate_query(query, *record))
        .collect()
}

fn evaluate_numeric<R: Searchable + ?Sized>(filter: &NumericFilter, record: &R) -> bool {
    // A missing value excludes the record, negated or not.
    let Some(actual) = record.number(filter.field) else {
        return false;
    };

    let pass = match filter.op {
        NumericOp::Range => {
            let other = filter.max_value.unwrap_or(filter.value);
            let (low, high) = if filter.value <= other {
                (filter.value, other)
            } else {
                (other, filter.value)
            };
            actual >= low && actual <= high
        }
        op => compare(op, actual, filter.value),
    };

    pass != filter.negate
}

fn evaluate_string<R: Searchable + ?Sized>(
    filter: &StringFilter,
    record: &R,
    resolved: &Resolved,
) -> bool {
    let needle = filter.value.to_lowercase();

    let pass = match filter.field {
        StringField::Any => resolved
            .full_text
            .as_deref()
            .is_some_and(|text| text.contains(&needle)),
        StringField::Tag => resolved
            .tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|tag| tag.contains(&needle))),
        field => record
            .text(field)
            .is_some_and(|text| text.to_lowercase().contains(&needle)),
    };

    pass != filter.negate
}

/// Apply a comparison operator.
fn compare(op: NumericOp, left: f64, right: f64) -> bool {
    match op {
        NumericOp::Eq => (left - right).abs() < f64::EPSILON,
        NumericOp::Lt => left < right,
        NumericOp::Le => left <= right,
        NumericOp::Gt => left > right,
        NumericOp::Ge => left >= right,
        NumericOp::Range => false,
    }
}
