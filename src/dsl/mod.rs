//! Search DSL for filtering a track library.
//!
//! Syntax (whitespace-separated, all terms AND-ed):
//!   word                    - free text across artist, title, album, comment, grouping, bpm
//!   "two words"             - quoted phrase
//!   field:value             - artist, title, album, genre, label, key, tag
//!   -term                   - negate any term
//!   bpm:120, year:1999      - numeric equality
//!   bpm:>=128, year:<2000   - numeric comparison
//!   bpm:120-130             - inclusive range
//!
//! Matching is case-insensitive substring containment. Malformed input never
//! errors: unknown fields become free text and bad numbers are dropped.

mod ast;
mod eval;
mod lexer;
mod parser;

pub use ast::*;
pub use eval::{Searchable, evaluate_query, filter_records};
pub use lexer::tokenize;
pub use parser::parse_query;
