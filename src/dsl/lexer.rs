//! Tokenizer for the search DSL.
//!
//! Tokens are separated by whitespace. A `"` opens a quoted run in which
//! whitespace is kept; the next `"` closes it. An unterminated quote runs to
//! the end of the input. Quotes stay in the token text for the classifier.

use winnow::combinator::{alt, opt, repeat};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

// Manually define PResult for resilience against winnow version changes
type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

/// A quoted run, closing quote optional.
fn lex_quoted(input: &mut &str) -> PResult<()> {
    ('"', take_till(0.., '"'), opt('"')).void().parse_next(input)
}

/// A run of anything but whitespace and quotes.
fn lex_bare(input: &mut &str) -> PResult<()> {
    take_while(1.., |c: char| !c.is_whitespace() && c != '"')
        .void()
        .parse_next(input)
}

fn skip_whitespace(input: &mut &str) -> PResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

/// Lex a single token: bare and quoted runs glued together.
fn lex_token<'i>(input: &mut &'i str) -> PResult<&'i str> {
    repeat::<_, _, (), _, _>(1.., alt((lex_quoted, lex_bare)))
        .take()
        .parse_next(input)
}

/// Tokenize the entire input. Never fails.
pub fn tokenize(input: &str) -> Vec<&str> {
    let mut remaining = input;
    let mut tokens = Vec::new();

    loop {
        if skip_whitespace(&mut remaining).is_err() || remaining.is_empty() {
            break;
        }
        match lex_token(&mut remaining) {
            Ok(tok) => tokens.push(tok),
            Err(e) => {
                // Unreachable with the grammar above; stop instead of looping.
                tracing::debug!("Lexer stopped at '{}': {:?}", remaining, e);
                break;
            }
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t ").is_empty());
    }

    #[test]
    fn test_whitespace_runs() {
        assert_eq!(tokenize("  techno\t -minimal  "), vec!["techno", "-minimal"]);
    }

    #[test]
    fn test_quoted_field_value() {
        assert_eq!(
            tokenize(r#"artist:Prince title:"Purple Rain""#),
            vec!["artist:Prince", r#"title:"Purple Rain""#]
        );
    }

    #[test]
    fn test_quote_mid_token() {
        assert_eq!(tokenize(r#"a"b c"d e"#), vec![r#"a"b c"d"#, "e"]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        assert_eq!(
            tokenize(r#"deep "late night vibes"#),
            vec!["deep", r#""late night vibes"#]
        );
    }

    #[test]
    fn test_lone_quote() {
        assert_eq!(tokenize(r#"house ""#), vec!["house", r#"""#]);
    }

    #[test]
    fn test_unicode_whitespace_and_text() {
        assert_eq!(tokenize("Björk\u{3000}Homogenic"), vec!["Björk", "Homogenic"]);
    }
}
